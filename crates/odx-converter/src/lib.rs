// crates/odx-converter/src/lib.rs

#![doc = "Converts ODX diagnostic description archives (PDX) into a resolved record stream."]
#![doc = ""]
#![doc = "The pipeline reads every ODX document of a PDX container, indexes all"]
#![doc = "`ID`s, resolves `ID-REF`s into typed handles, applies layer inheritance,"]
#![doc = "merges structurally identical shared structures and writes the result as"]
#![doc = "length-delimited `odx_records::Record`s."]
#![doc = ""]
#![doc = "Entry points:"]
#![doc = "- `convert_file`: one PDX file in, one record file and a report out."]
#![doc = "- `Converter`: the same pipeline over an already opened `PdxArchive`."]
#![doc = "- `load_document`, `CrossReferenceIndex`, `resolve`, `canonicalize`,"]
#![doc = "  `serialize`: the individual stages."]

// --- Crate Modules ---

mod log;

pub mod archive;
pub mod config;
pub mod converter;
pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod node;
pub mod resolver;
pub mod serializer;
pub mod types;

// --- Public API Re-exports ---

pub use archive::{ArchiveEntry, PdxArchive};
pub use config::{CancellationToken, ConvertOptions, RunGuard};
pub use converter::{convert_file, ConversionOutput, ConversionReport, Converter, PipelineStage};
pub use dedup::canonicalize;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};
pub use error::{ArchiveError, ConvertError, SchemaViolation, SerializationError};
pub use index::CrossReferenceIndex;
pub use loader::{load_document, load_documents, LoadOutcome, LoadedDocument};
pub use resolver::resolve;
pub use serializer::{serialize, write_atomic};
pub use types::{Link, NodeRef, ResolvedGraph};
