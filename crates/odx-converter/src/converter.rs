// crates/odx-converter/src/converter.rs

//! The conversion pipeline: one archive in, one record stream out.
//!
//! A run moves through `Idle -> Loading -> Indexing -> Resolving ->
//! Deduplicating -> Serializing` and ends in `Done` or `Failed`. Only archive
//! errors, serialization errors, cancellation, timeout and an archive with
//! no loadable document fail a run; everything else becomes a diagnostic.

use crate::archive::PdxArchive;
use crate::config::{ConvertOptions, RunGuard};
use crate::dedup;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};
use crate::error::{ArchiveError, ConvertError};
use crate::index::CrossReferenceIndex;
use crate::loader::{load_documents, LoadOutcome};
use crate::log::{odx_debug, odx_error, odx_info, RunContext};
use crate::resolver::resolve;
use crate::serializer;
use serde::Serialize;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

/// Stage of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Idle,
    Loading,
    Indexing,
    Resolving,
    Deduplicating,
    Serializing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Loading => "loading",
            PipelineStage::Indexing => "indexing",
            PipelineStage::Resolving => "resolving",
            PipelineStage::Deduplicating => "deduplicating",
            PipelineStage::Serializing => "serializing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub archive_name: String,
    /// The encoded record stream.
    pub bytes: Vec<u8>,
    /// Records in `bytes`, trailer included.
    pub records: u64,
    /// Documents that made it into the output, in archive order.
    pub documents: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Drives one archive through the pipeline. State is reset on every run.
pub struct Converter {
    options: ConvertOptions,
    stage: PipelineStage,
    diagnostics: Diagnostics,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            stage: PipelineStage::Idle,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Diagnostics of the last run, also available after a failure.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn convert<R: Read + Seek>(
        &mut self,
        archive: &mut PdxArchive<R>,
    ) -> Result<ConversionOutput, ConvertError> {
        self.execute(archive, None)
    }

    /// Converts and publishes the stream at `path`. Nothing is written when
    /// the run fails.
    pub fn convert_to_path<R: Read + Seek>(
        &mut self,
        archive: &mut PdxArchive<R>,
        path: &Path,
    ) -> Result<ConversionOutput, ConvertError> {
        self.execute(archive, Some(path))
    }

    fn execute<R: Read + Seek>(
        &mut self,
        archive: &mut PdxArchive<R>,
        target: Option<&Path>,
    ) -> Result<ConversionOutput, ConvertError> {
        self.stage = PipelineStage::Idle;
        self.diagnostics = Diagnostics::new();
        let guard = RunGuard::new(&self.options);

        let result = self.run(archive, target, &guard);
        match &result {
            Ok(output) => {
                self.transition(&output.archive_name, PipelineStage::Done);
            }
            Err(e) => {
                let ctx = RunContext { archive: archive.name() };
                odx_error!(ctx, "{} failed: {}", self.stage, e);
                self.transition(archive.name(), PipelineStage::Failed);
            }
        }
        result
    }

    fn run<R: Read + Seek>(
        &mut self,
        archive: &mut PdxArchive<R>,
        target: Option<&Path>,
        guard: &RunGuard,
    ) -> Result<ConversionOutput, ConvertError> {
        self.advance(archive.name(), PipelineStage::Loading, guard)?;
        self.check_catalog(archive)?;
        let name = archive.name().to_string();
        let ctx = RunContext { archive: &name };

        let total = archive.document_count();
        let outcomes = load_documents(archive.documents(), &self.options, guard)?;
        let mut documents = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                LoadOutcome::Loaded(mut document) => {
                    for finding in document.findings.drain(..) {
                        self.diagnostics.push(finding.into());
                    }
                    documents.push(document);
                }
                LoadOutcome::Skipped { .. } => {}
                LoadOutcome::Failed(violation) => self.diagnostics.push(violation.into()),
            }
        }
        odx_info!(ctx, "loaded {} of {} documents", documents.len(), total);
        if documents.is_empty() {
            return Err(ConvertError::NothingToConvert);
        }

        self.advance(&name, PipelineStage::Indexing, guard)?;
        let index = CrossReferenceIndex::build(&documents, &mut self.diagnostics);
        odx_debug!(ctx, "{} identifiers, {} references", index.len(), index.references().len());

        self.advance(&name, PipelineStage::Resolving, guard)?;
        let mut graph = resolve(&index, &documents, &mut self.diagnostics);
        odx_debug!(
            ctx,
            "{} layers, {} services, {} data object props",
            graph.layers.len(),
            graph.services.len(),
            graph.data_object_props.len()
        );

        self.advance(&name, PipelineStage::Deduplicating, guard)?;
        if self.options.deduplicate {
            dedup::canonicalize(&mut graph);
        } else {
            dedup::fingerprint(&mut graph);
        }

        self.advance(&name, PipelineStage::Serializing, guard)?;
        graph.archive_name = name.clone();
        graph.diagnostic_count = self.diagnostics.len() as u32;
        let (bytes, records) = serializer::encode(&graph)?;
        guard.check()?;
        if let Some(path) = target {
            serializer::publish(&bytes, path)?;
            odx_info!(ctx, "wrote {} records to {}", records, path.display());
        }

        Ok(ConversionOutput {
            archive_name: name.clone(),
            bytes,
            records,
            documents: graph.documents,
            diagnostics: self.diagnostics.iter().cloned().collect(),
        })
    }

    /// Reports catalog problems. Only an unreadable catalog entry is fatal.
    fn check_catalog<R: Read + Seek>(
        &mut self,
        archive: &mut PdxArchive<R>,
    ) -> Result<(), ConvertError> {
        let location = Location::new("index.xml", "CATALOG");
        match archive.catalog() {
            Ok(_) => {}
            Err(ArchiveError::InvalidCatalog(message)) => {
                self.diagnostics.report(
                    DiagnosticKind::CatalogMismatch,
                    location.clone(),
                    format!("catalog cannot be read: {}", message),
                );
            }
            Err(e) => return Err(e.into()),
        }
        for file in archive.missing_from_catalog() {
            self.diagnostics.report(
                DiagnosticKind::CatalogMismatch,
                location.clone(),
                format!("listed file '{}' is not in the archive", file),
            );
        }
        Ok(())
    }

    fn advance(
        &mut self,
        archive: &str,
        next: PipelineStage,
        guard: &RunGuard,
    ) -> Result<(), ConvertError> {
        guard.check()?;
        self.transition(archive, next);
        Ok(())
    }

    fn transition(&mut self, archive: &str, next: PipelineStage) {
        odx_info!(RunContext { archive }, "{} -> {}", self.stage, next);
        self.stage = next;
    }
}

/// Summary of a [`convert_file`] run, suitable for a JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub archive: String,
    pub output: String,
    pub stage: PipelineStage,
    pub records_written: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionReport {
    /// 0 when the output was written, possibly with diagnostics; 1 on a fatal error.
    pub fn exit_code(&self) -> i32 {
        if self.fatal.is_some() { 1 } else { 0 }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Converts the PDX file at `input` into a record stream at `output`.
pub fn convert_file(input: &Path, output: &Path, options: ConvertOptions) -> ConversionReport {
    let mut report = ConversionReport {
        archive: input.display().to_string(),
        output: output.display().to_string(),
        stage: PipelineStage::Idle,
        records_written: 0,
        fatal: None,
        diagnostics: Vec::new(),
    };

    let mut archive = match PdxArchive::open(input) {
        Ok(archive) => archive,
        Err(e) => {
            odx_error!(RunContext { archive: &report.archive }, "cannot open archive: {}", e);
            report.stage = PipelineStage::Failed;
            report.fatal = Some(e.to_string());
            return report;
        }
    };

    let mut converter = Converter::new(options);
    match converter.convert_to_path(&mut archive, output) {
        Ok(out) => report.records_written = out.records,
        Err(e) => report.fatal = Some(e.to_string()),
    }
    report.archive = archive.name().to_string();
    report.stage = converter.stage();
    report.diagnostics = converter.diagnostics().iter().cloned().collect();
    report
}
