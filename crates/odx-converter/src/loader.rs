// crates/odx-converter/src/loader.rs

//! Parses archive entries into typed ODX documents on a bounded worker pool.

use crate::archive::ArchiveEntry;
use crate::config::{ConvertOptions, RunGuard};
use crate::error::{ArchiveError, ConvertError, SchemaViolation};
use crate::log::{odx_debug, odx_info, DocContext};
use crate::model::Odx;
use crate::node::NodeView;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::thread;

/// A parsed and structurally valid document.
#[derive(Debug)]
pub struct LoadedDocument {
    pub name: String,
    pub odx: Odx,
    /// Node-level problems that did not reject the document.
    pub findings: Vec<SchemaViolation>,
}

impl LoadedDocument {
    /// Root of the node tree, see [`crate::node`].
    pub fn root(&self) -> NodeView<'_> {
        NodeView::Document(&self.odx)
    }
}

/// Result of loading one archive entry.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedDocument),
    /// Well-formed, but holds no diagnostic layers or communication parameters.
    Skipped { name: String },
    Failed(SchemaViolation),
}

/// Parses one document: well-formedness, typed deserialization, then
/// structural validation. No partial recovery.
pub fn load_document(
    name: &str,
    bytes: &[u8],
    options: &ConvertOptions,
) -> Result<Option<LoadedDocument>, SchemaViolation> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SchemaViolation::new(name, format!("document is not valid UTF-8: {}", e)))?;
    let text = text.trim_start_matches('\u{feff}');

    check_well_formed(name, text)?;

    let odx: Odx = quick_xml::de::from_str(text)
        .map_err(|e| SchemaViolation::new(name, format!("document does not match the ODX model: {}", e)))?;

    if odx.is_unsupported() {
        return Ok(None);
    }

    let mut document = LoadedDocument {
        name: name.to_string(),
        odx,
        findings: Vec::new(),
    };
    document.findings = validate_structure(&document, options)?;
    Ok(Some(document))
}

/// Streams over the whole document so syntax errors carry a line and column.
fn check_well_formed(name: &str, text: &str) -> Result<(), SchemaViolation> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                let offset = usize::try_from(reader.error_position()).unwrap_or(text.len());
                let (line, column) = line_column(text, offset);
                return Err(SchemaViolation::new(name, e.to_string()).at_position(line, column));
            }
        }
    }
}

/// 1-based line and column of a byte offset.
fn line_column(text: &str, offset: usize) -> (u64, u64) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
    (line as u64, column as u64)
}

/// An empty `ID` rejects the document. A malformed `SHORT-NAME` only does so
/// in strict mode; otherwise it is returned as a finding for that node.
fn validate_structure(
    document: &LoadedDocument,
    options: &ConvertOptions,
) -> Result<Vec<SchemaViolation>, SchemaViolation> {
    let mut findings = Vec::new();
    let mut stack = vec![(document.root(), String::new())];
    while let Some((node, parent_path)) = stack.pop() {
        let segment = match node.short_name() {
            Some(sn) => format!("{}[{}]", node.element(), sn),
            None => node.element().to_string(),
        };
        let path = if parent_path.is_empty() {
            segment
        } else {
            format!("{}/{}", parent_path, segment)
        };

        if let Some(id) = node.id() {
            if id.trim().is_empty() {
                return Err(SchemaViolation::new(&document.name, "empty ID attribute").at_path(path));
            }
        }
        if let Some(short_name) = node.short_name() {
            if !is_valid_short_name(short_name) {
                let violation = SchemaViolation::new(
                    &document.name,
                    format!("invalid SHORT-NAME '{}'", short_name),
                )
                .at_path(path.clone());
                if options.strict_short_names {
                    return Err(violation);
                }
                findings.push(violation);
            }
        }

        for child in node.children().into_iter().rev() {
            stack.push((child, path.clone()));
        }
    }
    Ok(findings)
}

fn is_valid_short_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Loads every entry on up to `options.workers` threads and returns the
/// outcomes in archive order.
///
/// Entries are pulled from `entries` on the calling thread. An archive error
/// stops the run; cancellation and timeout are checked between documents.
pub fn load_documents<I>(
    entries: I,
    options: &ConvertOptions,
    guard: &RunGuard,
) -> Result<Vec<LoadOutcome>, ConvertError>
where
    I: Iterator<Item = Result<ArchiveEntry, ArchiveError>>,
{
    let workers = options.workers.max(1);
    let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, ArchiveEntry)>(workers * 2);
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, LoadOutcome)>();

    let feed_result = thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (position, entry) in job_rx.iter() {
                    if guard.check().is_err() {
                        break;
                    }
                    let outcome = load_entry(entry, options);
                    if result_tx.send((position, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        let mut fed = Ok(());
        for (position, entry) in entries.enumerate() {
            if let Err(e) = guard.check() {
                fed = Err(e);
                break;
            }
            match entry {
                Ok(entry) => {
                    if job_tx.send((position, entry)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    fed = Err(ConvertError::Archive(e));
                    break;
                }
            }
        }
        drop(job_tx);
        fed
    });
    feed_result?;
    guard.check()?;

    let mut outcomes: Vec<(usize, LoadOutcome)> = result_rx.iter().collect();
    outcomes.sort_by_key(|(position, _)| *position);
    Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}

fn load_entry(entry: ArchiveEntry, options: &ConvertOptions) -> LoadOutcome {
    let ctx = DocContext { document: &entry.name };
    odx_debug!(ctx, "loading {} bytes", entry.data.len());
    match load_document(&entry.name, &entry.data, options) {
        Ok(Some(document)) => {
            odx_debug!(ctx, "loaded (MODEL-VERSION {})", document.odx.model_version);
            LoadOutcome::Loaded(document)
        }
        Ok(None) => {
            odx_info!(ctx, "no diagnostic layer or comparam content, skipping");
            LoadOutcome::Skipped { name: entry.name }
        }
        Err(violation) => LoadOutcome::Failed(violation),
    }
}
