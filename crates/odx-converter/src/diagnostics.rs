// crates/odx-converter/src/diagnostics.rs

//! Non-fatal findings collected across all pipeline stages.

use crate::error::SchemaViolation;
use crate::log::{odx_warn, LogMetadata};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// A document failed parsing or structural validation and was excluded,
    /// or a single node of a loaded document is malformed.
    SchemaViolation,
    /// An `ID` was defined more than once; the first definition is kept.
    DuplicateIdentifier,
    /// An `ID-REF` names an identifier that is not defined, or one of the wrong kind.
    UnresolvedReference,
    /// A layer takes part in (or descends from) an inheritance cycle and was skipped.
    CyclicInheritance,
    /// `index.xml` lists a file the container does not hold, or cannot be read.
    CatalogMismatch,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::SchemaViolation => "schema violation",
            DiagnosticKind::DuplicateIdentifier => "duplicate identifier",
            DiagnosticKind::UnresolvedReference => "unresolved reference",
            DiagnosticKind::CyclicInheritance => "cyclic inheritance",
            DiagnosticKind::CatalogMismatch => "catalog mismatch",
        };
        f.write_str(s)
    }
}

/// Where a diagnostic was found: the document and the node path inside it,
/// e.g. `DIAG-LAYER-CONTAINER[DLC]/BASE-VARIANT[ECU]/DIAG-SERVICE[ReadRpm]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub document: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u64>,
}

impl Location {
    pub fn new(document: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            path: path.into(),
            line: None,
            column: None,
        }
    }

    /// Location of a child element, `ELEMENT[SHORT-NAME]` appended to the path.
    pub fn child(&self, element: &str, short_name: Option<&str>) -> Self {
        let segment = match short_name {
            Some(name) => format!("{}[{}]", element, name),
            None => element.to_string(),
        };
        let path = if self.path.is_empty() {
            segment
        } else {
            format!("{}/{}", self.path, segment)
        };
        Self::new(self.document.clone(), path)
    }
}

impl LogMetadata for Location {
    fn meta(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                format!("document={}:{}:{}, path={}", self.document, line, column, self.path)
            }
            _ => format!("document={}, path={}", self.document, self.path),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, ":{}:{}", line, column)?;
        }
        if !self.path.is_empty() {
            write!(f, " {}", self.path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Location,
    /// Second location involved, e.g. the first definition of a duplicate `ID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Location>,
    pub message: String,
}

impl From<SchemaViolation> for Diagnostic {
    fn from(v: SchemaViolation) -> Self {
        Diagnostic {
            kind: DiagnosticKind::SchemaViolation,
            location: Location {
                document: v.document,
                path: v.path.unwrap_or_default(),
                line: v.line,
                column: v.column,
            },
            related: None,
            message: v.message,
        }
    }
}

/// Collector handed to every stage. Each entry is also logged at warn level.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, location: Location, message: impl Into<String>) {
        self.push(Diagnostic {
            kind,
            location,
            related: None,
            message: message.into(),
        });
    }

    pub fn report_related(
        &mut self,
        kind: DiagnosticKind,
        location: Location,
        related: Location,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic {
            kind,
            location,
            related: Some(related),
            message: message.into(),
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        odx_warn!(diagnostic.location, "{}: {}", diagnostic.kind, diagnostic.message);
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_child_paths() {
        let root = Location::new("a.odx-d", "");
        let layer = root
            .child("DIAG-LAYER-CONTAINER", Some("DLC"))
            .child("BASE-VARIANT", Some("ECU"));
        assert_eq!(layer.path, "DIAG-LAYER-CONTAINER[DLC]/BASE-VARIANT[ECU]");
        assert_eq!(layer.child("PARAM", None).path, "DIAG-LAYER-CONTAINER[DLC]/BASE-VARIANT[ECU]/PARAM");
    }

    #[test]
    fn test_collects_and_filters_by_kind() {
        let mut diags = Diagnostics::new();
        diags.report(DiagnosticKind::UnresolvedReference, Location::new("a", "X"), "missing 'Y'");
        diags.report_related(
            DiagnosticKind::DuplicateIdentifier,
            Location::new("b", "X"),
            Location::new("a", "X"),
            "duplicate 'X'",
        );
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::DuplicateIdentifier).count(), 1);
        let dup = diags.of_kind(DiagnosticKind::DuplicateIdentifier).next().unwrap();
        assert_eq!(dup.related.as_ref().unwrap().document, "a");
    }

    #[test]
    fn test_schema_violation_conversion_and_json() {
        let v = SchemaViolation::new("bad.odx-d", "mismatched end tag").at_position(3, 9);
        let d: Diagnostic = v.into();
        assert_eq!(d.kind, DiagnosticKind::SchemaViolation);
        assert_eq!(d.location.line, Some(3));

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "SCHEMA_VIOLATION");
        assert_eq!(json["location"]["column"], 9);
        assert!(json.get("related").is_none());
    }
}
