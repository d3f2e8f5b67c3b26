// crates/odx-converter/src/error.rs

use std::fmt;
use std::io;

/// Errors raised while reading the PDX container. Always fatal for the run.
#[derive(Debug)]
pub enum ArchiveError {
    /// The archive file could not be opened or read.
    Io(io::Error),

    /// The container is not a valid ZIP file.
    Zip(zip::result::ZipError),

    /// An entry could not be decompressed (truncated data, CRC or size mismatch).
    Corrupt { entry: String, source: io::Error },

    /// Two entries share the same name.
    DuplicateEntry(String),

    /// `index.xml` exists but could not be parsed.
    InvalidCatalog(String),
}

impl From<io::Error> for ArchiveError {
    fn from(e: io::Error) -> Self {
        ArchiveError::Io(e)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ArchiveError::Io(io),
            other => ArchiveError::Zip(other),
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Io(e) => write!(f, "archive I/O error: {}", e),
            ArchiveError::Zip(e) => write!(f, "malformed archive: {}", e),
            ArchiveError::Corrupt { entry, source } => {
                write!(f, "corrupt archive entry '{}': {}", entry, source)
            }
            ArchiveError::DuplicateEntry(name) => {
                write!(f, "duplicate archive entry '{}'", name)
            }
            ArchiveError::InvalidCatalog(msg) => write!(f, "invalid index.xml: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            ArchiveError::Zip(e) => Some(e),
            ArchiveError::Corrupt { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A document that is not well-formed or does not match the ODX model.
/// The document is excluded from the run; the others continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub document: String,
    /// 1-based position, known for syntax errors.
    pub line: Option<u64>,
    pub column: Option<u64>,
    /// Node path of the offending element, known for structural errors.
    pub path: Option<String>,
    pub message: String,
}

impl SchemaViolation {
    pub(crate) fn new(document: &str, message: impl Into<String>) -> Self {
        Self {
            document: document.to_string(),
            line: None,
            column: None,
            path: None,
            message: message.into(),
        }
    }

    pub(crate) fn at_position(mut self, line: u64, column: u64) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub(crate) fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, ":{}:{}", line, column)?;
        }
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for SchemaViolation {}

/// Errors raised while writing the record stream. Always fatal for the run.
#[derive(Debug)]
pub enum SerializationError {
    Encode(prost::EncodeError),
    Decode(prost::DecodeError),
    Io(io::Error),

    /// A handle points past the end of its table.
    DanglingIndex { table: &'static str, index: u32 },
}

impl From<prost::EncodeError> for SerializationError {
    fn from(e: prost::EncodeError) -> Self {
        SerializationError::Encode(e)
    }
}

impl From<prost::DecodeError> for SerializationError {
    fn from(e: prost::DecodeError) -> Self {
        SerializationError::Decode(e)
    }
}

impl From<io::Error> for SerializationError {
    fn from(e: io::Error) -> Self {
        SerializationError::Io(e)
    }
}

impl From<tempfile::PersistError> for SerializationError {
    fn from(e: tempfile::PersistError) -> Self {
        SerializationError::Io(e.error)
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::Encode(e) => write!(f, "record encoding error: {}", e),
            SerializationError::Decode(e) => write!(f, "record decoding error: {}", e),
            SerializationError::Io(e) => write!(f, "output I/O error: {}", e),
            SerializationError::DanglingIndex { table, index } => {
                write!(f, "dangling {} index {}", table, index)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

/// Fatal outcome of a conversion run.
#[derive(Debug)]
pub enum ConvertError {
    Archive(ArchiveError),
    Serialization(SerializationError),

    /// The archive contained no document that could be loaded.
    NothingToConvert,

    Cancelled,
    TimedOut,
}

impl From<ArchiveError> for ConvertError {
    fn from(e: ArchiveError) -> Self {
        ConvertError::Archive(e)
    }
}

impl From<SerializationError> for ConvertError {
    fn from(e: SerializationError) -> Self {
        ConvertError::Serialization(e)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Archive(e) => write!(f, "{}", e),
            ConvertError::Serialization(e) => write!(f, "{}", e),
            ConvertError::NothingToConvert => {
                write!(f, "no document in the archive could be loaded")
            }
            ConvertError::Cancelled => write!(f, "conversion cancelled"),
            ConvertError::TimedOut => write!(f, "conversion timed out"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Archive(e) => Some(e),
            ConvertError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}
