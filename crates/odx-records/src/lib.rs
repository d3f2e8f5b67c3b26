// crates/odx-records/src/lib.rs

#![doc = "Persisted record format for converted ODX diagnostic archives."]
#![doc = ""]
#![doc = "A converted archive is a stream of length-delimited `Record` messages:"]
#![doc = "one `Header`, the canonical layers and the shared structures they"]
#![doc = "reference, then a `Trailer`. Records refer to each other through"]
#![doc = "`NodeLink`s (a record kind plus its table index), so a reader can load"]
#![doc = "the stream into flat tables without resolving anything by name."]

use prost::Message;

mod messages;

pub use messages::*;

/// Version of the record layout written into every `Header`.
pub const FORMAT_VERSION: u32 = 1;

/// Appends one length-delimited record to `out`.
pub fn write_record(record: &Record, out: &mut Vec<u8>) -> Result<(), prost::EncodeError> {
    record.encode_length_delimited(out)
}

/// Decodes a complete record stream.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Record>, prost::DecodeError> {
    RecordReader::new(bytes).collect()
}

/// Lazily decodes length-delimited records from a byte slice.
pub struct RecordReader<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> RecordReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            remaining: bytes,
            failed: false,
        }
    }
}

impl Iterator for RecordReader<'_> {
    type Item = Result<Record, prost::DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }
        match Record::decode_length_delimited(&mut self.remaining) {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                // A broken length prefix leaves no way to resynchronize.
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl Record {
    /// Short name of the record body, used in logs and error messages.
    pub fn body_name(&self) -> &'static str {
        match &self.body {
            Some(record::Body::Header(_)) => "Header",
            Some(record::Body::Layer(_)) => "Layer",
            Some(record::Body::Unit(_)) => "Unit",
            Some(record::Body::DataObjectProp(_)) => "DataObjectProp",
            Some(record::Body::DtcDop(_)) => "DtcDop",
            Some(record::Body::Structure(_)) => "Structure",
            Some(record::Body::Opaque(_)) => "Opaque",
            Some(record::Body::Service(_)) => "Service",
            Some(record::Body::Request(_)) => "Request",
            Some(record::Body::Response(_)) => "Response",
            Some(record::Body::ComParamSubset(_)) => "ComParamSubset",
            Some(record::Body::ComParam(_)) => "ComParam",
            Some(record::Body::ComParamSet(_)) => "ComParamSet",
            Some(record::Body::Protocol(_)) => "ProtocolDescription",
            Some(record::Body::Trailer(_)) => "Trailer",
            None => "Empty",
        }
    }
}

macro_rules! impl_into_record {
    ($($ty:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(body: $ty) -> Self {
                    Record {
                        body: Some(record::Body::$variant(body)),
                    }
                }
            }
        )+
    };
}

impl_into_record! {
    Header => Header,
    Layer => Layer,
    Unit => Unit,
    DataObjectProp => DataObjectProp,
    DtcDop => DtcDop,
    Structure => Structure,
    OpaqueNode => Opaque,
    Service => Service,
    Request => Request,
    Response => Response,
    ComParamSubset => ComParamSubset,
    ComParam => ComParam,
    ComParamSet => ComParamSet,
    ProtocolDescription => Protocol,
    Trailer => Trailer,
}

impl NodeLink {
    /// A link to an existing record of the given kind.
    pub fn resolved(kind: NodeKind, index: u32) -> Self {
        Self {
            kind: kind as i32,
            index: Some(index),
            unresolved_id: None,
        }
    }

    /// A placeholder carrying the identifier that could not be resolved.
    pub fn unresolved(kind: NodeKind, id_ref: impl Into<String>) -> Self {
        Self {
            kind: kind as i32,
            index: None,
            unresolved_id: Some(id_ref.into()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.index.is_some()
    }
}
