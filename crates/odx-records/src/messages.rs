// crates/odx-records/src/messages.rs

//! Message definitions of the record stream.
//!
//! Field tags are part of the persisted format. Add new fields with new tags;
//! never renumber.

/// Kind of the record a `NodeLink` points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum NodeKind {
    Unspecified = 0,
    Layer = 1,
    Unit = 2,
    DataObjectProp = 3,
    DtcDop = 4,
    Structure = 5,
    Opaque = 6,
    Service = 7,
    Request = 8,
    Response = 9,
    ComParamSubset = 10,
    ComParam = 11,
    ComParamSet = 12,
    Protocol = 13,
}

/// ODX diagnostic layer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LayerKind {
    Unspecified = 0,
    Protocol = 1,
    FunctionalGroup = 2,
    EcuSharedData = 3,
    BaseVariant = 4,
    EcuVariant = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseKind {
    Unspecified = 0,
    Positive = 1,
    Negative = 2,
    GlobalNegative = 3,
}

/// `xsi:type` of a `PARAM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ParamKind {
    Unspecified = 0,
    CodedConst = 1,
    Value = 2,
    PhysConst = 3,
    Reserved = 4,
    MatchingRequestParam = 5,
    NrcConst = 6,
    Other = 7,
}

/// Reference to another record, or a placeholder for an unresolved `ID-REF`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct NodeLink {
    #[prost(enumeration = "NodeKind", tag = "1")]
    pub kind: i32,
    #[prost(uint32, optional, tag = "2")]
    pub index: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub unresolved_id: Option<String>,
}

// --- Envelope ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct Record {
    #[prost(
        oneof = "record::Body",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15"
    )]
    pub body: Option<record::Body>,
}

pub mod record {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "1")]
        Header(super::Header),
        #[prost(message, tag = "2")]
        Layer(super::Layer),
        #[prost(message, tag = "3")]
        Unit(super::Unit),
        #[prost(message, tag = "4")]
        DataObjectProp(super::DataObjectProp),
        #[prost(message, tag = "5")]
        DtcDop(super::DtcDop),
        #[prost(message, tag = "6")]
        Structure(super::Structure),
        #[prost(message, tag = "7")]
        Opaque(super::OpaqueNode),
        #[prost(message, tag = "8")]
        Service(super::Service),
        #[prost(message, tag = "9")]
        Request(super::Request),
        #[prost(message, tag = "10")]
        Response(super::Response),
        #[prost(message, tag = "11")]
        ComParamSubset(super::ComParamSubset),
        #[prost(message, tag = "12")]
        ComParam(super::ComParam),
        #[prost(message, tag = "13")]
        ComParamSet(super::ComParamSet),
        #[prost(message, tag = "14")]
        Protocol(super::ProtocolDescription),
        #[prost(message, tag = "15")]
        Trailer(super::Trailer),
    }
}

// --- Stream framing ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct Header {
    #[prost(uint32, tag = "1")]
    pub format_version: u32,
    #[prost(string, tag = "2")]
    pub archive_name: String,
    /// Documents that loaded successfully, in archive order.
    #[prost(string, repeated, tag = "3")]
    pub documents: Vec<String>,
    #[prost(uint32, tag = "4")]
    pub layer_count: u32,
    #[prost(uint32, tag = "5")]
    pub diagnostic_count: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Trailer {
    /// Number of records written before the trailer, header included.
    #[prost(uint64, tag = "1")]
    pub record_count: u64,
}

// --- Layers ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct Layer {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(string, optional, tag = "4")]
    pub long_name: Option<String>,
    #[prost(enumeration = "LayerKind", tag = "5")]
    pub kind: i32,
    #[prost(string, tag = "6")]
    pub document: String,
    #[prost(message, repeated, tag = "7")]
    pub parents: Vec<ParentRef>,
    /// Services declared or referenced by the layer itself.
    #[prost(message, repeated, tag = "8")]
    pub services: Vec<NodeLink>,
    #[prost(uint32, repeated, tag = "9")]
    pub data_object_props: Vec<u32>,
    #[prost(message, repeated, tag = "10")]
    pub comparam_values: Vec<ComParamValue>,
    #[prost(message, optional, tag = "11")]
    pub protocol_spec: Option<NodeLink>,
    #[prost(message, repeated, tag = "12")]
    pub variant_patterns: Vec<VariantPattern>,
    #[prost(message, optional, tag = "13")]
    pub effective: Option<EffectiveMembers>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ParentRef {
    #[prost(message, optional, tag = "1")]
    pub target: Option<NodeLink>,
    #[prost(string, repeated, tag = "2")]
    pub not_inherited_diag_comms: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub not_inherited_dops: Vec<String>,
}

/// Members after inheritance and overriding.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EffectiveMembers {
    #[prost(message, repeated, tag = "1")]
    pub services: Vec<NodeLink>,
    #[prost(uint32, repeated, tag = "2")]
    pub data_object_props: Vec<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub comparam_set: Option<u32>,
    #[prost(uint32, repeated, tag = "4")]
    pub protocols: Vec<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct VariantPattern {
    #[prost(message, repeated, tag = "1")]
    pub matching_parameters: Vec<MatchingParameter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MatchingParameter {
    #[prost(string, tag = "1")]
    pub expected_value: String,
    #[prost(string, tag = "2")]
    pub diag_comm: String,
    #[prost(string, optional, tag = "3")]
    pub out_param: Option<String>,
}

// --- Data dictionary ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct Unit {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    /// Every source identifier merged into this entry; the first is canonical.
    #[prost(string, repeated, tag = "2")]
    pub ids: Vec<String>,
    #[prost(string, tag = "3")]
    pub fingerprint: String,
    #[prost(string, tag = "4")]
    pub short_name: String,
    #[prost(string, tag = "5")]
    pub display_name: String,
    #[prost(string, optional, tag = "6")]
    pub factor_si_to_unit: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub offset_si_to_unit: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DataObjectProp {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, repeated, tag = "2")]
    pub ids: Vec<String>,
    #[prost(string, tag = "3")]
    pub fingerprint: String,
    #[prost(string, tag = "4")]
    pub short_name: String,
    #[prost(string, optional, tag = "5")]
    pub long_name: Option<String>,
    #[prost(message, optional, tag = "6")]
    pub compu_method: Option<CompuMethod>,
    #[prost(message, optional, tag = "7")]
    pub coded_type: Option<DiagCodedType>,
    #[prost(message, optional, tag = "8")]
    pub physical_type: Option<PhysicalType>,
    #[prost(message, optional, tag = "9")]
    pub unit: Option<NodeLink>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CompuMethod {
    #[prost(string, tag = "1")]
    pub category: String,
    #[prost(message, repeated, tag = "2")]
    pub scales: Vec<CompuScale>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CompuScale {
    #[prost(string, optional, tag = "1")]
    pub lower_limit: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub upper_limit: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub text: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub constant: Option<String>,
    #[prost(string, repeated, tag = "5")]
    pub numerators: Vec<String>,
    #[prost(string, repeated, tag = "6")]
    pub denominators: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DiagCodedType {
    /// The `xsi:type`, e.g. `STANDARD-LENGTH-TYPE`.
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(string, tag = "2")]
    pub base_data_type: String,
    #[prost(uint32, optional, tag = "3")]
    pub bit_length: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub min_length: Option<u32>,
    #[prost(uint32, optional, tag = "5")]
    pub max_length: Option<u32>,
    #[prost(string, optional, tag = "6")]
    pub termination: Option<String>,
    #[prost(bool, optional, tag = "7")]
    pub high_low_byte_order: Option<bool>,
    #[prost(string, optional, tag = "8")]
    pub bit_mask: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PhysicalType {
    #[prost(string, tag = "1")]
    pub base_data_type: String,
    #[prost(string, optional, tag = "2")]
    pub display_radix: Option<String>,
    #[prost(uint32, optional, tag = "3")]
    pub precision: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DtcDop {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(message, optional, tag = "4")]
    pub coded_type: Option<DiagCodedType>,
    #[prost(message, repeated, tag = "5")]
    pub dtcs: Vec<Dtc>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Dtc {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub short_name: String,
    #[prost(uint32, tag = "3")]
    pub trouble_code: u32,
    #[prost(string, optional, tag = "4")]
    pub display_trouble_code: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub text: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Structure {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(uint32, optional, tag = "4")]
    pub byte_size: Option<u32>,
    #[prost(message, repeated, tag = "5")]
    pub params: Vec<Param>,
}

/// Data dictionary entry the converter indexes but does not model.
#[derive(Clone, PartialEq, prost::Message)]
pub struct OpaqueNode {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub element: String,
    #[prost(string, tag = "4")]
    pub short_name: String,
}

// --- Diagnostic communication ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct Service {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(string, optional, tag = "4")]
    pub long_name: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub semantic: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub addressing: Option<String>,
    #[prost(message, optional, tag = "7")]
    pub request: Option<NodeLink>,
    #[prost(message, repeated, tag = "8")]
    pub pos_responses: Vec<NodeLink>,
    #[prost(message, repeated, tag = "9")]
    pub neg_responses: Vec<NodeLink>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Request {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(message, repeated, tag = "4")]
    pub params: Vec<Param>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Response {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(enumeration = "ResponseKind", tag = "4")]
    pub kind: i32,
    #[prost(message, repeated, tag = "5")]
    pub params: Vec<Param>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Param {
    #[prost(string, tag = "1")]
    pub short_name: String,
    #[prost(string, optional, tag = "2")]
    pub semantic: Option<String>,
    #[prost(enumeration = "ParamKind", tag = "3")]
    pub kind: i32,
    #[prost(uint32, optional, tag = "4")]
    pub byte_position: Option<u32>,
    #[prost(uint32, optional, tag = "5")]
    pub bit_position: Option<u32>,
    #[prost(string, optional, tag = "6")]
    pub coded_value: Option<String>,
    #[prost(string, repeated, tag = "7")]
    pub coded_values: Vec<String>,
    #[prost(string, optional, tag = "8")]
    pub physical_value: Option<String>,
    #[prost(message, optional, tag = "9")]
    pub dop: Option<NodeLink>,
    #[prost(message, optional, tag = "10")]
    pub coded_type: Option<DiagCodedType>,
    #[prost(uint32, optional, tag = "11")]
    pub bit_length: Option<u32>,
    #[prost(int32, optional, tag = "12")]
    pub request_byte_position: Option<i32>,
    #[prost(uint32, optional, tag = "13")]
    pub byte_length: Option<u32>,
    /// The raw `xsi:type` when `kind` is `Other`.
    #[prost(string, optional, tag = "14")]
    pub other_type: Option<String>,
}

// --- Communication parameters ---

#[derive(Clone, PartialEq, prost::Message)]
pub struct ComParamSubset {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(string, optional, tag = "4")]
    pub category: Option<String>,
    #[prost(uint32, repeated, tag = "5")]
    pub comparams: Vec<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ComParam {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(string, optional, tag = "4")]
    pub param_class: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub cp_type: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub physical_default_value: Option<String>,
    #[prost(uint32, optional, tag = "7")]
    pub subset: Option<u32>,
    #[prost(message, optional, tag = "8")]
    pub dop: Option<NodeLink>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ComParamValue {
    #[prost(string, tag = "1")]
    pub short_name: String,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(string, optional, tag = "3")]
    pub protocol: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub comparam: Option<NodeLink>,
}

/// Effective communication parameter values shared by one or more layers.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ComParamSet {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, tag = "2")]
    pub fingerprint: String,
    #[prost(message, repeated, tag = "3")]
    pub entries: Vec<ComParamValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtocolDescription {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(string, repeated, tag = "2")]
    pub ids: Vec<String>,
    #[prost(string, tag = "3")]
    pub fingerprint: String,
    #[prost(string, tag = "4")]
    pub short_name: String,
    #[prost(message, repeated, tag = "5")]
    pub prot_stacks: Vec<ProtStack>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtStack {
    #[prost(string, tag = "1")]
    pub short_name: String,
    #[prost(string, optional, tag = "2")]
    pub pdu_protocol_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub physical_link_type: Option<String>,
    #[prost(message, repeated, tag = "4")]
    pub comparam_subsets: Vec<NodeLink>,
}
