// crates/odx-converter/src/types.rs

//! The resolved, arena-based model produced by the resolver.
//!
//! Every entity lives in a table of [`ResolvedGraph`]; every relation is a
//! typed handle into one of those tables, or an explicit [`Link::Unresolved`]
//! placeholder when the source reference could not be satisfied.

use odx_records::{CompuMethod, DiagCodedType, Dtc, LayerKind, NodeKind, ParamKind, PhysicalType,
    ResponseKind, VariantPattern};
use std::collections::BTreeMap;

// --- Handles ---

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident,)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )+
    };
}

handle!(
    LayerId,
    UnitId,
    /// Handle of a `DATA-OBJECT-PROP`.
    DopId,
    DtcDopId,
    StructureId,
    OpaqueId,
    ServiceId,
    RequestId,
    ResponseId,
    SubsetId,
    ComParamId,
    ComParamSetId,
    /// Handle of a protocol description (`COMPARAM-SPEC`).
    ProtocolId,
);

/// Any handle, tagged with its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
    Layer(LayerId),
    Unit(UnitId),
    Dop(DopId),
    DtcDop(DtcDopId),
    Structure(StructureId),
    Opaque(OpaqueId),
    Service(ServiceId),
    Request(RequestId),
    Response(ResponseId),
    Subset(SubsetId),
    ComParam(ComParamId),
    Protocol(ProtocolId),
}

impl NodeRef {
    pub fn kind(self) -> NodeKind {
        match self {
            NodeRef::Layer(_) => NodeKind::Layer,
            NodeRef::Unit(_) => NodeKind::Unit,
            NodeRef::Dop(_) => NodeKind::DataObjectProp,
            NodeRef::DtcDop(_) => NodeKind::DtcDop,
            NodeRef::Structure(_) => NodeKind::Structure,
            NodeRef::Opaque(_) => NodeKind::Opaque,
            NodeRef::Service(_) => NodeKind::Service,
            NodeRef::Request(_) => NodeKind::Request,
            NodeRef::Response(_) => NodeKind::Response,
            NodeRef::Subset(_) => NodeKind::ComParamSubset,
            NodeRef::ComParam(_) => NodeKind::ComParam,
            NodeRef::Protocol(_) => NodeKind::Protocol,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            NodeRef::Layer(h) => h.0,
            NodeRef::Unit(h) => h.0,
            NodeRef::Dop(h) => h.0,
            NodeRef::DtcDop(h) => h.0,
            NodeRef::Structure(h) => h.0,
            NodeRef::Opaque(h) => h.0,
            NodeRef::Service(h) => h.0,
            NodeRef::Request(h) => h.0,
            NodeRef::Response(h) => h.0,
            NodeRef::Subset(h) => h.0,
            NodeRef::ComParam(h) => h.0,
            NodeRef::Protocol(h) => h.0,
        }
    }
}

/// A resolved reference, or the placeholder left for a missing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link<T> {
    Resolved(T),
    Unresolved { id_ref: String },
}

impl<T: Copy> Link<T> {
    pub fn resolved(&self) -> Option<T> {
        match self {
            Link::Resolved(h) => Some(*h),
            Link::Unresolved { .. } => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(T) -> U) -> Link<U> {
        match self {
            Link::Resolved(h) => Link::Resolved(f(*h)),
            Link::Unresolved { id_ref } => Link::Unresolved {
                id_ref: id_ref.clone(),
            },
        }
    }
}

// --- Layers ---

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: String,
    pub short_name: String,
    pub long_name: Option<String>,
    pub kind: LayerKind,
    /// Document the layer was defined in.
    pub document: String,
    pub parents: Vec<ParentLink>,
    /// Services declared or referenced by the layer itself, in `DIAG-COMMS` order.
    pub services: Vec<Link<ServiceId>>,
    pub data_object_props: Vec<DopId>,
    pub comparam_values: Vec<ComParamValue>,
    pub protocol_spec: Option<Link<ProtocolId>>,
    pub variant_patterns: Vec<VariantPattern>,
    pub effective: EffectiveMembers,
}

#[derive(Debug, Clone)]
pub struct ParentLink {
    pub target: Link<LayerId>,
    pub not_inherited_diag_comms: Vec<String>,
    pub not_inherited_dops: Vec<String>,
}

/// Members of a layer after inheritance and overriding.
#[derive(Debug, Clone, Default)]
pub struct EffectiveMembers {
    pub services: Vec<ServiceId>,
    pub data_object_props: Vec<DopId>,
    pub comparam_set: Option<ComParamSetId>,
    /// Protocol layers among the ancestors, the layer itself included.
    pub protocols: Vec<LayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComParamValue {
    pub short_name: String,
    pub value: String,
    pub protocol: Option<String>,
    pub comparam: Link<ComParamId>,
}

// --- Data dictionary ---

#[derive(Debug, Clone)]
pub struct Unit {
    /// Source identifiers merged into this entry, sorted; the first is canonical.
    pub ids: Vec<String>,
    pub fingerprint: String,
    pub short_name: String,
    pub display_name: String,
    pub factor_si_to_unit: Option<String>,
    pub offset_si_to_unit: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DataObjectProp {
    pub ids: Vec<String>,
    pub fingerprint: String,
    pub short_name: String,
    pub long_name: Option<String>,
    pub compu_method: CompuMethod,
    pub coded_type: DiagCodedType,
    pub physical_type: PhysicalType,
    pub unit: Option<Link<UnitId>>,
}

#[derive(Debug, Clone)]
pub struct DtcDop {
    pub id: String,
    pub short_name: String,
    pub coded_type: DiagCodedType,
    /// Owned and referenced trouble codes, in declaration order.
    pub dtcs: Vec<Dtc>,
}

#[derive(Debug, Clone)]
pub struct Structure {
    pub id: String,
    pub short_name: String,
    pub byte_size: Option<u32>,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct Opaque {
    pub id: String,
    pub element: String,
    pub short_name: String,
}

// --- Diagnostic communication ---

#[derive(Debug, Clone)]
pub struct Service {
    pub id: String,
    pub short_name: String,
    pub long_name: Option<String>,
    pub semantic: Option<String>,
    pub addressing: Option<String>,
    pub request: Option<Link<RequestId>>,
    pub pos_responses: Vec<Link<ResponseId>>,
    pub neg_responses: Vec<Link<ResponseId>>,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub id: String,
    pub short_name: String,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub short_name: String,
    pub kind: ResponseKind,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, Default)]
pub struct Param {
    pub short_name: String,
    pub semantic: Option<String>,
    pub kind: ParamKind,
    pub byte_position: Option<u32>,
    pub bit_position: Option<u32>,
    pub coded_value: Option<String>,
    pub coded_values: Vec<String>,
    pub physical_value: Option<String>,
    /// Any data dictionary entry: simple DOP, DTC-DOP, structure or opaque.
    pub dop: Option<Link<NodeRef>>,
    pub coded_type: Option<DiagCodedType>,
    pub bit_length: Option<u32>,
    pub request_byte_position: Option<i32>,
    pub byte_length: Option<u32>,
    pub other_type: Option<String>,
}

// --- Communication parameters ---

#[derive(Debug, Clone)]
pub struct ComParamSubset {
    pub id: String,
    pub short_name: String,
    pub category: Option<String>,
    pub comparams: Vec<ComParamId>,
}

#[derive(Debug, Clone)]
pub struct ComParam {
    pub id: String,
    pub short_name: String,
    pub param_class: Option<String>,
    pub cp_type: Option<String>,
    pub physical_default_value: Option<String>,
    pub subset: Option<SubsetId>,
    pub dop: Option<Link<DopId>>,
}

/// The effective communication parameter values of a layer, sorted by name.
#[derive(Debug, Clone)]
pub struct ComParamSet {
    pub fingerprint: String,
    pub entries: Vec<ComParamValue>,
}

/// A `COMPARAM-SPEC`.
#[derive(Debug, Clone)]
pub struct Protocol {
    pub ids: Vec<String>,
    pub fingerprint: String,
    pub short_name: String,
    pub prot_stacks: Vec<ProtStack>,
}

#[derive(Debug, Clone)]
pub struct ProtStack {
    pub short_name: String,
    pub pdu_protocol_type: Option<String>,
    pub physical_link_type: Option<String>,
    pub comparam_subsets: Vec<Link<SubsetId>>,
}

// --- Graph ---

/// Output of the resolver, input of the serializer.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub archive_name: String,
    /// Documents that loaded successfully, in archive order.
    pub documents: Vec<String>,
    pub diagnostic_count: u32,

    pub layers: Vec<Layer>,
    pub units: Vec<Unit>,
    pub data_object_props: Vec<DataObjectProp>,
    pub dtc_dops: Vec<DtcDop>,
    pub structures: Vec<Structure>,
    pub opaque: Vec<Opaque>,
    pub services: Vec<Service>,
    pub requests: Vec<Request>,
    pub responses: Vec<Response>,
    pub comparam_subsets: Vec<ComParamSubset>,
    pub comparams: Vec<ComParam>,
    pub comparam_sets: Vec<ComParamSet>,
    pub protocols: Vec<Protocol>,

    /// Every defined identifier (aliases included) to its canonical handle.
    pub ids: BTreeMap<String, NodeRef>,
}

impl ResolvedGraph {
    pub fn lookup(&self, id: &str) -> Option<NodeRef> {
        self.ids.get(id).copied()
    }

    pub fn layer_by_name(&self, short_name: &str) -> Option<(LayerId, &Layer)> {
        self.layers
            .iter()
            .enumerate()
            .find(|(_, l)| l.short_name == short_name)
            .map(|(i, l)| (LayerId(i as u32), l))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.index())
    }

    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.get(id.index())
    }

    pub fn data_object_prop(&self, id: DopId) -> Option<&DataObjectProp> {
        self.data_object_props.get(id.index())
    }

    pub fn comparam_set(&self, id: ComParamSetId) -> Option<&ComParamSet> {
        self.comparam_sets.get(id.index())
    }

    /// Effective value of a communication parameter for a layer.
    pub fn effective_comparam(&self, layer: LayerId, short_name: &str) -> Option<&ComParamValue> {
        let set = self.layer(layer)?.effective.comparam_set?;
        self.comparam_set(set)?
            .entries
            .iter()
            .find(|e| e.short_name == short_name)
    }
}
