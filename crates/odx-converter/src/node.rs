// crates/odx-converter/src/node.rs

//! Capability view over the typed ODX tree.
//!
//! The rest of the pipeline never matches on the `model` structs directly.
//! Each element exposes up to three capabilities:
//!
//! - [`Identified`]: it carries an `ID` and a `SHORT-NAME`.
//! - [`Referencing`]: it holds `ID-REF` fields.
//! - [`Composite`]: it owns child elements.
//!
//! [`NodeView`] is the copyable handle used to walk the tree; it records the
//! context the model structs cannot carry themselves (which list a layer or
//! response came from).

use crate::model::comm::DiagCommEntry;
use crate::model::data::{
    DiagDataDictionarySpec, DtcEntry, DynamicLengthField, EndOfPduField, EnvData, EnvDataDesc,
    Mux, PhysicalDimension, Table, UnitSpec,
};
use crate::model::{
    ComParam, ComparamSpec, ComparamSubset, ComplexComParam, DataObjectProp, DiagLayer,
    DiagLayerContainer, DiagService, Dtc, DtcDop, Message, Odx, Param, ProtStack, SingleEcuJob,
    Structure, Unit,
};
use odx_records::{LayerKind, ResponseKind};
use std::fmt;

// --- Capabilities ---

/// Node with an identifier.
pub trait Identified {
    fn id(&self) -> &str;
    fn short_name(&self) -> &str;
}

/// One `ID-REF` held by a node, with the element name of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRef<'a> {
    pub field: &'static str,
    pub id_ref: &'a str,
    pub docref: Option<&'a str>,
}

/// Node with reference fields.
pub trait Referencing {
    fn references(&self) -> Vec<LinkRef<'_>>;
}

/// Node with child nodes.
pub trait Composite {
    fn children(&self) -> Vec<NodeView<'_>>;
}

/// What a node defines, independent of where it sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Document,
    Container,
    Layer,
    DataObjectProp,
    DtcDop,
    Dtc,
    Structure,
    Unit,
    /// Data dictionary entries and jobs that are indexed but not modeled.
    Opaque,
    Service,
    Request,
    Response,
    Param,
    ComParamSubset,
    ComParam,
    ComParamSpec,
    ProtStack,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// --- Node handle ---

#[derive(Clone, Copy)]
pub enum NodeView<'a> {
    Document(&'a Odx),
    Container(&'a DiagLayerContainer),
    Layer(LayerKind, &'a DiagLayer),
    DataObjectProp(&'a DataObjectProp),
    DtcDop(&'a DtcDop),
    Dtc(&'a Dtc),
    Structure(&'a Structure),
    Unit(&'a Unit),
    Opaque(&'static str, &'a dyn Identified),
    Service(&'a DiagService),
    Request(&'a Message),
    Response(ResponseKind, &'a Message),
    Param(&'a Param),
    ComParamSubset(&'a ComparamSubset),
    ComParam(&'a ComParam),
    ComplexComParam(&'a ComplexComParam),
    ComParamSpec(&'a ComparamSpec),
    ProtStack(&'a ProtStack),
}

impl<'a> NodeView<'a> {
    /// The ODX element name, e.g. `BASE-VARIANT`.
    pub fn element(&self) -> &'static str {
        match self {
            NodeView::Document(_) => "ODX",
            NodeView::Container(_) => "DIAG-LAYER-CONTAINER",
            NodeView::Layer(kind, _) => layer_element(*kind),
            NodeView::DataObjectProp(_) => "DATA-OBJECT-PROP",
            NodeView::DtcDop(_) => "DTC-DOP",
            NodeView::Dtc(_) => "DTC",
            NodeView::Structure(_) => "STRUCTURE",
            NodeView::Unit(_) => "UNIT",
            NodeView::Opaque(element, _) => *element,
            NodeView::Service(_) => "DIAG-SERVICE",
            NodeView::Request(_) => "REQUEST",
            NodeView::Response(ResponseKind::Negative, _) => "NEG-RESPONSE",
            NodeView::Response(ResponseKind::GlobalNegative, _) => "GLOBAL-NEG-RESPONSE",
            NodeView::Response(_, _) => "POS-RESPONSE",
            NodeView::Param(_) => "PARAM",
            NodeView::ComParamSubset(_) => "COMPARAM-SUBSET",
            NodeView::ComParam(_) => "COMPARAM",
            NodeView::ComplexComParam(_) => "COMPLEX-COMPARAM",
            NodeView::ComParamSpec(_) => "COMPARAM-SPEC",
            NodeView::ProtStack(_) => "PROT-STACK",
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            NodeView::Document(_) => ElementKind::Document,
            NodeView::Container(_) => ElementKind::Container,
            NodeView::Layer(..) => ElementKind::Layer,
            NodeView::DataObjectProp(_) => ElementKind::DataObjectProp,
            NodeView::DtcDop(_) => ElementKind::DtcDop,
            NodeView::Dtc(_) => ElementKind::Dtc,
            NodeView::Structure(_) => ElementKind::Structure,
            NodeView::Unit(_) => ElementKind::Unit,
            NodeView::Opaque(..) => ElementKind::Opaque,
            NodeView::Service(_) => ElementKind::Service,
            NodeView::Request(_) => ElementKind::Request,
            NodeView::Response(..) => ElementKind::Response,
            NodeView::Param(_) => ElementKind::Param,
            NodeView::ComParamSubset(_) => ElementKind::ComParamSubset,
            NodeView::ComParam(_) | NodeView::ComplexComParam(_) => ElementKind::ComParam,
            NodeView::ComParamSpec(_) => ElementKind::ComParamSpec,
            NodeView::ProtStack(_) => ElementKind::ProtStack,
        }
    }

    fn identified(&self) -> Option<&'a dyn Identified> {
        match *self {
            NodeView::Document(_) | NodeView::Param(_) => None,
            NodeView::Container(n) => Some(n),
            NodeView::Layer(_, n) => Some(n),
            NodeView::DataObjectProp(n) => Some(n),
            NodeView::DtcDop(n) => Some(n),
            NodeView::Dtc(n) => Some(n),
            NodeView::Structure(n) => Some(n),
            NodeView::Unit(n) => Some(n),
            NodeView::Opaque(_, n) => Some(n),
            NodeView::Service(n) => Some(n),
            NodeView::Request(n) | NodeView::Response(_, n) => Some(n),
            NodeView::ComParamSubset(n) => Some(n),
            NodeView::ComParam(n) => Some(n),
            NodeView::ComplexComParam(n) => Some(n),
            NodeView::ComParamSpec(n) => Some(n),
            NodeView::ProtStack(n) => Some(n),
        }
    }

    fn referencing(&self) -> Option<&'a dyn Referencing> {
        match *self {
            NodeView::Layer(_, n) => Some(n),
            NodeView::DataObjectProp(n) => Some(n),
            NodeView::DtcDop(n) => Some(n),
            NodeView::Unit(n) => Some(n),
            NodeView::Service(n) => Some(n),
            NodeView::Param(n) => Some(n),
            NodeView::ComParam(n) => Some(n),
            NodeView::ProtStack(n) => Some(n),
            _ => None,
        }
    }

    fn composite(&self) -> Option<&'a dyn Composite> {
        match *self {
            NodeView::Document(n) => Some(n),
            NodeView::Container(n) => Some(n),
            NodeView::Layer(_, n) => Some(n),
            NodeView::DtcDop(n) => Some(n),
            NodeView::Structure(n) => Some(n),
            NodeView::Request(n) | NodeView::Response(_, n) => Some(n),
            NodeView::ComParamSubset(n) => Some(n),
            NodeView::ComParamSpec(n) => Some(n),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&'a str> {
        self.identified().map(|n| n.id())
    }

    pub fn short_name(&self) -> Option<&'a str> {
        match *self {
            NodeView::Param(p) => Some(p.short_name.as_str()),
            _ => self.identified().map(|n| n.short_name()),
        }
    }

    pub fn references(&self) -> Vec<LinkRef<'a>> {
        self.referencing().map(|n| n.references()).unwrap_or_default()
    }

    pub fn children(&self) -> Vec<NodeView<'a>> {
        self.composite().map(|n| n.children()).unwrap_or_default()
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}#{}", self.element(), id),
            None => f.write_str(self.element()),
        }
    }
}

pub(crate) fn layer_element(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Protocol => "PROTOCOL",
        LayerKind::FunctionalGroup => "FUNCTIONAL-GROUP",
        LayerKind::EcuSharedData => "ECU-SHARED-DATA",
        LayerKind::EcuVariant => "ECU-VARIANT",
        LayerKind::BaseVariant | LayerKind::Unspecified => "BASE-VARIANT",
    }
}

// --- Identified ---

macro_rules! impl_identified {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
                fn short_name(&self) -> &str {
                    &self.short_name
                }
            }
        )+
    };
}

impl_identified!(
    DiagLayerContainer,
    DiagLayer,
    DataObjectProp,
    DtcDop,
    Dtc,
    Structure,
    Unit,
    DiagService,
    SingleEcuJob,
    Message,
    ComparamSubset,
    ComParam,
    ComplexComParam,
    ComparamSpec,
    ProtStack,
    EndOfPduField,
    DynamicLengthField,
    Table,
    Mux,
    EnvDataDesc,
    EnvData,
    PhysicalDimension,
);

// --- Referencing ---

impl Referencing for DiagLayer {
    fn references(&self) -> Vec<LinkRef<'_>> {
        let mut refs = Vec::new();
        for parent in self.parent_refs.iter().flat_map(|l| l.items.iter()) {
            refs.push(LinkRef {
                field: "PARENT-REF",
                id_ref: &parent.id_ref,
                docref: parent.docref.as_deref(),
            });
        }
        for entry in self.diag_comms.iter().flat_map(|c| c.entries.iter()) {
            if let DiagCommEntry::Ref(link) = entry {
                refs.push(LinkRef {
                    field: "DIAG-COMM-REF",
                    id_ref: &link.id_ref,
                    docref: link.docref.as_deref(),
                });
            }
        }
        for cp in self.comparam_refs.iter().flat_map(|l| l.items.iter()) {
            refs.push(LinkRef {
                field: "COMPARAM-REF",
                id_ref: &cp.id_ref,
                docref: cp.docref.as_deref(),
            });
        }
        if let Some(spec) = &self.comparam_spec_ref {
            refs.push(LinkRef {
                field: "COMPARAM-SPEC-REF",
                id_ref: &spec.id_ref,
                docref: spec.docref.as_deref(),
            });
        }
        refs
    }
}

impl Referencing for DataObjectProp {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.unit_ref
            .iter()
            .map(|l| LinkRef {
                field: "UNIT-REF",
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

impl Referencing for DtcDop {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.dtcs
            .iter()
            .flat_map(|d| d.entries.iter())
            .filter_map(|entry| match entry {
                DtcEntry::Ref(l) => Some(LinkRef {
                    field: "DTC-REF",
                    id_ref: &l.id_ref,
                    docref: l.docref.as_deref(),
                }),
                DtcEntry::Dtc(_) => None,
            })
            .collect()
    }
}

impl Referencing for Unit {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.physical_dimension_ref
            .iter()
            .map(|l| LinkRef {
                field: "PHYSICAL-DIMENSION-REF",
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

impl Referencing for DiagService {
    fn references(&self) -> Vec<LinkRef<'_>> {
        let request = self.request_ref.iter().map(|l| ("REQUEST-REF", l));
        let pos = self
            .pos_response_refs
            .iter()
            .flat_map(|r| r.items.iter())
            .map(|l| ("POS-RESPONSE-REF", l));
        let neg = self
            .neg_response_refs
            .iter()
            .flat_map(|r| r.items.iter())
            .map(|l| ("NEG-RESPONSE-REF", l));
        request
            .chain(pos)
            .chain(neg)
            .map(|(field, l)| LinkRef {
                field,
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

impl Referencing for Param {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.dop_ref
            .iter()
            .map(|l| LinkRef {
                field: "DOP-REF",
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

impl Referencing for ComParam {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.data_object_prop_ref
            .iter()
            .map(|l| LinkRef {
                field: "DATA-OBJECT-PROP-REF",
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

impl Referencing for ProtStack {
    fn references(&self) -> Vec<LinkRef<'_>> {
        self.comparam_subset_refs
            .iter()
            .flat_map(|r| r.items.iter())
            .map(|l| LinkRef {
                field: "COMPARAM-SUBSET-REF",
                id_ref: &l.id_ref,
                docref: l.docref.as_deref(),
            })
            .collect()
    }
}

// --- Composite ---

impl Composite for Odx {
    fn children(&self) -> Vec<NodeView<'_>> {
        let mut out = Vec::new();
        if let Some(dlc) = &self.diag_layer_container {
            out.push(NodeView::Container(dlc));
        }
        if let Some(subset) = &self.comparam_subset {
            out.push(NodeView::ComParamSubset(subset));
        }
        if let Some(spec) = &self.comparam_spec {
            out.push(NodeView::ComParamSpec(spec));
        }
        out
    }
}

impl Composite for DiagLayerContainer {
    fn children(&self) -> Vec<NodeView<'_>> {
        let lists = [
            (LayerKind::Protocol, self.protocols.as_ref().map(|l| &l.items)),
            (LayerKind::FunctionalGroup, self.functional_groups.as_ref().map(|l| &l.items)),
            (LayerKind::EcuSharedData, self.ecu_shared_datas.as_ref().map(|l| &l.items)),
            (LayerKind::BaseVariant, self.base_variants.as_ref().map(|l| &l.items)),
            (LayerKind::EcuVariant, self.ecu_variants.as_ref().map(|l| &l.items)),
        ];
        lists
            .into_iter()
            .flat_map(|(kind, layers)| {
                layers
                    .into_iter()
                    .flatten()
                    .map(move |layer| NodeView::Layer(kind, layer))
            })
            .collect()
    }
}

impl Composite for DiagLayer {
    fn children(&self) -> Vec<NodeView<'_>> {
        let mut out = Vec::new();
        if let Some(ddds) = &self.diag_data_dictionary_spec {
            push_dictionary(ddds, &mut out);
        }
        for entry in self.diag_comms.iter().flat_map(|c| c.entries.iter()) {
            match entry {
                DiagCommEntry::Service(service) => out.push(NodeView::Service(service)),
                DiagCommEntry::Job(job) => out.push(NodeView::Opaque("SINGLE-ECU-JOB", job)),
                DiagCommEntry::Ref(_) => {}
            }
        }
        out.extend(
            self.requests
                .iter()
                .flat_map(|l| l.items.iter())
                .map(NodeView::Request),
        );
        let responses = [
            (ResponseKind::Positive, self.pos_responses.as_ref().map(|l| &l.items)),
            (ResponseKind::Negative, self.neg_responses.as_ref().map(|l| &l.items)),
            (ResponseKind::GlobalNegative, self.global_neg_responses.as_ref().map(|l| &l.items)),
        ];
        for (kind, list) in responses {
            out.extend(list.into_iter().flatten().map(|m| NodeView::Response(kind, m)));
        }
        out
    }
}

impl Composite for DtcDop {
    fn children(&self) -> Vec<NodeView<'_>> {
        self.dtcs
            .iter()
            .flat_map(|d| d.entries.iter())
            .filter_map(|entry| match entry {
                DtcEntry::Dtc(dtc) => Some(NodeView::Dtc(dtc)),
                DtcEntry::Ref(_) => None,
            })
            .collect()
    }
}

impl Composite for Structure {
    fn children(&self) -> Vec<NodeView<'_>> {
        self.params
            .iter()
            .flat_map(|p| p.items.iter())
            .map(NodeView::Param)
            .collect()
    }
}

impl Composite for Message {
    fn children(&self) -> Vec<NodeView<'_>> {
        self.params
            .iter()
            .flat_map(|p| p.items.iter())
            .map(NodeView::Param)
            .collect()
    }
}

impl Composite for ComparamSubset {
    fn children(&self) -> Vec<NodeView<'_>> {
        let mut out: Vec<NodeView<'_>> = self
            .comparams
            .iter()
            .flat_map(|l| l.items.iter())
            .map(NodeView::ComParam)
            .collect();
        out.extend(
            self.complex_comparams
                .iter()
                .flat_map(|l| l.items.iter())
                .map(NodeView::ComplexComParam),
        );
        out.extend(
            self.data_object_props
                .iter()
                .flat_map(|l| l.items.iter())
                .map(NodeView::DataObjectProp),
        );
        if let Some(units) = &self.unit_spec {
            push_unit_spec(units, &mut out);
        }
        out
    }
}

impl Composite for ComparamSpec {
    fn children(&self) -> Vec<NodeView<'_>> {
        self.prot_stacks
            .iter()
            .flat_map(|l| l.items.iter())
            .map(NodeView::ProtStack)
            .collect()
    }
}

/// Children of a `<DIAG-DATA-DICTIONARY-SPEC>`, in schema order.
fn push_dictionary<'a>(ddds: &'a DiagDataDictionarySpec, out: &mut Vec<NodeView<'a>>) {
    out.extend(ddds.dtc_dops.iter().flat_map(|l| l.items.iter()).map(NodeView::DtcDop));
    out.extend(
        ddds.data_object_props
            .iter()
            .flat_map(|l| l.items.iter())
            .map(NodeView::DataObjectProp),
    );
    out.extend(ddds.structures.iter().flat_map(|l| l.items.iter()).map(NodeView::Structure));

    macro_rules! opaque {
        ($field:ident, $ty:ty) => {
            out.extend(
                ddds.$field
                    .iter()
                    .flat_map(|l| l.items.iter())
                    .map(|n| NodeView::Opaque(<$ty>::ELEMENT, n)),
            );
        };
    }
    opaque!(end_of_pdu_fields, EndOfPduField);
    opaque!(dynamic_length_fields, DynamicLengthField);
    opaque!(tables, Table);
    opaque!(muxs, Mux);
    opaque!(env_data_descs, EnvDataDesc);
    opaque!(env_datas, EnvData);

    if let Some(units) = &ddds.unit_spec {
        push_unit_spec(units, out);
    }
}

fn push_unit_spec<'a>(units: &'a UnitSpec, out: &mut Vec<NodeView<'a>>) {
    out.extend(units.units.iter().flat_map(|l| l.items.iter()).map(NodeView::Unit));
    out.extend(
        units
            .physical_dimensions
            .iter()
            .flat_map(|l| l.items.iter())
            .map(|n| NodeView::Opaque(PhysicalDimension::ELEMENT, n)),
    );
}
