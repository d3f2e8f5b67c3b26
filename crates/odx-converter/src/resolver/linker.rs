// crates/odx-converter/src/resolver/linker.rs

//! Handle assignment and typed reference linking.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::index::{CrossReferenceIndex, Definition};
use crate::node::NodeView;
use crate::types::{
    ComParamId, DopId, DtcDopId, LayerId, Link, NodeRef, OpaqueId, ProtocolId, RequestId,
    ResponseId, ServiceId, StructureId, SubsetId, UnitId,
};

/// Table handle of every definition, by definition position.
///
/// Handles are assigned per table in definition order, so the resolver can
/// build each table by pushing entities in that same order.
pub(super) struct Handles {
    by_position: Vec<Option<NodeRef>>,
}

#[derive(Default)]
struct Counters {
    layers: u32,
    units: u32,
    dops: u32,
    dtc_dops: u32,
    structures: u32,
    opaque: u32,
    services: u32,
    requests: u32,
    responses: u32,
    subsets: u32,
    comparams: u32,
    protocols: u32,
}

fn next(counter: &mut u32) -> u32 {
    let value = *counter;
    *counter += 1;
    value
}

impl Handles {
    pub(super) fn assign(index: &CrossReferenceIndex<'_>) -> Self {
        let mut c = Counters::default();
        let by_position = index
            .definitions()
            .iter()
            .map(|def| match def.node {
                NodeView::Layer(..) => Some(NodeRef::Layer(LayerId(next(&mut c.layers)))),
                NodeView::Unit(_) => Some(NodeRef::Unit(UnitId(next(&mut c.units)))),
                NodeView::DataObjectProp(_) => Some(NodeRef::Dop(DopId(next(&mut c.dops)))),
                NodeView::DtcDop(_) => Some(NodeRef::DtcDop(DtcDopId(next(&mut c.dtc_dops)))),
                NodeView::Structure(_) => {
                    Some(NodeRef::Structure(StructureId(next(&mut c.structures))))
                }
                NodeView::Opaque(..) => Some(NodeRef::Opaque(OpaqueId(next(&mut c.opaque)))),
                NodeView::Service(_) => Some(NodeRef::Service(ServiceId(next(&mut c.services)))),
                NodeView::Request(_) => Some(NodeRef::Request(RequestId(next(&mut c.requests)))),
                NodeView::Response(..) => {
                    Some(NodeRef::Response(ResponseId(next(&mut c.responses))))
                }
                NodeView::ComParamSubset(_) => Some(NodeRef::Subset(SubsetId(next(&mut c.subsets)))),
                NodeView::ComParam(_) | NodeView::ComplexComParam(_) => {
                    Some(NodeRef::ComParam(ComParamId(next(&mut c.comparams))))
                }
                NodeView::ComParamSpec(_) => {
                    Some(NodeRef::Protocol(ProtocolId(next(&mut c.protocols))))
                }
                NodeView::Document(_)
                | NodeView::Container(_)
                | NodeView::Dtc(_)
                | NodeView::Param(_)
                | NodeView::ProtStack(_) => None,
            })
            .collect();
        Self { by_position }
    }

    pub(super) fn at(&self, position: usize) -> Option<NodeRef> {
        self.by_position.get(position).copied().flatten()
    }
}

/// Turns `ID-REF`s into typed [`Link`]s.
///
/// Missing targets were already reported by the existence check and become
/// silent placeholders here. Targets of the wrong kind are reported.
pub(super) struct Linker<'r, 'a> {
    pub(super) index: &'r CrossReferenceIndex<'a>,
    pub(super) handles: &'r Handles,
}

impl<'r, 'a> Linker<'r, 'a> {
    pub(super) fn definition(&self, id_ref: &str) -> Option<&'r Definition<'a>> {
        self.index.get(id_ref)
    }

    pub(super) fn handle(&self, id: &str) -> Option<NodeRef> {
        self.index.position(id).and_then(|p| self.handles.at(p))
    }

    /// Links `id_ref` when its target passes `select`; `expected` names the
    /// wanted kind in the diagnostic.
    pub(super) fn link<T>(
        &self,
        id_ref: &str,
        field: &str,
        expected: &str,
        site: &Location,
        diagnostics: &mut Diagnostics,
        select: impl Fn(NodeRef) -> Option<T>,
    ) -> Link<T> {
        let unresolved = || Link::Unresolved {
            id_ref: id_ref.to_string(),
        };
        let Some(definition) = self.definition(id_ref) else {
            return unresolved();
        };
        match self.handle(id_ref).and_then(select) {
            Some(handle) => Link::Resolved(handle),
            None => {
                diagnostics.report(
                    DiagnosticKind::UnresolvedReference,
                    site.clone(),
                    format!(
                        "{} '{}' names a {} at {}, expected a {}",
                        field,
                        id_ref,
                        definition.node.element(),
                        definition.location,
                        expected
                    ),
                );
                unresolved()
            }
        }
    }
}

pub(super) fn select_layer(h: NodeRef) -> Option<LayerId> {
    match h {
        NodeRef::Layer(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_unit(h: NodeRef) -> Option<UnitId> {
    match h {
        NodeRef::Unit(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_dop(h: NodeRef) -> Option<DopId> {
    match h {
        NodeRef::Dop(id) => Some(id),
        _ => None,
    }
}

/// Any data dictionary entry a `DOP-REF` may name.
pub(super) fn select_dop_base(h: NodeRef) -> Option<NodeRef> {
    match h {
        NodeRef::Dop(_) | NodeRef::DtcDop(_) | NodeRef::Structure(_) | NodeRef::Opaque(_) => Some(h),
        _ => None,
    }
}

pub(super) fn select_service(h: NodeRef) -> Option<ServiceId> {
    match h {
        NodeRef::Service(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_request(h: NodeRef) -> Option<RequestId> {
    match h {
        NodeRef::Request(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_response(h: NodeRef) -> Option<ResponseId> {
    match h {
        NodeRef::Response(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_subset(h: NodeRef) -> Option<SubsetId> {
    match h {
        NodeRef::Subset(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_comparam(h: NodeRef) -> Option<ComParamId> {
    match h {
        NodeRef::ComParam(id) => Some(id),
        _ => None,
    }
}

pub(super) fn select_protocol(h: NodeRef) -> Option<ProtocolId> {
    match h {
        NodeRef::Protocol(id) => Some(id),
        _ => None,
    }
}
