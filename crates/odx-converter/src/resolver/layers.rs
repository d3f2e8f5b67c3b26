// crates/odx-converter/src/resolver/layers.rs

//! Conversion of diagnostic layers: declared members and outgoing links.

use super::linker::{select_comparam, select_layer, select_protocol, select_service, Linker};
use crate::diagnostics::{Diagnostics, Location};
use crate::model::comm::DiagCommEntry;
use crate::model::layer::{ComParamRef, EcuVariantPattern};
use crate::model::DiagLayer;
use crate::node::NodeView;
use crate::types::{self, ComParamValue, DopId, EffectiveMembers, Link, ParentLink, ServiceId};
use odx_records::{LayerKind, MatchingParameter, VariantPattern};

pub(super) struct LayerInput<'l> {
    pub kind: LayerKind,
    pub layer: &'l DiagLayer,
    /// Definition position of the layer in the index.
    pub position: usize,
    pub location: &'l Location,
    /// Simple DOPs defined in the layer's own data dictionary.
    pub data_object_props: Vec<DopId>,
}

pub(super) fn layer(
    input: LayerInput<'_>,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Layer {
    let LayerInput {
        kind,
        layer,
        position,
        location,
        data_object_props,
    } = input;

    let parents = layer
        .parent_refs
        .iter()
        .flat_map(|l| l.items.iter())
        .map(|parent| ParentLink {
            target: linker.link(
                &parent.id_ref,
                "PARENT-REF",
                "diagnostic layer",
                location,
                diagnostics,
                select_layer,
            ),
            not_inherited_diag_comms: parent
                .not_inherited_diag_comms
                .iter()
                .flat_map(|l| l.items.iter())
                .map(|n| n.diag_comm_snref.short_name.clone())
                .collect(),
            not_inherited_dops: parent
                .not_inherited_dops
                .iter()
                .flat_map(|l| l.items.iter())
                .map(|n| n.dop_base_snref.short_name.clone())
                .collect(),
        })
        .collect();

    let services = services(layer, position, location, linker, diagnostics);

    let comparam_values = layer
        .comparam_refs
        .iter()
        .flat_map(|l| l.items.iter())
        .map(|cp| comparam_value(cp, location, linker, diagnostics))
        .collect();

    let protocol_spec = layer.comparam_spec_ref.as_ref().map(|l| {
        linker.link(
            &l.id_ref,
            "COMPARAM-SPEC-REF",
            "COMPARAM-SPEC",
            location,
            diagnostics,
            select_protocol,
        )
    });

    types::Layer {
        id: layer.id.clone(),
        short_name: layer.short_name.clone(),
        long_name: layer.long_name.as_ref().map(|t| t.as_str().to_string()),
        kind,
        document: location.document.clone(),
        parents,
        services,
        data_object_props,
        comparam_values,
        protocol_spec,
        variant_patterns: layer
            .ecu_variant_patterns
            .iter()
            .flat_map(|l| l.items.iter())
            .map(variant_pattern)
            .collect(),
        effective: EffectiveMembers::default(),
    }
}

/// Services in `DIAG-COMMS` order: owned definitions and `DIAG-COMM-REF`s.
/// Jobs and references to jobs are not converted.
fn services(
    layer: &DiagLayer,
    position: usize,
    location: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> Vec<Link<ServiceId>> {
    let mut out: Vec<Link<ServiceId>> = Vec::new();
    for entry in layer.diag_comms.iter().flat_map(|c| c.entries.iter()) {
        match entry {
            DiagCommEntry::Service(service) => {
                // The definition may have lost against an earlier duplicate elsewhere.
                let owned = linker
                    .definition(&service.id)
                    .is_some_and(|d| d.owner_layer == Some(position));
                let handle = linker.handle(&service.id).and_then(select_service);
                if let (true, Some(handle)) = (owned, handle) {
                    let link = Link::Resolved(handle);
                    if !out.contains(&link) {
                        out.push(link);
                    }
                }
            }
            DiagCommEntry::Ref(link) => {
                let is_job = linker
                    .definition(&link.id_ref)
                    .is_some_and(|d| matches!(d.node, NodeView::Opaque("SINGLE-ECU-JOB", _)));
                if is_job {
                    continue;
                }
                out.push(linker.link(
                    &link.id_ref,
                    "DIAG-COMM-REF",
                    "DIAG-SERVICE",
                    location,
                    diagnostics,
                    select_service,
                ));
            }
            DiagCommEntry::Job(_) => {}
        }
    }
    out
}

fn comparam_value(
    cp: &ComParamRef,
    location: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> ComParamValue {
    let comparam = linker.link(
        &cp.id_ref,
        "COMPARAM-REF",
        "COMPARAM",
        location,
        diagnostics,
        select_comparam,
    );
    let short_name = match (&comparam, linker.definition(&cp.id_ref)) {
        (Link::Resolved(_), Some(def)) => def.node.short_name().unwrap_or(&cp.id_ref).to_string(),
        _ => cp.id_ref.clone(),
    };
    ComParamValue {
        short_name,
        value: cp.value_text(),
        protocol: cp.protocol_snref.as_ref().map(|s| s.short_name.clone()),
        comparam,
    }
}

fn variant_pattern(pattern: &EcuVariantPattern) -> VariantPattern {
    VariantPattern {
        matching_parameters: pattern
            .matching_parameters
            .iter()
            .flat_map(|l| l.items.iter())
            .map(|m| MatchingParameter {
                expected_value: m.expected_value.trim().to_string(),
                diag_comm: m
                    .diag_comm_snref
                    .as_ref()
                    .map(|s| s.short_name.clone())
                    .unwrap_or_default(),
                out_param: m.out_param_if_snref.as_ref().map(|s| s.short_name.clone()),
            })
            .collect(),
    }
}
