// crates/odx-converter/src/resolver/data.rs

//! Conversion of data dictionary entries and parameters.

use super::linker::{select_dop_base, select_unit, Linker};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::model;
use crate::model::data::DtcEntry;
use crate::node::NodeView;
use crate::types;
use odx_records::{CompuMethod, CompuScale, DiagCodedType, Dtc, ParamKind, PhysicalType};

pub(super) fn unit(unit: &model::Unit) -> types::Unit {
    types::Unit {
        ids: vec![unit.id.clone()],
        fingerprint: String::new(),
        short_name: unit.short_name.clone(),
        display_name: unit.display_name.trim().to_string(),
        factor_si_to_unit: trimmed(&unit.factor_si_to_unit),
        offset_si_to_unit: trimmed(&unit.offset_si_to_unit),
    }
}

pub(super) fn data_object_prop(
    dop: &model::DataObjectProp,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::DataObjectProp {
    let unit = dop
        .unit_ref
        .as_ref()
        .map(|l| linker.link(&l.id_ref, "UNIT-REF", "UNIT", site, diagnostics, select_unit));
    types::DataObjectProp {
        ids: vec![dop.id.clone()],
        fingerprint: String::new(),
        short_name: dop.short_name.clone(),
        long_name: dop.long_name.as_ref().map(|t| t.as_str().to_string()),
        compu_method: compu_method(&dop.compu_method),
        coded_type: coded_type(&dop.diag_coded_type),
        physical_type: PhysicalType {
            base_data_type: dop.physical_type.base_data_type.clone(),
            display_radix: dop.physical_type.display_radix.clone(),
            precision: dop.physical_type.precision,
        },
        unit,
    }
}

fn compu_method(method: &model::data::CompuMethod) -> CompuMethod {
    let scales = method
        .internal_to_phys
        .iter()
        .flat_map(|i| i.compu_scales.iter())
        .flat_map(|l| l.items.iter())
        .map(|scale| CompuScale {
            lower_limit: scale.lower_limit.as_ref().map(|l| l.value.trim().to_string()),
            upper_limit: scale.upper_limit.as_ref().map(|l| l.value.trim().to_string()),
            text: scale
                .compu_const
                .as_ref()
                .and_then(|c| c.vt.as_ref())
                .map(|t| t.as_str().to_string()),
            constant: scale
                .compu_const
                .as_ref()
                .and_then(|c| c.v.as_ref())
                .map(|v| v.trim().to_string()),
            numerators: scale
                .rational_coeffs
                .iter()
                .flat_map(|c| c.numerator.items.iter())
                .map(|v| v.trim().to_string())
                .collect(),
            denominators: scale
                .rational_coeffs
                .iter()
                .flat_map(|c| c.denominator.iter())
                .flat_map(|d| d.items.iter())
                .map(|v| v.trim().to_string())
                .collect(),
        })
        .collect();
    CompuMethod {
        category: method.category.trim().to_string(),
        scales,
    }
}

pub(super) fn coded_type(dct: &model::DiagCodedType) -> DiagCodedType {
    DiagCodedType {
        kind: dct.xsi_type.clone(),
        base_data_type: dct.base_data_type.clone(),
        bit_length: dct.bit_length,
        min_length: dct.min_length,
        max_length: dct.max_length,
        termination: dct.termination.clone(),
        high_low_byte_order: dct.is_highlow_byte_order,
        bit_mask: trimmed(&dct.bit_mask),
    }
}

/// `DTC-REF`s are inlined; a reference to something other than a `DTC` is
/// reported and dropped.
pub(super) fn dtc_dop(
    dop: &model::DtcDop,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::DtcDop {
    let mut dtcs = Vec::new();
    for entry in dop.dtcs.iter().flat_map(|d| d.entries.iter()) {
        match entry {
            DtcEntry::Dtc(d) => dtcs.push(dtc(d)),
            DtcEntry::Ref(link) => {
                // Missing targets were reported by the existence check.
                let Some(def) = linker.definition(&link.id_ref) else {
                    continue;
                };
                match def.node {
                    NodeView::Dtc(d) => dtcs.push(dtc(d)),
                    other => diagnostics.report(
                        DiagnosticKind::UnresolvedReference,
                        site.clone(),
                        format!(
                            "DTC-REF '{}' names a {} at {}, expected a DTC",
                            link.id_ref,
                            other.element(),
                            def.location
                        ),
                    ),
                }
            }
        }
    }
    types::DtcDop {
        id: dop.id.clone(),
        short_name: dop.short_name.clone(),
        coded_type: coded_type(&dop.diag_coded_type),
        dtcs,
    }
}

fn dtc(d: &model::Dtc) -> Dtc {
    Dtc {
        id: d.id.clone(),
        short_name: d.short_name.clone(),
        trouble_code: d.trouble_code,
        display_trouble_code: trimmed(&d.display_trouble_code),
        text: d.text.as_ref().map(|t| t.as_str().to_string()),
    }
}

pub(super) fn structure(
    structure: &model::Structure,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Structure {
    types::Structure {
        id: structure.id.clone(),
        short_name: structure.short_name.clone(),
        byte_size: structure.byte_size,
        params: params(structure.params.as_ref(), site, linker, diagnostics),
    }
}

pub(super) fn opaque(element: &str, node: &dyn crate::node::Identified) -> types::Opaque {
    types::Opaque {
        id: node.id().to_string(),
        element: element.to_string(),
        short_name: node.short_name().to_string(),
    }
}

pub(super) fn params(
    list: Option<&model::comm::ParamList>,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> Vec<types::Param> {
    list.iter()
        .flat_map(|l| l.items.iter())
        .map(|p| param(p, &site.child("PARAM", Some(&p.short_name)), linker, diagnostics))
        .collect()
}

fn param(
    p: &model::Param,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Param {
    let kind = param_kind(&p.xsi_type);
    let dop = p.dop_ref.as_ref().map(|l| {
        linker.link(
            &l.id_ref,
            "DOP-REF",
            "data object property",
            site,
            diagnostics,
            select_dop_base,
        )
    });
    types::Param {
        short_name: p.short_name.clone(),
        semantic: p.semantic.clone(),
        kind,
        byte_position: p.byte_position,
        bit_position: p.bit_position,
        coded_value: trimmed(&p.coded_value),
        coded_values: p
            .coded_values
            .iter()
            .flat_map(|l| l.items.iter())
            .map(|v| v.trim().to_string())
            .collect(),
        physical_value: trimmed(&p.phys_constant_value).or_else(|| trimmed(&p.physical_default_value)),
        dop,
        coded_type: p.diag_coded_type.as_ref().map(coded_type),
        bit_length: p.bit_length,
        request_byte_position: p.request_byte_pos,
        byte_length: p.byte_length,
        other_type: (kind == ParamKind::Other).then(|| p.xsi_type.clone()),
    }
}

fn param_kind(xsi_type: &str) -> ParamKind {
    match xsi_type {
        "CODED-CONST" => ParamKind::CodedConst,
        "VALUE" => ParamKind::Value,
        "PHYS-CONST" => ParamKind::PhysConst,
        "RESERVED" => ParamKind::Reserved,
        "MATCHING-REQUEST-PARAM" => ParamKind::MatchingRequestParam,
        "NRC-CONST" => ParamKind::NrcConst,
        _ => ParamKind::Other,
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| v.trim().to_string())
}
