// crates/odx-converter/src/resolver/comparam.rs

//! Conversion of communication parameter subsets and protocol descriptions.

use super::linker::{select_dop, select_subset, Linker};
use crate::diagnostics::{Diagnostics, Location};
use crate::model::{ComParam, ComparamSpec, ComparamSubset, ComplexComParam};
use crate::types::{self, ComParamId, SubsetId};

/// `comparams` are the handles of the parameters the subset owns, collected
/// while its children were converted.
pub(super) fn subset(subset: &ComparamSubset, comparams: Vec<ComParamId>) -> types::ComParamSubset {
    types::ComParamSubset {
        id: subset.id.clone(),
        short_name: subset.short_name.clone(),
        category: subset.category.clone(),
        comparams,
    }
}

pub(super) fn comparam(
    cp: &ComParam,
    subset: Option<SubsetId>,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::ComParam {
    let dop = cp.data_object_prop_ref.as_ref().map(|l| {
        linker.link(
            &l.id_ref,
            "DATA-OBJECT-PROP-REF",
            "DATA-OBJECT-PROP",
            site,
            diagnostics,
            select_dop,
        )
    });
    types::ComParam {
        id: cp.id.clone(),
        short_name: cp.short_name.clone(),
        param_class: cp.param_class.clone(),
        cp_type: cp.cp_type.clone(),
        physical_default_value: cp.physical_default_value.as_ref().map(|v| v.trim().to_string()),
        subset,
        dop,
    }
}

pub(super) fn complex_comparam(cp: &ComplexComParam, subset: Option<SubsetId>) -> types::ComParam {
    types::ComParam {
        id: cp.id.clone(),
        short_name: cp.short_name.clone(),
        param_class: cp.param_class.clone(),
        cp_type: cp.cp_type.clone(),
        physical_default_value: None,
        subset,
        dop: None,
    }
}

pub(super) fn protocol(
    spec: &ComparamSpec,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Protocol {
    let prot_stacks = spec
        .prot_stacks
        .iter()
        .flat_map(|l| l.items.iter())
        .map(|stack| {
            let stack_site = site.child("PROT-STACK", Some(&stack.short_name));
            let comparam_subsets = stack
                .comparam_subset_refs
                .iter()
                .flat_map(|r| r.items.iter())
                .map(|l| {
                    linker.link(
                        &l.id_ref,
                        "COMPARAM-SUBSET-REF",
                        "COMPARAM-SUBSET",
                        &stack_site,
                        diagnostics,
                        select_subset,
                    )
                })
                .collect();
            types::ProtStack {
                short_name: stack.short_name.clone(),
                pdu_protocol_type: stack.pdu_protocol_type.as_ref().map(|v| v.trim().to_string()),
                physical_link_type: stack.physical_link_type.as_ref().map(|v| v.trim().to_string()),
                comparam_subsets,
            }
        })
        .collect();
    types::Protocol {
        ids: vec![spec.id.clone()],
        fingerprint: String::new(),
        short_name: spec.short_name.clone(),
        prot_stacks,
    }
}
