// crates/odx-converter/src/model/layer.rs

//! Model structs for `<DIAG-LAYER-CONTAINER>` and the diagnostic layers it holds.

use super::comm::{DiagComms, GlobalNegResponseList, NegResponseList, PosResponseList, RequestList};
use super::common::{odx_list, OdxLink, SnRef, Text};
use super::data::DiagDataDictionarySpec;
use serde::Deserialize;

/// `<DIAG-LAYER-CONTAINER>`: groups layers by their kind.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagLayerContainer {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "PROTOCOLS", default)]
    pub protocols: Option<ProtocolList>,

    #[serde(rename = "FUNCTIONAL-GROUPS", default)]
    pub functional_groups: Option<FunctionalGroupList>,

    #[serde(rename = "ECU-SHARED-DATAS", default)]
    pub ecu_shared_datas: Option<EcuSharedDataList>,

    #[serde(rename = "BASE-VARIANTS", default)]
    pub base_variants: Option<BaseVariantList>,

    #[serde(rename = "ECU-VARIANTS", default)]
    pub ecu_variants: Option<EcuVariantList>,
}

odx_list!(ProtocolList, "PROTOCOL", DiagLayer);
odx_list!(FunctionalGroupList, "FUNCTIONAL-GROUP", DiagLayer);
odx_list!(EcuSharedDataList, "ECU-SHARED-DATA", DiagLayer);
odx_list!(BaseVariantList, "BASE-VARIANT", DiagLayer);
odx_list!(EcuVariantList, "ECU-VARIANT", DiagLayer);

/// Any of `<PROTOCOL>`, `<FUNCTIONAL-GROUP>`, `<ECU-SHARED-DATA>`,
/// `<BASE-VARIANT>` or `<ECU-VARIANT>`. The kind comes from the list the
/// layer was found in; kind-specific children are simply absent elsewhere.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagLayer {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "DIAG-DATA-DICTIONARY-SPEC", default)]
    pub diag_data_dictionary_spec: Option<DiagDataDictionarySpec>,

    #[serde(rename = "DIAG-COMMS", default)]
    pub diag_comms: Option<DiagComms>,

    #[serde(rename = "REQUESTS", default)]
    pub requests: Option<RequestList>,

    #[serde(rename = "POS-RESPONSES", default)]
    pub pos_responses: Option<PosResponseList>,

    #[serde(rename = "NEG-RESPONSES", default)]
    pub neg_responses: Option<NegResponseList>,

    #[serde(rename = "GLOBAL-NEG-RESPONSES", default)]
    pub global_neg_responses: Option<GlobalNegResponseList>,

    #[serde(rename = "COMPARAM-REFS", default)]
    pub comparam_refs: Option<ComParamRefList>,

    #[serde(rename = "PARENT-REFS", default)]
    pub parent_refs: Option<ParentRefList>,

    /// Only on `<PROTOCOL>`.
    #[serde(rename = "COMPARAM-SPEC-REF", default)]
    pub comparam_spec_ref: Option<OdxLink>,

    /// Only on `<ECU-VARIANT>`.
    #[serde(rename = "ECU-VARIANT-PATTERNS", default)]
    pub ecu_variant_patterns: Option<EcuVariantPatternList>,
}

odx_list!(ComParamRefList, "COMPARAM-REF", ComParamRef);
odx_list!(ParentRefList, "PARENT-REF", ParentRef);
odx_list!(EcuVariantPatternList, "ECU-VARIANT-PATTERN", EcuVariantPattern);

/// `<PARENT-REF ID-REF="..." xsi:type="BASE-VARIANT-REF">`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ParentRef {
    #[serde(rename = "@ID-REF")]
    pub id_ref: String,

    #[serde(rename = "@DOCREF", default)]
    pub docref: Option<String>,

    #[serde(rename = "@DOCTYPE", default)]
    pub doctype: Option<String>,

    #[serde(rename = "@type", alias = "@xsi:type", default)]
    pub xsi_type: Option<String>,

    #[serde(rename = "NOT-INHERITED-DIAG-COMMS", default)]
    pub not_inherited_diag_comms: Option<NotInheritedDiagCommList>,

    #[serde(rename = "NOT-INHERITED-DOPS", default)]
    pub not_inherited_dops: Option<NotInheritedDopList>,
}

impl ParentRef {
    /// The reference part of the element, in the shape shared with other links.
    pub fn link(&self) -> OdxLink {
        OdxLink {
            id_ref: self.id_ref.clone(),
            docref: self.docref.clone(),
            doctype: self.doctype.clone(),
        }
    }
}

odx_list!(NotInheritedDiagCommList, "NOT-INHERITED-DIAG-COMM", NotInheritedDiagComm);
odx_list!(NotInheritedDopList, "NOT-INHERITED-DOP", NotInheritedDop);

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NotInheritedDiagComm {
    #[serde(rename = "DIAG-COMM-SNREF")]
    pub diag_comm_snref: SnRef,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NotInheritedDop {
    #[serde(rename = "DOP-BASE-SNREF")]
    pub dop_base_snref: SnRef,
}

/// `<COMPARAM-REF>`: assigns a value to a communication parameter defined in
/// a `COMPARAM-SUBSET`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComParamRef {
    #[serde(rename = "@ID-REF")]
    pub id_ref: String,

    #[serde(rename = "@DOCREF", default)]
    pub docref: Option<String>,

    #[serde(rename = "@DOCTYPE", default)]
    pub doctype: Option<String>,

    #[serde(rename = "SIMPLE-VALUE", default)]
    pub simple_value: Option<String>,

    /// ODX 2.0 spelling of `SIMPLE-VALUE`.
    #[serde(rename = "VALUE", default)]
    pub value: Option<String>,

    #[serde(rename = "COMPLEX-VALUE", default)]
    pub complex_value: Option<ComplexValue>,

    #[serde(rename = "PROTOCOL-SNREF", default)]
    pub protocol_snref: Option<SnRef>,

    #[serde(rename = "PROT-STACK-SNREF", default)]
    pub prot_stack_snref: Option<SnRef>,
}

impl ComParamRef {
    pub fn link(&self) -> OdxLink {
        OdxLink {
            id_ref: self.id_ref.clone(),
            docref: self.docref.clone(),
            doctype: self.doctype.clone(),
        }
    }

    /// The assigned value as text. Complex values are flattened with `;`.
    pub fn value_text(&self) -> String {
        if let Some(v) = self.simple_value.as_ref().or(self.value.as_ref()) {
            return v.trim().to_string();
        }
        match &self.complex_value {
            Some(complex) => complex
                .simple_values
                .iter()
                .map(|v| v.trim())
                .collect::<Vec<_>>()
                .join(";"),
            None => String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComplexValue {
    #[serde(rename = "SIMPLE-VALUE", default)]
    pub simple_values: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EcuVariantPattern {
    #[serde(rename = "MATCHING-PARAMETERS", default)]
    pub matching_parameters: Option<MatchingParameterList>,
}

odx_list!(MatchingParameterList, "MATCHING-PARAMETER", MatchingParameter);

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchingParameter {
    #[serde(rename = "EXPECTED-VALUE", default)]
    pub expected_value: String,

    #[serde(rename = "DIAG-COMM-SNREF", default)]
    pub diag_comm_snref: Option<SnRef>,

    #[serde(rename = "OUT-PARAM-IF-SNREF", default)]
    pub out_param_if_snref: Option<SnRef>,
}
