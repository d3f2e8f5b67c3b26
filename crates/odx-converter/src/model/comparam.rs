// crates/odx-converter/src/model/comparam.rs

//! Model structs for communication parameter documents (`.odx-cs`, `.odx-c`).

use super::common::{odx_list, OdxLink, Text};
use super::data::{DopList, UnitSpec};
use serde::Deserialize;

/// `<COMPARAM-SUBSET>`: definitions of communication parameters.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComparamSubset {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "@CATEGORY", default)]
    pub category: Option<String>,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "COMPARAMS", default)]
    pub comparams: Option<ComParamList>,

    #[serde(rename = "COMPLEX-COMPARAMS", default)]
    pub complex_comparams: Option<ComplexComParamList>,

    #[serde(rename = "DATA-OBJECT-PROPS", default)]
    pub data_object_props: Option<DopList>,

    #[serde(rename = "UNIT-SPEC", default)]
    pub unit_spec: Option<UnitSpec>,
}

odx_list!(ComParamList, "COMPARAM", ComParam);
odx_list!(ComplexComParamList, "COMPLEX-COMPARAM", ComplexComParam);

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComParam {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "@PARAM-CLASS", default)]
    pub param_class: Option<String>,

    #[serde(rename = "@CPTYPE", default)]
    pub cp_type: Option<String>,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "PHYSICAL-DEFAULT-VALUE", default)]
    pub physical_default_value: Option<String>,

    #[serde(rename = "DATA-OBJECT-PROP-REF", default)]
    pub data_object_prop_ref: Option<OdxLink>,
}

/// `<COMPLEX-COMPARAM>`; only its identity and classification are carried.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComplexComParam {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "@PARAM-CLASS", default)]
    pub param_class: Option<String>,

    #[serde(rename = "@CPTYPE", default)]
    pub cp_type: Option<String>,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,
}

/// `<COMPARAM-SPEC>`: the protocol description, a set of protocol stacks.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ComparamSpec {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "PROT-STACKS", default)]
    pub prot_stacks: Option<ProtStackList>,
}

odx_list!(ProtStackList, "PROT-STACK", ProtStack);

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProtStack {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "PDU-PROTOCOL-TYPE", default)]
    pub pdu_protocol_type: Option<String>,

    #[serde(rename = "PHYSICAL-LINK-TYPE", default)]
    pub physical_link_type: Option<String>,

    #[serde(rename = "COMPARAM-SUBSET-REFS", default)]
    pub comparam_subset_refs: Option<ComparamSubsetRefList>,
}

odx_list!(ComparamSubsetRefList, "COMPARAM-SUBSET-REF", OdxLink);
