// crates/odx-converter/src/model/comm.rs

//! Model structs for diagnostic communication: services, requests, responses
//! and their parameters.

use super::common::{odx_list, CodedValueList, OdxLink, Text};
use super::data::DiagCodedType;
use serde::Deserialize;

/// `<DIAG-COMMS>`; keeps services, references and jobs in declaration order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagComms {
    #[serde(rename = "$value", default)]
    pub entries: Vec<DiagCommEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub enum DiagCommEntry {
    #[serde(rename = "DIAG-SERVICE")]
    Service(DiagService),
    #[serde(rename = "DIAG-COMM-REF")]
    Ref(OdxLink),
    #[serde(rename = "SINGLE-ECU-JOB")]
    Job(SingleEcuJob),
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagService {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "@SEMANTIC", default)]
    pub semantic: Option<String>,

    #[serde(rename = "@ADDRESSING", default)]
    pub addressing: Option<String>,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "REQUEST-REF", default)]
    pub request_ref: Option<OdxLink>,

    #[serde(rename = "POS-RESPONSE-REFS", default)]
    pub pos_response_refs: Option<PosResponseRefList>,

    #[serde(rename = "NEG-RESPONSE-REFS", default)]
    pub neg_response_refs: Option<NegResponseRefList>,
}

odx_list!(PosResponseRefList, "POS-RESPONSE-REF", OdxLink);
odx_list!(NegResponseRefList, "NEG-RESPONSE-REF", OdxLink);

/// `<SINGLE-ECU-JOB>`; indexed so references to it resolve, otherwise not converted.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SingleEcuJob {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,
}

/// `<REQUEST>`, `<POS-RESPONSE>`, `<NEG-RESPONSE>` and `<GLOBAL-NEG-RESPONSE>`
/// share this shape.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Message {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "PARAMS", default)]
    pub params: Option<ParamList>,
}

odx_list!(RequestList, "REQUEST", Message);
odx_list!(PosResponseList, "POS-RESPONSE", Message);
odx_list!(NegResponseList, "NEG-RESPONSE", Message);
odx_list!(GlobalNegResponseList, "GLOBAL-NEG-RESPONSE", Message);
odx_list!(ParamList, "PARAM", Param);

/// `<PARAM xsi:type="...">`. The union of the fields used by the supported
/// parameter types; `xsi_type` selects which ones are meaningful.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Param {
    // quick-xml hands the attribute over without its `xsi:` prefix.
    #[serde(rename = "@type", alias = "@xsi:type", default)]
    pub xsi_type: String,

    #[serde(rename = "@SEMANTIC", default)]
    pub semantic: Option<String>,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "BYTE-POSITION", default)]
    pub byte_position: Option<u32>,

    #[serde(rename = "BIT-POSITION", default)]
    pub bit_position: Option<u32>,

    #[serde(rename = "CODED-VALUE", default)]
    pub coded_value: Option<String>,

    #[serde(rename = "CODED-VALUES", default)]
    pub coded_values: Option<CodedValueList>,

    #[serde(rename = "PHYS-CONSTANT-VALUE", default)]
    pub phys_constant_value: Option<String>,

    #[serde(rename = "PHYSICAL-DEFAULT-VALUE", default)]
    pub physical_default_value: Option<String>,

    #[serde(rename = "DOP-REF", default)]
    pub dop_ref: Option<OdxLink>,

    #[serde(rename = "DIAG-CODED-TYPE", default)]
    pub diag_coded_type: Option<DiagCodedType>,

    #[serde(rename = "BIT-LENGTH", default)]
    pub bit_length: Option<u32>,

    #[serde(rename = "REQUEST-BYTE-POS", default)]
    pub request_byte_pos: Option<i32>,

    #[serde(rename = "BYTE-LENGTH", default)]
    pub byte_length: Option<u32>,
}
