// crates/odx-converter/src/model/data.rs

//! Model structs for the `<DIAG-DATA-DICTIONARY-SPEC>` of a layer or comparam subset.

use super::comm::ParamList;
use super::common::{odx_list, odx_opaque, OdxLink, Text, VList};
use serde::Deserialize;

/// The data dictionary of a diagnostic layer.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagDataDictionarySpec {
    #[serde(rename = "DTC-DOPS", default)]
    pub dtc_dops: Option<DtcDopList>,

    #[serde(rename = "DATA-OBJECT-PROPS", default)]
    pub data_object_props: Option<DopList>,

    #[serde(rename = "STRUCTURES", default)]
    pub structures: Option<StructureList>,

    #[serde(rename = "END-OF-PDU-FIELDS", default)]
    pub end_of_pdu_fields: Option<EndOfPduFieldList>,

    #[serde(rename = "DYNAMIC-LENGTH-FIELDS", default)]
    pub dynamic_length_fields: Option<DynamicLengthFieldList>,

    #[serde(rename = "TABLES", default)]
    pub tables: Option<TableList>,

    #[serde(rename = "MUXS", default)]
    pub muxs: Option<MuxList>,

    #[serde(rename = "ENV-DATA-DESCS", default)]
    pub env_data_descs: Option<EnvDataDescList>,

    #[serde(rename = "ENV-DATAS", default)]
    pub env_datas: Option<EnvDataList>,

    #[serde(rename = "UNIT-SPEC", default)]
    pub unit_spec: Option<UnitSpec>,
}

odx_list!(DopList, "DATA-OBJECT-PROP", DataObjectProp);
odx_list!(DtcDopList, "DTC-DOP", DtcDop);
odx_list!(StructureList, "STRUCTURE", Structure);
odx_list!(UnitList, "UNIT", Unit);
odx_list!(CompuScaleList, "COMPU-SCALE", CompuScale);

odx_opaque!(EndOfPduField, EndOfPduFieldList, "END-OF-PDU-FIELD");
odx_opaque!(DynamicLengthField, DynamicLengthFieldList, "DYNAMIC-LENGTH-FIELD");
odx_opaque!(Table, TableList, "TABLE");
odx_opaque!(Mux, MuxList, "MUX");
odx_opaque!(EnvDataDesc, EnvDataDescList, "ENV-DATA-DESC");
odx_opaque!(EnvData, EnvDataList, "ENV-DATA");
odx_opaque!(PhysicalDimension, PhysicalDimensionList, "PHYSICAL-DIMENSION");

/// `<DATA-OBJECT-PROP>`: a simple data dictionary entry.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DataObjectProp {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "LONG-NAME", default)]
    pub long_name: Option<Text>,

    #[serde(rename = "COMPU-METHOD", default)]
    pub compu_method: CompuMethod,

    #[serde(rename = "DIAG-CODED-TYPE", default)]
    pub diag_coded_type: DiagCodedType,

    #[serde(rename = "PHYSICAL-TYPE", default)]
    pub physical_type: PhysicalType,

    #[serde(rename = "UNIT-REF", default)]
    pub unit_ref: Option<OdxLink>,
}

/// `<COMPU-METHOD>`; only the internal-to-physical direction is carried.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CompuMethod {
    #[serde(rename = "CATEGORY", default)]
    pub category: String,

    #[serde(rename = "COMPU-INTERNAL-TO-PHYS", default)]
    pub internal_to_phys: Option<CompuInternalToPhys>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CompuInternalToPhys {
    #[serde(rename = "COMPU-SCALES", default)]
    pub compu_scales: Option<CompuScaleList>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CompuScale {
    #[serde(rename = "LOWER-LIMIT", default)]
    pub lower_limit: Option<Limit>,

    #[serde(rename = "UPPER-LIMIT", default)]
    pub upper_limit: Option<Limit>,

    #[serde(rename = "COMPU-CONST", default)]
    pub compu_const: Option<CompuConst>,

    #[serde(rename = "COMPU-RATIONAL-COEFFS", default)]
    pub rational_coeffs: Option<CompuRationalCoeffs>,
}

/// `<LOWER-LIMIT INTERVAL-TYPE="OPEN">0</LOWER-LIMIT>`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Limit {
    #[serde(rename = "@INTERVAL-TYPE", default)]
    pub interval_type: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CompuConst {
    #[serde(rename = "VT", default)]
    pub vt: Option<Text>,
    #[serde(rename = "V", default)]
    pub v: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CompuRationalCoeffs {
    #[serde(rename = "COMPU-NUMERATOR", default)]
    pub numerator: VList,
    #[serde(rename = "COMPU-DENOMINATOR", default)]
    pub denominator: Option<VList>,
}

/// `<DIAG-CODED-TYPE xsi:type="STANDARD-LENGTH-TYPE" BASE-DATA-TYPE="A_UINT32">`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiagCodedType {
    #[serde(rename = "@type", alias = "@xsi:type", default)]
    pub xsi_type: String,

    #[serde(rename = "@BASE-DATA-TYPE", default)]
    pub base_data_type: String,

    #[serde(rename = "@TERMINATION", default)]
    pub termination: Option<String>,

    #[serde(rename = "@IS-HIGHLOW-BYTE-ORDER", default)]
    pub is_highlow_byte_order: Option<bool>,

    #[serde(rename = "BIT-LENGTH", default)]
    pub bit_length: Option<u32>,

    #[serde(rename = "MIN-LENGTH", default)]
    pub min_length: Option<u32>,

    #[serde(rename = "MAX-LENGTH", default)]
    pub max_length: Option<u32>,

    #[serde(rename = "BIT-MASK", default)]
    pub bit_mask: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PhysicalType {
    #[serde(rename = "@BASE-DATA-TYPE", default)]
    pub base_data_type: String,

    #[serde(rename = "@DISPLAY-RADIX", default)]
    pub display_radix: Option<String>,

    #[serde(rename = "PRECISION", default)]
    pub precision: Option<u32>,
}

/// `<DTC-DOP>` with its trouble codes.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DtcDop {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "DIAG-CODED-TYPE", default)]
    pub diag_coded_type: DiagCodedType,

    #[serde(rename = "DTCS", default)]
    pub dtcs: Option<Dtcs>,
}

/// `<DTCS>` mixes owned `<DTC>` definitions with `<DTC-REF>`s in document order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Dtcs {
    #[serde(rename = "$value", default)]
    pub entries: Vec<DtcEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub enum DtcEntry {
    #[serde(rename = "DTC")]
    Dtc(Dtc),
    #[serde(rename = "DTC-REF")]
    Ref(OdxLink),
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Dtc {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "TROUBLE-CODE")]
    pub trouble_code: u32,

    #[serde(rename = "DISPLAY-TROUBLE-CODE", default)]
    pub display_trouble_code: Option<String>,

    #[serde(rename = "TEXT", default)]
    pub text: Option<Text>,
}

/// `<STRUCTURE>`: a composite DOP made of parameters.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Structure {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "BYTE-SIZE", default)]
    pub byte_size: Option<u32>,

    #[serde(rename = "PARAMS", default)]
    pub params: Option<ParamList>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UnitSpec {
    #[serde(rename = "UNITS", default)]
    pub units: Option<UnitList>,

    #[serde(rename = "PHYSICAL-DIMENSIONS", default)]
    pub physical_dimensions: Option<PhysicalDimensionList>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Unit {
    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "SHORT-NAME")]
    pub short_name: String,

    #[serde(rename = "DISPLAY-NAME", default)]
    pub display_name: String,

    #[serde(rename = "FACTOR-SI-TO-UNIT", default)]
    pub factor_si_to_unit: Option<String>,

    #[serde(rename = "OFFSET-SI-TO-UNIT", default)]
    pub offset_si_to_unit: Option<String>,

    #[serde(rename = "PHYSICAL-DIMENSION-REF", default)]
    pub physical_dimension_ref: Option<OdxLink>,
}
