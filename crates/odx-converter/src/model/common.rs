// crates/odx-converter/src/model/common.rs

//! Reference and text helpers shared by all ODX elements.

use serde::Deserialize;

/// An `ODXLINK`: `<X-REF ID-REF="..." DOCREF="..." DOCTYPE="..."/>`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct OdxLink {
    #[serde(rename = "@ID-REF")]
    pub id_ref: String,
    #[serde(rename = "@DOCREF", default)]
    pub docref: Option<String>,
    #[serde(rename = "@DOCTYPE", default)]
    pub doctype: Option<String>,
}

impl OdxLink {
    pub fn new(id_ref: &str) -> Self {
        Self {
            id_ref: id_ref.into(),
            ..Default::default()
        }
    }
}

/// A short-name reference: `<X-SNREF SHORT-NAME="..."/>`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct SnRef {
    #[serde(rename = "@SHORT-NAME")]
    pub short_name: String,
}

/// Text that may carry a translation id, e.g. `<LONG-NAME TI="...">Value</LONG-NAME>`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Text {
    #[serde(rename = "@TI", default)]
    pub ti: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Text {
    pub fn as_str(&self) -> &str {
        self.value.trim()
    }
}

/// Defines a wrapper for a repeated child element, e.g.
/// `<DATA-OBJECT-PROPS><DATA-OBJECT-PROP/>...</DATA-OBJECT-PROPS>`.
macro_rules! odx_list {
    ($(#[$meta:meta])* $name:ident, $elem:literal, $item:ty) => {
        $(#[$meta])*
        #[derive(Debug, serde::Deserialize, Default, Clone)]
        pub struct $name {
            #[serde(rename = $elem, default)]
            pub items: ::std::vec::Vec<$item>,
        }
    };
}

/// Defines an identifier-bearing element that is indexed but not modeled
/// beyond its `ID` and `SHORT-NAME`, together with its list wrapper.
macro_rules! odx_opaque {
    ($name:ident, $list:ident, $elem:literal) => {
        #[derive(Debug, serde::Deserialize, Default, Clone)]
        pub struct $name {
            #[serde(rename = "@ID")]
            pub id: ::std::string::String,
            #[serde(rename = "SHORT-NAME")]
            pub short_name: ::std::string::String,
        }

        impl $name {
            pub const ELEMENT: &'static str = $elem;
        }

        $crate::model::common::odx_list!($list, $elem, $name);
    };
}

pub(crate) use odx_list;
pub(crate) use odx_opaque;

odx_list!(
    /// `<CODED-VALUES>` of an `NRC-CONST` parameter.
    CodedValueList,
    "CODED-VALUE",
    String
);

odx_list!(
    /// A list of plain `<V>` values (rational coefficients).
    VList,
    "V",
    String
);
