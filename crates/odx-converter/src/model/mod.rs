// crates/odx-converter/src/model/mod.rs

//! Internal `serde` data structures that map directly to the ODX 2.2 schema.
//!
//! These structs are deserialized with `quick-xml` and only cover the parts of
//! the schema the converter needs to resolve structure and identity. Unknown
//! elements are ignored. The rest of the crate does not walk these structs
//! directly; it goes through the [`crate::node`] adapter.

#![allow(clippy::pedantic)] // ODX naming conventions differ from Rust

use serde::Deserialize;

pub mod catalog;
pub mod comm;
pub mod common;
pub mod comparam;
pub mod data;
pub mod layer;

pub use catalog::Catalog;
pub use comm::{DiagComms, DiagService, Message, Param, SingleEcuJob};
pub use common::{OdxLink, SnRef, Text};
pub use comparam::{ComParam, ComparamSpec, ComparamSubset, ComplexComParam, ProtStack};
pub use data::{DataObjectProp, DiagCodedType, Dtc, DtcDop, Structure, Unit};
pub use layer::{ComParamRef, DiagLayer, DiagLayerContainer, ParentRef};

/// The `<ODX>` root element of every document.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename = "ODX")]
pub struct Odx {
    #[serde(rename = "@MODEL-VERSION")]
    pub model_version: String,

    #[serde(rename = "DIAG-LAYER-CONTAINER", default)]
    pub diag_layer_container: Option<DiagLayerContainer>,

    #[serde(rename = "COMPARAM-SUBSET", default)]
    pub comparam_subset: Option<ComparamSubset>,

    #[serde(rename = "COMPARAM-SPEC", default)]
    pub comparam_spec: Option<ComparamSpec>,
}

impl Odx {
    /// `true` when the document holds none of the roots the converter handles
    /// (vehicle info, flash, multi-ECU jobs).
    pub fn is_unsupported(&self) -> bool {
        self.diag_layer_container.is_none()
            && self.comparam_subset.is_none()
            && self.comparam_spec.is_none()
    }
}
