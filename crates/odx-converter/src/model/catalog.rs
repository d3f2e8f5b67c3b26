// crates/odx-converter/src/model/catalog.rs

//! The `index.xml` catalog of a PDX container.

use super::common::odx_list;
use serde::Deserialize;

/// `<CATALOG>`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Catalog {
    #[serde(rename = "@F-DTD-VERSION", default)]
    pub dtd_version: Option<String>,

    #[serde(rename = "SHORT-NAME", default)]
    pub short_name: String,

    #[serde(rename = "ABLOCKS", default)]
    pub ablocks: Option<AblockList>,
}

impl Catalog {
    /// Every file name listed by any `<ABLOCK>`, in catalog order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.ablocks
            .iter()
            .flat_map(|list| list.items.iter())
            .flat_map(|ablock| ablock.files.iter().flat_map(|f| f.items.iter()))
            .map(|file| file.name.trim())
    }
}

odx_list!(AblockList, "ABLOCK", Ablock);

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Ablock {
    #[serde(rename = "SHORT-NAME", default)]
    pub short_name: String,

    #[serde(rename = "CATEGORY", default)]
    pub category: Option<String>,

    #[serde(rename = "FILES", default)]
    pub files: Option<FileList>,
}

odx_list!(FileList, "FILE", CatalogFile);

/// `<FILE MIME-TYPE="application/x-asam.odx.odx-d">name.odx-d</FILE>`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CatalogFile {
    #[serde(rename = "@MIME-TYPE", default)]
    pub mime_type: Option<String>,

    #[serde(rename = "$text", default)]
    pub name: String,
}
