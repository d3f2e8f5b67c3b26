// crates/odx-converter/tests/common/mod.rs

//! Shared fixtures: in-memory PDX containers and record stream helpers.

#![allow(dead_code)]

use odx_converter::PdxArchive;
use odx_records::record::Body;
use odx_records::Record;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a ZIP container holding `entries` in the given order.
pub fn pdx(entries: &[(&str, &str)]) -> Vec<u8> {
    let entries: Vec<_> = entries
        .iter()
        .map(|(name, body)| (*name, *body, CompressionMethod::Deflated))
        .collect();
    pdx_compressed(&entries)
}

/// Like [`pdx`], with a compression method per entry.
pub fn pdx_compressed(entries: &[(&str, &str, CompressionMethod)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body, method) in entries {
        let options = SimpleFileOptions::default().compression_method(*method);
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn open(entries: &[(&str, &str)]) -> PdxArchive<Cursor<Vec<u8>>> {
    PdxArchive::from_reader(Cursor::new(pdx(entries)))
        .unwrap()
        .with_name("TEST")
}

/// Wraps `body` in an `<ODX>` root.
pub fn odx(body: &str) -> String {
    format!(r#"<ODX MODEL-VERSION="2.2.0">{}</ODX>"#, body)
}

/// A `DIAG-LAYER-CONTAINER` with the given base and ECU variants.
pub fn container(id: &str, base_variants: &str, ecu_variants: &str) -> String {
    let mut body = format!("<DIAG-LAYER-CONTAINER ID=\"{id}\"><SHORT-NAME>{id}</SHORT-NAME>");
    if !base_variants.is_empty() {
        body.push_str(&format!("<BASE-VARIANTS>{}</BASE-VARIANTS>", base_variants));
    }
    if !ecu_variants.is_empty() {
        body.push_str(&format!("<ECU-VARIANTS>{}</ECU-VARIANTS>", ecu_variants));
    }
    body.push_str("</DIAG-LAYER-CONTAINER>");
    odx(&body)
}

/// A subset with one timing comparam `CP_P` named `P`.
pub fn comparam_doc() -> String {
    odx(r#"<COMPARAM-SUBSET ID="CPS_Timing" CATEGORY="TIMING">
  <SHORT-NAME>Timing</SHORT-NAME>
  <COMPARAMS>
    <COMPARAM ID="CP_P" PARAM-CLASS="TIMING" CPTYPE="STANDARD">
      <SHORT-NAME>P</SHORT-NAME>
      <PHYSICAL-DEFAULT-VALUE>0</PHYSICAL-DEFAULT-VALUE>
    </COMPARAM>
  </COMPARAMS>
</COMPARAM-SUBSET>"#)
}

/// A data object property with a fixed structure; only the ID varies.
pub fn dop(id: &str, short_name: &str) -> String {
    format!(
        r#"<DATA-OBJECT-PROP ID="{id}">
  <SHORT-NAME>{short_name}</SHORT-NAME>
  <COMPU-METHOD><CATEGORY>IDENTICAL</CATEGORY></COMPU-METHOD>
  <DIAG-CODED-TYPE xsi:type="STANDARD-LENGTH-TYPE" BASE-DATA-TYPE="A_UINT32">
    <BIT-LENGTH>8</BIT-LENGTH>
  </DIAG-CODED-TYPE>
  <PHYSICAL-TYPE BASE-DATA-TYPE="A_UINT32"/>
</DATA-OBJECT-PROP>"#
    )
}

pub fn comparam_ref(id_ref: &str, value: &str) -> String {
    format!(
        r#"<COMPARAM-REFS>
  <COMPARAM-REF ID-REF="{id_ref}"><SIMPLE-VALUE>{value}</SIMPLE-VALUE></COMPARAM-REF>
</COMPARAM-REFS>"#
    )
}

pub fn parent_ref(id_ref: &str) -> String {
    format!(r#"<PARENT-REFS><PARENT-REF ID-REF="{id_ref}" xsi:type="BASE-VARIANT-REF"/></PARENT-REFS>"#)
}

pub fn layers(records: &[Record]) -> Vec<&odx_records::Layer> {
    records
        .iter()
        .filter_map(|r| match &r.body {
            Some(Body::Layer(layer)) => Some(layer),
            _ => None,
        })
        .collect()
}

pub fn comparam_sets(records: &[Record]) -> Vec<&odx_records::ComParamSet> {
    records
        .iter()
        .filter_map(|r| match &r.body {
            Some(Body::ComParamSet(set)) => Some(set),
            _ => None,
        })
        .collect()
}

pub fn layer<'r>(records: &'r [Record], short_name: &str) -> &'r odx_records::Layer {
    layers(records)
        .into_iter()
        .find(|l| l.short_name == short_name)
        .unwrap_or_else(|| panic!("layer '{}' not in the stream", short_name))
}

pub fn base_variant(id: &str, short_name: &str, inner: &str) -> String {
    format!(r#"<BASE-VARIANT ID="{id}"><SHORT-NAME>{short_name}</SHORT-NAME>{inner}</BASE-VARIANT>"#)
}

pub fn ecu_variant(id: &str, short_name: &str, inner: &str) -> String {
    format!(r#"<ECU-VARIANT ID="{id}"><SHORT-NAME>{short_name}</SHORT-NAME>{inner}</ECU-VARIANT>"#)
}

pub fn dictionary(dops: &str) -> String {
    format!(
        "<DIAG-DATA-DICTIONARY-SPEC><DATA-OBJECT-PROPS>{}</DATA-OBJECT-PROPS></DIAG-DATA-DICTIONARY-SPEC>",
        dops
    )
}
