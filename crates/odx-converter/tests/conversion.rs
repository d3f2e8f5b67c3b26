// crates/odx-converter/tests/conversion.rs

//! End-to-end conversions of small in-memory archives.

mod common;

use common::*;
use odx_converter::model::{Message, Param};
use odx_converter::types::DopId;
use odx_converter::{
    canonicalize, load_document, resolve, ConvertOptions, Converter, CrossReferenceIndex,
    DiagnosticKind, Diagnostics, LoadedDocument, PipelineStage, ResolvedGraph,
};
use odx_records::record::Body;
use odx_records::ParamKind;

fn convert(entries: &[(&str, &str)], options: ConvertOptions) -> (Vec<odx_records::Record>, Converter) {
    init_logger();
    let mut archive = open(entries);
    let mut converter = Converter::new(options);
    let output = converter.convert(&mut archive).expect("conversion failed");
    let records = odx_records::decode_all(&output.bytes).expect("stream does not decode");
    (records, converter)
}

fn resolve_entries(entries: &[(&str, &str)]) -> (ResolvedGraph, Diagnostics) {
    let options = ConvertOptions::default();
    let documents: Vec<LoadedDocument> = entries
        .iter()
        .map(|(name, xml)| load_document(name, xml.as_bytes(), &options).unwrap().unwrap())
        .collect();
    let mut diagnostics = Diagnostics::new();
    let index = CrossReferenceIndex::build(&documents, &mut diagnostics);
    let graph = resolve(&index, &documents, &mut diagnostics);
    (graph, diagnostics)
}

/// Two base variants, each defining the same `Temp` DOP under its own ID.
fn twin_dops() -> (String, String) {
    (
        container(
            "DLC_A",
            &base_variant("BV_A", "EngineA", &dictionary(&dop("DOP_A", "Temp"))),
            "",
        ),
        container(
            "DLC_B",
            &base_variant("BV_B", "EngineB", &dictionary(&dop("DOP_B", "Temp"))),
            "",
        ),
    )
}

#[test]
fn test_same_archive_gives_identical_bytes() {
    let (a, b) = twin_dops();
    let cp = comparam_doc();
    let entries = [("cp.odx-cs", cp.as_str()), ("a.odx-d", a.as_str()), ("b.odx-d", b.as_str())];

    let mut first = open(&entries);
    let mut second = open(&entries);
    let one = Converter::new(ConvertOptions::default().with_workers(1))
        .convert(&mut first)
        .unwrap();
    let four = Converter::new(ConvertOptions::default().with_workers(4))
        .convert(&mut second)
        .unwrap();
    assert_eq!(one.bytes, four.bytes);
    assert_eq!(one.records, four.records);
}

#[test]
fn test_identical_dops_are_merged() {
    let (a, b) = twin_dops();
    let (mut graph, diagnostics) = resolve_entries(&[("a.odx-d", a.as_str()), ("b.odx-d", b.as_str())]);
    assert!(diagnostics.is_empty());
    assert_eq!(graph.data_object_props.len(), 2);

    canonicalize(&mut graph);
    assert_eq!(graph.data_object_props.len(), 1);
    assert_eq!(graph.data_object_props[0].ids, vec!["DOP_A".to_string(), "DOP_B".to_string()]);
    assert_eq!(graph.lookup("DOP_A"), graph.lookup("DOP_B"));
    for layer in &graph.layers {
        assert_eq!(layer.data_object_props, vec![DopId(0)]);
    }
}

#[test]
fn test_deduplication_can_be_disabled() {
    let (a, b) = twin_dops();
    let entries = [("a.odx-d", a.as_str()), ("b.odx-d", b.as_str())];

    let count = |records: &[odx_records::Record]| {
        records
            .iter()
            .filter(|r| matches!(r.body, Some(Body::DataObjectProp(_))))
            .count()
    };
    let (merged, _) = convert(&entries, ConvertOptions::default());
    let (separate, _) = convert(&entries, ConvertOptions::default().with_deduplicate(false));
    assert_eq!(count(&merged), 1);
    assert_eq!(count(&separate), 2);
}

#[test]
fn test_variant_overrides_inherited_comparam() {
    let cp = comparam_doc();
    let doc = container(
        "DLC",
        &base_variant("BV", "Base", &comparam_ref("CP_P", "1")),
        &ecu_variant(
            "EV",
            "Variant",
            &format!("{}{}", parent_ref("BV"), comparam_ref("CP_P", "2")),
        ),
    );
    let (records, converter) = convert(
        &[("cp.odx-cs", cp.as_str()), ("layers.odx-d", doc.as_str())],
        ConvertOptions::default(),
    );
    assert_eq!(converter.stage(), PipelineStage::Done);
    assert!(converter.diagnostics().is_empty());

    let sets = comparam_sets(&records);
    let value_of = |name: &str| {
        let index = layer(&records, name)
            .effective
            .as_ref()
            .and_then(|e| e.comparam_set)
            .expect("layer has no comparam set");
        let set = sets.iter().find(|s| s.index == index).expect("set not in the stream");
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].short_name, "P");
        set.entries[0].value.clone()
    };
    assert_eq!(value_of("Base"), "1");
    assert_eq!(value_of("Variant"), "2");
}

#[test]
fn test_inheritance_cycle_is_isolated() {
    let doc = container(
        "DLC",
        &base_variant("BV_OK", "Ok", &dictionary(&dop("DOP_T", "Temp"))),
        &format!(
            "{}{}",
            ecu_variant("EV_A", "A", &parent_ref("EV_B")),
            ecu_variant("EV_B", "B", &parent_ref("EV_A"))
        ),
    );
    let (records, converter) = convert(&[("layers.odx-d", doc.as_str())], ConvertOptions::default());

    let cycles: Vec<_> = converter
        .diagnostics()
        .of_kind(DiagnosticKind::CyclicInheritance)
        .collect();
    assert_eq!(cycles.len(), 2);

    let names: Vec<&str> = layers(&records).iter().map(|l| l.short_name.as_str()).collect();
    assert_eq!(names, vec!["Ok"]);
    assert_eq!(layer(&records, "Ok").effective.as_ref().unwrap().data_object_props.len(), 1);
}

#[test]
fn test_unresolved_reference_is_isolated() {
    let doc = container(
        "DLC",
        &format!(
            "{}{}",
            base_variant(
                "BV_BROKEN",
                "Broken",
                r#"<DIAG-COMMS><DIAG-COMM-REF ID-REF="DS_Missing"/></DIAG-COMMS>"#
            ),
            base_variant("BV_FINE", "Fine", &dictionary(&dop("DOP_T", "Temp")))
        ),
        "",
    );
    let (records, converter) = convert(&[("layers.odx-d", doc.as_str())], ConvertOptions::default());

    let unresolved: Vec<_> = converter
        .diagnostics()
        .of_kind(DiagnosticKind::UnresolvedReference)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].message.contains("DS_Missing"));

    let broken = layer(&records, "Broken");
    assert_eq!(broken.services.len(), 1);
    assert!(!broken.services[0].is_resolved());
    assert_eq!(broken.services[0].unresolved_id.as_deref(), Some("DS_Missing"));
    assert_eq!(layer(&records, "Fine").data_object_props.len(), 1);
}

#[test]
fn test_duplicate_identifier_keeps_first_definition() {
    let one = container("DLC_1", &base_variant("BV", "First", ""), "");
    let two = container("DLC_2", &base_variant("BV", "Second", ""), "");
    let (records, converter) = convert(
        &[("one.odx-d", one.as_str()), ("two.odx-d", two.as_str())],
        ConvertOptions::default(),
    );

    let duplicates: Vec<_> = converter
        .diagnostics()
        .of_kind(DiagnosticKind::DuplicateIdentifier)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].location.document, "two.odx-d");
    assert_eq!(
        duplicates[0].related.as_ref().map(|l| l.document.as_str()),
        Some("one.odx-d")
    );

    let names: Vec<&str> = layers(&records).iter().map(|l| l.short_name.as_str()).collect();
    assert_eq!(names, vec!["First"]);
}

#[test]
fn test_header_and_trailer_describe_the_stream() {
    let (a, b) = twin_dops();
    let broken = "<ODX MODEL-VERSION=\"2.2.0\"><BROKEN></ODX>";
    let (records, converter) = convert(
        &[("a.odx-d", a.as_str()), ("broken.odx-d", broken), ("b.odx-d", b.as_str())],
        ConvertOptions::default(),
    );

    match &records[0].body {
        Some(Body::Header(header)) => {
            assert_eq!(header.archive_name, "TEST");
            assert_eq!(header.documents, vec!["a.odx-d".to_string(), "b.odx-d".to_string()]);
            assert_eq!(header.layer_count, 2);
            assert_eq!(header.diagnostic_count as usize, converter.diagnostics().len());
            assert_eq!(header.diagnostic_count, 1);
        }
        other => panic!("Expected header, got {:?}", other),
    }
    match records.last().and_then(|r| r.body.as_ref()) {
        Some(Body::Trailer(trailer)) => assert_eq!(trailer.record_count as usize, records.len() - 1),
        other => panic!("Expected trailer, got {:?}", other),
    }
}

#[test]
fn test_duplicate_container_keeps_its_layers() {
    let one = container("DLC_SHARED", &base_variant("BV_A", "EngineA", ""), "");
    let two = container("DLC_SHARED", &base_variant("BV_B", "EngineB", ""), "");
    let (records, converter) = convert(
        &[("one.odx-d", one.as_str()), ("two.odx-d", two.as_str())],
        ConvertOptions::default(),
    );

    let diagnostics: Vec<_> = converter.diagnostics().iter().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateIdentifier);
    assert!(diagnostics[0].message.contains("DLC_SHARED"));

    let names: Vec<&str> = layers(&records).iter().map(|l| l.short_name.as_str()).collect();
    assert_eq!(names, vec!["EngineA", "EngineB"]);
    assert_eq!(layer(&records, "EngineB").document, "two.odx-d");
}

#[test]
fn test_merged_comparam_set_does_not_depend_on_document_order() {
    let cp = comparam_doc();
    let a = container("DLC_A", &base_variant("BV_A", "EngineA", &comparam_ref("CP_P", "50.0")), "");
    let b = container("DLC_B", &base_variant("BV_B", "EngineB", &comparam_ref("CP_P", "50")), "");

    let forward = [("cp.odx-cs", cp.as_str()), ("a.odx-d", a.as_str()), ("b.odx-d", b.as_str())];
    let backward = [("cp.odx-cs", cp.as_str()), ("b.odx-d", b.as_str()), ("a.odx-d", a.as_str())];
    for entries in [forward, backward] {
        let (records, _) = convert(&entries, ConvertOptions::default());
        let sets = comparam_sets(&records);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].entries[0].value, "50");
        for name in ["EngineA", "EngineB"] {
            let set = layer(&records, name).effective.as_ref().and_then(|e| e.comparam_set);
            assert_eq!(set, Some(sets[0].index));
        }
    }
}

fn comparam_spec(id: &str, stack_id: &str) -> String {
    odx(&format!(
        r#"<COMPARAM-SPEC ID="{id}">
  <SHORT-NAME>UDS_CAN</SHORT-NAME>
  <PROT-STACKS>
    <PROT-STACK ID="{stack_id}">
      <SHORT-NAME>Stack</SHORT-NAME>
      <PDU-PROTOCOL-TYPE>ISO_14229_3</PDU-PROTOCOL-TYPE>
      <PHYSICAL-LINK-TYPE>ISO_11898_2_DWCAN</PHYSICAL-LINK-TYPE>
      <COMPARAM-SUBSET-REFS><COMPARAM-SUBSET-REF ID-REF="CPS_Timing"/></COMPARAM-SUBSET-REFS>
    </PROT-STACK>
  </PROT-STACKS>
</COMPARAM-SPEC>"#
    ))
}

#[test]
fn test_identical_protocol_descriptions_are_merged() {
    let cp = comparam_doc();
    let spec_a = comparam_spec("CS_A", "PS_A");
    let spec_b = comparam_spec("CS_B", "PS_B");
    let protocols = odx(r#"<DIAG-LAYER-CONTAINER ID="DLC">
  <SHORT-NAME>DLC</SHORT-NAME>
  <PROTOCOLS>
    <PROTOCOL ID="PR_A"><SHORT-NAME>ProtA</SHORT-NAME><COMPARAM-SPEC-REF ID-REF="CS_A"/></PROTOCOL>
    <PROTOCOL ID="PR_B"><SHORT-NAME>ProtB</SHORT-NAME><COMPARAM-SPEC-REF ID-REF="CS_B"/></PROTOCOL>
  </PROTOCOLS>
</DIAG-LAYER-CONTAINER>"#);
    let entries = [
        ("cp.odx-cs", cp.as_str()),
        ("a.odx-c", spec_a.as_str()),
        ("b.odx-c", spec_b.as_str()),
        ("layers.odx-d", protocols.as_str()),
    ];
    let descriptions = |records: &[odx_records::Record]| -> Vec<odx_records::ProtocolDescription> {
        records
            .iter()
            .filter_map(|r| match &r.body {
                Some(Body::Protocol(p)) => Some(p.clone()),
                _ => None,
            })
            .collect()
    };

    let (records, converter) = convert(&entries, ConvertOptions::default());
    assert!(converter.diagnostics().is_empty());
    let merged = descriptions(&records);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].ids, vec!["CS_A".to_string(), "CS_B".to_string()]);
    assert_eq!(merged[0].short_name, "UDS_CAN");
    let stack = &merged[0].prot_stacks[0];
    assert_eq!(stack.pdu_protocol_type.as_deref(), Some("ISO_14229_3"));
    assert!(stack.comparam_subsets[0].is_resolved());
    for name in ["ProtA", "ProtB"] {
        let spec = layer(&records, name).protocol_spec.as_ref().and_then(|l| l.index);
        assert_eq!(spec, Some(merged[0].index));
    }

    let (records, _) = convert(&entries, ConvertOptions::default().with_deduplicate(false));
    assert_eq!(descriptions(&records).len(), 2);
}

const TYPED_LAYER: &str = r#"<DIAG-COMMS>
  <DIAG-SERVICE ID="DS_Read" SEMANTIC="DATA">
    <SHORT-NAME>ReadTemp</SHORT-NAME>
    <REQUEST-REF ID-REF="RQ_Read"/>
    <POS-RESPONSE-REFS><POS-RESPONSE-REF ID-REF="PR_Read"/></POS-RESPONSE-REFS>
    <NEG-RESPONSE-REFS><NEG-RESPONSE-REF ID-REF="NR_Read"/></NEG-RESPONSE-REFS>
  </DIAG-SERVICE>
</DIAG-COMMS>
<REQUESTS>
  <REQUEST ID="RQ_Read">
    <SHORT-NAME>RQ_ReadTemp</SHORT-NAME>
    <PARAMS>
      <PARAM xsi:type="CODED-CONST" SEMANTIC="SERVICE-ID">
        <SHORT-NAME>SID</SHORT-NAME>
        <BYTE-POSITION>0</BYTE-POSITION>
        <CODED-VALUE>34</CODED-VALUE>
        <DIAG-CODED-TYPE xsi:type="STANDARD-LENGTH-TYPE" BASE-DATA-TYPE="A_UINT32">
          <BIT-LENGTH>8</BIT-LENGTH>
        </DIAG-CODED-TYPE>
      </PARAM>
    </PARAMS>
  </REQUEST>
</REQUESTS>
<POS-RESPONSES>
  <POS-RESPONSE ID="PR_Read">
    <SHORT-NAME>PR_ReadTemp</SHORT-NAME>
    <PARAMS>
      <PARAM xsi:type="VALUE">
        <SHORT-NAME>Temp</SHORT-NAME>
        <BYTE-POSITION>1</BYTE-POSITION>
        <DOP-REF ID-REF="DOP_T"/>
      </PARAM>
    </PARAMS>
  </POS-RESPONSE>
</POS-RESPONSES>
<NEG-RESPONSES>
  <NEG-RESPONSE ID="NR_Read">
    <SHORT-NAME>NR_ReadTemp</SHORT-NAME>
    <PARAMS>
      <PARAM xsi:type="NRC-CONST">
        <SHORT-NAME>NRC</SHORT-NAME>
        <BYTE-POSITION>2</BYTE-POSITION>
        <CODED-VALUES><CODED-VALUE>49</CODED-VALUE></CODED-VALUES>
        <DIAG-CODED-TYPE xsi:type="STANDARD-LENGTH-TYPE" BASE-DATA-TYPE="A_UINT32">
          <BIT-LENGTH>8</BIT-LENGTH>
        </DIAG-CODED-TYPE>
      </PARAM>
    </PARAMS>
  </NEG-RESPONSE>
</NEG-RESPONSES>"#;

fn typed_layer_doc() -> String {
    let inner = format!("{}{}", dictionary(&dop("DOP_T", "Temp")), TYPED_LAYER);
    container("DLC", &base_variant("BV", "Engine", &inner), "")
}

#[test]
fn test_type_attributes_survive_loading() {
    let doc = typed_layer_doc();
    let loaded = load_document("ecu.odx-d", doc.as_bytes(), &ConvertOptions::default())
        .unwrap()
        .unwrap();
    let container = loaded.odx.diag_layer_container.as_ref().unwrap();
    let bv = &container.base_variants.as_ref().unwrap().items[0];

    fn first_param(messages: &[Message]) -> Param {
        messages[0].params.as_ref().unwrap().items[0].clone()
    }
    let sid = first_param(&bv.requests.as_ref().unwrap().items);
    assert_eq!(sid.xsi_type, "CODED-CONST");
    assert_eq!(sid.diag_coded_type.unwrap().xsi_type, "STANDARD-LENGTH-TYPE");
    assert_eq!(first_param(&bv.pos_responses.as_ref().unwrap().items).xsi_type, "VALUE");
    assert_eq!(first_param(&bv.neg_responses.as_ref().unwrap().items).xsi_type, "NRC-CONST");

    let dops = &bv.diag_data_dictionary_spec.as_ref().unwrap().data_object_props;
    assert_eq!(
        dops.as_ref().unwrap().items[0].diag_coded_type.xsi_type,
        "STANDARD-LENGTH-TYPE"
    );
}

#[test]
fn test_parameter_kinds_reach_the_stream() {
    let doc = typed_layer_doc();
    let (records, converter) = convert(&[("ecu.odx-d", doc.as_str())], ConvertOptions::default());
    assert!(converter.diagnostics().is_empty());

    let request = records
        .iter()
        .find_map(|r| match &r.body {
            Some(Body::Request(rq)) => Some(rq),
            _ => None,
        })
        .expect("no request in the stream");
    assert_eq!(request.params[0].kind(), ParamKind::CodedConst);
    assert_eq!(request.params[0].other_type, None);
    assert_eq!(
        request.params[0].coded_type.as_ref().map(|t| t.kind.as_str()),
        Some("STANDARD-LENGTH-TYPE")
    );

    let response_param = |name: &str| {
        records
            .iter()
            .find_map(|r| match &r.body {
                Some(Body::Response(rs)) if rs.short_name == name => Some(rs.params[0].clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("response '{}' not in the stream", name))
    };
    let value = response_param("PR_ReadTemp");
    assert_eq!(value.kind(), ParamKind::Value);
    assert!(value.dop.as_ref().is_some_and(|l| l.is_resolved()));
    let nrc = response_param("NR_ReadTemp");
    assert_eq!(nrc.kind(), ParamKind::NrcConst);
    assert_eq!(nrc.coded_values, vec!["49".to_string()]);

    let dop = records
        .iter()
        .find_map(|r| match &r.body {
            Some(Body::DataObjectProp(d)) => Some(d),
            _ => None,
        })
        .expect("no data object property in the stream");
    assert_eq!(
        dop.coded_type.as_ref().map(|t| t.kind.as_str()),
        Some("STANDARD-LENGTH-TYPE")
    );
}
