// crates/odx-records/tests/stream.rs

use odx_records::record::Body;
use odx_records::{
    decode_all, write_record, ComParamSet, ComParamValue, EffectiveMembers, Header, Layer,
    LayerKind, NodeKind, NodeLink, RecordReader, Trailer, FORMAT_VERSION,
};

fn stream() -> Vec<u8> {
    let mut out = Vec::new();
    write_record(
        &Header {
            format_version: FORMAT_VERSION,
            archive_name: "ECU".into(),
            documents: vec!["ecu.odx-d".into()],
            layer_count: 1,
            diagnostic_count: 0,
        }
        .into(),
        &mut out,
    )
    .unwrap();
    write_record(
        &Layer {
            index: 0,
            id: "BV".into(),
            short_name: "Engine".into(),
            kind: LayerKind::BaseVariant as i32,
            services: vec![NodeLink::unresolved(NodeKind::Service, "DS_Gone")],
            effective: Some(EffectiveMembers {
                comparam_set: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        }
        .into(),
        &mut out,
    )
    .unwrap();
    write_record(
        &ComParamSet {
            index: 0,
            fingerprint: "00".into(),
            entries: vec![ComParamValue {
                short_name: "CP_P2Max".into(),
                value: "25".into(),
                protocol: None,
                comparam: Some(NodeLink::resolved(NodeKind::ComParam, 3)),
            }],
        }
        .into(),
        &mut out,
    )
    .unwrap();
    write_record(&Trailer { record_count: 3 }.into(), &mut out).unwrap();
    out
}

#[test]
fn test_layer_links_survive_the_stream() {
    let records = decode_all(&stream()).unwrap();
    let names: Vec<_> = records.iter().map(|r| r.body_name()).collect();
    assert_eq!(names, vec!["Header", "Layer", "ComParamSet", "Trailer"]);

    let Some(Body::Layer(layer)) = &records[1].body else {
        panic!("Expected layer, got {:?}", records[1].body);
    };
    assert_eq!(layer.kind(), LayerKind::BaseVariant);
    assert_eq!(layer.services[0].kind(), NodeKind::Service);
    assert_eq!(layer.services[0].unresolved_id.as_deref(), Some("DS_Gone"));

    let set_index = layer.effective.as_ref().and_then(|e| e.comparam_set).unwrap();
    let Some(Body::ComParamSet(set)) = &records[2].body else {
        panic!("Expected comparam set, got {:?}", records[2].body);
    };
    assert_eq!(set.index, set_index);
    assert_eq!(set.entries[0].comparam.as_ref().and_then(|l| l.index), Some(3));
}

#[test]
fn test_reader_is_lazy() {
    let bytes = stream();
    let mut reader = RecordReader::new(&bytes);
    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.body_name(), "Header");
    assert_eq!(reader.count(), 3);
}
