// crates/odx-converter/src/serializer.rs

//! Writes a [`ResolvedGraph`] as a stream of length-delimited records.
//!
//! Record order:
//!
//! 1. `Header`
//! 2. every layer, in table order
//! 3. per layer, the structures it references, in declaration order:
//!    services with their requests, responses and data dictionary entries,
//!    data object properties with their units, comparams, the comparam set
//!    and the protocol descriptions with their subsets
//! 4. every table entry not written yet, table by table
//! 5. `Trailer`
//!
//! Each entry is written exactly once. The output depends on nothing but the
//! graph, so the same graph always produces the same bytes.

use crate::error::SerializationError;
use crate::types::{
    ComParamId, ComParamSetId, ComParamValue, DopId, DtcDopId, LayerId, Link, NodeRef, OpaqueId,
    Param, ProtocolId, RequestId, ResolvedGraph, ResponseId, ServiceId, StructureId, SubsetId,
    UnitId,
};
use odx_records::{self as rec, NodeKind, NodeLink, Record};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Encodes the whole graph into one buffer.
pub fn serialize(graph: &ResolvedGraph) -> Result<Vec<u8>, SerializationError> {
    encode(graph).map(|(bytes, _)| bytes)
}

/// Encodes the graph and publishes it at `path` through a staging file in
/// the same directory. Nothing is left at `path` when encoding or writing
/// fails. Returns the number of records written.
pub fn write_atomic(graph: &ResolvedGraph, path: &Path) -> Result<u64, SerializationError> {
    let (bytes, records) = encode(graph)?;
    publish(&bytes, path)?;
    Ok(records)
}

/// The encoded stream and its record count, trailer included.
pub(crate) fn encode(graph: &ResolvedGraph) -> Result<(Vec<u8>, u64), SerializationError> {
    let mut writer = RecordWriter::new(graph);
    writer.header()?;
    for index in 0..graph.layers.len() {
        writer.layer(LayerId(index as u32))?;
    }
    for index in 0..graph.layers.len() {
        writer.layer_dependencies(LayerId(index as u32))?;
    }
    writer.remaining()?;
    writer.trailer()?;
    Ok((writer.out, writer.records))
}

pub(crate) fn publish(bytes: &[u8], path: &Path) -> Result<(), SerializationError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = tempfile::NamedTempFile::new_in(dir)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path)?;
    Ok(())
}

fn get<'t, T>(table: &'t [T], name: &'static str, index: u32) -> Result<&'t T, SerializationError> {
    table
        .get(index as usize)
        .ok_or(SerializationError::DanglingIndex { table: name, index })
}

struct RecordWriter<'g> {
    graph: &'g ResolvedGraph,
    out: Vec<u8>,
    records: u64,
    emitted: BTreeSet<(NodeKind, u32)>,
}

impl<'g> RecordWriter<'g> {
    fn new(graph: &'g ResolvedGraph) -> Self {
        Self {
            graph,
            out: Vec::new(),
            records: 0,
            emitted: BTreeSet::new(),
        }
    }

    fn write(&mut self, record: Record) -> Result<(), SerializationError> {
        rec::write_record(&record, &mut self.out)?;
        self.records += 1;
        Ok(())
    }

    /// `true` the first time an entry is seen.
    fn first_time(&mut self, kind: NodeKind, index: u32) -> bool {
        self.emitted.insert((kind, index))
    }

    // --- Links ---

    fn check(&self, handle: NodeRef) -> Result<u32, SerializationError> {
        let g = self.graph;
        let (table, len) = match handle {
            NodeRef::Layer(_) => ("layers", g.layers.len()),
            NodeRef::Unit(_) => ("units", g.units.len()),
            NodeRef::Dop(_) => ("data object props", g.data_object_props.len()),
            NodeRef::DtcDop(_) => ("DTC DOPs", g.dtc_dops.len()),
            NodeRef::Structure(_) => ("structures", g.structures.len()),
            NodeRef::Opaque(_) => ("opaque nodes", g.opaque.len()),
            NodeRef::Service(_) => ("services", g.services.len()),
            NodeRef::Request(_) => ("requests", g.requests.len()),
            NodeRef::Response(_) => ("responses", g.responses.len()),
            NodeRef::Subset(_) => ("comparam subsets", g.comparam_subsets.len()),
            NodeRef::ComParam(_) => ("comparams", g.comparams.len()),
            NodeRef::Protocol(_) => ("protocols", g.protocols.len()),
        };
        let index = handle.index();
        if (index as usize) < len {
            Ok(index)
        } else {
            Err(SerializationError::DanglingIndex { table, index })
        }
    }

    fn link<T: Copy>(
        &self,
        link: &Link<T>,
        kind: NodeKind,
        handle: impl Fn(T) -> NodeRef,
    ) -> Result<NodeLink, SerializationError> {
        match link {
            Link::Resolved(h) => {
                let handle = handle(*h);
                let index = self.check(handle)?;
                Ok(NodeLink::resolved(handle.kind(), index))
            }
            Link::Unresolved { id_ref } => Ok(NodeLink::unresolved(kind, id_ref.clone())),
        }
    }

    fn comparam_value(&self, value: &ComParamValue) -> Result<rec::ComParamValue, SerializationError> {
        Ok(rec::ComParamValue {
            short_name: value.short_name.clone(),
            value: value.value.clone(),
            protocol: value.protocol.clone(),
            comparam: Some(self.link(&value.comparam, NodeKind::ComParam, NodeRef::ComParam)?),
        })
    }

    fn params(&self, params: &[Param]) -> Result<Vec<rec::Param>, SerializationError> {
        params
            .iter()
            .map(|p| {
                Ok(rec::Param {
                    short_name: p.short_name.clone(),
                    semantic: p.semantic.clone(),
                    kind: p.kind as i32,
                    byte_position: p.byte_position,
                    bit_position: p.bit_position,
                    coded_value: p.coded_value.clone(),
                    coded_values: p.coded_values.clone(),
                    physical_value: p.physical_value.clone(),
                    dop: p
                        .dop
                        .as_ref()
                        .map(|l| self.link(l, NodeKind::DataObjectProp, |h| h))
                        .transpose()?,
                    coded_type: p.coded_type.clone(),
                    bit_length: p.bit_length,
                    request_byte_position: p.request_byte_position,
                    byte_length: p.byte_length,
                    other_type: p.other_type.clone(),
                })
            })
            .collect()
    }

    // --- Framing ---

    fn header(&mut self) -> Result<(), SerializationError> {
        let g = self.graph;
        self.write(
            rec::Header {
                format_version: rec::FORMAT_VERSION,
                archive_name: g.archive_name.clone(),
                documents: g.documents.clone(),
                layer_count: g.layers.len() as u32,
                diagnostic_count: g.diagnostic_count,
            }
            .into(),
        )
    }

    fn trailer(&mut self) -> Result<(), SerializationError> {
        let record_count = self.records;
        self.write(rec::Trailer { record_count }.into())
    }

    // --- Layers ---

    fn layer(&mut self, id: LayerId) -> Result<(), SerializationError> {
        let graph = self.graph;
        let layer = get(&graph.layers, "layers", id.0)?;
        self.first_time(NodeKind::Layer, id.0);

        let parents = layer
            .parents
            .iter()
            .map(|p| {
                Ok(rec::ParentRef {
                    target: Some(self.link(&p.target, NodeKind::Layer, NodeRef::Layer)?),
                    not_inherited_diag_comms: p.not_inherited_diag_comms.clone(),
                    not_inherited_dops: p.not_inherited_dops.clone(),
                })
            })
            .collect::<Result<Vec<_>, SerializationError>>()?;
        let services = layer
            .services
            .iter()
            .map(|s| self.link(s, NodeKind::Service, NodeRef::Service))
            .collect::<Result<Vec<_>, _>>()?;
        let data_object_props = layer
            .data_object_props
            .iter()
            .map(|d| self.check(NodeRef::Dop(*d)))
            .collect::<Result<Vec<_>, _>>()?;
        let comparam_values = layer
            .comparam_values
            .iter()
            .map(|v| self.comparam_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        let protocol_spec = layer
            .protocol_spec
            .as_ref()
            .map(|l| self.link(l, NodeKind::Protocol, NodeRef::Protocol))
            .transpose()?;

        let effective = &layer.effective;
        let comparam_set = match effective.comparam_set {
            Some(set) => {
                get(&graph.comparam_sets, "comparam sets", set.0)?;
                Some(set.0)
            }
            None => None,
        };
        let effective = rec::EffectiveMembers {
            services: effective
                .services
                .iter()
                .map(|s| Ok(NodeLink::resolved(NodeKind::Service, self.check(NodeRef::Service(*s))?)))
                .collect::<Result<Vec<_>, SerializationError>>()?,
            data_object_props: effective
                .data_object_props
                .iter()
                .map(|d| self.check(NodeRef::Dop(*d)))
                .collect::<Result<Vec<_>, _>>()?,
            comparam_set,
            protocols: effective
                .protocols
                .iter()
                .map(|p| self.check(NodeRef::Layer(*p)))
                .collect::<Result<Vec<_>, _>>()?,
        };

        self.write(
            rec::Layer {
                index: id.0,
                id: layer.id.clone(),
                short_name: layer.short_name.clone(),
                long_name: layer.long_name.clone(),
                kind: layer.kind as i32,
                document: layer.document.clone(),
                parents,
                services,
                data_object_props,
                comparam_values,
                protocol_spec,
                variant_patterns: layer.variant_patterns.clone(),
                effective: Some(effective),
            }
            .into(),
        )
    }

    fn layer_dependencies(&mut self, id: LayerId) -> Result<(), SerializationError> {
        let graph = self.graph;
        let layer = get(&graph.layers, "layers", id.0)?;

        let services = layer.services.iter().filter_map(Link::resolved);
        for service in services.chain(layer.effective.services.iter().copied()) {
            self.service(service)?;
        }
        for dop in layer.data_object_props.iter().chain(&layer.effective.data_object_props) {
            self.dop(*dop)?;
        }
        for value in &layer.comparam_values {
            if let Link::Resolved(cp) = value.comparam {
                self.comparam(cp)?;
            }
        }
        if let Some(set) = layer.effective.comparam_set {
            self.comparam_set(set)?;
        }
        if let Some(Link::Resolved(protocol)) = layer.protocol_spec {
            self.protocol(protocol)?;
        }
        for protocol_layer in &layer.effective.protocols {
            let protocol_layer = get(&graph.layers, "layers", protocol_layer.0)?;
            if let Some(Link::Resolved(protocol)) = protocol_layer.protocol_spec {
                self.protocol(protocol)?;
            }
        }
        Ok(())
    }

    // --- Data dictionary ---

    fn unit(&mut self, id: UnitId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Unit, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let unit = get(&graph.units, "units", id.0)?;
        self.write(
            rec::Unit {
                index: id.0,
                ids: unit.ids.clone(),
                fingerprint: unit.fingerprint.clone(),
                short_name: unit.short_name.clone(),
                display_name: unit.display_name.clone(),
                factor_si_to_unit: unit.factor_si_to_unit.clone(),
                offset_si_to_unit: unit.offset_si_to_unit.clone(),
            }
            .into(),
        )
    }

    fn dop(&mut self, id: DopId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::DataObjectProp, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let dop = get(&graph.data_object_props, "data object props", id.0)?;
        let unit = dop
            .unit
            .as_ref()
            .map(|l| self.link(l, NodeKind::Unit, NodeRef::Unit))
            .transpose()?;
        self.write(
            rec::DataObjectProp {
                index: id.0,
                ids: dop.ids.clone(),
                fingerprint: dop.fingerprint.clone(),
                short_name: dop.short_name.clone(),
                long_name: dop.long_name.clone(),
                compu_method: Some(dop.compu_method.clone()),
                coded_type: Some(dop.coded_type.clone()),
                physical_type: Some(dop.physical_type.clone()),
                unit,
            }
            .into(),
        )?;
        if let Some(Link::Resolved(unit)) = dop.unit {
            self.unit(unit)?;
        }
        Ok(())
    }

    fn dtc_dop(&mut self, id: DtcDopId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::DtcDop, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let dop = get(&graph.dtc_dops, "DTC DOPs", id.0)?;
        self.write(
            rec::DtcDop {
                index: id.0,
                id: dop.id.clone(),
                short_name: dop.short_name.clone(),
                coded_type: Some(dop.coded_type.clone()),
                dtcs: dop.dtcs.clone(),
            }
            .into(),
        )
    }

    fn structure(&mut self, id: StructureId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Structure, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let structure = get(&graph.structures, "structures", id.0)?;
        let params = self.params(&structure.params)?;
        self.write(
            rec::Structure {
                index: id.0,
                id: structure.id.clone(),
                short_name: structure.short_name.clone(),
                byte_size: structure.byte_size,
                params,
            }
            .into(),
        )?;
        self.param_dependencies(&structure.params)
    }

    fn opaque(&mut self, id: OpaqueId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Opaque, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let node = get(&graph.opaque, "opaque nodes", id.0)?;
        self.write(
            rec::OpaqueNode {
                index: id.0,
                id: node.id.clone(),
                element: node.element.clone(),
                short_name: node.short_name.clone(),
            }
            .into(),
        )
    }

    fn param_dependencies(&mut self, params: &[Param]) -> Result<(), SerializationError> {
        for param in params {
            match param.dop {
                Some(Link::Resolved(NodeRef::Dop(d))) => self.dop(d)?,
                Some(Link::Resolved(NodeRef::DtcDop(d))) => self.dtc_dop(d)?,
                Some(Link::Resolved(NodeRef::Structure(s))) => self.structure(s)?,
                Some(Link::Resolved(NodeRef::Opaque(o))) => self.opaque(o)?,
                _ => {}
            }
        }
        Ok(())
    }

    // --- Diagnostic communication ---

    fn service(&mut self, id: ServiceId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Service, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let service = get(&graph.services, "services", id.0)?;
        let request = service
            .request
            .as_ref()
            .map(|l| self.link(l, NodeKind::Request, NodeRef::Request))
            .transpose()?;
        let pos_responses = service
            .pos_responses
            .iter()
            .map(|l| self.link(l, NodeKind::Response, NodeRef::Response))
            .collect::<Result<Vec<_>, _>>()?;
        let neg_responses = service
            .neg_responses
            .iter()
            .map(|l| self.link(l, NodeKind::Response, NodeRef::Response))
            .collect::<Result<Vec<_>, _>>()?;
        self.write(
            rec::Service {
                index: id.0,
                id: service.id.clone(),
                short_name: service.short_name.clone(),
                long_name: service.long_name.clone(),
                semantic: service.semantic.clone(),
                addressing: service.addressing.clone(),
                request,
                pos_responses,
                neg_responses,
            }
            .into(),
        )?;

        if let Some(Link::Resolved(request)) = service.request {
            self.request(request)?;
        }
        for response in service.pos_responses.iter().chain(&service.neg_responses) {
            if let Link::Resolved(response) = response {
                self.response(*response)?;
            }
        }
        Ok(())
    }

    fn request(&mut self, id: RequestId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Request, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let request = get(&graph.requests, "requests", id.0)?;
        let params = self.params(&request.params)?;
        self.write(
            rec::Request {
                index: id.0,
                id: request.id.clone(),
                short_name: request.short_name.clone(),
                params,
            }
            .into(),
        )?;
        self.param_dependencies(&request.params)
    }

    fn response(&mut self, id: ResponseId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Response, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let response = get(&graph.responses, "responses", id.0)?;
        let params = self.params(&response.params)?;
        self.write(
            rec::Response {
                index: id.0,
                id: response.id.clone(),
                short_name: response.short_name.clone(),
                kind: response.kind as i32,
                params,
            }
            .into(),
        )?;
        self.param_dependencies(&response.params)
    }

    // --- Communication parameters ---

    fn subset(&mut self, id: SubsetId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::ComParamSubset, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let subset = get(&graph.comparam_subsets, "comparam subsets", id.0)?;
        let comparams = subset
            .comparams
            .iter()
            .map(|cp| self.check(NodeRef::ComParam(*cp)))
            .collect::<Result<Vec<_>, _>>()?;
        self.write(
            rec::ComParamSubset {
                index: id.0,
                id: subset.id.clone(),
                short_name: subset.short_name.clone(),
                category: subset.category.clone(),
                comparams,
            }
            .into(),
        )?;
        for cp in &subset.comparams {
            self.comparam(*cp)?;
        }
        Ok(())
    }

    fn comparam(&mut self, id: ComParamId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::ComParam, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let cp = get(&graph.comparams, "comparams", id.0)?;
        let subset = cp
            .subset
            .map(|s| self.check(NodeRef::Subset(s)))
            .transpose()?;
        let dop = cp
            .dop
            .as_ref()
            .map(|l| self.link(l, NodeKind::DataObjectProp, NodeRef::Dop))
            .transpose()?;
        self.write(
            rec::ComParam {
                index: id.0,
                id: cp.id.clone(),
                short_name: cp.short_name.clone(),
                param_class: cp.param_class.clone(),
                cp_type: cp.cp_type.clone(),
                physical_default_value: cp.physical_default_value.clone(),
                subset,
                dop,
            }
            .into(),
        )?;
        if let Some(Link::Resolved(dop)) = cp.dop {
            self.dop(dop)?;
        }
        Ok(())
    }

    fn comparam_set(&mut self, id: ComParamSetId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::ComParamSet, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let set = get(&graph.comparam_sets, "comparam sets", id.0)?;
        let entries = set
            .entries
            .iter()
            .map(|v| self.comparam_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        self.write(
            rec::ComParamSet {
                index: id.0,
                fingerprint: set.fingerprint.clone(),
                entries,
            }
            .into(),
        )?;
        for entry in &set.entries {
            if let Link::Resolved(cp) = entry.comparam {
                self.comparam(cp)?;
            }
        }
        Ok(())
    }

    fn protocol(&mut self, id: ProtocolId) -> Result<(), SerializationError> {
        if !self.first_time(NodeKind::Protocol, id.0) {
            return Ok(());
        }
        let graph = self.graph;
        let protocol = get(&graph.protocols, "protocols", id.0)?;
        let prot_stacks = protocol
            .prot_stacks
            .iter()
            .map(|stack| {
                Ok(rec::ProtStack {
                    short_name: stack.short_name.clone(),
                    pdu_protocol_type: stack.pdu_protocol_type.clone(),
                    physical_link_type: stack.physical_link_type.clone(),
                    comparam_subsets: stack
                        .comparam_subsets
                        .iter()
                        .map(|l| self.link(l, NodeKind::ComParamSubset, NodeRef::Subset))
                        .collect::<Result<Vec<_>, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, SerializationError>>()?;
        self.write(
            rec::ProtocolDescription {
                index: id.0,
                ids: protocol.ids.clone(),
                fingerprint: protocol.fingerprint.clone(),
                short_name: protocol.short_name.clone(),
                prot_stacks,
            }
            .into(),
        )?;
        for stack in &protocol.prot_stacks {
            for subset in &stack.comparam_subsets {
                if let Link::Resolved(subset) = subset {
                    self.subset(*subset)?;
                }
            }
        }
        Ok(())
    }

    // --- Leftovers ---

    /// Entries no layer reaches, e.g. content of skipped layers.
    fn remaining(&mut self) -> Result<(), SerializationError> {
        let g = self.graph;
        for i in 0..g.units.len() as u32 {
            self.unit(UnitId(i))?;
        }
        for i in 0..g.data_object_props.len() as u32 {
            self.dop(DopId(i))?;
        }
        for i in 0..g.dtc_dops.len() as u32 {
            self.dtc_dop(DtcDopId(i))?;
        }
        for i in 0..g.structures.len() as u32 {
            self.structure(StructureId(i))?;
        }
        for i in 0..g.opaque.len() as u32 {
            self.opaque(OpaqueId(i))?;
        }
        for i in 0..g.services.len() as u32 {
            self.service(ServiceId(i))?;
        }
        for i in 0..g.requests.len() as u32 {
            self.request(RequestId(i))?;
        }
        for i in 0..g.responses.len() as u32 {
            self.response(ResponseId(i))?;
        }
        for i in 0..g.comparam_subsets.len() as u32 {
            self.subset(SubsetId(i))?;
        }
        for i in 0..g.comparams.len() as u32 {
            self.comparam(ComParamId(i))?;
        }
        for i in 0..g.comparam_sets.len() as u32 {
            self.comparam_set(ComParamSetId(i))?;
        }
        for i in 0..g.protocols.len() as u32 {
            self.protocol(ProtocolId(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComParamSet, EffectiveMembers, Layer, Unit};
    use odx_records::record::Body;
    use odx_records::LayerKind;

    fn sample_graph() -> ResolvedGraph {
        let mut graph = ResolvedGraph {
            archive_name: "ECU_TEST".to_string(),
            documents: vec!["ecu.odx-d".to_string()],
            ..Default::default()
        };
        graph.units.push(Unit {
            ids: vec!["UNIT_rpm".into()],
            fingerprint: "ab".into(),
            short_name: "rpm".into(),
            display_name: "1/min".into(),
            factor_si_to_unit: None,
            offset_si_to_unit: None,
        });
        graph.comparam_sets.push(ComParamSet {
            fingerprint: "cd".into(),
            entries: vec![ComParamValue {
                short_name: "CP_P2Max".into(),
                value: "25".into(),
                protocol: None,
                comparam: Link::Unresolved { id_ref: "CP_P2".into() },
            }],
        });
        graph.layers.push(Layer {
            id: "BV".into(),
            short_name: "Engine".into(),
            long_name: None,
            kind: LayerKind::BaseVariant,
            document: "ecu.odx-d".into(),
            parents: Vec::new(),
            services: Vec::new(),
            data_object_props: Vec::new(),
            comparam_values: Vec::new(),
            protocol_spec: None,
            variant_patterns: Vec::new(),
            effective: EffectiveMembers {
                comparam_set: Some(ComParamSetId(0)),
                ..Default::default()
            },
        });
        graph
    }

    #[test]
    fn test_stream_layout() {
        let graph = sample_graph();
        let records = rec::decode_all(&serialize(&graph).unwrap()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.body_name()).collect();
        // The unit is referenced by no layer and comes after the layer's set.
        assert_eq!(names, vec!["Header", "Layer", "ComParamSet", "Unit", "Trailer"]);

        match &records[0].body {
            Some(Body::Header(h)) => {
                assert_eq!(h.format_version, rec::FORMAT_VERSION);
                assert_eq!(h.archive_name, "ECU_TEST");
                assert_eq!(h.layer_count, 1);
            }
            other => panic!("Expected header, got {:?}", other),
        }
        match &records[4].body {
            Some(Body::Trailer(t)) => assert_eq!(t.record_count, 4),
            other => panic!("Expected trailer, got {:?}", other),
        }
        match &records[2].body {
            Some(Body::ComParamSet(set)) => {
                let link = set.entries[0].comparam.as_ref().unwrap();
                assert!(!link.is_resolved());
                assert_eq!(link.unresolved_id.as_deref(), Some("CP_P2"));
            }
            other => panic!("Expected comparam set, got {:?}", other),
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let graph = sample_graph();
        assert_eq!(serialize(&graph).unwrap(), serialize(&graph).unwrap());
    }

    #[test]
    fn test_dangling_index_is_an_error() {
        let mut graph = sample_graph();
        graph.layers[0].data_object_props.push(DopId(7));
        match serialize(&graph) {
            Err(SerializationError::DanglingIndex { index, .. }) => assert_eq!(index, 7),
            other => panic!("Expected dangling index, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_write_atomic_publishes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecu.rec");
        let records = write_atomic(&sample_graph(), &path).unwrap();
        assert_eq!(records, 5);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, serialize(&sample_graph()).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
