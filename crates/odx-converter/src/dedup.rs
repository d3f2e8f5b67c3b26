// crates/odx-converter/src/dedup.rs

//! Structural fingerprints and merging of shared structures.
//!
//! Units, data object properties, comparam sets and protocol descriptions
//! are encoded into canonical bytes: identifiers left out, numeric text
//! normalized, referenced shared content embedded by value. The fingerprint
//! is the SHA-256 of those bytes. Entries merge only when both the
//! fingerprint and the full bytes are equal.
//!
//! Each table is then rebuilt ordered by (fingerprint, lowest identifier),
//! which makes the result independent of document order. Running the pass a
//! second time changes nothing.

use crate::types::{
    ComParamSet, ComParamSetId, ComParamValue, DopId, Link, NodeRef, Param, ProtocolId,
    ResolvedGraph, UnitId,
};
use odx_records::{CompuMethod, DiagCodedType};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// --- Canonical encoding ---

/// Length-prefixed, tagged byte encoding. Every optional value and every
/// list carries a marker, so distinct contents never share an encoding.
#[derive(Default)]
struct Canonical {
    bytes: Vec<u8>,
}

impl Canonical {
    fn text(&mut self, s: &str) {
        self.count(s.len());
        self.bytes.extend_from_slice(s.as_bytes());
    }

    fn opt_text(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.bytes.push(1);
                self.text(s);
            }
            None => self.bytes.push(0),
        }
    }

    fn number(&mut self, s: &str) {
        self.text(&normalize_number(s));
    }

    fn opt_number(&mut self, s: Option<&str>) {
        self.opt_text(s.map(normalize_number).as_deref());
    }

    fn opt_u32(&mut self, v: Option<u32>) {
        match v {
            Some(v) => {
                self.bytes.push(1);
                self.bytes.extend_from_slice(&v.to_le_bytes());
            }
            None => self.bytes.push(0),
        }
    }

    fn opt_bool(&mut self, v: Option<bool>) {
        self.bytes.push(match v {
            None => 0,
            Some(false) => 1,
            Some(true) => 2,
        });
    }

    fn count(&mut self, n: usize) {
        self.bytes.extend_from_slice(&(n as u64).to_le_bytes());
    }

    fn nested(&mut self, bytes: &[u8]) {
        self.count(bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    /// A reference that could not be resolved is part of the content.
    fn unresolved(&mut self, id_ref: &str) {
        self.bytes.push(0xff);
        self.text(id_ref);
    }
}

/// `"1.0"`, `"1"` and `"1e0"` encode the same. Text that is not a decimal
/// number (hex, enums) is only trimmed.
fn normalize_number(s: &str) -> String {
    let t = s.trim();
    match t.parse::<f64>() {
        Ok(v) if v == 0.0 => "0".to_string(),
        Ok(v) if v.is_finite() => v.to_string(),
        _ => t.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Content {
    fingerprint: String,
    bytes: Vec<u8>,
}

impl Content {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            fingerprint: hex::encode(Sha256::digest(&bytes)),
            bytes,
        }
    }
}

fn unit_content(graph: &ResolvedGraph, unit: UnitId) -> Content {
    let unit = &graph.units[unit.index()];
    let mut c = Canonical::default();
    c.text(&unit.short_name);
    c.text(unit.display_name.trim());
    c.opt_number(unit.factor_si_to_unit.as_deref());
    c.opt_number(unit.offset_si_to_unit.as_deref());
    Content::new(c.bytes)
}

fn compu_method(c: &mut Canonical, method: &CompuMethod) {
    c.text(&method.category);
    c.count(method.scales.len());
    for scale in &method.scales {
        c.opt_number(scale.lower_limit.as_deref());
        c.opt_number(scale.upper_limit.as_deref());
        c.opt_text(scale.text.as_deref());
        c.opt_number(scale.constant.as_deref());
        c.count(scale.numerators.len());
        for n in &scale.numerators {
            c.number(n);
        }
        c.count(scale.denominators.len());
        for d in &scale.denominators {
            c.number(d);
        }
    }
}

fn coded_type(c: &mut Canonical, t: &DiagCodedType) {
    c.text(&t.kind);
    c.text(&t.base_data_type);
    c.opt_u32(t.bit_length);
    c.opt_u32(t.min_length);
    c.opt_u32(t.max_length);
    c.opt_text(t.termination.as_deref());
    c.opt_bool(t.high_low_byte_order);
    c.opt_text(t.bit_mask.as_deref());
}

fn dop_content(graph: &ResolvedGraph, dop: DopId, units: &[Content]) -> Content {
    let dop = &graph.data_object_props[dop.index()];
    let mut c = Canonical::default();
    c.text(&dop.short_name);
    c.opt_text(dop.long_name.as_deref());
    compu_method(&mut c, &dop.compu_method);
    coded_type(&mut c, &dop.coded_type);
    c.text(&dop.physical_type.base_data_type);
    c.opt_text(dop.physical_type.display_radix.as_deref());
    c.opt_u32(dop.physical_type.precision);
    match &dop.unit {
        None => c.bytes.push(0),
        Some(Link::Resolved(unit)) => {
            c.bytes.push(1);
            c.nested(&units[unit.index()].bytes);
        }
        Some(Link::Unresolved { id_ref }) => c.unresolved(id_ref),
    }
    Content::new(c.bytes)
}

fn comparam_value(c: &mut Canonical, graph: &ResolvedGraph, value: &ComParamValue) {
    c.text(&value.short_name);
    c.number(&value.value);
    c.opt_text(value.protocol.as_deref());
    match &value.comparam {
        // Comparams are not merged; their identifier is their identity.
        Link::Resolved(cp) => {
            c.bytes.push(1);
            c.text(&graph.comparams[cp.index()].id);
        }
        Link::Unresolved { id_ref } => c.unresolved(id_ref),
    }
}

fn comparam_set_content(graph: &ResolvedGraph, set: ComParamSetId) -> Content {
    let mut entries: Vec<&ComParamValue> = graph.comparam_sets[set.index()].entries.iter().collect();
    entries.sort_by(|a, b| (&a.short_name, &a.protocol).cmp(&(&b.short_name, &b.protocol)));
    let mut c = Canonical::default();
    c.count(entries.len());
    for entry in entries {
        comparam_value(&mut c, graph, entry);
    }
    Content::new(c.bytes)
}

fn protocol_content(graph: &ResolvedGraph, protocol: ProtocolId) -> Content {
    let protocol = &graph.protocols[protocol.index()];
    let mut c = Canonical::default();
    c.text(&protocol.short_name);
    c.count(protocol.prot_stacks.len());
    for stack in &protocol.prot_stacks {
        c.text(&stack.short_name);
        c.opt_text(stack.pdu_protocol_type.as_deref());
        c.opt_text(stack.physical_link_type.as_deref());
        c.count(stack.comparam_subsets.len());
        for subset in &stack.comparam_subsets {
            let subset = match subset {
                Link::Resolved(s) => &graph.comparam_subsets[s.index()],
                Link::Unresolved { id_ref } => {
                    c.unresolved(id_ref);
                    continue;
                }
            };
            c.bytes.push(1);
            c.text(&subset.short_name);
            c.opt_text(subset.category.as_deref());
            c.count(subset.comparams.len());
            for cp in &subset.comparams {
                let cp = &graph.comparams[cp.index()];
                c.text(&cp.short_name);
                c.opt_text(cp.param_class.as_deref());
                c.opt_text(cp.cp_type.as_deref());
                c.opt_number(cp.physical_default_value.as_deref());
            }
        }
    }
    Content::new(c.bytes)
}

// --- Merge plan ---

/// Old-to-new index mapping for one table.
struct Plan {
    /// Old indices per new slot; the first one is kept, the rest merge into it.
    slots: Vec<Vec<usize>>,
    remap: Vec<u32>,
}

impl Plan {
    /// `ids[i]` is the lowest identifier of entry `i` (empty when it has none).
    fn new(contents: &[Content], ids: &[&str]) -> Self {
        let mut groups: BTreeMap<(&str, &[u8]), Vec<usize>> = BTreeMap::new();
        for (i, content) in contents.iter().enumerate() {
            groups
                .entry((content.fingerprint.as_str(), content.bytes.as_slice()))
                .or_default()
                .push(i);
        }
        let mut slots: Vec<((&str, &str, &[u8]), Vec<usize>)> = groups
            .into_iter()
            .map(|((fingerprint, bytes), mut members)| {
                members.sort_by(|a, b| ids[*a].cmp(ids[*b]).then(a.cmp(b)));
                let lowest = ids[members[0]];
                ((fingerprint, lowest, bytes), members)
            })
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let mut remap = vec![0u32; contents.len()];
        for (slot, (_, members)) in slots.iter().enumerate() {
            for &old in members {
                remap[old] = slot as u32;
            }
        }
        Self {
            slots: slots.into_iter().map(|(_, members)| members).collect(),
            remap,
        }
    }

    fn new_index(&self, old: usize) -> u32 {
        self.remap[old]
    }

    /// Rebuilds a table: one entry per slot, `merge` folds the duplicates in.
    fn apply<T>(&self, items: Vec<T>, mut merge: impl FnMut(&mut T, T)) -> Vec<T> {
        let mut items: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let mut out = Vec::with_capacity(self.slots.len());
        for members in &self.slots {
            let mut rest = members.iter().filter_map(|&i| items[i].take());
            if let Some(mut canonical) = rest.next() {
                for duplicate in rest {
                    merge(&mut canonical, duplicate);
                }
                out.push(canonical);
            }
        }
        out
    }
}

fn merge_ids(into: &mut Vec<String>, from: Vec<String>) {
    into.extend(from);
    into.sort();
    into.dedup();
}

fn lowest(ids: &[String]) -> &str {
    ids.iter().map(String::as_str).min().unwrap_or("")
}

/// Comparam sets carry no identifier. Equal sets may still differ in value
/// text (`"50"` and `"50.0"`), so the one kept is picked by that text.
fn raw_values(set: &ComParamSet) -> String {
    let mut entries: Vec<&ComParamValue> = set.entries.iter().collect();
    entries.sort_by(|a, b| (&a.short_name, &a.protocol).cmp(&(&b.short_name, &b.protocol)));
    entries
        .iter()
        .map(|e| e.value.as_str())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

// --- Passes ---

struct Contents {
    units: Vec<Content>,
    dops: Vec<Content>,
    sets: Vec<Content>,
    protocols: Vec<Content>,
}

fn contents(graph: &ResolvedGraph) -> Contents {
    let units: Vec<Content> = (0..graph.units.len())
        .map(|i| unit_content(graph, UnitId(i as u32)))
        .collect();
    let dops = (0..graph.data_object_props.len())
        .map(|i| dop_content(graph, DopId(i as u32), &units))
        .collect();
    let sets = (0..graph.comparam_sets.len())
        .map(|i| comparam_set_content(graph, ComParamSetId(i as u32)))
        .collect();
    let protocols = (0..graph.protocols.len())
        .map(|i| protocol_content(graph, ProtocolId(i as u32)))
        .collect();
    Contents {
        units,
        dops,
        sets,
        protocols,
    }
}

/// Stores the fingerprint of every shared structure without merging anything.
pub fn fingerprint(graph: &mut ResolvedGraph) {
    let contents = contents(graph);
    for (unit, c) in graph.units.iter_mut().zip(&contents.units) {
        unit.fingerprint = c.fingerprint.clone();
    }
    for (dop, c) in graph.data_object_props.iter_mut().zip(&contents.dops) {
        dop.fingerprint = c.fingerprint.clone();
    }
    for (set, c) in graph.comparam_sets.iter_mut().zip(&contents.sets) {
        set.fingerprint = c.fingerprint.clone();
    }
    for (protocol, c) in graph.protocols.iter_mut().zip(&contents.protocols) {
        protocol.fingerprint = c.fingerprint.clone();
    }
}

/// Fingerprints and merges structurally identical shared structures, then
/// repoints every handle and identifier at the canonical copies.
pub fn canonicalize(graph: &mut ResolvedGraph) {
    fingerprint(graph);
    let contents = contents(graph);

    let unit_ids: Vec<&str> = graph.units.iter().map(|u| lowest(&u.ids)).collect();
    let units = Plan::new(&contents.units, &unit_ids);
    let dop_ids: Vec<&str> = graph.data_object_props.iter().map(|d| lowest(&d.ids)).collect();
    let dops = Plan::new(&contents.dops, &dop_ids);
    let set_keys: Vec<String> = graph.comparam_sets.iter().map(raw_values).collect();
    let set_ids: Vec<&str> = set_keys.iter().map(String::as_str).collect();
    let sets = Plan::new(&contents.sets, &set_ids);
    let protocol_ids: Vec<&str> = graph.protocols.iter().map(|p| lowest(&p.ids)).collect();
    let protocols = Plan::new(&contents.protocols, &protocol_ids);

    graph.units = units.apply(std::mem::take(&mut graph.units), |canonical, duplicate| {
        merge_ids(&mut canonical.ids, duplicate.ids)
    });
    graph.data_object_props = dops.apply(
        std::mem::take(&mut graph.data_object_props),
        |canonical, duplicate| merge_ids(&mut canonical.ids, duplicate.ids),
    );
    graph.comparam_sets = sets.apply(std::mem::take(&mut graph.comparam_sets), |_, _| {});
    graph.protocols = protocols.apply(std::mem::take(&mut graph.protocols), |canonical, duplicate| {
        merge_ids(&mut canonical.ids, duplicate.ids)
    });

    repoint(graph, &units, &dops, &sets, &protocols);
}

fn repoint(graph: &mut ResolvedGraph, units: &Plan, dops: &Plan, sets: &Plan, protocols: &Plan) {
    let dop = |id: DopId| DopId(dops.new_index(id.index()));

    for d in &mut graph.data_object_props {
        if let Some(Link::Resolved(unit)) = &mut d.unit {
            *unit = UnitId(units.new_index(unit.index()));
        }
    }

    for layer in &mut graph.layers {
        layer.data_object_props = unique(layer.data_object_props.iter().map(|d| dop(*d)));
        layer.effective.data_object_props =
            unique(layer.effective.data_object_props.iter().map(|d| dop(*d)));
        if let Some(set) = &mut layer.effective.comparam_set {
            *set = ComParamSetId(sets.new_index(set.index()));
        }
        if let Some(Link::Resolved(p)) = &mut layer.protocol_spec {
            *p = ProtocolId(protocols.new_index(p.index()));
        }
    }

    let repoint_params = |params: &mut [Param]| {
        for param in params.iter_mut() {
            if let Some(Link::Resolved(NodeRef::Dop(d))) = &mut param.dop {
                *d = dop(*d);
            }
        }
    };
    for s in &mut graph.structures {
        repoint_params(&mut s.params);
    }
    for r in &mut graph.requests {
        repoint_params(&mut r.params);
    }
    for r in &mut graph.responses {
        repoint_params(&mut r.params);
    }
    for cp in &mut graph.comparams {
        if let Some(Link::Resolved(d)) = &mut cp.dop {
            *d = dop(*d);
        }
    }

    for handle in graph.ids.values_mut() {
        *handle = match *handle {
            NodeRef::Unit(u) => NodeRef::Unit(UnitId(units.new_index(u.index()))),
            NodeRef::Dop(d) => NodeRef::Dop(dop(d)),
            NodeRef::Protocol(p) => NodeRef::Protocol(ProtocolId(protocols.new_index(p.index()))),
            other => other,
        };
    }
}

/// Keeps the first occurrence of each handle.
fn unique(ids: impl Iterator<Item = DopId>) -> Vec<DopId> {
    let mut out: Vec<DopId> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataObjectProp, Unit};

    fn unit(id: &str, factor: &str) -> Unit {
        Unit {
            ids: vec![id.to_string()],
            fingerprint: String::new(),
            short_name: "rpm".to_string(),
            display_name: "1/min".to_string(),
            factor_si_to_unit: Some(factor.to_string()),
            offset_si_to_unit: None,
        }
    }

    fn dop(id: &str, unit: u32) -> DataObjectProp {
        DataObjectProp {
            ids: vec![id.to_string()],
            fingerprint: String::new(),
            short_name: "EngineSpeed".to_string(),
            long_name: None,
            compu_method: CompuMethod {
                category: "IDENTICAL".to_string(),
                scales: Vec::new(),
            },
            coded_type: DiagCodedType {
                kind: "STANDARD-LENGTH-TYPE".to_string(),
                base_data_type: "A_UINT32".to_string(),
                bit_length: Some(16),
                ..Default::default()
            },
            physical_type: Default::default(),
            unit: Some(Link::Resolved(UnitId(unit))),
        }
    }

    fn graph() -> ResolvedGraph {
        let mut graph = ResolvedGraph::default();
        graph.units = vec![unit("UNIT_B", "1.0"), unit("UNIT_A", "1"), unit("UNIT_C", "2")];
        graph.data_object_props = vec![dop("DOP_2", 0), dop("DOP_1", 1), dop("DOP_3", 2)];
        for (i, u) in graph.units.iter().enumerate() {
            graph.ids.insert(u.ids[0].clone(), NodeRef::Unit(UnitId(i as u32)));
        }
        for (i, d) in graph.data_object_props.iter().enumerate() {
            graph.ids.insert(d.ids[0].clone(), NodeRef::Dop(DopId(i as u32)));
        }
        graph
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number(" 1.0 "), "1");
        assert_eq!(normalize_number("1e3"), "1000");
        assert_eq!(normalize_number("-0.0"), "0");
        assert_eq!(normalize_number("0.25"), "0.25");
        assert_eq!(normalize_number("0x7E0"), "0x7E0");
    }

    #[test]
    fn test_identical_structures_merge() {
        let mut graph = graph();
        canonicalize(&mut graph);

        assert_eq!(graph.units.len(), 2);
        assert_eq!(graph.data_object_props.len(), 2);
        let merged = graph
            .data_object_props
            .iter()
            .find(|d| d.ids.len() == 2)
            .unwrap();
        assert_eq!(merged.ids, vec!["DOP_1", "DOP_2"]);
        assert_eq!(graph.lookup("DOP_1"), graph.lookup("DOP_2"));
        assert_ne!(graph.lookup("DOP_1"), graph.lookup("DOP_3"));
        assert_eq!(graph.lookup("UNIT_A"), graph.lookup("UNIT_B"));

        // The merged DOP points at the merged unit.
        let Some(NodeRef::Dop(d)) = graph.lookup("DOP_1") else {
            panic!("DOP_1 should resolve to a DOP");
        };
        let unit = graph.data_object_props[d.index()].unit.as_ref().and_then(Link::resolved);
        assert_eq!(unit.map(NodeRef::Unit), graph.lookup("UNIT_A"));
        assert_eq!(graph.units[unit.unwrap().index()].ids, vec!["UNIT_A", "UNIT_B"]);
        assert_eq!(merged.fingerprint.len(), 64);
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let mut once = graph();
        canonicalize(&mut once);
        let mut twice = once.clone();
        canonicalize(&mut twice);

        let ids = |g: &ResolvedGraph| -> Vec<Vec<String>> {
            g.data_object_props.iter().map(|d| d.ids.clone()).collect()
        };
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(once.ids, twice.ids);
    }

    #[test]
    fn test_result_is_independent_of_table_order() {
        let mut forward = graph();
        let mut reversed = graph();
        reversed.units.reverse();
        reversed.data_object_props.reverse();
        for d in &mut reversed.data_object_props {
            if let Some(Link::Resolved(u)) = &mut d.unit {
                *u = UnitId(2 - u.0);
            }
        }
        for handle in reversed.ids.values_mut() {
            *handle = match *handle {
                NodeRef::Unit(u) => NodeRef::Unit(UnitId(2 - u.0)),
                NodeRef::Dop(d) => NodeRef::Dop(DopId(2 - d.0)),
                other => other,
            };
        }

        canonicalize(&mut forward);
        canonicalize(&mut reversed);
        assert_eq!(forward.ids, reversed.ids);
        let fingerprints = |g: &ResolvedGraph| -> Vec<String> {
            g.data_object_props.iter().map(|d| d.fingerprint.clone()).collect()
        };
        assert_eq!(fingerprints(&forward), fingerprints(&reversed));
    }

    #[test]
    fn test_comparam_sets_merge_on_equal_entries() {
        let value = |v: &str| ComParamValue {
            short_name: "CP_P2Max".to_string(),
            value: v.to_string(),
            protocol: None,
            comparam: Link::Unresolved { id_ref: "CP_P2".to_string() },
        };
        let mut graph = ResolvedGraph::default();
        for v in ["50", "50.0", "60"] {
            graph.comparam_sets.push(ComParamSet {
                fingerprint: String::new(),
                entries: vec![value(v)],
            });
        }
        canonicalize(&mut graph);
        assert_eq!(graph.comparam_sets.len(), 2);
    }

    #[test]
    fn test_merged_comparam_set_keeps_the_same_text_in_any_order() {
        let set = |v: &str| ComParamSet {
            fingerprint: String::new(),
            entries: vec![ComParamValue {
                short_name: "CP_P2Max".to_string(),
                value: v.to_string(),
                protocol: None,
                comparam: Link::Unresolved { id_ref: "CP_P2".to_string() },
            }],
        };
        for order in [["50.0", "50"], ["50", "50.0"]] {
            let mut graph = ResolvedGraph::default();
            graph.comparam_sets = order.into_iter().map(set).collect();
            canonicalize(&mut graph);
            assert_eq!(graph.comparam_sets.len(), 1);
            assert_eq!(graph.comparam_sets[0].entries[0].value, "50");
        }
    }
}
