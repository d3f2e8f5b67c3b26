// crates/odx-converter/src/resolver/inheritance.rs

//! Layer inheritance: cycle detection and effective member computation.
//!
//! The parent links form a directed graph (parent to child). Layers inside a
//! cycle, and every layer that inherits from one, are skipped: they get no
//! effective members and are removed from the layer table. The content they
//! own stays in the shared tables. All other layers are processed parents
//! first.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::types::{
    ComParamSet, ComParamSetId, ComParamValue, DopId, EffectiveMembers, LayerId, Link, NodeRef,
    ResolvedGraph, ServiceId,
};
use indexmap::IndexMap;
use odx_records::LayerKind;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{BTreeMap, BTreeSet};

/// Parents are applied in this order; later parents override earlier ones.
fn kind_rank(kind: LayerKind) -> u8 {
    match kind {
        LayerKind::Protocol => 0,
        LayerKind::FunctionalGroup => 1,
        LayerKind::EcuSharedData => 2,
        LayerKind::BaseVariant | LayerKind::Unspecified => 3,
        LayerKind::EcuVariant => 4,
    }
}

/// Computes [`EffectiveMembers`] for every layer and drops the layers that
/// take part in or descend from an inheritance cycle.
///
/// `locations` holds the source location of each layer, by layer index.
pub(super) fn apply(graph: &mut ResolvedGraph, locations: &[Location], diagnostics: &mut Diagnostics) {
    let mut dag: DiGraph<usize, ()> = DiGraph::with_capacity(graph.layers.len(), 0);
    let nodes: Vec<NodeIndex> = (0..graph.layers.len()).map(|i| dag.add_node(i)).collect();
    for (child, layer) in graph.layers.iter().enumerate() {
        for parent in &layer.parents {
            if let Link::Resolved(p) = parent.target {
                dag.add_edge(nodes[p.index()], nodes[child], ());
            }
        }
    }

    // Strongly connected components come out children first.
    let mut components = tarjan_scc(&dag);
    components.reverse();

    let mut cyclic: BTreeSet<usize> = BTreeSet::new();
    for component in &components {
        let looped = component.len() == 1 && dag.contains_edge(component[0], component[0]);
        if component.len() > 1 || looped {
            cyclic.extend(component.iter().map(|n| dag[*n]));
        }
    }

    let mut skipped: BTreeMap<usize, Option<usize>> = BTreeMap::new();
    for &start in &cyclic {
        skipped.insert(start, None);
    }
    for &start in &cyclic {
        let mut dfs = Dfs::new(&dag, nodes[start]);
        while let Some(n) = dfs.next(&dag) {
            skipped.entry(dag[n]).or_insert(Some(start));
        }
    }
    for (&layer, &via) in &skipped {
        let name = &graph.layers[layer].short_name;
        let message = match via {
            None => format!("layer '{}' is part of an inheritance cycle; skipped", name),
            Some(ancestor) => format!(
                "layer '{}' inherits from '{}', which is part of an inheritance cycle; skipped",
                name, graph.layers[ancestor].short_name
            ),
        };
        let location = locations.get(layer).cloned().unwrap_or_default();
        diagnostics.report(DiagnosticKind::CyclicInheritance, location, message);
    }

    for component in &components {
        let layer = dag[component[0]];
        if component.len() == 1 && !skipped.contains_key(&layer) {
            let effective = effective_members(graph, layer);
            graph.layers[layer].effective = effective;
        }
    }

    remove_layers(graph, &skipped.keys().copied().collect());
}

fn effective_members(graph: &mut ResolvedGraph, layer: usize) -> EffectiveMembers {
    let current = &graph.layers[layer];

    let mut parents: Vec<_> = current
        .parents
        .iter()
        .filter_map(|p| p.target.resolved().map(|id| (id, p)))
        .collect();
    parents.sort_by_key(|(id, _)| kind_rank(graph.layers[id.index()].kind));

    let mut services: IndexMap<&str, ServiceId> = IndexMap::new();
    let mut dops: IndexMap<&str, DopId> = IndexMap::new();
    let mut comparams: IndexMap<(&str, Option<&str>), &ComParamValue> = IndexMap::new();
    let mut protocols: Vec<LayerId> = Vec::new();

    for (parent_id, link) in &parents {
        let parent = &graph.layers[parent_id.index()].effective;
        for &service in &parent.services {
            let name = graph.services[service.index()].short_name.as_str();
            if !link.not_inherited_diag_comms.iter().any(|n| n == name) {
                services.insert(name, service);
            }
        }
        for &dop in &parent.data_object_props {
            let name = graph.data_object_props[dop.index()].short_name.as_str();
            if !link.not_inherited_dops.iter().any(|n| n == name) {
                dops.insert(name, dop);
            }
        }
        if let Some(set) = parent.comparam_set {
            for entry in &graph.comparam_sets[set.index()].entries {
                comparams.insert((entry.short_name.as_str(), entry.protocol.as_deref()), entry);
            }
        }
        for protocol in &parent.protocols {
            if !protocols.contains(protocol) {
                protocols.push(*protocol);
            }
        }
    }

    for service in current.services.iter().filter_map(Link::resolved) {
        services.insert(graph.services[service.index()].short_name.as_str(), service);
    }
    for &dop in &current.data_object_props {
        dops.insert(graph.data_object_props[dop.index()].short_name.as_str(), dop);
    }
    for value in &current.comparam_values {
        comparams.insert((value.short_name.as_str(), value.protocol.as_deref()), value);
    }
    let own_id = LayerId(layer as u32);
    if current.kind == LayerKind::Protocol && !protocols.contains(&own_id) {
        protocols.push(own_id);
    }

    let mut entries: Vec<ComParamValue> = comparams.into_values().cloned().collect();
    entries.sort_by(|a, b| (&a.short_name, &a.protocol).cmp(&(&b.short_name, &b.protocol)));
    let services = services.into_values().collect();
    let data_object_props = dops.into_values().collect();

    let comparam_set = if entries.is_empty() {
        None
    } else {
        let id = ComParamSetId(graph.comparam_sets.len() as u32);
        graph.comparam_sets.push(ComParamSet {
            fingerprint: String::new(),
            entries,
        });
        Some(id)
    };

    EffectiveMembers {
        services,
        data_object_props,
        comparam_set,
        protocols,
    }
}

/// Drops `removed` from the layer table and renumbers the remaining handles.
fn remove_layers(graph: &mut ResolvedGraph, removed: &BTreeSet<usize>) {
    if removed.is_empty() {
        return;
    }
    let mut remap: Vec<Option<LayerId>> = Vec::with_capacity(graph.layers.len());
    let mut next = 0u32;
    for i in 0..graph.layers.len() {
        if removed.contains(&i) {
            remap.push(None);
        } else {
            remap.push(Some(LayerId(next)));
            next += 1;
        }
    }
    let renumber = |id: LayerId| remap[id.index()];

    let layers = std::mem::take(&mut graph.layers);
    graph.layers = layers
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, mut layer)| {
            for parent in &mut layer.parents {
                // Parents of a kept layer are kept as well.
                if let Link::Resolved(p) = parent.target {
                    if let Some(p) = renumber(p) {
                        parent.target = Link::Resolved(p);
                    }
                }
            }
            layer.effective.protocols = layer
                .effective
                .protocols
                .iter()
                .filter_map(|p| renumber(*p))
                .collect();
            layer
        })
        .collect();

    graph.ids.retain(|_, handle| match handle {
        NodeRef::Layer(id) => match renumber(*id) {
            Some(new) => {
                *id = new;
                true
            }
            None => false,
        },
        _ => true,
    });
}
