// crates/odx-converter/src/resolver/mod.rs

//! Turns the identifier index into a [`ResolvedGraph`].
//!
//! Resolution runs in three passes:
//!
//! 1. Every `ID-REF` is checked against the index; missing targets are
//!    reported once, at the referencing node.
//! 2. Each definition is converted into its table, in discovery order. Links
//!    become typed handles, or [`Link::Unresolved`](crate::types::Link)
//!    placeholders when the target is missing or of the wrong kind.
//! 3. Layer inheritance is applied (see `inheritance`).

mod comm;
mod comparam;
mod data;
mod inheritance;
mod layers;
mod linker;

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::index::CrossReferenceIndex;
use crate::loader::LoadedDocument;
use crate::node::NodeView;
use crate::types::{ComParamId, DopId, NodeRef, ResolvedGraph, SubsetId};
use linker::{Handles, Linker};
use std::collections::BTreeMap;

/// Resolves every reference of the indexed documents.
///
/// Never fails: every problem is recorded in `diagnostics` and the affected
/// node is kept with placeholders in place of what could not be resolved.
pub fn resolve(
    index: &CrossReferenceIndex<'_>,
    documents: &[LoadedDocument],
    diagnostics: &mut Diagnostics,
) -> ResolvedGraph {
    check_references(index, diagnostics);

    let handles = Handles::assign(index);
    let linker = Linker {
        index,
        handles: &handles,
    };

    // Membership is known only once the children have been seen, so collect
    // it before converting the owners.
    let mut layer_dops: BTreeMap<usize, Vec<DopId>> = BTreeMap::new();
    let mut subset_comparams: BTreeMap<usize, Vec<ComParamId>> = BTreeMap::new();
    for (position, def) in index.definitions().iter().enumerate() {
        match handles.at(position) {
            Some(NodeRef::Dop(dop)) => {
                if let Some(owner) = def.owner_layer {
                    layer_dops.entry(owner).or_default().push(dop);
                }
            }
            Some(NodeRef::ComParam(cp)) => {
                if let Some(parent) = def.parent {
                    subset_comparams.entry(parent).or_default().push(cp);
                }
            }
            _ => {}
        }
    }

    let mut graph = ResolvedGraph {
        documents: documents.iter().map(|d| d.name.clone()).collect(),
        ..Default::default()
    };
    let mut layer_locations: Vec<Location> = Vec::new();

    for (position, def) in index.definitions().iter().enumerate() {
        let site = &def.location;
        match def.node {
            NodeView::Layer(kind, layer) => {
                let input = layers::LayerInput {
                    kind,
                    layer,
                    position,
                    location: site,
                    data_object_props: layer_dops.remove(&position).unwrap_or_default(),
                };
                graph.layers.push(layers::layer(input, &linker, diagnostics));
                layer_locations.push(site.clone());
            }
            NodeView::Unit(unit) => graph.units.push(data::unit(unit)),
            NodeView::DataObjectProp(dop) => graph
                .data_object_props
                .push(data::data_object_prop(dop, site, &linker, diagnostics)),
            NodeView::DtcDop(dop) => graph
                .dtc_dops
                .push(data::dtc_dop(dop, site, &linker, diagnostics)),
            NodeView::Structure(s) => graph
                .structures
                .push(data::structure(s, site, &linker, diagnostics)),
            NodeView::Opaque(element, node) => graph.opaque.push(data::opaque(element, node)),
            NodeView::Service(s) => graph
                .services
                .push(comm::service(s, site, &linker, diagnostics)),
            NodeView::Request(m) => graph
                .requests
                .push(comm::request(m, site, &linker, diagnostics)),
            NodeView::Response(kind, m) => graph
                .responses
                .push(comm::response(kind, m, site, &linker, diagnostics)),
            NodeView::ComParamSubset(subset) => graph.comparam_subsets.push(comparam::subset(
                subset,
                subset_comparams.remove(&position).unwrap_or_default(),
            )),
            NodeView::ComParam(cp) => {
                let subset = owning_subset(&handles, def.parent);
                graph
                    .comparams
                    .push(comparam::comparam(cp, subset, site, &linker, diagnostics));
            }
            NodeView::ComplexComParam(cp) => {
                let subset = owning_subset(&handles, def.parent);
                graph.comparams.push(comparam::complex_comparam(cp, subset));
            }
            NodeView::ComParamSpec(spec) => graph
                .protocols
                .push(comparam::protocol(spec, site, &linker, diagnostics)),
            NodeView::Document(_)
            | NodeView::Container(_)
            | NodeView::Dtc(_)
            | NodeView::Param(_)
            | NodeView::ProtStack(_) => {}
        }
        if let (Some(id), Some(handle)) = (def.node.id(), handles.at(position)) {
            graph.ids.insert(id.to_string(), handle);
        }
    }

    inheritance::apply(&mut graph, &layer_locations, diagnostics);
    graph
}

/// Reports every `ID-REF` whose identifier is not defined in any document.
fn check_references(index: &CrossReferenceIndex<'_>, diagnostics: &mut Diagnostics) {
    for site in index.references() {
        if index.contains(site.target.id_ref) {
            continue;
        }
        let docref = site
            .target
            .docref
            .map(|d| format!(" (DOCREF '{}')", d))
            .unwrap_or_default();
        diagnostics.report(
            DiagnosticKind::UnresolvedReference,
            site.location.clone(),
            format!(
                "{} '{}'{} does not name a defined identifier",
                site.field, site.target.id_ref, docref
            ),
        );
    }
}

fn owning_subset(handles: &Handles, parent: Option<usize>) -> Option<SubsetId> {
    match parent.and_then(|p| handles.at(p)) {
        Some(NodeRef::Subset(id)) => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::loader::load_document;
    use crate::types::{LayerId, Link, ServiceId};
    use odx_records::ParamKind;

    fn doc(name: &str, xml: &str) -> LoadedDocument {
        load_document(name, xml.as_bytes(), &ConvertOptions::default())
            .unwrap()
            .unwrap()
    }

    fn resolve_docs(docs: &[LoadedDocument]) -> (ResolvedGraph, Diagnostics) {
        let mut diags = Diagnostics::new();
        let index = CrossReferenceIndex::build(docs, &mut diags);
        let graph = resolve(&index, docs, &mut diags);
        (graph, diags)
    }

    const COMPARAMS: &str = r#"<ODX MODEL-VERSION="2.2.0">
  <COMPARAM-SUBSET ID="CPS_ISO" CATEGORY="TRANSPORT">
    <SHORT-NAME>ISO_15765_2</SHORT-NAME>
    <COMPARAMS>
      <COMPARAM ID="CP_P2" PARAM-CLASS="TIMING" CPTYPE="STANDARD">
        <SHORT-NAME>CP_P2Max</SHORT-NAME>
        <PHYSICAL-DEFAULT-VALUE>50</PHYSICAL-DEFAULT-VALUE>
      </COMPARAM>
    </COMPARAMS>
    <COMPLEX-COMPARAMS>
      <COMPLEX-COMPARAM ID="CP_Ids" PARAM-CLASS="UNIQUE_ID">
        <SHORT-NAME>CP_UniqueRespIdTable</SHORT-NAME>
      </COMPLEX-COMPARAM>
    </COMPLEX-COMPARAMS>
  </COMPARAM-SUBSET>
</ODX>"#;

    const LAYERS: &str = r#"<ODX MODEL-VERSION="2.2.0">
  <DIAG-LAYER-CONTAINER ID="DLC">
    <SHORT-NAME>DLC</SHORT-NAME>
    <BASE-VARIANTS>
      <BASE-VARIANT ID="BV">
        <SHORT-NAME>Engine</SHORT-NAME>
        <DIAG-DATA-DICTIONARY-SPEC>
          <DATA-OBJECT-PROPS>
            <DATA-OBJECT-PROP ID="DOP_RPM">
              <SHORT-NAME>Rpm</SHORT-NAME>
              <COMPU-METHOD><CATEGORY>IDENTICAL</CATEGORY></COMPU-METHOD>
              <DIAG-CODED-TYPE xsi:type="STANDARD-LENGTH-TYPE" BASE-DATA-TYPE="A_UINT32">
                <BIT-LENGTH>16</BIT-LENGTH>
              </DIAG-CODED-TYPE>
              <PHYSICAL-TYPE BASE-DATA-TYPE="A_UINT32"/>
              <UNIT-REF ID-REF="UNIT_MISSING"/>
            </DATA-OBJECT-PROP>
          </DATA-OBJECT-PROPS>
        </DIAG-DATA-DICTIONARY-SPEC>
        <DIAG-COMMS>
          <DIAG-SERVICE ID="DS_Read" SEMANTIC="DATA">
            <SHORT-NAME>ReadRpm</SHORT-NAME>
            <REQUEST-REF ID-REF="RQ_Read"/>
            <POS-RESPONSE-REFS>
              <POS-RESPONSE-REF ID-REF="PR_Read"/>
            </POS-RESPONSE-REFS>
          </DIAG-SERVICE>
          <SINGLE-ECU-JOB ID="JOB_Flash">
            <SHORT-NAME>Flash</SHORT-NAME>
          </SINGLE-ECU-JOB>
          <DIAG-COMM-REF ID-REF="DS_Missing"/>
        </DIAG-COMMS>
        <REQUESTS>
          <REQUEST ID="RQ_Read">
            <SHORT-NAME>RQ_ReadRpm</SHORT-NAME>
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
            <SHORT-NAME>PR_ReadRpm</SHORT-NAME>
            <PARAMS>
              <PARAM xsi:type="VALUE">
                <SHORT-NAME>Rpm</SHORT-NAME>
                <BYTE-POSITION>1</BYTE-POSITION>
                <DOP-REF ID-REF="DOP_RPM"/>
              </PARAM>
              <PARAM xsi:type="VALUE">
                <SHORT-NAME>Wrong</SHORT-NAME>
                <DOP-REF ID-REF="DS_Read"/>
              </PARAM>
            </PARAMS>
          </POS-RESPONSE>
        </POS-RESPONSES>
        <COMPARAM-REFS>
          <COMPARAM-REF ID-REF="CP_P2">
            <SIMPLE-VALUE>25</SIMPLE-VALUE>
            <PROTOCOL-SNREF SHORT-NAME="UDS_CAN"/>
          </COMPARAM-REF>
        </COMPARAM-REFS>
      </BASE-VARIANT>
    </BASE-VARIANTS>
    <ECU-VARIANTS>
      <ECU-VARIANT ID="EV">
        <SHORT-NAME>Engine_V1</SHORT-NAME>
        <DIAG-COMMS>
          <DIAG-COMM-REF ID-REF="JOB_Flash"/>
        </DIAG-COMMS>
        <PARENT-REFS>
          <PARENT-REF ID-REF="BV" xsi:type="BASE-VARIANT-REF"/>
        </PARENT-REFS>
        <ECU-VARIANT-PATTERNS>
          <ECU-VARIANT-PATTERN>
            <MATCHING-PARAMETERS>
              <MATCHING-PARAMETER>
                <EXPECTED-VALUE> 0x01 </EXPECTED-VALUE>
                <DIAG-COMM-SNREF SHORT-NAME="ReadRpm"/>
                <OUT-PARAM-IF-SNREF SHORT-NAME="Rpm"/>
              </MATCHING-PARAMETER>
            </MATCHING-PARAMETERS>
          </ECU-VARIANT-PATTERN>
        </ECU-VARIANT-PATTERNS>
      </ECU-VARIANT>
    </ECU-VARIANTS>
  </DIAG-LAYER-CONTAINER>
</ODX>"#;

    #[test]
    fn test_resolves_links_and_keeps_placeholders() {
        let docs = vec![doc("cp.odx-cs", COMPARAMS), doc("layers.odx-d", LAYERS)];
        let (graph, diags) = resolve_docs(&docs);

        // UNIT-REF and DIAG-COMM-REF are missing, DOP-REF names a service.
        let unresolved: Vec<_> = diags.of_kind(DiagnosticKind::UnresolvedReference).collect();
        assert_eq!(unresolved.len(), 3, "{:?}", unresolved);

        let (base_id, base) = graph.layer_by_name("Engine").unwrap();
        assert_eq!(base_id, LayerId(0));
        assert_eq!(base.document, "layers.odx-d");
        assert_eq!(
            base.services,
            vec![
                Link::Resolved(ServiceId(0)),
                Link::Unresolved {
                    id_ref: "DS_Missing".into()
                },
            ]
        );
        assert_eq!(base.data_object_props, vec![DopId(0)]);

        let dop = &graph.data_object_props[0];
        assert_eq!(
            dop.unit,
            Some(Link::Unresolved {
                id_ref: "UNIT_MISSING".into()
            })
        );
        assert_eq!(dop.coded_type.bit_length, Some(16));

        let service = graph.service(ServiceId(0)).unwrap();
        assert_eq!(service.request.as_ref().and_then(Link::resolved), Some(crate::types::RequestId(0)));
        let response = &graph.responses[0];
        assert_eq!(response.params[0].dop, Some(Link::Resolved(NodeRef::Dop(DopId(0)))));
        assert_eq!(
            response.params[1].dop,
            Some(Link::Unresolved {
                id_ref: "DS_Read".into()
            })
        );
        let request = &graph.requests[0];
        assert_eq!(request.params[0].kind, ParamKind::CodedConst);
        assert_eq!(request.params[0].coded_value.as_deref(), Some("34"));

        let value = &base.comparam_values[0];
        assert_eq!(value.short_name, "CP_P2Max");
        assert_eq!(value.value, "25");
        assert_eq!(value.protocol.as_deref(), Some("UDS_CAN"));
    }

    #[test]
    fn test_comparams_belong_to_their_subset() {
        let docs = vec![doc("cp.odx-cs", COMPARAMS)];
        let (graph, diags) = resolve_docs(&docs);
        assert!(diags.is_empty());

        assert_eq!(graph.comparam_subsets.len(), 1);
        assert_eq!(graph.comparam_subsets[0].comparams, vec![ComParamId(0), ComParamId(1)]);
        assert_eq!(graph.comparams[1].short_name, "CP_UniqueRespIdTable");
        assert_eq!(graph.comparams[1].subset, Some(SubsetId(0)));
        assert_eq!(graph.lookup("CP_P2"), Some(NodeRef::ComParam(ComParamId(0))));
    }

    #[test]
    fn test_variant_inherits_and_skips_job_reference() {
        let docs = vec![doc("cp.odx-cs", COMPARAMS), doc("layers.odx-d", LAYERS)];
        let (graph, _) = resolve_docs(&docs);

        let (variant_id, variant) = graph.layer_by_name("Engine_V1").unwrap();
        assert!(variant.services.is_empty());
        assert_eq!(variant.effective.services, vec![ServiceId(0)]);
        assert_eq!(variant.effective.data_object_props, vec![DopId(0)]);
        assert_eq!(
            graph.effective_comparam(variant_id, "CP_P2Max").map(|v| v.value.as_str()),
            Some("25")
        );
        let pattern = &variant.variant_patterns[0].matching_parameters[0];
        assert_eq!(pattern.expected_value, "0x01");
        assert_eq!(pattern.diag_comm, "ReadRpm");
        assert_eq!(pattern.out_param.as_deref(), Some("Rpm"));
        assert_eq!(graph.opaque[0].element, "SINGLE-ECU-JOB");
    }
}
