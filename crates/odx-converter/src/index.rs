// crates/odx-converter/src/index.rs

//! Identifier index over every loaded document.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::loader::LoadedDocument;
use crate::node::{ElementKind, LinkRef, NodeView};
use std::collections::BTreeMap;

/// The node that defines an identifier.
#[derive(Debug, Clone)]
pub struct Definition<'a> {
    pub kind: ElementKind,
    pub location: Location,
    pub node: NodeView<'a>,
    /// Position (in [`CrossReferenceIndex::definitions`]) of the closest
    /// enclosing definition.
    pub parent: Option<usize>,
    /// Position of the closest enclosing diagnostic layer.
    pub owner_layer: Option<usize>,
}

/// One `ID-REF` occurrence.
#[derive(Debug, Clone)]
pub struct ReferenceSite<'a> {
    /// Location of the node holding the reference.
    pub location: Location,
    pub field: &'static str,
    pub target: LinkRef<'a>,
}

#[derive(Debug, Default)]
pub struct CrossReferenceIndex<'a> {
    definitions: Vec<Definition<'a>>,
    by_id: BTreeMap<&'a str, usize>,
    references: Vec<ReferenceSite<'a>>,
}

impl<'a> CrossReferenceIndex<'a> {
    /// Walks every document in archive order, preorder.
    ///
    /// A second definition of an identifier is reported and ignored; the
    /// first definition wins. The nodes below it are still indexed.
    pub fn build(documents: &'a [LoadedDocument], diagnostics: &mut Diagnostics) -> Self {
        let mut index = CrossReferenceIndex::default();
        for document in documents {
            let root = Location::new(document.name.clone(), "");
            index.visit(document.root(), &root, None, None, diagnostics);
        }
        index
    }

    fn visit(
        &mut self,
        node: NodeView<'a>,
        parent_location: &Location,
        parent: Option<usize>,
        owner_layer: Option<usize>,
        diagnostics: &mut Diagnostics,
    ) {
        let location = parent_location.child(node.element(), node.short_name());
        let mut parent = parent;
        let mut owner_layer = owner_layer;

        let mut duplicate = false;
        if let Some(id) = node.id() {
            if let Some(&first) = self.by_id.get(id) {
                let first = &self.definitions[first];
                diagnostics.report_related(
                    DiagnosticKind::DuplicateIdentifier,
                    location.clone(),
                    first.location.clone(),
                    format!(
                        "identifier '{}' is already defined at {}; keeping the first definition",
                        id, first.location
                    ),
                );
                duplicate = true;
            } else {
                let position = self.definitions.len();
                self.by_id.insert(id, position);
                self.definitions.push(Definition {
                    kind: node.kind(),
                    location: location.clone(),
                    node,
                    parent,
                    owner_layer,
                });
                parent = Some(position);
                if node.kind() == ElementKind::Layer {
                    owner_layer = Some(position);
                }
            }
        }

        if !duplicate {
            for target in node.references() {
                self.references.push(ReferenceSite {
                    location: location.clone(),
                    field: target.field,
                    target,
                });
            }
        }

        // Descendants of a duplicate still count on their own identifiers.
        for child in node.children() {
            self.visit(child, &location, parent, owner_layer, diagnostics);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Definition<'a>> {
        self.by_id.get(id).map(|&i| &self.definitions[i])
    }

    /// Position of the definition of `id` in [`Self::definitions`].
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// All definitions, in discovery order.
    pub fn definitions(&self) -> &[Definition<'a>] {
        &self.definitions
    }

    pub fn references(&self) -> &[ReferenceSite<'a>] {
        &self.references
    }

    /// Every defined identifier, sorted.
    pub fn declared_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_id.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::loader::load_document;

    fn doc(name: &str, xml: &str) -> LoadedDocument {
        load_document(name, xml.as_bytes(), &ConvertOptions::default())
            .unwrap()
            .unwrap()
    }

    const FIRST: &str = r#"<ODX MODEL-VERSION="2.2.0">
  <DIAG-LAYER-CONTAINER ID="DLC_A">
    <SHORT-NAME>DLC_A</SHORT-NAME>
    <BASE-VARIANTS>
      <BASE-VARIANT ID="BV_A">
        <SHORT-NAME>EcuA</SHORT-NAME>
        <DIAG-DATA-DICTIONARY-SPEC>
          <DATA-OBJECT-PROPS>
            <DATA-OBJECT-PROP ID="DOP_1">
              <SHORT-NAME>Speed</SHORT-NAME>
              <UNIT-REF ID-REF="UNIT_MISSING"/>
            </DATA-OBJECT-PROP>
          </DATA-OBJECT-PROPS>
        </DIAG-DATA-DICTIONARY-SPEC>
      </BASE-VARIANT>
    </BASE-VARIANTS>
  </DIAG-LAYER-CONTAINER>
</ODX>"#;

    const SECOND: &str = r#"<ODX MODEL-VERSION="2.2.0">
  <DIAG-LAYER-CONTAINER ID="DLC_B">
    <SHORT-NAME>DLC_B</SHORT-NAME>
    <BASE-VARIANTS>
      <BASE-VARIANT ID="BV_B">
        <SHORT-NAME>EcuB</SHORT-NAME>
        <DIAG-DATA-DICTIONARY-SPEC>
          <DATA-OBJECT-PROPS>
            <DATA-OBJECT-PROP ID="DOP_1">
              <SHORT-NAME>Other</SHORT-NAME>
            </DATA-OBJECT-PROP>
          </DATA-OBJECT-PROPS>
        </DIAG-DATA-DICTIONARY-SPEC>
      </BASE-VARIANT>
    </BASE-VARIANTS>
  </DIAG-LAYER-CONTAINER>
</ODX>"#;

    #[test]
    fn test_definitions_in_discovery_order() {
        let docs = vec![doc("a.odx-d", FIRST)];
        let mut diags = Diagnostics::new();
        let index = CrossReferenceIndex::build(&docs, &mut diags);

        let ids: Vec<&str> = index
            .definitions()
            .iter()
            .filter_map(|d| d.node.id())
            .collect();
        assert_eq!(ids, vec!["DLC_A", "BV_A", "DOP_1"]);
        assert!(diags.is_empty());

        let dop = index.get("DOP_1").unwrap();
        assert_eq!(dop.kind, ElementKind::DataObjectProp);
        assert_eq!(dop.owner_layer, index.position("BV_A"));
        assert_eq!(dop.parent, index.position("BV_A"));
        assert_eq!(index.get("BV_A").unwrap().parent, index.position("DLC_A"));
        assert_eq!(
            dop.location.path,
            "ODX/DIAG-LAYER-CONTAINER[DLC_A]/BASE-VARIANT[EcuA]/DATA-OBJECT-PROP[Speed]"
        );

        let refs = index.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].field, "UNIT-REF");
        assert_eq!(refs[0].target.id_ref, "UNIT_MISSING");
        assert!(!index.contains("UNIT_MISSING"));
    }

    #[test]
    fn test_duplicate_identifier_first_wins() {
        let docs = vec![doc("a.odx-d", FIRST), doc("b.odx-d", SECOND)];
        let mut diags = Diagnostics::new();
        let index = CrossReferenceIndex::build(&docs, &mut diags);

        let dups: Vec<_> = diags.of_kind(DiagnosticKind::DuplicateIdentifier).collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].location.document, "b.odx-d");
        assert_eq!(dups[0].related.as_ref().unwrap().document, "a.odx-d");

        let winner = index.get("DOP_1").unwrap();
        assert_eq!(winner.location.document, "a.odx-d");
        assert_eq!(winner.node.short_name(), Some("Speed"));
        assert_eq!(
            index.declared_ids().collect::<Vec<_>>(),
            vec!["BV_A", "BV_B", "DLC_A", "DLC_B", "DOP_1"]
        );
    }

    #[test]
    fn test_duplicate_keeps_unique_descendants() {
        let second = SECOND.replace("DLC_B", "DLC_A").replace("\"DOP_1\"", "\"DOP_2\"");
        let docs = vec![doc("a.odx-d", FIRST), doc("b.odx-d", &second)];
        let mut diags = Diagnostics::new();
        let index = CrossReferenceIndex::build(&docs, &mut diags);

        assert_eq!(diags.of_kind(DiagnosticKind::DuplicateIdentifier).count(), 1);
        assert_eq!(index.get("DLC_A").unwrap().location.document, "a.odx-d");

        let bv = index.get("BV_B").unwrap();
        assert_eq!(bv.location.document, "b.odx-d");
        assert_eq!(bv.parent, None);
        let dop = index.get("DOP_2").unwrap();
        assert_eq!(dop.owner_layer, index.position("BV_B"));
    }
}
