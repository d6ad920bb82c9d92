//! Property-based tests for id generation and prefix resolution.
//!
//! Documents are built from random sequences of edits, mixing anonymous
//! records, explicit ids (bare, namespaced, in the default namespace, or
//! looking like generated ones) and removals.

use std::collections::HashSet;

use proptest::prelude::*;
use provgraph::{Document, Namespace, ProvError, Record, RecordKey};

#[derive(Debug, Clone)]
enum Edit {
    Entity,
    Activity,
    Named(u8),
    Generation(usize, usize),
    Remove(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => Just(Edit::Entity),
        2 => Just(Edit::Activity),
        3 => (0u8..12).prop_map(Edit::Named),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(e, a)| Edit::Generation(e, a)),
        1 => any::<usize>().prop_map(Edit::Remove),
    ]
}

const DEFAULT_URI: &str = "http://example.org/";

/// Applies `edits` to a document whose default namespace is [`DEFAULT_URI`],
/// ignoring the ones the document rejects. Only elements no relation points
/// at are removed, so no reference dangles.
fn build(edits: &[Edit]) -> Document {
    let mut doc = Document::with_default_namespace(DEFAULT_URI);
    let mut elements: Vec<RecordKey> = Vec::new();
    let mut referenced: HashSet<RecordKey> = HashSet::new();
    for edit in edits {
        match edit {
            Edit::Entity => elements.extend(doc.add_entity(None).ok()),
            Edit::Activity => elements.extend(doc.add_activity(None, None, None).ok()),
            Edit::Named(n) => {
                // Bare and default-namespace names render alike on purpose,
                // as do bare names and generated ids.
                let local = format!("e{}", n / 4);
                let record = match n % 4 {
                    0 => Record::entity().with_id(format!("_:ELEM{}", n / 4)),
                    1 => Record::entity().with_id(local),
                    2 => Record::entity().with_id(Namespace::new("ex", DEFAULT_URI).name(&local)),
                    _ => Record::entity()
                        .with_id(Namespace::new("ex", "http://other.org/").name(&local)),
                };
                if let Ok(record) = record {
                    elements.extend(doc.add(record).ok());
                }
            }
            Edit::Generation(e, a) if !elements.is_empty() => {
                let entity = elements[e % elements.len()];
                let activity = elements[a % elements.len()];
                if doc.add_generation(entity, activity, None).is_ok() {
                    referenced.extend([entity, activity]);
                }
            }
            Edit::Remove(i) if !elements.is_empty() => {
                let index = i % elements.len();
                if !referenced.contains(&elements[index]) {
                    doc.remove(elements.remove(index));
                }
            }
            Edit::Generation(..) | Edit::Remove(_) => {}
        }
    }
    doc
}

/// Number of entries under `keyword` in an encoded graph.
fn section_len(json: &serde_json::Value, keyword: &str) -> usize {
    json.get(keyword)
        .and_then(serde_json::Value::as_object)
        .map_or(0, serde_json::Map::len)
}

proptest! {
    /// Every record of a graph gets an id of its own, or the encode fails
    /// because two explicit ids render alike.
    #[test]
    fn prop_ids_are_unique_per_graph(edits in prop::collection::vec(edit(), 0..40)) {
        let doc = build(&edits);
        let table = doc.prefix_table();
        let mut seen = HashSet::new();
        let clash = doc
            .records()
            .filter_map(Record::id)
            .any(|id| !seen.insert(table.resolve(id)));

        match doc.to_prov_json() {
            Ok(json) => {
                prop_assert!(!clash, "clashing ids encoded: {}", json);
                let encoded = section_len(&json, "entity")
                    + section_len(&json, "activity")
                    + section_len(&json, "wasGeneratedBy");
                prop_assert_eq!(encoded, doc.records().count());
            }
            Err(ProvError::DuplicateIdentifier(_)) => prop_assert!(clash),
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        }
    }

    /// Encoding twice yields the same tree, ids and prefixes included.
    #[test]
    fn prop_encoding_is_deterministic(edits in prop::collection::vec(edit(), 0..40)) {
        let doc = build(&edits);
        let first = doc.to_prov_json().ok();
        let second = doc.to_prov_json().ok();
        prop_assert_eq!(first, second);
    }

    /// The first namespace keeps a contested prefix; later ones get
    /// `ns0`, `ns1`, ... in order of appearance.
    #[test]
    fn prop_prefix_conflicts_mint_contiguous_prefixes(count in 1usize..8) {
        let mut doc = Document::new();
        for i in 0..count {
            let ns = Namespace::new("ex", format!("http://example.org/{i}/"));
            doc.add_entity(Some(ns.name("e"))).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let table = doc.prefix_table();
        prop_assert_eq!(table.get("ex"), Some("http://example.org/0/"));
        for i in 1..count {
            let synthetic = format!("ns{}", i - 1);
            let expected = format!("http://example.org/{i}/");
            prop_assert_eq!(table.get(&synthetic), Some(expected.as_str()));
        }
        let next_synthetic = format!("ns{}", count.saturating_sub(1));
        prop_assert!(!table.contains_prefix(&next_synthetic));
    }

    /// Registering a default namespace removes every other alias for it.
    #[test]
    fn prop_default_namespace_has_no_aliases(prefixes in prop::collection::vec("[a-z]{1,4}", 1..6)) {
        let uri = "http://example.org/";
        let mut doc = Document::with_default_namespace(uri);
        for (i, prefix) in prefixes.iter().enumerate() {
            let ns = Namespace::new(prefix.as_str(), uri);
            doc.add_entity(Some(ns.name(&format!("e{i}"))))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let table = doc.prefix_table();
        let aliases: Vec<&str> = table
            .iter()
            .filter(|(prefix, bound)| *bound == uri && *prefix != provgraph::DEFAULT_PREFIX)
            .map(|(prefix, _)| prefix)
            .collect();
        prop_assert!(aliases.is_empty(), "aliases survived: {:?}", aliases);
    }
}
