//! Namespace resolution: one conflict-free prefix table per document.
//!
//! [`build_prefix_table`] walks the whole document once, in document order
//! (elements, then relations, then sub-graphs; within a record its id, its
//! extra attributes and then the records its typed fields reference), and folds every qualified name
//! it meets into a [`PrefixTable`]. A prefix, once bound, is never rebound to a
//! different URI; a later URI asking for a taken prefix gets the first free
//! synthetic `nsN` prefix instead.
//!
//! The table and the synthetic counter live only as long as one call.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};

use crate::bundle::{Bundle, GraphKey};
use crate::document::Document;
use crate::identifier::{Namespace, QualifiedName};
use crate::namespaces;
use crate::record::{FieldValue, Record, RecordKey};
use crate::value::{AttributeKey, Attributes};

/// The prefix reserved for a document's default namespace.
pub const DEFAULT_PREFIX: &str = "default";

/// A mapping from prefixes to namespace URIs used to render one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct PrefixTable {
    entries: IndexMap<String, String>,
}

impl PrefixTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri`, returning the URI it was bound to before.
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        self.entries.insert(prefix.into(), uri.into())
    }

    /// The URI bound to `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Whether `prefix` is bound.
    #[must_use]
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    /// The first prefix bound to `uri`, in table order.
    #[must_use]
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// The default namespace, if the table has one.
    #[must_use]
    pub fn default_namespace(&self) -> Option<&str> {
        self.get(DEFAULT_PREFIX)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// The display string of `name` under this table.
    ///
    /// 1. A prefix bound to the name's namespace wins: `local` for the default
    ///    namespace, `prefix:local` otherwise.
    /// 2. Otherwise a preferred prefix is used as is: `preferred:local`.
    /// 3. Otherwise the full name.
    #[must_use]
    pub fn resolve(&self, name: &QualifiedName) -> String {
        let Some(local) = name.local_part() else {
            return name.full_name().to_owned();
        };
        if let Some(prefix) = name.namespace_uri().and_then(|uri| self.prefix_for(uri)) {
            if prefix == DEFAULT_PREFIX {
                return local.to_owned();
            }
            return format!("{prefix}:{local}");
        }
        match name.preferred_prefix() {
            Some(preferred) => format!("{preferred}:{local}"),
            None => name.full_name().to_owned(),
        }
    }

    /// The table as a JSON object, for the document's `prefix` key.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(p, u)| (p.clone(), Value::String(u.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Builds the prefix table for `document`.
///
/// Seeds the default namespace, the implicit `xsd` and `prov` namespaces and
/// the root's declared namespaces (in that order, later seeds overwriting
/// earlier ones), then merges every qualified name reachable from the root.
/// Finally drops any non-default prefix aliasing the default namespace.
#[must_use]
pub fn build_prefix_table(document: &Document) -> PrefixTable {
    let root = document.root();
    let mut merger = NamespaceMerger::new(document.default_namespace(), root);

    if let Some(default) = document.default_namespace() {
        merger.table.insert(DEFAULT_PREFIX, default);
    }
    for ns in namespaces::implicit() {
        merger.table.insert(ns.prefix(), ns.uri());
    }
    for (prefix, uri) in root.namespaces() {
        merger.table.insert(prefix.as_str(), uri.as_str());
    }

    merger.visit_bundle(root);
    merger.finish()
}

struct NamespaceMerger<'a> {
    table: PrefixTable,
    default: Option<&'a str>,
    index: HashMap<RecordKey, &'a Record>,
    visited_records: HashSet<RecordKey>,
    visited_graphs: HashSet<GraphKey>,
    next_synthetic: u64,
}

impl<'a> NamespaceMerger<'a> {
    fn new(default: Option<&'a str>, root: &'a Bundle) -> Self {
        let mut index = HashMap::new();
        index_records(root, &mut index);
        Self {
            table: PrefixTable::new(),
            default,
            index,
            visited_records: HashSet::new(),
            visited_graphs: HashSet::new(),
            next_synthetic: 0,
        }
    }

    fn visit_bundle(&mut self, bundle: &'a Bundle) {
        if !self.visited_graphs.insert(bundle.key()) {
            return;
        }
        for (prefix, uri) in bundle.namespaces() {
            self.merge(&Namespace::new(prefix.as_str(), uri.as_str()).as_name());
        }
        self.merge(bundle.id());
        if let Some(asserter) = bundle.asserter() {
            self.merge(asserter);
        }
        self.visit_attributes(bundle.attributes());
        for member in bundle.members() {
            self.visit_record(&member.record);
        }
        for sub in bundle.sub_graphs() {
            self.visit_bundle(sub);
        }
    }

    fn visit_record(&mut self, record: &'a Record) {
        if !self.visited_records.insert(record.key()) {
            return;
        }
        if let Some(id) = record.id() {
            self.merge(id);
        }
        self.visit_attributes(record.attributes());
        for field in record.fields() {
            if let FieldValue::Ref(target) = field.value {
                // Dangling references are reported by the encoder.
                if let Some(referenced) = self.index.get(&target).copied() {
                    self.visit_record(referenced);
                }
            }
        }
    }

    fn visit_attributes(&mut self, attributes: &'a Attributes) {
        for (key, value) in attributes {
            if let AttributeKey::Name(name) = key {
                self.merge(name);
            }
            for name in value.names() {
                self.merge(name);
            }
        }
    }

    fn merge(&mut self, name: &QualifiedName) {
        let (Some(prefix), Some(uri)) = (name.preferred_prefix(), name.namespace_uri()) else {
            return;
        };
        match self.table.get(prefix).map(str::to_owned) {
            None => {
                trace!(prefix, uri; "Binding prefix");
                self.table.insert(prefix, uri);
            }
            Some(bound) if bound == uri => {}
            Some(_) => {
                if self.default == Some(uri) || self.table.prefix_for(uri).is_some() {
                    return;
                }
                let synthetic = self.mint_prefix();
                debug!(requested = prefix, synthetic:% = synthetic, uri; "Prefix conflict, minted synthetic prefix");
                self.table.insert(synthetic, uri);
            }
        }
    }

    fn mint_prefix(&mut self) -> String {
        loop {
            let candidate = format!("ns{}", self.next_synthetic);
            self.next_synthetic += 1;
            if !self.table.contains_prefix(&candidate) {
                return candidate;
            }
        }
    }

    fn finish(mut self) -> PrefixTable {
        if let Some(default) = self.default {
            self.table.entries.retain(|prefix, uri| {
                let keep = prefix == DEFAULT_PREFIX || uri.as_str() != default;
                if !keep {
                    debug!(prefix:% = prefix, uri:% = uri; "Dropping alias of the default namespace");
                }
                keep
            });
        }
        self.table
    }
}

/// Maps every record in `bundle` and its sub-graphs to the record itself.
pub(crate) fn index_records<'a>(bundle: &'a Bundle, index: &mut HashMap<RecordKey, &'a Record>) {
    for record in bundle.records() {
        index.insert(record.key(), record);
    }
    for sub in bundle.sub_graphs() {
        index_records(sub, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(prefix: &str, uri: &str, local: &str) -> QualifiedName {
        Namespace::new(prefix, uri).name(local)
    }

    #[test]
    fn table_hit_beats_preferred_prefix() {
        let mut table = PrefixTable::new();
        table.insert("other", "http://a/");
        assert_eq!(table.resolve(&name("ex", "http://a/", "e1")), "other:e1");
    }

    #[test]
    fn default_namespace_renders_bare_local_part() {
        let mut table = PrefixTable::new();
        table.insert(DEFAULT_PREFIX, "http://a/");
        assert_eq!(table.resolve(&name("ex", "http://a/", "e1")), "e1");
    }

    #[test]
    fn preferred_prefix_beats_full_uri() {
        let table = PrefixTable::new();
        assert_eq!(table.resolve(&name("ex", "http://a/", "e1")), "ex:e1");
        let bare = QualifiedName::new("http://a/e1", Some("http://a/".into()), Some("e1".into()), None);
        assert_eq!(table.resolve(&bare), "http://a/e1");
        assert_eq!(table.resolve(&QualifiedName::local("e1").expect("valid id")), "e1");
    }

    #[test]
    fn implicit_namespaces_are_seeded() {
        let table = build_prefix_table(&Document::new());
        assert_eq!(table.get("xsd"), Some(namespaces::XSD_URI));
        assert_eq!(table.get("prov"), Some(namespaces::PROV_URI));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn explicit_declarations_override_implicit_ones() {
        let mut doc = Document::new();
        doc.add_namespace("xsd", "http://www.w3.org/2001/XMLSchema#")
            .expect("declare");
        let table = build_prefix_table(&doc);
        assert_eq!(table.get("xsd"), Some("http://www.w3.org/2001/XMLSchema#"));
    }

    #[test]
    fn conflicting_prefix_gets_synthetic_binding() {
        let mut doc = Document::new();
        doc.add_entity(Some(name("ex", "http://a/", "e1"))).expect("attach");
        doc.add_entity(Some(name("ex", "http://b/", "e2"))).expect("attach");
        doc.add_entity(Some(name("ex", "http://b/", "e3"))).expect("attach");
        doc.add_entity(Some(name("ex", "http://c/", "e4"))).expect("attach");

        let table = build_prefix_table(&doc);
        assert_eq!(table.get("ex"), Some("http://a/"));
        assert_eq!(table.get("ns0"), Some("http://b/"));
        assert_eq!(table.get("ns1"), Some("http://c/"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn synthetic_prefixes_skip_declared_ones() {
        let mut doc = Document::new();
        doc.add_namespace("ns0", "http://declared/").expect("declare");
        doc.add_entity(Some(name("ex", "http://a/", "e1"))).expect("attach");
        doc.add_entity(Some(name("ex", "http://b/", "e2"))).expect("attach");

        let table = build_prefix_table(&doc);
        assert_eq!(table.get("ns0"), Some("http://declared/"));
        assert_eq!(table.get("ns1"), Some("http://b/"));
    }

    #[test]
    fn aliases_of_the_default_namespace_are_dropped() {
        let mut doc = Document::with_default_namespace("http://a/");
        doc.add_namespace("ex", "http://a/").expect("declare");
        doc.add_entity(Some(name("ax", "http://a/", "e1"))).expect("attach");

        let table = build_prefix_table(&doc);
        assert_eq!(table.default_namespace(), Some("http://a/"));
        assert_eq!(table.prefix_for("http://a/"), Some(DEFAULT_PREFIX));
        assert!(!table.contains_prefix("ex"));
        assert!(!table.contains_prefix("ax"));
    }

    #[test]
    fn nested_accounts_contribute_namespaces() {
        let mut doc = Document::new();
        doc.add_entity(Some(name("ex", "http://a/", "e1"))).expect("attach");
        let account = doc.add_sub_graph("acc", "alice").expect("add");
        account.add_namespace("ex", "http://nested/").expect("declare");
        account
            .add(Record::entity().with_attribute(name("dc", "http://dc/", "title"), "report"))
            .expect("attach");

        let table = build_prefix_table(&doc);
        assert_eq!(table.get("ex"), Some("http://a/"));
        assert_eq!(table.get("ns0"), Some("http://nested/"));
        assert_eq!(table.get("dc"), Some("http://dc/"));
    }

    #[test]
    fn references_pull_in_records_from_other_graphs_first() {
        let mut doc = Document::new();
        let activity = doc
            .add_activity(Some(name("ex", "http://a/", "run")), None, None)
            .expect("attach");
        let account = doc.add_sub_graph("acc", "alice").expect("add");
        let entity = account
            .add_entity(Some(name("ex", "http://b/", "out")))
            .expect("attach");
        doc.add_generation(entity, activity, None).expect("attach");
        doc.add_entity(Some(name("ex", "http://c/", "late"))).expect("attach");

        // Elements are visited before relations, so the root's second entity
        // claims `ns0` before the generation reaches into the account.
        let table = build_prefix_table(&doc);
        assert_eq!(table.get("ns0"), Some("http://c/"));
        assert_eq!(table.get("ns1"), Some("http://b/"));
    }

    #[test]
    fn every_call_starts_from_scratch() {
        let mut doc = Document::new();
        doc.add_entity(Some(name("ex", "http://a/", "e1"))).expect("attach");
        doc.add_entity(Some(name("ex", "http://b/", "e2"))).expect("attach");
        assert_eq!(build_prefix_table(&doc), build_prefix_table(&doc));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_a_plain_object() {
        let mut table = PrefixTable::new();
        table.insert("ex", "http://a/");
        table.insert(DEFAULT_PREFIX, "http://b/");
        let json = serde_json::to_value(&table).expect("serializes");
        assert_eq!(json, table.to_json());
    }

    #[test]
    fn attributes_are_merged_before_referenced_records() {
        let mut doc = Document::new();
        let activity = doc
            .add_activity(Some(name("ex", "http://a/", "run")), None, None)
            .expect("attach");
        let entity = doc
            .add_sub_graph("acc", "alice")
            .and_then(|acc| acc.add_entity(Some(name("ex", "http://b/", "out"))))
            .expect("attach");
        let generation = Record::generation(entity, activity)
            .with_attribute(name("ex", "http://c/", "tool"), "latex");
        doc.add(generation).expect("attach");

        let table = build_prefix_table(&doc);
        assert_eq!(table.get("ex"), Some("http://a/"));
        assert_eq!(table.get("ns0"), Some("http://c/"));
        assert_eq!(table.get("ns1"), Some("http://b/"));
    }
}
