//! Bundles: ownership scopes for records, namespaces and nested accounts.
//!
//! A [`Bundle`] owns its elements, relations and sub-graphs outright; a record
//! lives in exactly one bundle. References between records are
//! [`RecordKey`]s, and a record remembers its owner only by the owner's id.
//!
//! Anonymous records receive an ordinal from the bundle's element or relation
//! counter when they are attached. Counters only ever grow: removing a record
//! or emptying the bundle never hands an ordinal out twice.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::{ProvError, Result};
use crate::identifier::{validate_prefix, IntoIdentifier, QualifiedName};
use crate::record::{next_node, Record, RecordKey};
use crate::resolver::DEFAULT_PREFIX;
use crate::value::{AttributeKey, AttributeValue, Attributes, Timestamp};

/// Identity of a bundle for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GraphKey(u64);

/// A record together with the ordinal it drew when attached anonymously.
#[derive(Debug)]
pub(crate) struct Member {
    pub(crate) record: Record,
    pub(crate) ordinal: Option<u64>,
}

/// An ordered collection of records plus its own namespace table.
///
/// Nested bundles are *accounts*: they carry an asserter and are encoded under
/// the `account` key of their parent.
#[derive(Debug)]
pub struct Bundle {
    key: GraphKey,
    id: QualifiedName,
    asserter: Option<QualifiedName>,
    attributes: Attributes,
    elements: Vec<Member>,
    relations: Vec<Member>,
    sub_graphs: Vec<Bundle>,
    namespaces: IndexMap<String, String>,
    element_counter: u64,
    relation_counter: u64,
}

impl Bundle {
    /// Creates an empty bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::InvalidIdentifier`] if `id` is unusable identifier text.
    pub fn new(id: impl IntoIdentifier) -> Result<Self> {
        Ok(Self::with_id(id.into_identifier()?))
    }

    pub(crate) fn with_id(id: QualifiedName) -> Self {
        Self {
            key: GraphKey(next_node()),
            id,
            asserter: None,
            attributes: Attributes::new(),
            elements: Vec::new(),
            relations: Vec::new(),
            sub_graphs: Vec::new(),
            namespaces: IndexMap::new(),
            element_counter: 0,
            relation_counter: 0,
        }
    }

    pub(crate) fn key(&self) -> GraphKey {
        self.key
    }

    /// The bundle's identifier.
    #[must_use]
    pub fn id(&self) -> &QualifiedName {
        &self.id
    }

    /// Who asserted the content of this account, if set.
    #[must_use]
    pub fn asserter(&self) -> Option<&QualifiedName> {
        self.asserter.as_ref()
    }

    /// Extra attributes of the bundle itself.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Sets an extra attribute on the bundle itself.
    pub fn set_attribute(&mut self, key: impl Into<AttributeKey>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Attaches a record, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::DuplicateIdentifier`] if the record's explicit id is
    /// already used by a record or sub-graph of this bundle.
    pub fn add(&mut self, mut record: Record) -> Result<RecordKey> {
        self.check_id(record.id())?;

        let key = record.key();
        let is_element = record.is_element();
        let ordinal = if record.id().is_some() {
            None
        } else if is_element {
            self.element_counter += 1;
            Some(self.element_counter - 1)
        } else {
            self.relation_counter += 1;
            Some(self.relation_counter - 1)
        };

        trace!(
            bundle:% = self.id,
            kind:% = record.kind(),
            ordinal:?;
            "Attaching record"
        );
        record.set_container(Some(self.id.clone()));
        let member = Member { record, ordinal };
        if is_element {
            self.elements.push(member);
        } else {
            self.relations.push(member);
        }
        Ok(key)
    }

    /// Attaches an entity.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_entity(&mut self, id: Option<QualifiedName>) -> Result<RecordKey> {
        self.add(identified(Record::entity(), id)?)
    }

    /// Attaches an activity.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_activity(
        &mut self,
        id: Option<QualifiedName>,
        start_time: Option<Timestamp>,
        end_time: Option<Timestamp>,
    ) -> Result<RecordKey> {
        let mut record = Record::activity();
        if let Some(t) = start_time {
            record = record.started_at(t);
        }
        if let Some(t) = end_time {
            record = record.ended_at(t);
        }
        self.add(identified(record, id)?)
    }

    /// Attaches an agent.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_agent(&mut self, id: Option<QualifiedName>) -> Result<RecordKey> {
        self.add(identified(Record::agent(), id)?)
    }

    /// Attaches a note.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_note(&mut self, id: Option<QualifiedName>) -> Result<RecordKey> {
        self.add(identified(Record::note(), id)?)
    }

    /// Attaches an anonymous generation of `entity` by `activity`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_generation(
        &mut self,
        entity: RecordKey,
        activity: RecordKey,
        time: Option<Timestamp>,
    ) -> Result<RecordKey> {
        let mut record = Record::generation(entity, activity);
        if let Some(t) = time {
            record = record.at(t);
        }
        self.add(record)
    }

    /// Attaches an anonymous usage of `entity` by `activity`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_usage(
        &mut self,
        activity: RecordKey,
        entity: RecordKey,
        time: Option<Timestamp>,
    ) -> Result<RecordKey> {
        let mut record = Record::usage(activity, entity);
        if let Some(t) = time {
            record = record.at(t);
        }
        self.add(record)
    }

    /// Attaches an anonymous association of `agent` with `activity`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_association(&mut self, activity: RecordKey, agent: RecordKey) -> Result<RecordKey> {
        self.add(Record::association(activity, agent))
    }

    /// Attaches an anonymous start of `activity` by `agent`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_start(&mut self, activity: RecordKey, agent: RecordKey) -> Result<RecordKey> {
        self.add(Record::start(activity, agent))
    }

    /// Attaches an anonymous end of `activity` by `agent`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_end(&mut self, activity: RecordKey, agent: RecordKey) -> Result<RecordKey> {
        self.add(Record::end(activity, agent))
    }

    /// Attaches an anonymous responsibility record.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_responsibility(
        &mut self,
        subordinate: RecordKey,
        responsible: RecordKey,
    ) -> Result<RecordKey> {
        self.add(Record::responsibility(subordinate, responsible))
    }

    /// Attaches an anonymous derivation of `generated_entity` from `used_entity`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_derivation(
        &mut self,
        generated_entity: RecordKey,
        used_entity: RecordKey,
    ) -> Result<RecordKey> {
        self.add(Record::derivation(generated_entity, used_entity))
    }

    /// Attaches an anonymous alternate record.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_alternate(&mut self, subject: RecordKey, alternate: RecordKey) -> Result<RecordKey> {
        self.add(Record::alternate(subject, alternate))
    }

    /// Attaches an anonymous specialization record.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_specialization(
        &mut self,
        subject: RecordKey,
        specialization: RecordKey,
    ) -> Result<RecordKey> {
        self.add(Record::specialization(subject, specialization))
    }

    /// Attaches an anonymous annotation of `record` by `note`.
    ///
    /// # Errors
    ///
    /// See [`Bundle::add`].
    pub fn add_annotation(&mut self, record: RecordKey, note: RecordKey) -> Result<RecordKey> {
        self.add(Record::annotation(record, note))
    }

    /// Declares a namespace on this bundle, replacing any earlier URI for `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::ReservedNamespace`] for the `default` prefix and
    /// [`ProvError::InvalidIdentifier`] for an empty prefix or one containing `:`.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if prefix == DEFAULT_PREFIX {
            return Err(ProvError::ReservedNamespace);
        }
        validate_prefix(prefix)?;
        debug!(bundle:% = self.id, prefix, uri; "Declaring namespace");
        self.namespaces.insert(prefix.to_owned(), uri.to_owned());
        Ok(())
    }

    /// The namespaces declared on this bundle, in declaration order.
    #[must_use]
    pub fn namespaces(&self) -> &IndexMap<String, String> {
        &self.namespaces
    }

    /// Creates a nested account and returns it for population.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::DuplicateIdentifier`] if `id` names this bundle,
    /// any bundle nested in it, or one of its records, and
    /// [`ProvError::InvalidIdentifier`] for unusable identifier text.
    pub fn add_sub_graph(
        &mut self,
        id: impl IntoIdentifier,
        asserter: impl IntoIdentifier,
    ) -> Result<&mut Bundle> {
        let id = id.into_identifier()?;
        let asserter = asserter.into_identifier()?;
        if self.graph(&id).is_some() || self.has_local_id(&id) {
            return Err(ProvError::DuplicateIdentifier(id.to_string()));
        }

        debug!(parent:% = self.id, account:% = id; "Adding account");
        let mut account = Bundle::with_id(id);
        account.asserter = Some(asserter);
        self.sub_graphs.push(account);
        let last = self.sub_graphs.len() - 1;
        Ok(&mut self.sub_graphs[last])
    }

    /// The nested accounts, in insertion order.
    #[must_use]
    pub fn sub_graphs(&self) -> &[Bundle] {
        &self.sub_graphs
    }

    /// The elements, in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Record> {
        self.elements.iter().map(|m| &m.record)
    }

    /// The relations, in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Record> {
        self.relations.iter().map(|m| &m.record)
    }

    /// Elements followed by relations.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.elements().chain(self.relations())
    }

    pub(crate) fn members(&self) -> impl Iterator<Item = &Member> {
        self.elements.iter().chain(self.relations.iter())
    }

    /// A record attached directly to this bundle.
    #[must_use]
    pub fn get(&self, key: RecordKey) -> Option<&Record> {
        self.records().find(|r| r.key() == key)
    }

    /// Mutable access to a record attached directly to this bundle.
    pub fn get_mut(&mut self, key: RecordKey) -> Option<&mut Record> {
        self.elements
            .iter_mut()
            .chain(self.relations.iter_mut())
            .map(|m| &mut m.record)
            .find(|r| r.key() == key)
    }

    /// A record attached to this bundle or to any bundle nested in it.
    #[must_use]
    pub fn find(&self, key: RecordKey) -> Option<&Record> {
        self.get(key)
            .or_else(|| self.sub_graphs.iter().find_map(|g| g.find(key)))
    }

    /// Detaches a record attached directly to this bundle.
    ///
    /// The bundle's counters are left untouched.
    pub fn remove(&mut self, key: RecordKey) -> Option<Record> {
        let list = if self.elements.iter().any(|m| m.record.key() == key) {
            &mut self.elements
        } else {
            &mut self.relations
        };
        let index = list.iter().position(|m| m.record.key() == key)?;
        let mut record = list.remove(index).record;
        record.set_container(None);
        trace!(bundle:% = self.id, kind:% = record.kind(); "Detached record");
        Some(record)
    }

    /// Detaches a record from this bundle or from any bundle nested in it.
    pub(crate) fn remove_anywhere(&mut self, key: RecordKey) -> Option<Record> {
        if let Some(record) = self.remove(key) {
            return Some(record);
        }
        self.sub_graphs
            .iter_mut()
            .find_map(|g| g.remove_anywhere(key))
    }

    /// This bundle or a bundle nested in it with the given id.
    #[must_use]
    pub fn graph(&self, id: &QualifiedName) -> Option<&Bundle> {
        if &self.id == id {
            return Some(self);
        }
        self.sub_graphs.iter().find_map(|g| g.graph(id))
    }

    /// Mutable lookup of this bundle or a nested one by id.
    pub fn graph_mut(&mut self, id: &QualifiedName) -> Option<&mut Bundle> {
        if &self.id == id {
            return Some(self);
        }
        self.sub_graphs.iter_mut().find_map(|g| g.graph_mut(id))
    }

    /// Drops every record, account and namespace declaration.
    ///
    /// Counters keep their values so that ordinals are never reused.
    pub fn empty(&mut self) {
        self.elements.clear();
        self.relations.clear();
        self.sub_graphs.clear();
        self.namespaces.clear();
        self.attributes.clear();
    }

    /// Number of anonymous elements ever attached.
    #[must_use]
    pub fn element_counter(&self) -> u64 {
        self.element_counter
    }

    /// Number of anonymous relations ever attached.
    #[must_use]
    pub fn relation_counter(&self) -> u64 {
        self.relation_counter
    }

    /// Fails if `id` is already used by a record or sub-graph of this bundle.
    pub(crate) fn check_id(&self, id: Option<&QualifiedName>) -> Result<()> {
        match id {
            Some(id) if self.has_local_id(id) => {
                Err(ProvError::DuplicateIdentifier(id.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn has_local_id(&self, id: &QualifiedName) -> bool {
        self.records().any(|r| r.id() == Some(id)) || self.sub_graphs.iter().any(|g| &g.id == id)
    }
}

fn identified(record: Record, id: Option<QualifiedName>) -> Result<Record> {
    match id {
        Some(id) => record.with_id(id),
        None => Ok(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Namespace;

    fn ex() -> Namespace {
        Namespace::new("ex", "http://example.org/")
    }

    #[test]
    fn anonymous_records_draw_ordinals() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let e = bundle.add_entity(None).expect("attach");
        bundle.add_entity(Some(ex().name("named"))).expect("attach");
        let a = bundle.add_activity(None, None, None).expect("attach");
        bundle.add_generation(e, a, None).expect("attach");

        assert_eq!(bundle.element_counter(), 2);
        assert_eq!(bundle.relation_counter(), 1);
        let ordinals: Vec<Option<u64>> = bundle.members().map(|m| m.ordinal).collect();
        assert_eq!(ordinals, [Some(0), None, Some(1), Some(0)]);
    }

    #[test]
    fn counters_survive_removal_and_empty() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let e = bundle.add_entity(None).expect("attach");
        let removed = bundle.remove(e).expect("present");
        assert!(removed.container().is_none());
        assert!(bundle.get(e).is_none());

        bundle.add_entity(None).expect("attach");
        bundle.empty();
        bundle.add_entity(None).expect("attach");
        assert_eq!(bundle.element_counter(), 3);
        assert_eq!(bundle.members().next().and_then(|m| m.ordinal), Some(2));
    }

    #[test]
    fn attaching_sets_the_container() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let key = bundle.add(Record::agent()).expect("attach");
        let record = bundle.get(key).expect("present");
        assert_eq!(record.container(), Some(bundle.id()));
    }

    #[test]
    fn duplicate_record_ids_are_rejected() {
        let mut bundle = Bundle::new("b").expect("valid id");
        bundle.add_entity(Some(ex().name("e1"))).expect("attach");
        assert_eq!(
            bundle.add_agent(Some(ex().name("e1"))),
            Err(ProvError::DuplicateIdentifier("http://example.org/e1".into()))
        );
    }

    #[test]
    fn sub_graph_ids_are_unique_through_nesting() {
        let mut bundle = Bundle::new("root").expect("valid id");
        let acc1 = bundle.add_sub_graph("acc1", "alice").expect("add");
        acc1.add_sub_graph("inner", "bob").expect("add");

        assert!(matches!(
            bundle.add_sub_graph("inner", "carol"),
            Err(ProvError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            bundle.add_sub_graph("root", "carol"),
            Err(ProvError::DuplicateIdentifier(_))
        ));
        assert!(bundle.graph(&QualifiedName::local("inner").expect("valid id")).is_some());
    }

    #[test]
    fn default_prefix_is_reserved() {
        let mut bundle = Bundle::new("b").expect("valid id");
        assert_eq!(
            bundle.add_namespace("default", "http://example.org/"),
            Err(ProvError::ReservedNamespace)
        );
        assert!(matches!(
            bundle.add_namespace("a:b", "http://example.org/"),
            Err(ProvError::InvalidIdentifier(_))
        ));
        bundle.add_namespace("ex", "http://example.org/").expect("declare");
        assert_eq!(bundle.namespaces().get("ex").map(String::as_str), Some("http://example.org/"));
    }

    #[test]
    fn find_reaches_nested_records() {
        let mut bundle = Bundle::new("root").expect("valid id");
        let key = bundle
            .add_sub_graph("acc", "alice")
            .and_then(|acc| acc.add_entity(None))
            .expect("attach");
        assert!(bundle.get(key).is_none());
        assert!(bundle.find(key).is_some());
        assert!(bundle.remove_anywhere(key).is_some());
        assert!(bundle.find(key).is_none());
    }
}
