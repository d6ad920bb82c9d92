//! Display ids for every record of a document, fixed once per encode call.
//!
//! Records with an explicit id use its resolved display form. Anonymous
//! records get `_:ELEMn` / `_:RLATn`, where `n` starts at the ordinal the
//! record drew from its bundle's counter when attached. If that candidate is
//! already taken in the same bundle, further candidates come from a counter
//! seeded with the bundle's current counter value, so they can never collide
//! with another record's ordinal.
//!
//! Explicit ids are unique by full name when attached, but two distinct names
//! can still render alike under the final prefix table (a default-namespace
//! name next to a bare local one, say). Such clashes among the records of one
//! bundle, or among sibling accounts, fail the encode.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::bundle::Bundle;
use crate::error::{ProvError, Result};
use crate::record::RecordKey;
use crate::resolver::PrefixTable;

/// Which family of generated ids a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdClass {
    Element,
    Relation,
}

impl IdClass {
    fn prefix(self) -> &'static str {
        match self {
            IdClass::Element => "_:ELEM",
            IdClass::Relation => "_:RLAT",
        }
    }
}

/// Ids taken so far in one bundle plus the fallback counters.
struct IdScope {
    taken: HashSet<String>,
    next_element: u64,
    next_relation: u64,
}

impl IdScope {
    fn draw(&mut self, class: IdClass) -> u64 {
        let counter = match class {
            IdClass::Element => &mut self.next_element,
            IdClass::Relation => &mut self.next_relation,
        };
        *counter += 1;
        *counter - 1
    }

    fn generate_id(&mut self, class: IdClass, ordinal: Option<u64>) -> String {
        let mut n = match ordinal {
            Some(n) => n,
            None => self.draw(class),
        };
        loop {
            let candidate = format!("{}{n}", class.prefix());
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n = self.draw(class);
        }
    }
}

/// The resolved id of every record in a document.
#[derive(Debug, Default)]
pub(crate) struct IdMap {
    ids: HashMap<RecordKey, String>,
}

impl IdMap {
    /// Assigns ids to every record under `root`, bundle by bundle in
    /// document order.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::DuplicateIdentifier`] if two explicit record ids
    /// of one bundle, or the ids of two sibling accounts, render to the same
    /// display string.
    pub(crate) fn assign(root: &Bundle, table: &PrefixTable) -> Result<Self> {
        let mut map = Self::default();
        map.assign_bundle(root, table)?;
        Ok(map)
    }

    fn assign_bundle(&mut self, bundle: &Bundle, table: &PrefixTable) -> Result<()> {
        let mut scope = IdScope {
            taken: HashSet::new(),
            next_element: bundle.element_counter(),
            next_relation: bundle.relation_counter(),
        };

        for member in bundle.members() {
            if let Some(id) = member.record.id() {
                let display = table.resolve(id);
                if !scope.taken.insert(display.clone()) {
                    return Err(ProvError::DuplicateIdentifier(display));
                }
                self.ids.insert(member.record.key(), display);
            }
        }
        for member in bundle.members() {
            if member.record.id().is_some() {
                continue;
            }
            let class = if member.record.is_element() {
                IdClass::Element
            } else {
                IdClass::Relation
            };
            let id = scope.generate_id(class, member.ordinal);
            trace!(bundle:% = bundle.id(), id:% = id; "Generated record id");
            self.ids.insert(member.record.key(), id);
        }

        let mut accounts = HashSet::new();
        for sub in bundle.sub_graphs() {
            let display = table.resolve(sub.id());
            if !accounts.insert(display.clone()) {
                return Err(ProvError::DuplicateIdentifier(display));
            }
            self.assign_bundle(sub, table)?;
        }
        Ok(())
    }

    /// The id of `key`, if the record is in the document.
    pub(crate) fn get(&self, key: RecordKey) -> Option<&str> {
        self.ids.get(&key).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Namespace;
    use crate::record::Record;

    #[test]
    fn ordinals_become_ids() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let e = bundle.add_entity(None).expect("attach");
        let a = bundle.add_activity(None, None, None).expect("attach");
        let g = bundle.add_generation(e, a, None).expect("attach");

        let ids = IdMap::assign(&bundle, &PrefixTable::new()).expect("assigns");
        assert_eq!(ids.get(e), Some("_:ELEM0"));
        assert_eq!(ids.get(a), Some("_:ELEM1"));
        assert_eq!(ids.get(g), Some("_:RLAT0"));
    }

    #[test]
    fn collisions_with_explicit_ids_fall_through_to_the_counter() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let named = bundle
            .add(Record::entity().with_id("_:ELEM0").expect("valid id"))
            .expect("attach");
        let first = bundle.add_entity(None).expect("attach");
        let second = bundle.add_entity(None).expect("attach");

        let ids = IdMap::assign(&bundle, &PrefixTable::new()).expect("assigns");
        assert_eq!(ids.get(named), Some("_:ELEM0"));
        // `first` drew ordinal 0, which is taken; the fallback counter starts
        // past every ordinal handed out so far.
        assert_eq!(ids.get(first), Some("_:ELEM2"));
        assert_eq!(ids.get(second), Some("_:ELEM1"));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn removed_ordinals_are_not_reused() {
        let mut bundle = Bundle::new("b").expect("valid id");
        let gone = bundle.add_entity(None).expect("attach");
        let kept = bundle.add_entity(None).expect("attach");
        bundle.remove(gone);
        let added = bundle.add_entity(None).expect("attach");

        let ids = IdMap::assign(&bundle, &PrefixTable::new()).expect("assigns");
        assert_eq!(ids.get(kept), Some("_:ELEM1"));
        assert_eq!(ids.get(added), Some("_:ELEM2"));
        assert_eq!(ids.get(gone), None);
    }

    #[test]
    fn sub_graphs_count_independently() {
        let mut root = Bundle::new("root").expect("valid id");
        let outer = root.add_entity(None).expect("attach");
        let inner = root
            .add_sub_graph("acc", "alice")
            .and_then(|acc| acc.add_entity(None))
            .expect("attach");

        let ids = IdMap::assign(&root, &PrefixTable::new()).expect("assigns");
        assert_eq!(ids.get(outer), Some("_:ELEM0"));
        assert_eq!(ids.get(inner), Some("_:ELEM0"));
    }

    #[test]
    fn explicit_ids_rendering_alike_are_rejected() {
        let mut bundle = Bundle::new("b").expect("valid id");
        bundle
            .add_entity(Some(Namespace::new("ex", "http://a/").name("e1")))
            .expect("attach");
        bundle
            .add(Record::entity().with_id("e1").expect("valid id"))
            .expect("distinct full names attach");

        let mut table = PrefixTable::new();
        table.insert(crate::resolver::DEFAULT_PREFIX, "http://a/");
        assert_eq!(
            IdMap::assign(&bundle, &table).err(),
            Some(ProvError::DuplicateIdentifier("e1".to_owned()))
        );
    }

    #[test]
    fn sibling_accounts_rendering_alike_are_rejected() {
        let mut root = Bundle::new("root").expect("valid id");
        root.add_sub_graph(Namespace::new("ex", "http://a/").name("acc"), "alice")
            .expect("add");
        root.add_sub_graph("ex:acc", "bob").expect("distinct full names add");

        let mut table = PrefixTable::new();
        table.insert("ex", "http://a/");
        assert_eq!(
            IdMap::assign(&root, &table).err(),
            Some(ProvError::DuplicateIdentifier("ex:acc".to_owned()))
        );
    }
}
