//! The document root: a bundle plus an optional default namespace.

use std::ops::{Deref, DerefMut};

use log::debug;
use serde_json::Value;

use crate::bundle::Bundle;
use crate::error::{ProvError, Result};
use crate::identifier::QualifiedName;
use crate::record::RecordKey;
use crate::resolver::{build_prefix_table, PrefixTable, DEFAULT_PREFIX};
use crate::serializer::json;

/// A provenance document.
///
/// Dereferences to its root [`Bundle`], so records, namespaces and accounts
/// are added to the document directly.
///
/// ```
/// use provgraph::{Document, Namespace};
///
/// let ex = Namespace::new("ex", "http://example.org/");
/// let mut doc = Document::new();
/// let report = doc.add_entity(Some(ex.name("report")))?;
/// let compile = doc.add_activity(None, None, None)?;
/// doc.add_generation(report, compile, None)?;
///
/// let json = doc.to_prov_json()?;
/// assert_eq!(json["wasGeneratedBy"]["_:RLAT0"]["prov:entity"], "ex:report");
/// # Ok::<(), provgraph::ProvError>(())
/// ```
#[derive(Debug)]
pub struct Document {
    root: Bundle,
    default_namespace: Option<String>,
}

impl Document {
    /// An empty document with no default namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Bundle::with_id(QualifiedName::new(
                DEFAULT_PREFIX,
                None,
                Some(DEFAULT_PREFIX.to_owned()),
                None,
            )),
            default_namespace: None,
        }
    }

    /// An empty document whose default namespace is `uri`.
    #[must_use]
    pub fn with_default_namespace(uri: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.set_default_namespace(Some(uri.into()));
        doc
    }

    /// Sets (or clears) the default namespace.
    pub fn set_default_namespace(&mut self, uri: Option<String>) {
        self.default_namespace = uri;
    }

    /// The default namespace.
    #[must_use]
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// The root bundle.
    #[must_use]
    pub fn root(&self) -> &Bundle {
        &self.root
    }

    /// Mutable access to the root bundle.
    pub fn root_mut(&mut self) -> &mut Bundle {
        &mut self.root
    }

    /// Moves a record into the bundle identified by `target`.
    ///
    /// The record keeps its key, so references to it stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::DanglingReference`] if no record with `key` is in
    /// the document, [`ProvError::InvalidIdentifier`] if `target` names no
    /// bundle, and [`ProvError::DuplicateIdentifier`] if the record's id is
    /// already used in the target. The document is unchanged on error.
    pub fn relocate(&mut self, key: RecordKey, target: &QualifiedName) -> Result<()> {
        let missing = || ProvError::DanglingReference {
            record: key.to_string(),
            field: "relocate",
            target: key,
        };
        let destination = self
            .root
            .graph(target)
            .ok_or_else(|| ProvError::InvalidIdentifier(target.to_string()))?;
        let record = self.root.find(key).ok_or_else(missing)?;
        if record.container() == Some(target) {
            return Ok(());
        }
        destination.check_id(record.id())?;
        let source = record.container().cloned();

        let record = self.root.remove_anywhere(key).ok_or_else(missing)?;
        self.root
            .graph_mut(target)
            .ok_or_else(|| ProvError::InvalidIdentifier(target.to_string()))?
            .add(record)?;
        debug!(from:? = source, to:% = target; "Relocated record");
        Ok(())
    }

    /// The prefix table this document would be encoded with.
    #[must_use]
    pub fn prefix_table(&self) -> PrefixTable {
        build_prefix_table(self)
    }

    /// Encodes the document as a PROV-JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::DanglingReference`] if a relation references a
    /// record that is not part of this document.
    pub fn to_prov_json(&self) -> Result<Value> {
        json::to_prov_json(self)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Document {
    type Target = Bundle;

    fn deref(&self) -> &Bundle {
        &self.root
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Bundle {
        &mut self.root
    }
}
