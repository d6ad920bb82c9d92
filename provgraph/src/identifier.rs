//! Qualified names and the namespaces that mint them.
//!
//! A [`QualifiedName`] is identified by its full URI alone: two names with the
//! same `full_name` are equal and hash alike whatever prefix they would prefer.
//! The display form (`ex:e1`, `e1`, or the bare URI) is only decided once a
//! document's prefix table is known; see [`crate::resolver::PrefixTable::resolve`].

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{ProvError, Result};

/// An identifier resolvable to a full URI plus an optional prefixed form.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QualifiedName {
    full_name: String,
    namespace_uri: Option<String>,
    local_part: Option<String>,
    preferred_prefix: Option<String>,
}

impl QualifiedName {
    /// Builds a name from all four parts.
    ///
    /// Most callers want [`Namespace::name`] or [`QualifiedName::local`].
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        namespace_uri: Option<String>,
        local_part: Option<String>,
        preferred_prefix: Option<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            namespace_uri,
            local_part,
            preferred_prefix,
        }
    }

    /// Builds a namespace-less name whose full name and local part are both `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::InvalidIdentifier`] if `name` is empty or contains
    /// whitespace.
    pub fn local(name: &str) -> Result<Self> {
        validate_identifier(name)?;
        Ok(Self::new(name, None, Some(name.to_owned()), None))
    }

    /// The full URI (or bare string) this name stands for.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The namespace URI, if the name was minted by a namespace.
    #[must_use]
    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    /// The part after the namespace URI.
    #[must_use]
    pub fn local_part(&self) -> Option<&str> {
        self.local_part.as_deref()
    }

    /// The prefix this name would like to be rendered with.
    #[must_use]
    pub fn preferred_prefix(&self) -> Option<&str> {
        self.preferred_prefix.as_deref()
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

impl TryFrom<&str> for QualifiedName {
    type Error = ProvError;

    fn try_from(name: &str) -> Result<Self> {
        Self::local(name)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = ProvError;

    fn try_from(name: String) -> Result<Self> {
        Self::local(&name)
    }
}

/// Anything that can identify a record, a sub-graph or an asserter.
///
/// Implemented for [`QualifiedName`] (taken as is) and for strings, which
/// become namespace-less names via [`QualifiedName::local`].
pub trait IntoIdentifier {
    /// Converts `self` into a qualified name.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::InvalidIdentifier`] for unusable identifier text.
    fn into_identifier(self) -> Result<QualifiedName>;
}

impl IntoIdentifier for QualifiedName {
    fn into_identifier(self) -> Result<QualifiedName> {
        Ok(self)
    }
}

impl IntoIdentifier for &QualifiedName {
    fn into_identifier(self) -> Result<QualifiedName> {
        Ok(self.clone())
    }
}

impl IntoIdentifier for &str {
    fn into_identifier(self) -> Result<QualifiedName> {
        QualifiedName::local(self)
    }
}

impl IntoIdentifier for String {
    fn into_identifier(self) -> Result<QualifiedName> {
        QualifiedName::local(&self)
    }
}

/// A prefix/URI pair that mints [`QualifiedName`]s sharing its URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Namespace {
    prefix: String,
    uri: String,
}

impl Namespace {
    /// Creates a namespace. The prefix is a preference, not a binding: the
    /// document encoder may render the URI under a synthetic prefix instead.
    #[must_use]
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// The preferred prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The namespace URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Mints the name `uri + local`.
    #[must_use]
    pub fn name(&self, local: &str) -> QualifiedName {
        QualifiedName::new(
            format!("{}{local}", self.uri),
            Some(self.uri.clone()),
            Some(local.to_owned()),
            Some(self.prefix.clone()),
        )
    }

    /// A name standing for the namespace itself, used to feed declared
    /// namespaces through the same merge as every other name.
    pub(crate) fn as_name(&self) -> QualifiedName {
        QualifiedName::new(
            self.uri.clone(),
            Some(self.uri.clone()),
            None,
            Some(self.prefix.clone()),
        )
    }
}

pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ProvError::InvalidIdentifier(name.to_owned()));
    }
    Ok(())
}

pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    validate_identifier(prefix)?;
    if prefix.contains(':') {
        return Err(ProvError::InvalidIdentifier(prefix.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_prefix() {
        let a = Namespace::new("ex", "http://example.org/").name("e1");
        let b = Namespace::new("other", "http://example.org/").name("e1");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn namespace_mints_full_names() {
        let ex = Namespace::new("ex", "http://example.org/");
        let name = ex.name("report");
        assert_eq!(name.full_name(), "http://example.org/report");
        assert_eq!(name.namespace_uri(), Some("http://example.org/"));
        assert_eq!(name.local_part(), Some("report"));
        assert_eq!(name.preferred_prefix(), Some("ex"));
        assert_eq!(name.to_string(), "http://example.org/report");
    }

    #[test]
    fn local_names_reject_blank_text() {
        assert_eq!(
            QualifiedName::local(""),
            Err(ProvError::InvalidIdentifier(String::new()))
        );
        assert!(QualifiedName::local("two words").is_err());
        assert!(QualifiedName::try_from("e1").is_ok());
    }

    #[test]
    fn prefixes_reject_colons() {
        assert!(validate_prefix("ex").is_ok());
        assert!(validate_prefix("ex:1").is_err());
        assert!(validate_prefix("").is_err());
    }
}
