//! Attribute values and keys carried by records.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use indexmap::IndexMap;

use crate::identifier::QualifiedName;

/// The extra attributes of a record or account, keyed by name.
///
/// Insertion order carries no meaning but is kept so that encoding is
/// reproducible.
pub type Attributes = IndexMap<AttributeKey, AttributeValue>;

/// Key of an entry in [`Attributes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    /// A qualified attribute name, rendered through the prefix table.
    Name(QualifiedName),
    /// A plain string key, emitted verbatim.
    Plain(String),
}

impl From<QualifiedName> for AttributeKey {
    fn from(name: QualifiedName) -> Self {
        Self::Name(name)
    }
}

impl From<&str> for AttributeKey {
    fn from(key: &str) -> Self {
        Self::Plain(key.to_owned())
    }
}

impl From<String> for AttributeKey {
    fn from(key: String) -> Self {
        Self::Plain(key)
    }
}

/// A point in time, with or without an offset.
///
/// No normalisation is applied: the value is rendered with whatever offset
/// (or lack of one) it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A timestamp carrying a UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// A wall-clock timestamp with no offset.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// ISO-8601 rendering, e.g. `2012-03-31T09:21:00+01:00`.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Zoned(dt) => dt.to_rfc3339(),
            Timestamp::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Naive(dt)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Zoned(dt.fixed_offset())
    }
}

/// The lexical part of a [`Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Lexical form, emitted verbatim.
    Lexical(String),
    /// A qualified name, emitted in its resolved display form.
    Name(QualifiedName),
}

/// A value paired with an explicit datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// The value.
    pub value: LiteralValue,
    /// Its datatype.
    pub datatype: QualifiedName,
}

impl Literal {
    /// A literal with a lexical value.
    #[must_use]
    pub fn new(value: impl Into<String>, datatype: QualifiedName) -> Self {
        Self {
            value: LiteralValue::Lexical(value.into()),
            datatype,
        }
    }

    /// A literal whose value is itself a qualified name.
    #[must_use]
    pub fn named(value: QualifiedName, datatype: QualifiedName) -> Self {
        Self {
            value: LiteralValue::Name(value),
            datatype,
        }
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Plain string, emitted untyped.
    String(String),
    /// Boolean, emitted untyped.
    Boolean(bool),
    /// Integer, tagged `xsd:integer`.
    Integer(i64),
    /// Float, tagged `xsd:float`.
    Float(f64),
    /// Timestamp, tagged `xsd:dateTime`.
    Timestamp(Timestamp),
    /// Qualified name, tagged `xsd:QName` (or `xsd:anyURI` when unresolvable).
    Name(QualifiedName),
    /// Explicitly typed literal.
    Literal(Literal),
    /// Array of values, tagged `prov:array`.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Every qualified name inside this value, depth first.
    pub(crate) fn names(&self) -> Vec<&QualifiedName> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a QualifiedName>) {
        match self {
            AttributeValue::Name(name) => out.push(name),
            AttributeValue::Literal(literal) => {
                if let LiteralValue::Name(name) = &literal.value {
                    out.push(name);
                }
                out.push(&literal.datatype);
            }
            AttributeValue::Array(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
            AttributeValue::String(_)
            | AttributeValue::Boolean(_)
            | AttributeValue::Integer(_)
            | AttributeValue::Float(_)
            | AttributeValue::Timestamp(_) => {}
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Timestamp> for AttributeValue {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<QualifiedName> for AttributeValue {
    fn from(value: QualifiedName) -> Self {
        Self::Name(value)
    }
}

impl From<Literal> for AttributeValue {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
