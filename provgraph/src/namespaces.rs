//! Implicit namespaces every document carries.
//!
//! `xsd` types the literals the encoder emits and `prov` names the array
//! datatype and the reserved record vocabulary. Both are seeded into every
//! prefix table before any declared namespace, so an explicit declaration of
//! the same prefix replaces them.

use crate::identifier::{Namespace, QualifiedName};

/// URI of the XML Schema datatypes namespace.
pub const XSD_URI: &str = "http://www.w3.org/2001/XMLSchema-datatypes#";

/// URI of the PROV data model namespace.
pub const PROV_URI: &str = "http://www.w3.org/ns/prov-dm/";

/// The `xsd` namespace.
#[must_use]
pub fn xsd() -> Namespace {
    Namespace::new("xsd", XSD_URI)
}

/// The `prov` namespace.
#[must_use]
pub fn prov() -> Namespace {
    Namespace::new("prov", PROV_URI)
}

/// `xsd:float`.
#[must_use]
pub fn xsd_float() -> QualifiedName {
    xsd().name("float")
}

/// `xsd:integer`.
#[must_use]
pub fn xsd_integer() -> QualifiedName {
    xsd().name("integer")
}

/// `xsd:dateTime`.
#[must_use]
pub fn xsd_date_time() -> QualifiedName {
    xsd().name("dateTime")
}

/// `prov:array`.
#[must_use]
pub fn prov_array() -> QualifiedName {
    prov().name("array")
}

/// The implicit namespaces in seeding order.
pub(crate) fn implicit() -> [Namespace; 2] {
    [xsd(), prov()]
}
