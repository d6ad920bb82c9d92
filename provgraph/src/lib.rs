//! PROV provenance graphs held in memory and encoded as PROV-JSON.
//!
//! The `provgraph` crate models provenance records (entities, activities,
//! agents and the relations between them) grouped into bundles with nested
//! accounts, resolves the namespaces they use into a conflict-free prefix
//! table, and encodes the whole document as PROV-JSON.
//!
//! # Entry Point
//!
//! ```
//! use provgraph::{Document, Namespace};
//!
//! let ex = Namespace::new("ex", "http://example.org/");
//! let mut doc = Document::new();
//! let e = doc.add_entity(None)?;
//! let a = doc.add_activity(Some(ex.name("compile")), None, None)?;
//! doc.add_generation(e, a, None)?;
//!
//! let json = doc.to_prov_json()?;
//! assert_eq!(json["wasGeneratedBy"]["_:RLAT0"]["prov:entity"], "_:ELEM0");
//! assert_eq!(json["prefix"]["ex"], "http://example.org/");
//! # Ok::<(), provgraph::ProvError>(())
//! ```
//!
//! # Nested accounts
//!
//! ```
//! let mut doc = provgraph::Document::new();
//! let account = doc.add_sub_graph("acc1", "alice")?;
//! account.add_entity(None)?;
//!
//! let json = doc.to_prov_json()?;
//! assert_eq!(json["account"]["acc1"]["asserter"], "alice");
//! assert!(json.get("entity").is_none());
//! # Ok::<(), provgraph::ProvError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod bundle;
pub mod document;
pub mod error;
pub mod identifier;
pub mod namespaces;
pub mod record;
pub mod resolver;
pub mod serializer;
pub mod value;

pub use bundle::Bundle;
pub use document::Document;
pub use error::{ProvError, Result};
pub use identifier::{IntoIdentifier, Namespace, QualifiedName};
pub use record::{FieldValue, Record, RecordBody, RecordKey, RecordKind, TypedField};
pub use resolver::{build_prefix_table, PrefixTable, DEFAULT_PREFIX};
pub use value::{AttributeKey, AttributeValue, Attributes, Literal, LiteralValue, Timestamp};
