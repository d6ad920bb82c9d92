//! Error types for provenance graph construction and encoding.
//!
//! Every variant is a programming error on the caller's side: nothing here is
//! transient and nothing is retried. Construction-time variants are raised when
//! a record, sub-graph or namespace is attached. The encoder raises
//! [`ProvError::DanglingReference`], and [`ProvError::DuplicateIdentifier`] for
//! ids that only clash once rendered, before any output is returned.

use thiserror::Error;

use crate::record::RecordKey;

/// The error type for provenance graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvError {
    /// Identifier text that cannot name a record or namespace.
    #[error("invalid identifier {0:?}: identifiers must be non-empty and contain no whitespace")]
    InvalidIdentifier(String),

    /// An explicit identifier collides with a record or sub-graph in the same scope.
    #[error("identifier `{0}` conflicts with existing assertions")]
    DuplicateIdentifier(String),

    /// A reference field points to a record that is not part of the document.
    #[error("`{field}` of record `{record}` references {target}, which is not in this document")]
    DanglingReference {
        /// Display id of the record holding the reference. For a direct lookup
        /// such as [`Document::relocate`](crate::Document::relocate) this is
        /// the missing record itself.
        record: String,
        /// Document key of the dangling field (e.g. `prov:entity`).
        field: &'static str,
        /// The missing record.
        target: RecordKey,
    },

    /// Attempt to declare the reserved `default` prefix directly.
    #[error("the namespace prefix `default` is reserved; use the document's default namespace instead")]
    ReservedNamespace,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ProvError> = std::result::Result<T, E>;
