//! Document encoders.
//!
//! - **PROV-JSON** ([`json`]) — the interchange format; the only one supported.
//!
//! Encoding runs in two passes over the document: [`crate::resolver`] builds
//! the prefix table, then [`json`] walks the graph once. All scratch state
//! (prefix table, generated ids) belongs to a single call.

mod ids;
pub mod json;
