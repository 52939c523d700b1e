//! # AuthRelay Core
//!
//! Domain types and pure translation logic for AuthRelay, the MCP bridge to
//! SpiceDB-compatible permission stores. This crate owns the pieces that do
//! not touch the network:
//!
//! - **Lookup queries**: partially-specified relationship lookups, with a
//!   single required resource type and independently optional narrowing
//!   fields ([`LookupQuery`])
//! - **Bulk-check parsing**: the flat `resourceType:resourceId:permission:
//!   subjectType:subjectId[:subjectRelation]` record format
//!   ([`parse_checks`])
//! - **Report rendering**: deterministic, human-readable summaries of
//!   streamed and batched query results ([`report`])
//!
//! Everything here is constructed per call and discarded after formatting;
//! nothing is persisted.

pub mod bulk;
pub mod error;
pub mod query;
pub mod report;

pub use bulk::{BulkCheckItem, parse_checks};
pub use error::ParseError;
pub use query::LookupQuery;
pub use report::RelationshipRecord;
