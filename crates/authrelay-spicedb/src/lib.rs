//! # AuthRelay SpiceDB client
//!
//! Wire types and an HTTP client for the SpiceDB v1 API, used by AuthRelay
//! as its external collaborator boundary.
//!
//! SpiceDB's HTTP gateway mirrors the gRPC API one-to-one: unary calls are
//! plain JSON POSTs, server-streaming calls answer with newline-delimited
//! JSON frames. The [`PermissionsApi`] trait is the seam the tool layer
//! programs against; [`HttpClient`] is the production implementation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use authrelay_spicedb::{HttpClient, PermissionsApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new("http://localhost:8443")?.with_token("sekret");
//!     let schema = client.read_schema().await?;
//!     println!("{schema}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpClient, PermissionsApi, ResultStream};
pub use error::{SpiceDbError, SpiceDbResult};
pub use types::{
    CheckBulkPermissionsPair, CheckBulkPermissionsRequest, CheckBulkPermissionsRequestItem,
    Consistency, LookupResourcesRequest, LookupSubjectsRequest, ObjectReference,
    ReadRelationshipsRequest, Relationship, RelationshipFilter, SubjectReference,
};
