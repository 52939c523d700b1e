//! # AuthRelay MCP
//!
//! The MCP tool surface of AuthRelay: five tools that translate
//! loosely-typed lookup parameters into SpiceDB requests, reduce the
//! responses into human-readable reports, and convert every failure into a
//! descriptive string.
//!
//! The tool contract is load-bearing: MCP tool invocations have no separate
//! error channel here, so each tool always returns a string (a report on
//! success, an `Error <operation>: ...` line on failure) and never raises a
//! protocol-level error.

pub mod error;
pub mod server;

pub use error::{Operation, ToolFailure};
pub use server::{AuthRelayServer, ConsistencyPolicy};
