//! Failure classification for tool results.

use std::fmt;

use thiserror::Error;

use authrelay_core::ParseError;
use authrelay_spicedb::SpiceDbError;

/// The operation a tool was performing when a failure occurred. Rendered
/// into the failure prefix, e.g. `Error looking up resources: ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetSchema,
    LookupResources,
    LookupSubjects,
    ReadRelationships,
    CheckBulkPermissions,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetSchema => "looking up schema",
            Operation::LookupResources => "looking up resources",
            Operation::LookupSubjects => "looking up subjects",
            Operation::ReadRelationships => "reading relationships",
            Operation::CheckBulkPermissions => "checking bulk permissions",
        };
        f.write_str(name)
    }
}

/// A classified tool failure.
///
/// Failures never cross the tool boundary as errors; [`ToolFailure::render`]
/// turns them into the string the tool returns instead.
#[derive(Debug, Error)]
pub enum ToolFailure {
    /// The external service failed or rejected the call.
    #[error("{0}")]
    Transport(String),

    /// The caller supplied malformed input.
    #[error("{0}")]
    Format(String),

    /// Anything else: decode failures, violated response invariants.
    #[error("{0}")]
    Internal(String),
}

impl ToolFailure {
    /// Create an internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Render the failure into the tool's string contract.
    pub fn render(&self, operation: Operation) -> String {
        format!("Error {operation}: {self}")
    }
}

impl From<SpiceDbError> for ToolFailure {
    fn from(err: SpiceDbError) -> Self {
        match err {
            SpiceDbError::Api { .. } | SpiceDbError::Connection { .. } => {
                Self::Transport(err.to_string())
            }
            SpiceDbError::Decode(_) | SpiceDbError::Url(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ParseError> for ToolFailure {
    fn from(err: ParseError) -> Self {
        Self::Format(err.to_string())
    }
}
