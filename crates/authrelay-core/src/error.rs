//! Error types for query translation.

use thiserror::Error;

/// Errors raised while parsing a bulk permission-check string.
///
/// Any malformed record fails the whole batch; there are no partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained no usable records after trimming.
    #[error("no valid permission checks provided")]
    EmptyBatch,

    /// A record had the wrong number of fields. The offending record is
    /// quoted verbatim so the caller can find it in a long batch.
    #[error(
        "invalid check format: {record}. Expected format: 'resourceType:resourceId:permission:subjectType:subjectId[:subjectRelation]'"
    )]
    MalformedRecord { record: String },
}

impl ParseError {
    /// Create a malformed-record error naming the record.
    pub fn malformed(record: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
        }
    }
}
