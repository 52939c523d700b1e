//! Deterministic rendering of query results into report strings.
//!
//! Streamed results are rendered one line per element in arrival order; the
//! order the service delivered elements in is the order they appear, never
//! re-sorted. An empty result set always produces an explicit "no results"
//! message rather than an empty string, so callers can tell "ran
//! successfully, found nothing" apart from a failure.

use serde::{Deserialize, Serialize};

use crate::bulk::BulkCheckItem;
use crate::query::LookupQuery;

/// One relationship tuple as returned by the read path.
///
/// The subject may be absent, in which case it renders as `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub resource_type: String,
    pub resource_id: String,
    pub relation: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<String>,
}

impl RelationshipRecord {
    /// Render this record as a single report line.
    pub fn render(&self) -> String {
        let subject = match (&self.subject_type, &self.subject_id) {
            (Some(subject_type), Some(subject_id)) => format!("{subject_type}:{subject_id}"),
            _ => "N/A".to_string(),
        };
        format!(
            "{}:{} has {} relationship with {}",
            self.resource_type, self.resource_id, self.relation, subject
        )
    }
}

/// Report for a resource lookup: which resources of a type a subject holds a
/// permission on.
pub fn resources_report(
    resource_type: &str,
    permission: &str,
    subject_type: &str,
    subject_id: &str,
    resource_ids: &[String],
) -> String {
    if resource_ids.is_empty() {
        return format!(
            "No resources of type {resource_type} found with {permission} permission for {subject_type}:{subject_id}."
        );
    }
    format!(
        "Resources of type '{resource_type}' with '{permission}' permission for {subject_type}:{subject_id}:\n{}",
        resource_ids.join("\n")
    )
}

/// Report for a subject lookup: which subjects hold a permission on a
/// resource.
pub fn subjects_report(
    resource_type: &str,
    resource_id: &str,
    permission: &str,
    subject_ids: &[String],
) -> String {
    if subject_ids.is_empty() {
        return format!(
            "No subjects found with {permission} permission on {resource_type}:{resource_id}."
        );
    }
    format!(
        "Subjects with '{permission}' permission on {resource_type}:{resource_id}:\n{}",
        subject_ids.join("\n")
    )
}

/// Report for a relationship read, headed by the query description.
pub fn relationships_report(query: &LookupQuery, records: &[RelationshipRecord]) -> String {
    let description = query.describe();
    if records.is_empty() {
        return format!("No relationships found for {description}.");
    }
    let lines: Vec<String> = records.iter().map(RelationshipRecord::render).collect();
    format!("Relationships for {description}:\n{}", lines.join("\n"))
}

/// Report for a bulk permission check.
///
/// `outcomes` is positionally aligned with `items`; the caller is
/// responsible for having zipped the service's pair array back against the
/// submitted items by index.
pub fn bulk_report(items: &[BulkCheckItem], outcomes: &[bool]) -> String {
    items
        .iter()
        .zip(outcomes)
        .map(|(item, &granted)| {
            let verdict = if granted { "HAS" } else { "DOES NOT HAVE" };
            format!(
                "{} {} permission '{}' on {}",
                item.subject_ref(),
                verdict,
                item.permission,
                item.resource_ref()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
