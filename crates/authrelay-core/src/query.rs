//! Relationship lookup queries and their textual description.

use serde::{Deserialize, Serialize};

/// A partially-specified relationship lookup.
///
/// The resource type is always present; every other field is independently
/// optional and narrows the query when set (set fields combine via logical
/// AND). Values arriving from loosely-typed callers are normalized on
/// construction: whitespace is trimmed and empty strings become `None`, so
/// "absent" and "explicitly empty" cannot diverge downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub relation: Option<String>,
    pub subject_type: Option<String>,
    pub subject_id: Option<String>,
    pub subject_relation: Option<String>,
}

impl LookupQuery {
    /// Create a query matching every relationship on a resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into().trim().to_string(),
            resource_id: None,
            relation: None,
            subject_type: None,
            subject_id: None,
            subject_relation: None,
        }
    }

    /// Build a query from loosely-typed optional parts, normalizing empty
    /// and whitespace-only values to `None`.
    pub fn from_parts(
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        relation: Option<String>,
        subject_type: Option<String>,
        subject_id: Option<String>,
        subject_relation: Option<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into().trim().to_string(),
            resource_id: normalize(resource_id),
            relation: normalize(relation),
            subject_type: normalize(subject_type),
            subject_id: normalize(subject_id),
            subject_relation: normalize(subject_relation),
        }
    }

    /// Render a deterministic description of the fields this query has set.
    ///
    /// The same description appears in the results header and in the
    /// no-results message, so callers (and tests) can rely on a single
    /// rendering: `resource_type[:resource_id]`, then `relation '<name>'`
    /// when set, then `subject '<type>[:<id>][#<relation>]'` when a subject
    /// type is set, joined by `", "`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        let mut resource = self.resource_type.clone();
        if let Some(id) = &self.resource_id {
            resource.push(':');
            resource.push_str(id);
        }
        parts.push(resource);

        if let Some(relation) = &self.relation {
            parts.push(format!("relation '{relation}'"));
        }

        // Subject narrowing only applies when a subject type is given; an id
        // or relation without a type is not part of the query.
        if let Some(subject_type) = &self.subject_type {
            let mut subject = format!("subject '{subject_type}");
            if let Some(id) = &self.subject_id {
                subject.push(':');
                subject.push_str(id);
            }
            if let Some(relation) = &self.subject_relation {
                subject.push('#');
                subject.push_str(relation);
            }
            subject.push('\'');
            parts.push(subject);
        }

        parts.join(", ")
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
