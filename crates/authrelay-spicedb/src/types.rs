//! Wire types for the SpiceDB v1 API.
//!
//! Field names follow the gateway's JSON casing (camelCase). Optional fields
//! are omitted from the serialized payload entirely when unset: SpiceDB
//! treats a missing `optional*` field as "match anything" and an empty
//! string as a literal filter value, so absence must never degrade into an
//! empty string on the wire.

use serde::{Deserialize, Serialize};

use authrelay_core::{BulkCheckItem, LookupQuery, RelationshipRecord};

/// Consistency requirement attached to a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Consistency {
    /// Resolve the query against all writes visible at the moment of the
    /// request.
    FullyConsistent(bool),
    /// Let the service answer from the fastest snapshot available.
    MinimizeLatency(bool),
}

impl Consistency {
    pub fn fully_consistent() -> Self {
        Self::FullyConsistent(true)
    }

    pub fn minimize_latency() -> Self {
        Self::MinimizeLatency(true)
    }
}

/// A reference to a stored object, `type` plus `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub object_type: String,
    pub object_id: String,
}

impl ObjectReference {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

/// A reference to a subject, optionally through a relation on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReference {
    pub object: ObjectReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_relation: Option<String>,
}

// ---------------------------------------------------------------------------
// Relationship filters
// ---------------------------------------------------------------------------

/// Filter over stored relationships. Only `resource_type` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipFilter {
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_subject_filter: Option<SubjectFilter>,
}

/// Subject-side narrowing of a relationship filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectFilter {
    pub subject_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_relation: Option<SubjectRelationFilter>,
}

/// Relation narrowing nested inside a subject filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRelationFilter {
    pub relation: String,
}

impl RelationshipFilter {
    /// Build a wire filter from a lookup query.
    ///
    /// Unset query fields stay out of the filter. The subject filter is
    /// nested only when a subject type is present; subject id and subject
    /// relation are each included independently when given.
    pub fn from_query(query: &LookupQuery) -> Self {
        let optional_subject_filter =
            query
                .subject_type
                .as_ref()
                .map(|subject_type| SubjectFilter {
                    subject_type: subject_type.clone(),
                    optional_subject_id: query.subject_id.clone(),
                    optional_relation: query.subject_relation.as_ref().map(|relation| {
                        SubjectRelationFilter {
                            relation: relation.clone(),
                        }
                    }),
                });

        Self {
            resource_type: query.resource_type.clone(),
            optional_resource_id: query.resource_id.clone(),
            optional_relation: query.relation.clone(),
            optional_subject_filter,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `POST /v1/schema/read`: no parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadSchemaRequest {}

/// `POST /v1/permissions/resources`: which resources of a type a subject
/// holds a permission on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResourcesRequest {
    pub consistency: Consistency,
    pub resource_object_type: String,
    pub permission: String,
    pub subject: SubjectReference,
}

/// `POST /v1/permissions/subjects`: which subjects of a type hold a
/// permission on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupSubjectsRequest {
    pub consistency: Consistency,
    pub resource: ObjectReference,
    pub permission: String,
    pub subject_object_type: String,
}

/// `POST /v1/relationships/read`: stored relationships matching a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRelationshipsRequest {
    pub consistency: Consistency,
    pub relationship_filter: RelationshipFilter,
}

/// `POST /v1/permissions/checkbulk`: many independent permission checks in
/// one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkPermissionsRequest {
    pub consistency: Consistency,
    pub items: Vec<CheckBulkPermissionsRequestItem>,
}

/// One item of a bulk check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkPermissionsRequestItem {
    pub resource: ObjectReference,
    pub permission: String,
    pub subject: SubjectReference,
}

impl From<&BulkCheckItem> for CheckBulkPermissionsRequestItem {
    fn from(item: &BulkCheckItem) -> Self {
        Self {
            resource: ObjectReference::new(&item.resource_type, &item.resource_id),
            permission: item.permission.clone(),
            subject: SubjectReference {
                object: ObjectReference::new(&item.subject_type, &item.subject_id),
                optional_relation: item.subject_relation.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response to a schema read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadSchemaResponse {
    pub schema_text: String,
}

/// One streamed element of a resource lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResourcesResponse {
    pub resource_object_id: String,
}

/// One streamed element of a subject lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupSubjectsResponse {
    pub subject: ResolvedSubject,
}

/// The subject carried by a subject-lookup element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSubject {
    pub subject_object_id: String,
}

/// One streamed element of a relationship read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRelationshipsResponse {
    pub relationship: Relationship,
}

/// A stored relationship tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub resource: ObjectReference,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<RelationshipSubject>,
}

/// Subject side of a stored relationship. The object may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSubject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_relation: Option<String>,
}

impl Relationship {
    /// Convert to the domain record used by report rendering.
    pub fn into_record(self) -> RelationshipRecord {
        let (subject_type, subject_id) = match self.subject.and_then(|subject| subject.object) {
            Some(object) => (Some(object.object_type), Some(object.object_id)),
            None => (None, None),
        };
        RelationshipRecord {
            resource_type: self.resource.object_type,
            resource_id: self.resource.object_id,
            relation: self.relation,
            subject_type,
            subject_id,
        }
    }
}

/// Response to a bulk check: one pair per submitted item, in submission
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkPermissionsResponse {
    #[serde(default)]
    pub pairs: Vec<CheckBulkPermissionsPair>,
}

/// One pair of a bulk-check response: either a result item or a per-item
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkPermissionsPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<CheckBulkPermissionsResponseItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcStatus>,
}

/// The result carried by a successful bulk-check pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkPermissionsResponseItem {
    pub permissionship: Permissionship,
}

/// Computed permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permissionship {
    #[serde(rename = "PERMISSIONSHIP_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PERMISSIONSHIP_NO_PERMISSION")]
    NoPermission,
    #[serde(rename = "PERMISSIONSHIP_HAS_PERMISSION")]
    HasPermission,
    #[serde(rename = "PERMISSIONSHIP_CONDITIONAL_PERMISSION")]
    ConditionalPermission,
}

impl Permissionship {
    /// Whether the decision grants the permission outright.
    pub fn has_permission(self) -> bool {
        matches!(self, Self::HasPermission)
    }
}

/// Error payload attached to rejected requests, in-stream error frames, and
/// failed bulk-check pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
