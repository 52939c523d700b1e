//! MCP server exposing SpiceDB authorization queries as tools.

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::debug;

use authrelay_core::{LookupQuery, parse_checks, report};
use authrelay_spicedb::{
    CheckBulkPermissionsRequest, CheckBulkPermissionsRequestItem, Consistency,
    LookupResourcesRequest, LookupSubjectsRequest, ObjectReference, PermissionsApi,
    ReadRelationshipsRequest, RelationshipFilter, SubjectReference,
};

use crate::error::{Operation, ToolFailure};

/// Which consistency mode every read is issued with.
///
/// The permission store answers either from the latest visible state or from
/// the fastest available snapshot; AuthRelay applies one policy uniformly to
/// all operations rather than varying it per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyPolicy {
    #[default]
    FullyConsistent,
    MinimizeLatency,
}

impl ConsistencyPolicy {
    fn to_consistency(self) -> Consistency {
        match self {
            Self::FullyConsistent => Consistency::fully_consistent(),
            Self::MinimizeLatency => Consistency::minimize_latency(),
        }
    }
}

/// Request for the `lookup_resources` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupResourcesParams {
    #[schemars(description = "The resource object type to search, e.g. 'project'")]
    pub resource_object_type: String,
    #[schemars(description = "The permission to check")]
    pub permission: String,
    #[schemars(description = "The subject type to check")]
    pub subject_type: String,
    #[schemars(description = "The subject id to check")]
    pub subject_id: String,
}

/// Request for the `lookup_subjects` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupSubjectsParams {
    #[schemars(description = "The resource type")]
    pub resource_type: String,
    #[schemars(description = "The resource id")]
    pub resource_id: String,
    #[schemars(description = "The permission to check")]
    pub permission: String,
    #[schemars(description = "The subject object type to return, e.g. 'user'")]
    pub subject_object_type: String,
}

/// Request for the `read_relationships` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadRelationshipsParams {
    #[schemars(description = "The resource type (required)")]
    pub resource_type: String,
    #[schemars(description = "The resource id (optional)")]
    pub resource_id: Option<String>,
    #[schemars(description = "The relationship name to match (optional)")]
    pub relationship_name: Option<String>,
    #[schemars(description = "The subject type (optional)")]
    pub subject_type: Option<String>,
    #[schemars(description = "The subject id (optional)")]
    pub subject_id: Option<String>,
    #[schemars(description = "The subject relation (optional)")]
    pub subject_relation: Option<String>,
}

/// Request for the `check_bulk_permissions` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckBulkPermissionsParams {
    #[schemars(
        description = "Semicolon-separated list of permission checks in the format 'resourceType:resourceId:permission:subjectType:subjectId[:subjectRelation]'. Example: 'document:doc1:view:user:john;folder:folder1:read:user:jane'"
    )]
    pub permission_checks: String,
}

/// MCP server exposing SpiceDB authorization queries as tools.
///
/// Every tool returns a string in both the success and the failure case;
/// failures render as `Error <operation>: <detail>` instead of surfacing as
/// protocol-level errors.
#[derive(Clone)]
pub struct AuthRelayServer {
    client: Arc<dyn PermissionsApi>,
    policy: ConsistencyPolicy,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for AuthRelayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRelayServer")
            .field("policy", &self.policy)
            .finish()
    }
}

#[tool_router(router = tool_router)]
impl AuthRelayServer {
    /// Create a server over the given permissions client.
    pub fn new(client: Arc<dyn PermissionsApi>, policy: ConsistencyPolicy) -> Self {
        Self {
            client,
            policy,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Get the SpiceDB schema in use. When in doubt, call this first to get an overview of the existing model before making other calls."
    )]
    pub async fn get_schema(&self) -> String {
        self.try_get_schema()
            .await
            .unwrap_or_else(|failure| failure.render(Operation::GetSchema))
    }

    #[tool(
        description = "Look up all resources of a type on which a subject has a permission. Answers questions like 'On what projects does user:CTO have admin permission?'"
    )]
    pub async fn lookup_resources(&self, params: Parameters<LookupResourcesParams>) -> String {
        self.try_lookup_resources(params.0)
            .await
            .unwrap_or_else(|failure| failure.render(Operation::LookupResources))
    }

    #[tool(
        description = "Look up all subjects of a type that have a permission on a resource. Answers questions like 'Which users can read document a?'"
    )]
    pub async fn lookup_subjects(&self, params: Parameters<LookupSubjectsParams>) -> String {
        self.try_lookup_subjects(params.0)
            .await
            .unwrap_or_else(|failure| failure.render(Operation::LookupSubjects))
    }

    #[tool(
        description = "Read stored relationships. All parameters except resource_type are optional. This returns direct relations only, not computed permissions: prefer lookup_resources or lookup_subjects for permission questions, and use this for inventory questions like 'what users do I have?' or 'what documents are there?'"
    )]
    pub async fn read_relationships(&self, params: Parameters<ReadRelationshipsParams>) -> String {
        self.try_read_relationships(params.0)
            .await
            .unwrap_or_else(|failure| failure.render(Operation::ReadRelationships))
    }

    #[tool(
        description = "Check multiple permissions at once. Accepts a semicolon-separated list of checks in the format 'resourceType:resourceId:permission:subjectType:subjectId[:subjectRelation]'. Favor this over repeated lookup calls, as the whole batch is a single request."
    )]
    pub async fn check_bulk_permissions(
        &self,
        params: Parameters<CheckBulkPermissionsParams>,
    ) -> String {
        self.try_check_bulk_permissions(params.0)
            .await
            .unwrap_or_else(|failure| failure.render(Operation::CheckBulkPermissions))
    }
}

impl AuthRelayServer {
    fn consistency(&self) -> Consistency {
        self.policy.to_consistency()
    }

    async fn try_get_schema(&self) -> Result<String, ToolFailure> {
        let schema = self.client.read_schema().await?;
        Ok(schema)
    }

    async fn try_lookup_resources(
        &self,
        params: LookupResourcesParams,
    ) -> Result<String, ToolFailure> {
        let resource_object_type = params.resource_object_type.trim().to_string();
        let permission = params.permission.trim().to_string();
        let subject_type = params.subject_type.trim().to_string();
        let subject_id = params.subject_id.trim().to_string();

        let request = LookupResourcesRequest {
            consistency: self.consistency(),
            resource_object_type: resource_object_type.clone(),
            permission: permission.clone(),
            subject: SubjectReference {
                object: ObjectReference::new(&subject_type, &subject_id),
                optional_relation: None,
            },
        };

        let mut stream = self.client.lookup_resources(request).await?;
        let mut resources = Vec::new();
        while let Some(id) = stream.next().await {
            resources.push(id?);
        }

        debug!(count = resources.len(), "resource lookup finished");
        Ok(report::resources_report(
            &resource_object_type,
            &permission,
            &subject_type,
            &subject_id,
            &resources,
        ))
    }

    async fn try_lookup_subjects(
        &self,
        params: LookupSubjectsParams,
    ) -> Result<String, ToolFailure> {
        let resource_type = params.resource_type.trim().to_string();
        let resource_id = params.resource_id.trim().to_string();
        let permission = params.permission.trim().to_string();
        let subject_object_type = params.subject_object_type.trim().to_string();

        let request = LookupSubjectsRequest {
            consistency: self.consistency(),
            resource: ObjectReference::new(&resource_type, &resource_id),
            permission: permission.clone(),
            subject_object_type,
        };

        let mut stream = self.client.lookup_subjects(request).await?;
        let mut subjects = Vec::new();
        while let Some(id) = stream.next().await {
            subjects.push(id?);
        }

        debug!(count = subjects.len(), "subject lookup finished");
        Ok(report::subjects_report(
            &resource_type,
            &resource_id,
            &permission,
            &subjects,
        ))
    }

    async fn try_read_relationships(
        &self,
        params: ReadRelationshipsParams,
    ) -> Result<String, ToolFailure> {
        let query = LookupQuery::from_parts(
            params.resource_type,
            params.resource_id,
            params.relationship_name,
            params.subject_type,
            params.subject_id,
            params.subject_relation,
        );

        let request = ReadRelationshipsRequest {
            consistency: self.consistency(),
            relationship_filter: RelationshipFilter::from_query(&query),
        };

        let mut stream = self.client.read_relationships(request).await?;
        let mut records = Vec::new();
        while let Some(relationship) = stream.next().await {
            records.push(relationship?.into_record());
        }

        debug!(count = records.len(), "relationship read finished");
        Ok(report::relationships_report(&query, &records))
    }

    async fn try_check_bulk_permissions(
        &self,
        params: CheckBulkPermissionsParams,
    ) -> Result<String, ToolFailure> {
        let items = parse_checks(&params.permission_checks)?;

        let request = CheckBulkPermissionsRequest {
            consistency: self.consistency(),
            items: items.iter().map(CheckBulkPermissionsRequestItem::from).collect(),
        };

        let pairs = self.client.check_bulk_permissions(request).await?;
        if pairs.len() != items.len() {
            return Err(ToolFailure::internal(format!(
                "service returned {} results for {} checks",
                pairs.len(),
                items.len()
            )));
        }

        // Pairs are positionally aligned with the submitted items. Any
        // per-item error fails the whole batch; there is no partial report.
        let mut outcomes = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if let Some(status) = pair.error {
                return Err(ToolFailure::Transport(status.message));
            }
            let item = pair.item.ok_or_else(|| {
                ToolFailure::internal("bulk check pair carried neither an item nor an error")
            })?;
            outcomes.push(item.permissionship.has_permission());
        }

        Ok(report::bulk_report(&items, &outcomes))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for AuthRelayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "authrelay".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Query a SpiceDB permissions store: read the schema, look up \
                 resources or subjects by permission, read stored relationships, \
                 and check many permissions in one batch."
                    .to_string(),
            ),
        }
    }
}
