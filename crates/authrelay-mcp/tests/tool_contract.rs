//! Contract tests for the tool surface: every tool returns a string in both
//! the success and the failure case, reports preserve delivery order, and
//! failures render with the per-operation prefix.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use authrelay_mcp::server::{
    AuthRelayServer, CheckBulkPermissionsParams, ConsistencyPolicy, LookupResourcesParams,
    LookupSubjectsParams, ReadRelationshipsParams,
};
use authrelay_spicedb::types::{
    CheckBulkPermissionsPair, CheckBulkPermissionsRequest, CheckBulkPermissionsResponseItem,
    LookupResourcesRequest, LookupSubjectsRequest, ObjectReference, Permissionship,
    ReadRelationshipsRequest, Relationship, RelationshipSubject, RpcStatus,
};
use authrelay_spicedb::{Consistency, PermissionsApi, ResultStream, SpiceDbError, SpiceDbResult};
use rmcp::handler::server::wrapper::Parameters;

/// Scripted collaborator. Each operation consumes its prepared response;
/// requests are recorded for assertions.
#[derive(Default)]
struct FakeApi {
    schema: Mutex<Option<SpiceDbResult<String>>>,
    resources: Mutex<Option<Vec<SpiceDbResult<String>>>>,
    subjects: Mutex<Option<Vec<SpiceDbResult<String>>>>,
    relationships: Mutex<Option<Vec<SpiceDbResult<Relationship>>>>,
    bulk: Mutex<Option<SpiceDbResult<Vec<CheckBulkPermissionsPair>>>>,
    seen_resource_requests: Mutex<Vec<LookupResourcesRequest>>,
    seen_relationship_requests: Mutex<Vec<ReadRelationshipsRequest>>,
    seen_bulk_requests: Mutex<Vec<CheckBulkPermissionsRequest>>,
    round_trips: AtomicUsize,
}

fn stream_of<T: Send + 'static>(items: Vec<SpiceDbResult<T>>) -> ResultStream<T> {
    Box::pin(tokio_stream::iter(items))
}

fn connection_refused() -> SpiceDbError {
    SpiceDbError::connection("connection refused")
}

#[async_trait]
impl PermissionsApi for FakeApi {
    async fn read_schema(&self) -> SpiceDbResult<String> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.schema.lock().unwrap().take().expect("unscripted read_schema call")
    }

    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> SpiceDbResult<ResultStream<String>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.seen_resource_requests.lock().unwrap().push(request);
        let items = self
            .resources
            .lock()
            .unwrap()
            .take()
            .ok_or_else(connection_refused)?;
        Ok(stream_of(items))
    }

    async fn lookup_subjects(
        &self,
        _request: LookupSubjectsRequest,
    ) -> SpiceDbResult<ResultStream<String>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        let items = self
            .subjects
            .lock()
            .unwrap()
            .take()
            .ok_or_else(connection_refused)?;
        Ok(stream_of(items))
    }

    async fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> SpiceDbResult<ResultStream<Relationship>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.seen_relationship_requests.lock().unwrap().push(request);
        let items = self
            .relationships
            .lock()
            .unwrap()
            .take()
            .ok_or_else(connection_refused)?;
        Ok(stream_of(items))
    }

    async fn check_bulk_permissions(
        &self,
        request: CheckBulkPermissionsRequest,
    ) -> SpiceDbResult<Vec<CheckBulkPermissionsPair>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.seen_bulk_requests.lock().unwrap().push(request);
        self.bulk.lock().unwrap().take().expect("unscripted check_bulk_permissions call")
    }
}

fn server_over(api: Arc<FakeApi>) -> AuthRelayServer {
    AuthRelayServer::new(api, ConsistencyPolicy::FullyConsistent)
}

fn relationship(resource_id: &str, relation: &str, subject: Option<(&str, &str)>) -> Relationship {
    Relationship {
        resource: ObjectReference::new("document", resource_id),
        relation: relation.to_string(),
        subject: subject.map(|(subject_type, subject_id)| RelationshipSubject {
            object: Some(ObjectReference::new(subject_type, subject_id)),
            optional_relation: None,
        }),
    }
}

fn granted_pair() -> CheckBulkPermissionsPair {
    CheckBulkPermissionsPair {
        item: Some(CheckBulkPermissionsResponseItem {
            permissionship: Permissionship::HasPermission,
        }),
        error: None,
    }
}

fn denied_pair() -> CheckBulkPermissionsPair {
    CheckBulkPermissionsPair {
        item: Some(CheckBulkPermissionsResponseItem {
            permissionship: Permissionship::NoPermission,
        }),
        error: None,
    }
}

#[tokio::test]
async fn get_schema_passes_schema_text_through() {
    let api = Arc::new(FakeApi::default());
    *api.schema.lock().unwrap() = Some(Ok("definition user {}".to_string()));

    let result = server_over(api).get_schema().await;
    assert_eq!(result, "definition user {}");
}

#[tokio::test]
async fn get_schema_failure_renders_error_string() {
    let api = Arc::new(FakeApi::default());
    *api.schema.lock().unwrap() = Some(Err(connection_refused()));

    let result = server_over(api).get_schema().await;
    assert_eq!(
        result,
        "Error looking up schema: failed to reach SpiceDB: connection refused"
    );
}

#[tokio::test]
async fn lookup_resources_reports_ids_in_delivery_order() {
    let api = Arc::new(FakeApi::default());
    *api.resources.lock().unwrap() = Some(vec![
        Ok("proj-9".to_string()),
        Ok("proj-1".to_string()),
        Ok("proj-5".to_string()),
    ]);

    let result = server_over(api)
        .lookup_resources(Parameters(LookupResourcesParams {
            resource_object_type: "project".to_string(),
            permission: "admin".to_string(),
            subject_type: "user".to_string(),
            subject_id: "CTO".to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "Resources of type 'project' with 'admin' permission for user:CTO:\nproj-9\nproj-1\nproj-5"
    );
}

#[tokio::test]
async fn lookup_resources_empty_result_is_explicit() {
    let api = Arc::new(FakeApi::default());
    *api.resources.lock().unwrap() = Some(Vec::new());

    let result = server_over(api)
        .lookup_resources(Parameters(LookupResourcesParams {
            resource_object_type: "project".to_string(),
            permission: "admin".to_string(),
            subject_type: "user".to_string(),
            subject_id: "CTO".to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "No resources of type project found with admin permission for user:CTO."
    );
}

#[tokio::test]
async fn lookup_resources_transport_failure_has_operation_prefix() {
    // No scripted response: the fake fails the call like an unreachable
    // service would.
    let api = Arc::new(FakeApi::default());

    let result = server_over(api)
        .lookup_resources(Parameters(LookupResourcesParams {
            resource_object_type: "project".to_string(),
            permission: "admin".to_string(),
            subject_type: "user".to_string(),
            subject_id: "CTO".to_string(),
        }))
        .await;

    assert!(result.starts_with("Error looking up resources: "));
}

#[tokio::test]
async fn lookup_resources_mid_stream_failure_aborts_with_error_string() {
    let api = Arc::new(FakeApi::default());
    *api.resources.lock().unwrap() = Some(vec![
        Ok("proj-1".to_string()),
        Err(SpiceDbError::api(14, "backend unavailable")),
    ]);

    let result = server_over(api)
        .lookup_resources(Parameters(LookupResourcesParams {
            resource_object_type: "project".to_string(),
            permission: "admin".to_string(),
            subject_type: "user".to_string(),
            subject_id: "CTO".to_string(),
        }))
        .await;

    assert_eq!(result, "Error looking up resources: backend unavailable");
}

#[tokio::test]
async fn lookup_subjects_reports_and_empty_message() {
    let api = Arc::new(FakeApi::default());
    *api.subjects.lock().unwrap() = Some(vec![Ok("alice".to_string()), Ok("bob".to_string())]);

    let params = || {
        Parameters(LookupSubjectsParams {
            resource_type: "document".to_string(),
            resource_id: "a".to_string(),
            permission: "read".to_string(),
            subject_object_type: "user".to_string(),
        })
    };

    let result = server_over(api).lookup_subjects(params()).await;
    assert_eq!(
        result,
        "Subjects with 'read' permission on document:a:\nalice\nbob"
    );

    let api = Arc::new(FakeApi::default());
    *api.subjects.lock().unwrap() = Some(Vec::new());
    let result = server_over(api).lookup_subjects(params()).await;
    assert_eq!(result, "No subjects found with read permission on document:a.");
}

#[tokio::test]
async fn read_relationships_renders_lines_and_na_subject() {
    let api = Arc::new(FakeApi::default());
    *api.relationships.lock().unwrap() = Some(vec![
        Ok(relationship("doc1", "owner", Some(("user", "jane")))),
        Ok(relationship("doc1", "viewer", None)),
    ]);

    let result = server_over(api)
        .read_relationships(Parameters(ReadRelationshipsParams {
            resource_type: "document".to_string(),
            resource_id: Some("doc1".to_string()),
            relationship_name: None,
            subject_type: None,
            subject_id: None,
            subject_relation: None,
        }))
        .await;

    assert_eq!(
        result,
        "Relationships for document:doc1:\n\
         document:doc1 has owner relationship with user:jane\n\
         document:doc1 has viewer relationship with N/A"
    );
}

#[tokio::test]
async fn read_relationships_no_results_names_the_query() {
    let api = Arc::new(FakeApi::default());
    *api.relationships.lock().unwrap() = Some(Vec::new());

    let result = server_over(api)
        .read_relationships(Parameters(ReadRelationshipsParams {
            resource_type: "document".to_string(),
            resource_id: None,
            relationship_name: None,
            subject_type: None,
            subject_id: None,
            subject_relation: None,
        }))
        .await;

    assert_eq!(result, "No relationships found for document.");
}

#[tokio::test]
async fn read_relationships_builds_sparse_filter_from_empty_params() {
    let api = Arc::new(FakeApi::default());
    *api.relationships.lock().unwrap() = Some(Vec::new());

    // Empty strings from the caller must behave exactly like absent fields.
    server_over(api.clone())
        .read_relationships(Parameters(ReadRelationshipsParams {
            resource_type: "document".to_string(),
            resource_id: Some(String::new()),
            relationship_name: Some("  ".to_string()),
            subject_type: None,
            subject_id: Some("john".to_string()),
            subject_relation: None,
        }))
        .await;

    let seen = api.seen_relationship_requests.lock().unwrap();
    let filter = serde_json::to_value(&seen[0].relationship_filter).unwrap();
    assert_eq!(filter, serde_json::json!({"resourceType": "document"}));
}

#[tokio::test]
async fn consistency_policy_applies_to_every_request() {
    let api = Arc::new(FakeApi::default());
    *api.resources.lock().unwrap() = Some(Vec::new());

    let server = AuthRelayServer::new(api.clone(), ConsistencyPolicy::MinimizeLatency);
    server
        .lookup_resources(Parameters(LookupResourcesParams {
            resource_object_type: "project".to_string(),
            permission: "admin".to_string(),
            subject_type: "user".to_string(),
            subject_id: "CTO".to_string(),
        }))
        .await;

    let seen = api.seen_resource_requests.lock().unwrap();
    assert_eq!(seen[0].consistency, Consistency::minimize_latency());
}

#[tokio::test]
async fn bulk_check_preserves_submission_order_in_one_round_trip() {
    let api = Arc::new(FakeApi::default());
    *api.bulk.lock().unwrap() = Some(Ok(vec![granted_pair(), denied_pair()]));

    let result = server_over(api.clone())
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: "document:doc1:view:user:john;folder:folder1:read:user:jane"
                .to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "user:john HAS permission 'view' on document:doc1\n\
         user:jane DOES NOT HAVE permission 'read' on folder:folder1"
    );

    // The whole batch went out as a single request.
    assert_eq!(api.round_trips.load(Ordering::SeqCst), 1);
    let seen = api.seen_bulk_requests.lock().unwrap();
    assert_eq!(seen[0].items.len(), 2);
}

#[tokio::test]
async fn bulk_check_renders_subject_relation_when_given() {
    let api = Arc::new(FakeApi::default());
    *api.bulk.lock().unwrap() = Some(Ok(vec![granted_pair()]));

    let result = server_over(api.clone())
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: "document:doc1:view:group:eng:member".to_string(),
        }))
        .await;

    assert_eq!(result, "group:eng#member HAS permission 'view' on document:doc1");

    let seen = api.seen_bulk_requests.lock().unwrap();
    assert_eq!(
        seen[0].items[0].subject.optional_relation.as_deref(),
        Some("member")
    );
}

#[tokio::test]
async fn bulk_check_malformed_record_fails_whole_batch() {
    // The service must never be called for a malformed batch.
    let api = Arc::new(FakeApi::default());

    let result = server_over(api.clone())
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: "document:doc1:view:user:john;document:doc1:view".to_string(),
        }))
        .await;

    assert!(result.starts_with("Error checking bulk permissions: invalid check format:"));
    assert!(result.contains("document:doc1:view."));
    assert_eq!(api.round_trips.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bulk_check_empty_input_is_a_format_error() {
    let api = Arc::new(FakeApi::default());

    let result = server_over(api)
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: " ; ; ".to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "Error checking bulk permissions: no valid permission checks provided"
    );
}

#[tokio::test]
async fn bulk_check_pair_error_aborts_the_batch() {
    let api = Arc::new(FakeApi::default());
    *api.bulk.lock().unwrap() = Some(Ok(vec![
        granted_pair(),
        CheckBulkPermissionsPair {
            item: None,
            error: Some(RpcStatus {
                code: 3,
                message: "object definition `folder` not found".to_string(),
            }),
        },
    ]));

    let result = server_over(api)
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: "document:doc1:view:user:john;folder:folder1:read:user:jane"
                .to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "Error checking bulk permissions: object definition `folder` not found"
    );
}

#[tokio::test]
async fn bulk_check_length_mismatch_is_an_internal_error() {
    let api = Arc::new(FakeApi::default());
    *api.bulk.lock().unwrap() = Some(Ok(vec![granted_pair()]));

    let result = server_over(api)
        .check_bulk_permissions(Parameters(CheckBulkPermissionsParams {
            permission_checks: "document:doc1:view:user:john;folder:folder1:read:user:jane"
                .to_string(),
        }))
        .await;

    assert_eq!(
        result,
        "Error checking bulk permissions: service returned 1 results for 2 checks"
    );
}
