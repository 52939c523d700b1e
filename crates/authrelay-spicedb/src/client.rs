//! HTTP client for the SpiceDB v1 API.
//!
//! Unary calls are plain JSON POSTs. Server-streaming calls answer with
//! newline-delimited JSON, one `{"result": ...}` or `{"error": ...}` frame per
//! line; an error frame aborts the stream.
//!
//! ## Timeouts and retries
//!
//! Unary requests time out after 30 seconds, streaming requests after 5
//! minutes. A request that fails with a transient transport error is retried
//! once before the failure surfaces. Streams are never retried once response
//! bytes may have been observed; the retry window closes when the response
//! status has been accepted.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{SpiceDbError, SpiceDbResult};
use crate::types::{
    CheckBulkPermissionsPair, CheckBulkPermissionsRequest, CheckBulkPermissionsResponse,
    LookupResourcesRequest, LookupResourcesResponse, LookupSubjectsRequest,
    LookupSubjectsResponse, ReadRelationshipsRequest, ReadRelationshipsResponse,
    ReadSchemaRequest, ReadSchemaResponse, Relationship, RpcStatus,
};

/// Timeout for unary requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for server-streaming requests.
const STREAMING_TIMEOUT: Duration = Duration::from_secs(300);

const SCHEMA_READ: &str = "/v1/schema/read";
const PERMISSIONS_RESOURCES: &str = "/v1/permissions/resources";
const PERMISSIONS_SUBJECTS: &str = "/v1/permissions/subjects";
const RELATIONSHIPS_READ: &str = "/v1/relationships/read";
const PERMISSIONS_CHECKBULK: &str = "/v1/permissions/checkbulk";

/// A lazily-consumed stream of results from a server-streaming call.
///
/// Elements resolve in delivery order; the consumer suspends between
/// elements and an `Err` item terminates the stream.
pub type ResultStream<T> = Pin<Box<dyn Stream<Item = SpiceDbResult<T>> + Send>>;

/// The SpiceDB operations AuthRelay consumes.
///
/// This is the seam between the tool layer and the wire: production code
/// uses [`HttpClient`], tests substitute an in-memory fake.
#[async_trait]
pub trait PermissionsApi: Send + Sync {
    /// Read the schema currently loaded into the store.
    async fn read_schema(&self) -> SpiceDbResult<String>;

    /// Stream the ids of resources the subject holds the permission on.
    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> SpiceDbResult<ResultStream<String>>;

    /// Stream the ids of subjects holding the permission on the resource.
    async fn lookup_subjects(
        &self,
        request: LookupSubjectsRequest,
    ) -> SpiceDbResult<ResultStream<String>>;

    /// Stream stored relationships matching the filter.
    async fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> SpiceDbResult<ResultStream<Relationship>>;

    /// Evaluate many permission checks in a single round trip. The returned
    /// pairs are positionally aligned with the submitted items.
    async fn check_bulk_permissions(
        &self,
        request: CheckBulkPermissionsRequest,
    ) -> SpiceDbResult<Vec<CheckBulkPermissionsPair>>;
}

/// reqwest-backed client for SpiceDB's HTTP gateway.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl HttpClient {
    /// Create a client for the given gateway endpoint.
    ///
    /// Timeouts are applied per request rather than on the client, so a
    /// long-lived stream is not cut off by the unary limit.
    pub fn new(base_url: impl AsRef<str>) -> SpiceDbResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        let http = reqwest::Client::builder()
            .user_agent(format!("authrelay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SpiceDbError::connection(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    /// Create a client with a custom HTTP client.
    pub fn with_http_client(base_url: impl AsRef<str>, http: reqwest::Client) -> SpiceDbResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    /// Set the pre-shared key sent as a bearer token on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> SpiceDbResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// POST `body` to `path`, retrying once on a transient transport error.
    async fn send_with_retry<B>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> SpiceDbResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let mut retried = false;

        loop {
            match self.execute(url.clone(), body, timeout).await {
                Err(err) if err.is_retryable() && !retried => {
                    warn!(url = %url, error = %err, "transient transport failure, retrying once");
                    retried = true;
                }
                other => return other,
            }
        }
    }

    async fn execute<B>(
        &self,
        url: Url,
        body: &B,
        timeout: Duration,
    ) -> SpiceDbResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(url).timeout(timeout).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SpiceDbError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        Ok(response)
    }

    async fn post_unary<B, T>(&self, path: &str, body: &B) -> SpiceDbResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_with_retry(path, body, DEFAULT_TIMEOUT).await?;
        let bytes = response.bytes().await.map_err(|e| {
            SpiceDbError::connection(format!("failed to read response body: {e}"))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_stream<B, T>(&self, path: &str, body: &B) -> SpiceDbResult<ResultStream<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.send_with_retry(path, body, STREAMING_TIMEOUT).await?;
        let mut frames = Box::pin(response.bytes_stream());

        let stream = try_stream! {
            let mut buf: Vec<u8> = Vec::new();
            while let Some(chunk) = frames.next().await {
                let chunk = chunk.map_err(|e| {
                    SpiceDbError::connection(format!("response stream interrupted: {e}"))
                })?;
                buf.extend_from_slice(&chunk);

                while let Some(newline) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=newline).collect();
                    if let Some(result) = decode_frame::<T>(&line)? {
                        yield result;
                    }
                }
            }
            // The gateway terminates every frame with a newline; accept a
            // final unterminated frame anyway.
            if let Some(result) = decode_frame::<T>(&buf)? {
                yield result;
            }
        };

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl PermissionsApi for HttpClient {
    async fn read_schema(&self) -> SpiceDbResult<String> {
        debug!("reading schema");
        let response: ReadSchemaResponse =
            self.post_unary(SCHEMA_READ, &ReadSchemaRequest {}).await?;
        Ok(response.schema_text)
    }

    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> SpiceDbResult<ResultStream<String>> {
        debug!(
            resource_object_type = %request.resource_object_type,
            permission = %request.permission,
            "looking up resources"
        );
        let stream = self
            .post_stream::<_, LookupResourcesResponse>(PERMISSIONS_RESOURCES, &request)
            .await?;
        Ok(Box::pin(stream.map(|item| item.map(|r| r.resource_object_id))))
    }

    async fn lookup_subjects(
        &self,
        request: LookupSubjectsRequest,
    ) -> SpiceDbResult<ResultStream<String>> {
        debug!(
            resource_type = %request.resource.object_type,
            permission = %request.permission,
            "looking up subjects"
        );
        let stream = self
            .post_stream::<_, LookupSubjectsResponse>(PERMISSIONS_SUBJECTS, &request)
            .await?;
        Ok(Box::pin(
            stream.map(|item| item.map(|r| r.subject.subject_object_id)),
        ))
    }

    async fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> SpiceDbResult<ResultStream<Relationship>> {
        debug!(
            resource_type = %request.relationship_filter.resource_type,
            "reading relationships"
        );
        let stream = self
            .post_stream::<_, ReadRelationshipsResponse>(RELATIONSHIPS_READ, &request)
            .await?;
        Ok(Box::pin(stream.map(|item| item.map(|r| r.relationship))))
    }

    async fn check_bulk_permissions(
        &self,
        request: CheckBulkPermissionsRequest,
    ) -> SpiceDbResult<Vec<CheckBulkPermissionsPair>> {
        debug!(items = request.items.len(), "checking bulk permissions");
        let response: CheckBulkPermissionsResponse =
            self.post_unary(PERMISSIONS_CHECKBULK, &request).await?;
        Ok(response.pairs)
    }
}

/// Decode one NDJSON frame. Blank lines yield nothing; an error frame
/// becomes an `Api` error carrying the service's detail.
fn decode_frame<T: DeserializeOwned>(line: &[u8]) -> SpiceDbResult<Option<T>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    #[derive(serde::Deserialize)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    struct StreamFrame<T> {
        #[serde(default)]
        result: Option<T>,
        #[serde(default)]
        error: Option<RpcStatus>,
    }

    let frame: StreamFrame<T> = serde_json::from_slice(line)?;
    if let Some(status) = frame.error {
        return Err(SpiceDbError::api(status.code, status.message));
    }
    Ok(frame.result)
}

async fn error_from_response(status: StatusCode, response: reqwest::Response) -> SpiceDbError {
    let body = response.text().await.unwrap_or_default();

    // The gateway reports errors as {"code", "message", ...}; fall back to the
    // raw body or the status line when the shape is unexpected.
    let message = match serde_json::from_str::<RpcStatus>(&body) {
        Ok(rpc) if !rpc.message.is_empty() => rpc.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string(),
    };

    SpiceDbError::api(i32::from(status.as_u16()), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_frame_extracts_result() {
        let frame: Option<LookupResourcesResponse> =
            decode_frame(br#"{"result": {"resourceObjectId": "doc1"}}"#).unwrap();
        assert_eq!(frame.unwrap().resource_object_id, "doc1");
    }

    #[test]
    fn decode_frame_skips_blank_lines() {
        let frame: Option<LookupResourcesResponse> = decode_frame(b"   \r").unwrap();
        assert!(frame.is_none());
        let frame: Option<LookupResourcesResponse> = decode_frame(b"").unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn decode_frame_surfaces_error_frames() {
        let err = decode_frame::<LookupResourcesResponse>(
            br#"{"error": {"code": 7, "message": "permission denied"}}"#,
        )
        .unwrap_err();

        assert!(matches!(err, SpiceDbError::Api { code: 7, .. }));
        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            HttpClient::new("not a url"),
            Err(SpiceDbError::Url(_))
        ));
    }
}
