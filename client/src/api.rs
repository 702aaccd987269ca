//! Gateway to the remote AMS CRUD endpoint.
//!
//! One operation issues exactly one remote call and parses exactly one
//! envelope. There are no retries and no request de-duplication; an
//! in-flight call is abandoned by dropping its future.

use ams_types::{EntityKind, EntityRecord, EntitySchema, Envelope, FormBuffer, RequestEncoding};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Result type for gateway operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Call could not be completed.
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP status.
    #[error("HTTP {0} error: {1}")]
    Http(u16, String),
    /// Malformed response envelope.
    #[error("decode error: {0}")]
    Decode(String),
    /// Envelope outcome was failure; carries the server message
    /// verbatim when present, else a generic fallback.
    #[error("{0}")]
    Server(String),
    /// Update and delete require a non-empty record id.
    #[error("record id must not be empty")]
    EmptyId,
}

/// The remote CRUD surface, one suspend point per operation.
///
/// A trait seam so screen controllers can be driven against an
/// in-memory double in tests.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Fetch the full record list for one kind.
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<EntityRecord>>;

    /// Create a record from the staged buffer.
    async fn create(&self, kind: EntityKind, buffer: &FormBuffer) -> ApiResult<EntityRecord>;

    /// Update the record `id` with the staged buffer.
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        buffer: &FormBuffer,
    ) -> ApiResult<EntityRecord>;

    /// Delete the record `id`.
    async fn delete(&self, kind: EntityKind, id: &str) -> ApiResult<()>;

    /// Flag a notification as read without touching its other fields.
    async fn mark_notification_read(&self, id: &str) -> ApiResult<()>;
}

/// Gateway talking to the real endpoint over HTTP.
///
/// Reads are GET; writes are POST with the kind's schema encoding
/// (multipart form fields or a JSON body).
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    /// Optional bearer token taken from the current session.
    auth_token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_auth(base_url, None)
    }

    pub fn with_auth(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            auth_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Helper to add the auth header to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.auth_token {
            builder.header("Authorization", format!("Bearer {}", token))
        } else {
            builder
        }
    }

    fn endpoint(&self, kind: EntityKind, action: &str) -> String {
        format!(
            "{}/api.php?table={}&action={}",
            self.base_url,
            kind.table(),
            action
        )
    }

    /// Check the HTTP status and parse the envelope.
    async fn read_envelope(response: reqwest::Response) -> ApiResult<Envelope> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            error!("HTTP error {}: {}", status, text);
            return Err(ApiError::Http(status, text));
        }

        response.json().await.map_err(|e| {
            error!("Failed to parse response envelope: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    /// Issue one write (create/update/delete) in the kind's encoding.
    async fn post_action(
        &self,
        kind: EntityKind,
        action: &str,
        id: Option<&str>,
        buffer: Option<&FormBuffer>,
    ) -> ApiResult<Envelope> {
        let schema = EntitySchema::of(kind);
        let url = self.endpoint(kind, action);
        debug!("POST {}", url);

        let request = match schema.encoding {
            RequestEncoding::Form => {
                let mut form = reqwest::multipart::Form::new();
                if let Some(id) = id {
                    form = form.text("id", id.to_string());
                }
                if let Some(buffer) = buffer {
                    for (field, value) in buffer.fields() {
                        if field == schema.id_field {
                            continue;
                        }
                        form = form.text(field.to_string(), value.to_string());
                    }
                }
                self.authorize(self.client.post(&url)).multipart(form)
            }
            RequestEncoding::Json => {
                let mut body = Map::new();
                if let Some(id) = id {
                    body.insert("id".to_string(), Value::String(id.to_string()));
                }
                if let Some(buffer) = buffer {
                    for (field, value) in buffer.fields() {
                        if field == schema.id_field {
                            continue;
                        }
                        body.insert(field.to_string(), Value::String(value.to_string()));
                    }
                }
                self.authorize(self.client.post(&url)).json(&body)
            }
        };

        let response = request.send().await.map_err(|e| {
            error!("Network request failed: {}", e);
            ApiError::Network(e.to_string())
        })?;

        Self::read_envelope(response).await
    }
}

/// Envelope failure → server error with the verbatim message when
/// present.
fn check_outcome(envelope: &Envelope, fallback: &str) -> ApiResult<()> {
    if envelope.is_success() {
        return Ok(());
    }
    let message = envelope
        .message
        .clone()
        .unwrap_or_else(|| fallback.to_string());
    Err(ApiError::Server(message))
}

#[async_trait]
impl EntityGateway for HttpGateway {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<EntityRecord>> {
        let url = self.endpoint(kind, "read");
        debug!("Fetching {} from {}", kind.table(), url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                error!("Network error fetching {}: {}", kind.table(), e);
                ApiError::Network(e.to_string())
            })?;

        let envelope = Self::read_envelope(response).await?;
        check_outcome(&envelope, &format!("Failed to fetch {} records", kind))?;

        let records = envelope.records();
        debug!("Loaded {} {} records", records.len(), kind);
        Ok(records)
    }

    async fn create(&self, kind: EntityKind, buffer: &FormBuffer) -> ApiResult<EntityRecord> {
        let envelope = self.post_action(kind, "create", None, Some(buffer)).await?;
        check_outcome(&envelope, "Failed to process record")?;
        Ok(envelope.record().unwrap_or_else(|| buffer.to_record()))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        buffer: &FormBuffer,
    ) -> ApiResult<EntityRecord> {
        if id.is_empty() {
            return Err(ApiError::EmptyId);
        }
        let envelope = self
            .post_action(kind, "update", Some(id), Some(buffer))
            .await?;
        check_outcome(&envelope, "Failed to process record")?;
        Ok(envelope.record().unwrap_or_else(|| buffer.to_record()))
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> ApiResult<()> {
        if id.is_empty() {
            return Err(ApiError::EmptyId);
        }
        let envelope = self.post_action(kind, "delete", Some(id), None).await?;
        check_outcome(&envelope, "Failed to delete record")
    }

    async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        if id.is_empty() {
            return Err(ApiError::EmptyId);
        }
        let kind = EntityKind::Notification;
        let url = self.endpoint(kind, "update");
        debug!("Marking notification {} read", id);

        // Partial update: only the id and the status flag, so the
        // other fields are left untouched server-side.
        let form = reqwest::multipart::Form::new()
            .text("id", id.to_string())
            .text("status", "read");
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Network request failed: {}", e);
                ApiError::Network(e.to_string())
            })?;

        let envelope = Self::read_envelope(response).await?;
        check_outcome(&envelope, "Failed to update notification")
    }
}
