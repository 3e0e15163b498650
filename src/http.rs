//! HTTP surface for fiscal-document ingestion.
//!
//! - `POST /api/fiscal-documents/upload`: multipart upload, field `file`
//! - `GET /api/fiscal-documents`: every ingested document
//! - `GET /api/fiscal-documents/:id`: one document, `404` when absent
//!
//! Failures are a single JSON error object. Rejected files and header-contract violations are
//! `400`; everything else is `500`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::error::IngestionError;
use crate::ingestion::{IngestionOptions, get_document, ingest_upload, list_documents};
use crate::store::{DocumentStore, StoreError};
use crate::types::StoredDocument;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Ingestion failure; status depends on the cause
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Storage failure on the read path (500)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Ingestion(err @ IngestionError::HeaderMismatch(_)) => {
                (StatusCode::BAD_REQUEST, "HEADER_MISMATCH", err.to_string())
            }
            ApiError::Ingestion(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, "INVALID_FILE", err.to_string())
            }
            ApiError::Ingestion(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROCESSING_ERROR",
                format!("error processing the file: {err}"),
            ),
            ApiError::Store(err) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", err.to_string()),
        };

        if status.is_server_error() {
            error!(code, "{message}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub options: Arc<IngestionOptions>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, options: IngestionOptions) -> Self {
        Self {
            store,
            options: Arc::new(options),
        }
    }
}

/// Build the fiscal-document routes.
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.options.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/api/fiscal-documents/upload", post(upload_document))
        .route("/api/fiscal-documents", get(list_all))
        .route("/api/fiscal-documents/:id", get(get_one))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// POST /api/fiscal-documents/upload
///
/// Ingestion is synchronous and CPU-bound, so it runs on the blocking pool.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<StoredDocument>>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((filename, bytes));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("missing multipart field 'file'".to_string()))?;
    info!(filename = %filename, size = bytes.len(), "fiscal document upload received");

    let report = tokio::task::spawn_blocking(move || {
        ingest_upload(&filename, &bytes, state.store.as_ref(), &state.options)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("ingestion task failed: {e}")))??;

    Ok(Json(report.documents))
}

/// GET /api/fiscal-documents
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Json<Vec<StoredDocument>>> {
    Ok(Json(list_documents(state.store.as_ref())?))
}

/// GET /api/fiscal-documents/:id
pub async fn get_one(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<StoredDocument>> {
    get_document(state.store.as_ref(), id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("fiscal document {id}")))
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `FISCAL_INGEST_BIND`, default `127.0.0.1:8080`.
    pub bind: SocketAddr,
    /// `FISCAL_INGEST_MAX_UPLOAD_MB`, default 512.
    pub max_upload_mb: u64,
}

/// Invalid server setting.
#[derive(Debug, Error)]
#[error("invalid value for {var}: '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_upload_mb: 512,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup("FISCAL_INGEST_BIND") {
            config.bind = value.parse().map_err(|_| ConfigError {
                var: "FISCAL_INGEST_BIND",
                value,
            })?;
        }
        if let Some(value) = lookup("FISCAL_INGEST_MAX_UPLOAD_MB") {
            config.max_upload_mb = value.parse().map_err(|_| ConfigError {
                var: "FISCAL_INGEST_MAX_UPLOAD_MB",
                value,
            })?;
        }
        Ok(config)
    }

    /// Ingestion options matching these settings.
    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            max_file_size: self.max_upload_mb.saturating_mul(1024 * 1024),
            ..Default::default()
        }
    }
}
