//! HTTP surface: `POST /api/analyze` and `GET /health`.
//!
//! The analyze endpoint takes a multipart form with one field named
//! `video`. Success returns the [`ExtractionResult`] JSON; every failure is
//! `{"error": "..."}` with a non-2xx status, plus `"raw"` carrying the
//! model's text when the answer broke the JSON contract.
//!
//! Requests share nothing but the read-only configuration.

use crate::analyze::analyze;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::output::ExtractionResult;
use crate::pipeline::input::UploadedMedia;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

/// Default request body cap (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AnalyzerConfig>,
}

/// Build the router.
pub fn router(config: AnalyzerConfig, max_upload_bytes: usize) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/api/analyze", post(analyze_video))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(
    config: AnalyzerConfig,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    if config.require_api_key().is_err() {
        warn!("No API key configured; every analyze request will fail until one is set");
    }

    let app = router(config, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "api_key_configured": state.config.require_api_key().is_ok(),
        "model": state.config.model,
    }))
}

async fn analyze_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResult>, AnalyzeError> {
    let multipart = multipart.map_err(|e| AnalyzeError::InvalidInput(e.body_text()))?;
    let media = read_video_field(multipart).await?;
    let output = analyze(media, &state.config).await?;
    Ok(Json(output.result))
}

/// Pull the `video` field out of the form; other fields are ignored.
pub async fn read_video_field(mut multipart: Multipart) -> Result<UploadedMedia, AnalyzeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalyzeError::InvalidInput(format!("Failed to read multipart: {e}")))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AnalyzeError::InvalidInput(format!("Failed to read video data: {e}")))?;

        return Ok(UploadedMedia::new(bytes.to_vec(), mime_type, filename));
    }

    Err(AnalyzeError::MissingMedia)
}

impl AnalyzeError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::MissingMedia
            | AnalyzeError::InvalidInput(_)
            | AnalyzeError::FileNotFound { .. } => StatusCode::BAD_REQUEST,
            AnalyzeError::ProcessingTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AnalyzeError::Auth { .. }
            | AnalyzeError::RateLimited { .. }
            | AnalyzeError::RemoteApi { .. } => StatusCode::BAD_GATEWAY,
            AnalyzeError::Configuration { .. }
            | AnalyzeError::InvalidConfig(_)
            | AnalyzeError::Staging { .. }
            | AnalyzeError::ProcessingFailed { .. }
            | AnalyzeError::Contract(_)
            | AnalyzeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Error processing video: {}", self);
        } else {
            warn!("Rejected analyze request: {}", self);
        }

        let mut body = json!({ "error": self.to_string() });
        if let Some(raw) = self.raw_response() {
            body["raw"] = Value::String(raw.to_string());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContractError;

    #[test]
    fn status_mapping() {
        assert_eq!(AnalyzeError::MissingMedia.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AnalyzeError::missing_api_key().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AnalyzeError::ProcessingFailed { name: "files/a".into() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AnalyzeError::ProcessingTimeout { attempts: 3, elapsed_secs: 6 }.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AnalyzeError::RateLimited { retry_after_secs: None }.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn contract_error_body_carries_raw() {
        let err = AnalyzeError::from(ContractError {
            detail: "eof".into(),
            raw: "{\"items\":".into(),
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "Failed to parse AI response");
        assert_eq!(v["raw"], "{\"items\":");
    }
}
