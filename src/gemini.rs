//! REST client for the Google Gemini API (`v1beta`).
//!
//! Implements [`GenerativeService`] with four calls:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | upload    | `POST /upload/v1beta/files` (resumable: start, then upload+finalize) |
//! | get file  | `GET /v1beta/{name}` |
//! | generate  | `POST /v1beta/models/{model}:generateContent` |
//! | models    | `GET /v1beta/models` |
//!
//! The key is sent in the `x-goog-api-key` header rather than the query
//! string so it never shows up in request logs.

use crate::error::AnalyzeError;
use crate::service::{GenerationSettings, GenerativeService, ModelInfo, Part, RemoteFile};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Build a client against `base_url` with a per-request timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalyzeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyzeError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: RemoteFile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn transport_error(e: reqwest::Error) -> AnalyzeError {
    if e.is_timeout() {
        AnalyzeError::RemoteApi {
            message: "request to the AI service timed out".into(),
        }
    } else {
        AnalyzeError::RemoteApi {
            message: e.to_string(),
        }
    }
}

/// Turn a non-success response into the matching [`AnalyzeError`].
async fn check(response: Response) -> Result<Response, AnalyzeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalyzeError::Auth { detail },
        StatusCode::TOO_MANY_REQUESTS => AnalyzeError::RateLimited { retry_after_secs },
        _ => AnalyzeError::RemoteApi {
            message: format!("HTTP {status}: {detail}"),
        },
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AnalyzeError> {
    response.json::<T>().await.map_err(|e| AnalyzeError::RemoteApi {
        message: format!("unexpected response body: {e}"),
    })
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, AnalyzeError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AnalyzeError::Internal(format!("Failed to read staged file {}: {e}", path.display()))
        })?;
        let size = bytes.len();

        let start = self
            .http
            .post(self.url("/upload/v1beta/files"))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size)
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(transport_error)?;
        let start = check(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| AnalyzeError::RemoteApi {
                message: "upload session did not return an upload URL".into(),
            })?;
        debug!("Upload session opened for {} bytes", size);

        let finish = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: FileEnvelope = decode(check(finish).await?).await?;
        Ok(envelope.file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, AnalyzeError> {
        let response = self
            .http
            .get(self.url(&format!("/v1beta/{name}")))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        decode(check(response).await?).await
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: &[Part],
        settings: &GenerationSettings,
    ) -> Result<String, AnalyzeError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": settings,
        });

        let response = self
            .http
            .post(self.url(&format!("/v1beta/models/{model}:generateContent")))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: GenerateResponse = decode(check(response).await?).await?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".into());
            return Err(AnalyzeError::RemoteApi {
                message: format!("model returned no answer: {reason}"),
            });
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            debug!("Generation finished: {}", reason);
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalyzeError> {
        let response = self
            .http
            .get(self.url("/v1beta/models"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let list: ModelList = decode(check(response).await?).await?;
        Ok(list.models)
    }
}
