//! Error types for the dekhovalue library.
//!
//! Two error types reflect two layers of failure:
//!
//! * [`AnalyzeError`] — **Fatal for the request**: the pipeline stopped
//!   (missing API key, the remote service rejected the upload, the video
//!   never finished processing). Returned as `Err(AnalyzeError)` from
//!   [`crate::analyze()`] and friends.
//!
//! * [`ContractError`] — the model answered, but its text does not satisfy
//!   the JSON contract. It always carries the raw text untouched so the
//!   caller can show exactly what the model said. It is wrapped by
//!   [`AnalyzeError::Contract`] when it escapes the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the dekhovalue pipeline.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The API key (or another required setting) is absent.
    #[error("{setting} missing.\n{hint}")]
    Configuration { setting: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// The multipart request carried no `video` field.
    #[error("No video file provided")]
    MissingMedia,

    /// The request body could not be read as a media upload.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A local video path given to the CLI does not exist.
    #[error("Video file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Staging errors ────────────────────────────────────────────────────
    /// Writing the upload to the scratch directory failed.
    #[error("Failed to stage upload in '{dir}': {source}")]
    Staging {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote processing errors ──────────────────────────────────────────
    /// The remote service marked the uploaded video as FAILED.
    #[error("Video processing failed")]
    ProcessingFailed { name: String },

    /// The video stayed in PROCESSING past the configured bound.
    #[error("Video processing did not finish after {attempts} status checks ({elapsed_secs}s)")]
    ProcessingTimeout { attempts: u32, elapsed_secs: u64 },

    /// The remote API rejected the key (401/403).
    #[error("Authentication error from the AI service: {detail}")]
    Auth { detail: String },

    /// The remote API returned HTTP 429.
    #[error("Rate limit exceeded by the AI service")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success answer or transport failure from the remote API.
    #[error("AI service error: {message}")]
    RemoteApi { message: String },

    // ── Contract errors ───────────────────────────────────────────────────
    /// The model's answer did not match the expected JSON shape.
    #[error("Failed to parse AI response")]
    Contract(#[from] ContractError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzeError {
    /// The raw model text, present only for contract failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AnalyzeError::Contract(e) => Some(&e.raw),
            _ => None,
        }
    }

    /// `true` when the caller sent something unusable (4xx territory).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalyzeError::MissingMedia
                | AnalyzeError::InvalidInput(_)
                | AnalyzeError::FileNotFound { .. }
        )
    }

    /// Shorthand used by the pipeline when the API key is absent.
    pub fn missing_api_key() -> Self {
        AnalyzeError::Configuration {
            setting: "API Key".into(),
            hint: "Set GEMINI_API_KEY in the environment or pass --api-key.".into(),
        }
    }
}

/// The model's text could not be turned into an [`crate::output::ExtractionResult`].
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct ContractError {
    /// Why the text was rejected (serde message or validation failure).
    pub detail: String,
    /// The exact text the model returned, before fence stripping.
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_display() {
        let msg = AnalyzeError::missing_api_key().to_string();
        assert!(msg.starts_with("API Key missing"), "got: {msg}");
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn contract_error_keeps_raw() {
        let e = AnalyzeError::from(ContractError {
            detail: "expected value at line 1 column 1".into(),
            raw: "not json".into(),
        });
        assert_eq!(e.to_string(), "Failed to parse AI response");
        assert_eq!(e.raw_response(), Some("not json"));
    }

    #[test]
    fn timeout_display() {
        let e = AnalyzeError::ProcessingTimeout {
            attempts: 150,
            elapsed_secs: 300,
        };
        assert!(e.to_string().contains("150 status checks"));
        assert!(e.to_string().contains("300s"));
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(AnalyzeError::MissingMedia.is_input_error());
        assert!(AnalyzeError::InvalidInput("bad".into()).is_input_error());
        assert!(!AnalyzeError::ProcessingFailed { name: "files/x".into() }.is_input_error());
        assert!(AnalyzeError::missing_api_key().raw_response().is_none());
    }
}
