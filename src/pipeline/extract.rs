//! Prompt-driven extraction: one generation request per run.
//!
//! The request pairs the processed video with the underwriter prompt and
//! deterministic sampling settings. Malformed answers are not retried
//! here; the contract parser reports them with the raw text attached.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::pipeline::input::DEFAULT_MIME_TYPE;
use crate::prompts::UNDERWRITER_PROMPT;
use crate::service::{GenerativeService, Part, RemoteFile};
use std::time::Instant;
use tracing::{debug, info};

/// Build the request parts: the file reference first, then the instruction.
pub fn build_parts(file: &RemoteFile, prompt: &str) -> Vec<Part> {
    let mime_type = if file.mime_type.is_empty() {
        DEFAULT_MIME_TYPE.to_string()
    } else {
        file.mime_type.clone()
    };

    vec![
        Part::FileData {
            mime_type,
            file_uri: file.uri.clone(),
        },
        Part::Text(prompt.to_string()),
    ]
}

/// Ask the model to inventory the video and return its raw text answer.
pub async fn extract(
    service: &dyn GenerativeService,
    file: &RemoteFile,
    config: &AnalyzerConfig,
) -> Result<String, AnalyzeError> {
    let start = Instant::now();
    let prompt = config.prompt.as_deref().unwrap_or(UNDERWRITER_PROMPT);
    let parts = build_parts(file, prompt);
    let settings = config.generation_settings();

    let text = service
        .generate_content(&config.model, &parts, &settings)
        .await?;

    info!(
        "Extraction with {} returned {} chars in {}ms",
        config.model,
        text.len(),
        start.elapsed().as_millis()
    );
    debug!("Raw model answer: {}", text);
    Ok(text)
}
