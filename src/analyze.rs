//! Pipeline entry points.
//!
//! [`analyze`] runs one upload through every stage in order:
//!
//! 1. check the API key (before any side effect)
//! 2. stage the bytes to a scratch file
//! 3. upload and wait for remote processing
//! 4. one extraction request
//! 5. release the scratch file, on every path
//! 6. parse the answer against the JSON contract

use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::gemini::GeminiClient;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::input::UploadedMedia;
use crate::pipeline::stage::{self, StagedFile};
use crate::pipeline::{contract, extract, ingest};
use crate::service::{GenerativeService, ModelInfo};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Analyze one uploaded video.
///
/// # Errors
/// - [`AnalyzeError::Configuration`] when no API key is configured; nothing
///   is staged or sent in that case
/// - [`AnalyzeError::InvalidInput`] for an empty upload
/// - [`AnalyzeError::ProcessingFailed`] / [`AnalyzeError::ProcessingTimeout`]
///   when the service never makes the video ready
/// - [`AnalyzeError::Contract`] when the answer is not valid contract JSON
///
/// The scratch file is gone by the time this returns, whatever the outcome.
pub async fn analyze(
    media: UploadedMedia,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzeError> {
    let outcome = run(media, config).await;

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(outcome.as_ref().ok().map(|o| o.result.items.len()));
    }
    outcome
}

/// Read a local video file and [`analyze`] it.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzeError> {
    config.require_api_key()?;
    let media = UploadedMedia::from_path(path).await?;
    analyze(media, config).await
}

/// Models visible to the configured key that support content generation.
pub async fn available_models(config: &AnalyzerConfig) -> Result<Vec<ModelInfo>, AnalyzeError> {
    let service = resolve_service(config)?;
    let mut models = service.list_models().await?;
    models.retain(ModelInfo::supports_generate_content);
    Ok(models)
}

/// Pick a model from a listing: the configured default if offered, else
/// the first "flash" model, else the first entry.
pub fn recommend_model<'a>(models: &'a [ModelInfo], preferred: &str) -> Option<&'a ModelInfo> {
    models
        .iter()
        .find(|m| m.id() == preferred)
        .or_else(|| models.iter().find(|m| m.id().contains("flash")))
        .or_else(|| models.first())
}

async fn run(media: UploadedMedia, config: &AnalyzerConfig) -> Result<AnalysisOutput, AnalyzeError> {
    let total_start = Instant::now();

    // ── Step 1: Configuration ────────────────────────────────────────────
    let service = resolve_service(config)?;
    if media.is_empty() {
        return Err(AnalyzeError::InvalidInput("video file is empty".into()));
    }
    info!(
        "Starting analysis: {} bytes, {}, model {}",
        media.len(),
        media.mime_type(),
        config.model
    );

    // ── Step 2: Stage ────────────────────────────────────────────────────
    let mime_type = media.mime_type().to_string();
    let staged = stage::stage(media, &config.staging_dir).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_staged(staged.size());
    }

    let mut stats = AnalysisStats {
        staged_bytes: staged.size(),
        ..Default::default()
    };

    // ── Steps 3–4: Remote work, with the scratch file alive ──────────────
    let remote = run_remote(service.as_ref(), &staged, &mime_type, config, &mut stats).await;

    // ── Step 5: Release, regardless of outcome ───────────────────────────
    let staged_path = staged.path().to_path_buf();
    if let Err(e) = staged.release() {
        warn!("Failed to remove staged upload {}: {}", staged_path.display(), e);
    }
    let raw = remote?;

    // ── Step 6: Contract ─────────────────────────────────────────────────
    let result = contract::parse_extraction(&raw, config.strictness).map_err(|e| {
        error!("AI response violates the JSON contract: {}", e.detail);
        AnalyzeError::from(e)
    })?;

    if let Some(diff) = result.value_discrepancy() {
        warn!(
            "Model total_value {} differs from item sum {} by {}",
            result.total_value,
            result.items_total(),
            diff
        );
    }

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Analysis complete: {} items, total {} INR, {}ms",
        result.items.len(),
        result.total_value,
        stats.total_duration_ms
    );

    Ok(AnalysisOutput { result, stats })
}

async fn run_remote(
    service: &dyn GenerativeService,
    staged: &StagedFile,
    mime_type: &str,
    config: &AnalyzerConfig,
    stats: &mut AnalysisStats,
) -> Result<String, AnalyzeError> {
    let upload_start = Instant::now();
    let handle = ingest::submit(service, staged, mime_type, &config.display_name).await?;
    stats.upload_duration_ms = upload_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_uploaded(&handle.name);
    }

    let wait_start = Instant::now();
    let ready = ingest::await_ready(
        service,
        &handle,
        &config.poll_policy(),
        config.progress_callback.as_ref(),
    )
    .await?;
    stats.status_checks = ready.status_checks;
    stats.processing_duration_ms = wait_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start();
    }
    let extract_start = Instant::now();
    let raw = extract::extract(service, &ready.file, config).await?;
    stats.extraction_duration_ms = extract_start.elapsed().as_millis() as u64;
    Ok(raw)
}

/// Resolve the service, from most-specific to least-specific.
///
/// 1. **Pre-built service** (`config.service`), used as-is; tests and
///    callers with custom middleware go this way.
/// 2. **Gemini REST client** built from `api_key` and `base_url`.
///
/// The key is required on both paths so a missing secret fails the same
/// way no matter how the service was wired.
fn resolve_service(config: &AnalyzerConfig) -> Result<Arc<dyn GenerativeService>, AnalyzeError> {
    let api_key = config.require_api_key()?;

    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let client = GeminiClient::new(api_key, config.base_url.clone(), config.request_timeout)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelInfo {
        ModelInfo {
            name: format!("models/{name}"),
            display_name: None,
            supported_generation_methods: vec!["generateContent".into()],
        }
    }

    #[test]
    fn recommend_prefers_configured_model() {
        let models = vec![model("gemini-2.5-pro"), model("gemini-2.5-flash-lite")];
        let pick = recommend_model(&models, "gemini-2.5-flash-lite").unwrap();
        assert_eq!(pick.id(), "gemini-2.5-flash-lite");
    }

    #[test]
    fn recommend_falls_back_to_flash_then_first() {
        let models = vec![model("gemini-2.5-pro"), model("gemini-2.0-flash")];
        assert_eq!(recommend_model(&models, "absent").unwrap().id(), "gemini-2.0-flash");

        let models = vec![model("gemini-2.5-pro")];
        assert_eq!(recommend_model(&models, "absent").unwrap().id(), "gemini-2.5-pro");

        assert!(recommend_model(&[], "absent").is_none());
    }

    #[test]
    fn missing_key_blocks_service_resolution() {
        let config = AnalyzerConfig::default();
        assert!(matches!(
            resolve_service(&config),
            Err(AnalyzeError::Configuration { .. })
        ));
    }
}
