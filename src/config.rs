//! Configuration for the room-video analysis pipeline.
//!
//! Every knob lives in [`AnalyzerConfig`], built via [`AnalyzerConfigBuilder`]
//! or [`AnalyzerConfig::from_env`]. The pipeline never reads the process
//! environment itself: the configuration object is the only input besides
//! the media, so tests can inject fake keys, endpoints and services.

use crate::error::AnalyzeError;
use crate::gemini::DEFAULT_BASE_URL;
use crate::progress::ProgressCallback;
use crate::service::{GenerationSettings, GenerativeService};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default model used for extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Display name attached to every upload.
pub const DEFAULT_DISPLAY_NAME: &str = "Insurance Video";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for one or many analysis runs.
///
/// # Example
/// ```rust
/// use dekhovalue::AnalyzerConfig;
/// use std::time::Duration;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("AIza-test")
///     .poll_interval(Duration::from_secs(1))
///     .max_poll_attempts(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash-lite");
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// API key for the remote service. `None` fails every request with
    /// [`AnalyzeError::Configuration`] before any side effect.
    pub api_key: Option<String>,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Default: 0 (deterministic).
    pub temperature: f32,

    /// Nucleus sampling cutoff. Default: 0.95.
    pub top_p: f32,

    /// Top-k sampling cutoff. Default: 40.
    pub top_k: u32,

    /// Maximum tokens in the model's answer. Default: 8192.
    pub max_output_tokens: u32,

    /// Delay between readiness checks. Default: 2 s.
    pub poll_interval: Duration,

    /// Maximum number of readiness checks. Default: 150.
    pub max_poll_attempts: u32,

    /// Maximum wall-clock time spent waiting for readiness. Default: 300 s.
    pub max_processing_wait: Duration,

    /// Timeout applied to each HTTP request to the service. Default: 120 s.
    ///
    /// Uploads of a few tens of megabytes over a slow uplink are the long pole.
    pub request_timeout: Duration,

    /// Directory for staged uploads. Default: the OS temp directory.
    pub staging_dir: PathBuf,

    /// Display name given to uploaded files.
    pub display_name: String,

    /// Custom extraction prompt. If None, uses the built-in underwriter prompt.
    pub prompt: Option<String>,

    /// How strictly the model's JSON is validated. Default: strict.
    pub strictness: Strictness,

    /// Pre-constructed service. Takes precedence over `api_key`/`base_url`
    /// when building the client, but the key is still required.
    pub service: Option<Arc<dyn GenerativeService>>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 150,
            max_processing_wait: Duration::from_secs(300),
            request_timeout: Duration::from_secs(120),
            staging_dir: std::env::temp_dir(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            prompt: None,
            strictness: Strictness::default(),
            service: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("max_processing_wait", &self.max_processing_wait)
            .field("staging_dir", &self.staging_dir)
            .field("strictness", &self.strictness)
            .field("service", &self.service.as_ref().map(|_| "<dyn GenerativeService>"))
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus whatever the environment provides:
    /// `GEMINI_API_KEY`, `GEMINI_BASE_URL`, `DEKHOVALUE_MODEL`.
    ///
    /// A missing key is not an error here; it is reported per request.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = non_empty_env(API_KEY_ENV);
        if let Some(url) = non_empty_env("GEMINI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = non_empty_env("DEKHOVALUE_MODEL") {
            config.model = model;
        }
        config
    }

    /// The API key, or the configuration error every request must report.
    pub fn require_api_key(&self) -> Result<&str, AnalyzeError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(AnalyzeError::missing_api_key)
    }

    /// Sampling parameters for the extraction request.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// The bound applied to the readiness loop.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_attempts: self.max_poll_attempts,
            max_wait: self.max_processing_wait,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.config.poll_interval = d;
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n;
        self
    }

    pub fn max_processing_wait(mut self, d: Duration) -> Self {
        self.config.max_processing_wait = d;
        self
    }

    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.config.request_timeout = d;
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = dir.into();
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.config.display_name = name.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn strictness(mut self, s: Strictness) -> Self {
        self.config.strictness = s;
        self
    }

    pub fn service(mut self, service: Arc<dyn GenerativeService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The API key is not checked here; a missing key is reported per
    /// request as [`AnalyzeError::Configuration`].
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzeError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalyzeError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_poll_attempts == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "max_poll_attempts must be ≥ 1".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AnalyzeError::InvalidConfig(format!(
                "base_url must be an HTTP(S) URL, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Policies ─────────────────────────────────────────────────────────────

/// How the model's JSON is checked after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Shape, risk labels in {Low, Medium, High}, finite non-negative amounts. (default)
    #[default]
    Strict,
    /// Shape only; unknown risk labels and odd amounts pass through.
    Lenient,
}

/// Bounds for the readiness loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_wait: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extraction_contract() {
        let c = AnalyzerConfig::default();
        let s = c.generation_settings();
        assert_eq!(s.temperature, 0.0);
        assert_eq!(s.top_p, 0.95);
        assert_eq!(s.top_k, 40);
        assert_eq!(s.max_output_tokens, 8192);
        assert_eq!(c.poll_interval, Duration::from_secs(2));
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.display_name, "Insurance Video");
    }

    #[test]
    fn missing_or_blank_key_is_a_configuration_error() {
        let c = AnalyzerConfig::default();
        assert!(matches!(
            c.require_api_key(),
            Err(AnalyzeError::Configuration { .. })
        ));

        let blank = AnalyzerConfig::builder().api_key("  ").build().unwrap();
        assert!(blank.require_api_key().is_err());

        let ok = AnalyzerConfig::builder().api_key("k").build().unwrap();
        assert_eq!(ok.require_api_key().unwrap(), "k");
    }

    #[test]
    fn build_rejects_zero_poll_attempts() {
        let err = AnalyzerConfig::builder().max_poll_attempts(0).build();
        assert!(matches!(err, Err(AnalyzeError::InvalidConfig(_))));
    }

    #[test]
    fn build_rejects_non_http_base_url() {
        let err = AnalyzerConfig::builder().base_url("ftp://x").build();
        assert!(matches!(err, Err(AnalyzeError::InvalidConfig(_))));
    }

    #[test]
    fn debug_redacts_key() {
        let c = AnalyzerConfig::builder().api_key("secret-key").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn poll_policy_reflects_builder() {
        let c = AnalyzerConfig::builder()
            .poll_interval(Duration::from_millis(10))
            .max_poll_attempts(3)
            .max_processing_wait(Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(
            c.poll_policy(),
            PollPolicy {
                interval: Duration::from_millis(10),
                max_attempts: 3,
                max_wait: Duration::from_secs(1),
            }
        );
    }
}
