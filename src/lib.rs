//! # dekhovalue
//!
//! Walk-through video in, insurance inventory out.
//!
//! A short video of a room is handed to a multimodal model (Google Gemini),
//! which lists the insurable assets it can see with a condition, an
//! estimated market price in Indian rupees and a risk label, plus a total
//! and a recommended coverage amount.
//!
//! ## Pipeline Overview
//!
//! ```text
//! video bytes
//!  │
//!  ├─ 1. Config   API key present? (checked before any side effect)
//!  ├─ 2. Stage    write to a uniquely named scratch file
//!  ├─ 3. Ingest   resumable upload, then poll until the file is ACTIVE
//!  ├─ 4. Extract  one generateContent call: file reference + prompt
//!  ├─ 5. Release  scratch file removed on every path
//!  └─ 6. Contract strip ``` fences, strict JSON parse
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dekhovalue::{analyze_file, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY
//!     let config = AnalyzerConfig::from_env();
//!     let output = analyze_file("living-room.mp4", &config).await?;
//!     for item in &output.result.items {
//!         println!("{} ({}) Rs. {}", item.name, item.risk_factor, item.estimated_price_inr);
//!     }
//!     println!("cover: Rs. {}", output.result.recommended_coverage);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | via cli | axum HTTP endpoint `POST /api/analyze` |
//! | `cli`    | on      | Enables the `dekhovalue` binary (clap + anyhow + tracing-subscriber) |
//!
//! Library-only use:
//! ```toml
//! dekhovalue = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quote;
#[cfg(feature = "server")]
pub mod server;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, available_models, recommend_model};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, PollPolicy, Strictness};
pub use error::{AnalyzeError, ContractError};
pub use gemini::GeminiClient;
pub use output::{AnalysisOutput, AnalysisStats, ExtractionResult, Item, RiskFactor};
pub use pipeline::input::UploadedMedia;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use service::{FileState, GenerationSettings, GenerativeService, ModelInfo, Part, RemoteFile};
