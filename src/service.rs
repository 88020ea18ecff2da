//! The seam between the pipeline and the remote generative-AI service.
//!
//! The pipeline only ever talks to `Arc<dyn GenerativeService>`. The
//! production implementation is [`crate::gemini::GeminiClient`]; tests plug
//! in scripted doubles to drive state sequences and count calls.

use crate::error::AnalyzeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Processing state of an uploaded file, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileState {
    /// Still being ingested; poll again later.
    Processing,
    /// Ready to be referenced in a generation request (`ACTIVE`).
    Ready,
    /// Terminal failure.
    Failed,
    /// `STATE_UNSPECIFIED` or a value this crate does not know.
    #[default]
    Unspecified,
}

impl From<String> for FileState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PROCESSING" => FileState::Processing,
            "ACTIVE" => FileState::Ready,
            "FAILED" => FileState::Failed,
            _ => FileState::Unspecified,
        }
    }
}

impl From<FileState> for String {
    fn from(s: FileState) -> Self {
        match s {
            FileState::Processing => "PROCESSING",
            FileState::Ready => "ACTIVE",
            FileState::Failed => "FAILED",
            FileState::Unspecified => "STATE_UNSPECIFIED",
        }
        .to_string()
    }
}

/// Handle to a file held by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`. Used for state fetches.
    pub name: String,
    /// URI referenced from generation requests.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: FileState,
}

/// One element of a multimodal generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Part {
    /// Reference to a previously uploaded file.
    FileData { mime_type: String, file_uri: String },
    /// Plain instruction text.
    Text(String),
}

/// Sampling parameters sent with a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

/// A model entry from the service's model listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Full resource name, e.g. `models/gemini-2.5-flash-lite`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Model id without the `models/` prefix.
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// Operations the pipeline needs from a multimodal generative-AI service.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Upload a local file; the returned handle is usually still processing.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, AnalyzeError>;

    /// Fetch the current state of an uploaded file by resource name.
    async fn get_file(&self, name: &str) -> Result<RemoteFile, AnalyzeError>;

    /// Run one generation request and return the concatenated response text.
    async fn generate_content(
        &self,
        model: &str,
        parts: &[Part],
        settings: &GenerationSettings,
    ) -> Result<String, AnalyzeError>;

    /// List the models visible to the configured key.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalyzeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_state_maps_service_labels() {
        let f: RemoteFile = serde_json::from_value(json!({
            "name": "files/abc",
            "uri": "https://example.test/files/abc",
            "mimeType": "video/mp4",
            "state": "ACTIVE"
        }))
        .unwrap();
        assert_eq!(f.state, FileState::Ready);

        let unknown: FileState = serde_json::from_value(json!("SOMETHING_NEW")).unwrap();
        assert_eq!(unknown, FileState::Unspecified);
    }

    #[test]
    fn missing_state_defaults_to_unspecified() {
        let f: RemoteFile = serde_json::from_value(json!({ "name": "files/x" })).unwrap();
        assert_eq!(f.state, FileState::Unspecified);
        assert!(f.uri.is_empty());
    }

    #[test]
    fn parts_serialise_in_service_shape() {
        let parts = vec![
            Part::FileData {
                mime_type: "video/mp4".into(),
                file_uri: "https://example.test/files/abc".into(),
            },
            Part::Text("describe".into()),
        ];
        let v = serde_json::to_value(&parts).unwrap();
        assert_eq!(
            v,
            json!([
                { "fileData": { "mimeType": "video/mp4", "fileUri": "https://example.test/files/abc" } },
                { "text": "describe" }
            ])
        );
    }

    #[test]
    fn model_info_helpers() {
        let m: ModelInfo = serde_json::from_value(json!({
            "name": "models/gemini-2.5-flash-lite",
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        }))
        .unwrap();
        assert_eq!(m.id(), "gemini-2.5-flash-lite");
        assert!(m.supports_generate_content());
    }
}
