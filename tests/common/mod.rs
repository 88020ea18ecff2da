//! Shared test doubles for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use dekhovalue::{
    AnalyzeError, AnalyzerConfig, FileState, GenerationSettings, GenerativeService, ModelInfo,
    Part, RemoteFile,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SOFA_JSON: &str = r#"{"items":[{"name":"Sofa","category":"Furniture","condition":"Used","estimated_price_inr":50000,"risk_factor":"Low"}],"total_value":50000,"recommended_coverage":60000}"#;

/// In-memory service that replays a scripted sequence of file states.
///
/// Once the script runs out, the last state repeats (or `PROCESSING` if
/// the script was empty).
pub struct ScriptedService {
    states: Mutex<VecDeque<FileState>>,
    last_state: Mutex<FileState>,
    response: String,
    fail_upload: bool,
    pub uploads: AtomicU32,
    pub status_checks: AtomicU32,
    pub generations: AtomicU32,
    /// Set when the staged path existed and held bytes at upload time.
    pub staged_file_seen: AtomicBool,
    pub last_parts: Mutex<Vec<Part>>,
    pub last_model: Mutex<Option<String>>,
}

impl ScriptedService {
    pub fn new(states: &[FileState], response: impl Into<String>) -> Self {
        Self {
            states: Mutex::new(states.iter().copied().collect()),
            last_state: Mutex::new(FileState::Processing),
            response: response.into(),
            fail_upload: false,
            uploads: AtomicU32::new(0),
            status_checks: AtomicU32::new(0),
            generations: AtomicU32::new(0),
            staged_file_seen: AtomicBool::new(false),
            last_parts: Mutex::new(Vec::new()),
            last_model: Mutex::new(None),
        }
    }

    pub fn failing_upload() -> Self {
        let mut s = Self::new(&[FileState::Ready], SOFA_JSON);
        s.fail_upload = true;
        s
    }

    pub fn uploads(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> u32 {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> u32 {
        self.generations.load(Ordering::SeqCst)
    }

    fn file(&self, state: FileState) -> RemoteFile {
        RemoteFile {
            name: "files/room-1".into(),
            uri: "https://example.test/v1beta/files/room-1".into(),
            mime_type: "video/mp4".into(),
            display_name: Some("Insurance Video".into()),
            state,
        }
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn upload_file(
        &self,
        path: &Path,
        _mime_type: &str,
        _display_name: &str,
    ) -> Result<RemoteFile, AnalyzeError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let non_empty = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        self.staged_file_seen.store(non_empty, Ordering::SeqCst);

        if self.fail_upload {
            return Err(AnalyzeError::RemoteApi {
                message: "HTTP 500: upload rejected".into(),
            });
        }
        Ok(self.file(FileState::Processing))
    }

    async fn get_file(&self, _name: &str) -> Result<RemoteFile, AnalyzeError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let state = match self.states.lock().unwrap().pop_front() {
            Some(s) => {
                *self.last_state.lock().unwrap() = s;
                s
            }
            None => *self.last_state.lock().unwrap(),
        };
        Ok(self.file(state))
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: &[Part],
        _settings: &GenerationSettings,
    ) -> Result<String, AnalyzeError> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        *self.last_parts.lock().unwrap() = parts.to_vec();
        *self.last_model.lock().unwrap() = Some(model.to_string());
        Ok(self.response.clone())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalyzeError> {
        Ok(Vec::new())
    }
}

/// Config wired to `service` with a fast poll loop and a private staging dir.
pub fn config_with(service: Arc<ScriptedService>, staging: &Path) -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .api_key("test-key")
        .service(service)
        .staging_dir(staging)
        .poll_interval(Duration::from_millis(5))
        .max_poll_attempts(20)
        .max_processing_wait(Duration::from_secs(5))
        .build()
        .unwrap()
}
