//! The uploaded media as received from a client or read from disk.

use crate::error::AnalyzeError;
use std::path::Path;
use tracing::debug;

/// MIME type assumed when the client does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Raw upload: bytes plus what the client said about them.
#[derive(Debug, Clone, Default)]
pub struct UploadedMedia {
    pub bytes: Vec<u8>,
    /// Declared MIME type; `None` or empty means [`DEFAULT_MIME_TYPE`].
    pub mime_type: Option<String>,
    /// Original filename, if the client sent one.
    pub filename: Option<String>,
}

impl UploadedMedia {
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            bytes,
            mime_type,
            filename,
        }
    }

    /// Read a local video file, guessing the MIME type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalyzeError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AnalyzeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => AnalyzeError::InvalidInput(format!("cannot read '{}': {e}", path.display())),
        })?;

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .map(str::to_string);
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::new(bytes, mime_type, filename))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared MIME type without parameters, or [`DEFAULT_MIME_TYPE`].
    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Extension for the scratch file: the filename's own extension if it
    /// looks sane, else one derived from the MIME type, else `mp4`.
    pub fn declared_extension(&self) -> String {
        let from_name = self
            .filename
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase);

        from_name
            .or_else(|| extension_for_mime(self.mime_type()).map(str::to_string))
            .unwrap_or_else(|| "mp4".to_string())
    }
}

/// Best-effort MIME type for common video extensions.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "avi" => Some("video/x-msvideo"),
        "3gp" => Some("video/3gpp"),
        "mpeg" | "mpg" => Some("video/mpeg"),
        _ => None,
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        "video/x-matroska" => Some("mkv"),
        "video/x-msvideo" => Some("avi"),
        "video/3gpp" => Some("3gp"),
        "video/mpeg" => Some("mpeg"),
        _ => None,
    }
}
