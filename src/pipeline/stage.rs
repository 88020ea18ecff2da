//! Temp staging: put the upload on disk for the remote upload call.
//!
//! The upload client streams from a path, so the bytes have to land in a
//! file first. Each run gets its own file, named
//! `upload-<unix-millis>-<random>.<ext>`; `tempfile` creates it with
//! `O_EXCL`, so two concurrent requests in the same millisecond still get
//! different paths.
//!
//! A [`StagedFile`] is removed exactly once: by [`StagedFile::release`] on
//! the normal path, or by its destructor if the owning future is dropped
//! (client disconnect, panic) before release runs.

use crate::error::AnalyzeError;
use crate::pipeline::input::UploadedMedia;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// A scratch copy of an upload.
#[derive(Debug)]
pub struct StagedFile {
    temp: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// Bytes written.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the file now and report the outcome.
    pub fn release(self) -> std::io::Result<()> {
        let path = self.temp.to_path_buf();
        self.temp.close()?;
        debug!("Released staged upload {}", path.display());
        Ok(())
    }
}

/// Write `media` to a fresh file inside `dir` (created if missing).
///
/// The create/write/fsync runs on the blocking pool; uploads can be large.
/// Any I/O failure is fatal for the request; there is no retry.
pub async fn stage(media: UploadedMedia, dir: &Path) -> Result<StagedFile, AnalyzeError> {
    let dir = dir.to_path_buf();
    let suffix = format!(".{}", media.declared_extension());

    tokio::task::spawn_blocking(move || write_scratch(&media.bytes, &dir, &suffix))
        .await
        .map_err(|e| AnalyzeError::Internal(format!("staging task failed: {e}")))?
}

fn write_scratch(bytes: &[u8], dir: &Path, suffix: &str) -> Result<StagedFile, AnalyzeError> {
    let fail = |source: std::io::Error| AnalyzeError::Staging {
        dir: dir.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(fail)?;

    let prefix = format!("upload-{}-", chrono::Utc::now().timestamp_millis());
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(fail)?;

    file.write_all(bytes).map_err(fail)?;
    file.as_file().sync_all().map_err(fail)?;

    let temp = file.into_temp_path();
    debug!("Staged {} bytes at {}", bytes.len(), temp.display());

    Ok(StagedFile {
        temp,
        size: bytes.len() as u64,
    })
}

/// Scratch files currently present in `dir` (used by tests and diagnostics).
pub fn staged_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_upload = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("upload-"));
        if is_upload {
            out.push(path);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(bytes: &[u8]) -> UploadedMedia {
        UploadedMedia::new(bytes.to_vec(), Some("video/mp4".into()), Some("room.mp4".into()))
    }

    #[tokio::test]
    async fn stage_writes_bytes_with_expected_name() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(media(b"frames"), dir.path()).await.unwrap();

        let name = staged.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("upload-"), "got: {name}");
        assert!(name.ends_with(".mp4"), "got: {name}");
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"frames");
        assert_eq!(staged.size(), 6);
    }

    #[tokio::test]
    async fn release_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(media(b"x"), dir.path()).await.unwrap();
        let path = staged.path().to_path_buf();

        staged.release().unwrap();
        assert!(!path.exists());
        assert!(staged_files_in(dir.path()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn drop_without_release_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = stage(media(b"x"), dir.path()).await.unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn back_to_back_stages_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = stage(media(b"a"), dir.path()).await.unwrap();
        let b = stage(media(b"b"), dir.path()).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(staged_files_in(dir.path()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("scratch").join("uploads");
        let staged = stage(media(b"x"), &nested).await.unwrap();
        assert!(staged.path().starts_with(&nested));
    }

    #[tokio::test]
    async fn unwritable_directory_is_a_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let file_not_dir = dir.path().join("plain-file");
        std::fs::write(&file_not_dir, b"").unwrap();

        let err = stage(media(b"x"), &file_not_dir).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::Staging { .. }), "got: {err:?}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn staging_yields_to_other_tasks() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        // Single-threaded runtime: the spawned task can only run if staging
        // suspends instead of writing on this thread.
        let staged = stage(media(&vec![7u8; 8 * 1024 * 1024]), dir.path())
            .await
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(staged.size(), 8 * 1024 * 1024);
    }
}
