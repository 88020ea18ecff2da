//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to observe a
//! run as it moves through staging, upload, readiness polling and
//! extraction. The CLI drives its spinner from these events; the HTTP
//! server runs without one.
//!
//! # Example
//!
//! ```rust
//! use dekhovalue::{AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter(AtomicU32);
//!
//! impl AnalysisProgressCallback for PollCounter {
//!     fn on_status_check(&self, attempt: u32, _state: &str) {
//!         self.0.store(attempt, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(PollCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only
/// override what they care about. Events arrive in pipeline order from a
/// single task.
pub trait AnalysisProgressCallback: Send + Sync {
    /// The upload was written to the scratch directory.
    fn on_staged(&self, bytes: u64) {
        let _ = bytes;
    }

    /// The remote service accepted the upload.
    ///
    /// # Arguments
    /// * `name` — remote resource name, e.g. `files/abc123`
    fn on_uploaded(&self, name: &str) {
        let _ = name;
    }

    /// A readiness check returned.
    ///
    /// # Arguments
    /// * `attempt` — 1-based count of status fetches so far
    /// * `state`   — the service's state label (`PROCESSING`, `ACTIVE`, …)
    fn on_status_check(&self, attempt: u32, state: &str) {
        let _ = (attempt, state);
    }

    /// The extraction request is about to be sent.
    fn on_extraction_start(&self) {}

    /// The run finished, successfully or not.
    ///
    /// # Arguments
    /// * `item_count` — identified items, `None` on failure
    fn on_complete(&self, item_count: Option<usize>) {
        let _ = item_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_staged(&self, bytes: u64) {
            self.events.lock().unwrap().push(format!("staged:{bytes}"));
        }

        fn on_status_check(&self, attempt: u32, state: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("check:{attempt}:{state}"));
        }

        fn on_complete(&self, item_count: Option<usize>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{item_count:?}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_staged(10);
        cb.on_uploaded("files/a");
        cb.on_status_check(1, "PROCESSING");
        cb.on_extraction_start();
        cb.on_complete(None);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_staged(42);
        rec.on_uploaded("files/ignored");
        rec.on_status_check(1, "PROCESSING");
        rec.on_status_check(2, "ACTIVE");
        rec.on_complete(Some(3));

        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["staged:42", "check:1:PROCESSING", "check:2:ACTIVE", "done:Some(3)"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start();
    }
}
