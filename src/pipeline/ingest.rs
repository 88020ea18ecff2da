//! Remote media ingestion: upload the staged file, then wait for it.
//!
//! The service processes video asynchronously and only exposes a state
//! field, so readiness is a poll loop: fetch, and while the state is
//! `PROCESSING` sleep [`PollPolicy::interval`] and fetch again. With N
//! processing answers followed by a terminal one the loop makes exactly
//! N + 1 fetches.
//!
//! The loop is bounded by both an attempt count and a wall-clock budget;
//! whichever trips first ends it with [`AnalyzeError::ProcessingTimeout`].

use crate::config::PollPolicy;
use crate::error::AnalyzeError;
use crate::pipeline::stage::StagedFile;
use crate::progress::ProgressCallback;
use crate::service::{FileState, GenerativeService, RemoteFile};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Upload a staged file. The returned handle is usually still processing.
pub async fn submit(
    service: &dyn GenerativeService,
    staged: &StagedFile,
    mime_type: &str,
    display_name: &str,
) -> Result<RemoteFile, AnalyzeError> {
    let file = service
        .upload_file(staged.path(), mime_type, display_name)
        .await?;
    info!("Uploaded {} bytes as {}", staged.size(), file.name);
    Ok(file)
}

/// A handle that has left `PROCESSING`, with the number of fetches it took.
#[derive(Debug, Clone)]
pub struct Readiness {
    pub file: RemoteFile,
    pub status_checks: u32,
}

/// Poll `handle` until the service reports a state other than `PROCESSING`.
///
/// `FAILED` becomes [`AnalyzeError::ProcessingFailed`]. Any other
/// non-processing state (`ACTIVE`, or an unspecified/unknown label) is
/// treated as ready.
pub async fn await_ready(
    service: &dyn GenerativeService,
    handle: &RemoteFile,
    policy: &PollPolicy,
    progress: Option<&ProgressCallback>,
) -> Result<Readiness, AnalyzeError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        let current = service.get_file(&handle.name).await?;
        attempts += 1;

        let label = String::from(current.state);
        debug!("{}: status check {} → {}", handle.name, attempts, label);
        if let Some(cb) = progress {
            cb.on_status_check(attempts, &label);
        }

        match current.state {
            FileState::Processing => {}
            FileState::Failed => {
                warn!("{}: remote processing failed", handle.name);
                return Err(AnalyzeError::ProcessingFailed {
                    name: handle.name.clone(),
                });
            }
            FileState::Ready | FileState::Unspecified => {
                info!(
                    "{} ready after {} status checks ({}ms)",
                    handle.name,
                    attempts,
                    started.elapsed().as_millis()
                );
                return Ok(Readiness {
                    file: current,
                    status_checks: attempts,
                });
            }
        }

        let out_of_time = started.elapsed().saturating_add(policy.interval) > policy.max_wait;
        if attempts >= policy.max_attempts || out_of_time {
            warn!(
                "{}: still processing after {} checks, giving up",
                handle.name, attempts
            );
            return Err(AnalyzeError::ProcessingTimeout {
                attempts,
                elapsed_secs: started.elapsed().as_secs(),
            });
        }

        sleep(policy.interval).await;
    }
}
