//! Job status polling
//!
//! Drives a submitted job to a terminal outcome by querying its status on a
//! fixed interval, up to a hard attempt cap. The wait between attempts is an
//! async sleep, so dropping the future between polls abandons the job on
//! the client side without blocking the caller's runtime.

use crate::client::CrawlClient;
use crate::job::{CrawlJobHandle, CrawlOutcome, CrawlRequest, CrawlStatus, PollPolicy};
use crate::state::JobState;
use crate::{CrawlError, PollResult};
use tokio::sync::mpsc::UnboundedSender;

/// A non-terminal status observed while polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    pub job_id: String,
    /// 1-based index of the status query that produced this label
    pub attempt: u32,
    pub max_attempts: u32,
    pub label: String,
}

/// Receives progress notifications from the poll loop
///
/// Notifications are informational; an observer cannot influence polling.
pub trait PollObserver {
    fn on_progress(&self, progress: &PollProgress);
}

impl<F> PollObserver for F
where
    F: Fn(&PollProgress),
{
    fn on_progress(&self, progress: &PollProgress) {
        self(progress)
    }
}

impl PollObserver for UnboundedSender<PollProgress> {
    fn on_progress(&self, progress: &PollProgress) {
        // A dropped receiver only means nobody is watching
        let _ = self.send(progress.clone());
    }
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PollObserver for NoopObserver {
    fn on_progress(&self, _progress: &PollProgress) {}
}

fn advance(current: JobState, next: JobState) -> JobState {
    debug_assert!(
        current.can_transition_to(next),
        "invalid job transition {} -> {}",
        current,
        next
    );
    tracing::trace!("Job state {} -> {}", current, next);
    next
}

impl CrawlClient {
    /// Polls a job until it completes, fails, or the attempt cap is reached
    ///
    /// # Behavior
    ///
    /// | Status label | Action |
    /// |--------------|--------|
    /// | `completed` | Stop, return `Success` with the pages |
    /// | `failed` | Stop, return `Failure` with the service's message |
    /// | anything else | Notify observer, wait `interval`, query again |
    /// | non-2xx response | Stop, return `PollError::StatusQueryFailed` |
    ///
    /// Running out of attempts returns `CrawlOutcome::TimedOut`, not an
    /// error. No wait follows the final attempt.
    pub async fn poll_until_terminal<O>(
        &self,
        handle: &CrawlJobHandle,
        policy: PollPolicy,
        observer: &O,
    ) -> PollResult<CrawlOutcome>
    where
        O: PollObserver + ?Sized,
    {
        let mut state = JobState::Submitted;
        let mut last_status = None;
        let mut last_raw = None;

        tracing::debug!(
            "Polling job {} every {:?}, at most {} times (budget {:?})",
            handle.id(),
            policy.interval,
            policy.max_attempts,
            policy.budget()
        );

        for attempt in 1..=policy.max_attempts {
            state = advance(state, JobState::Polling);

            let (status, raw) = self.check_status(handle).await?;

            match status {
                CrawlStatus::Completed { pages } => {
                    advance(state, JobState::Completed);
                    tracing::info!(
                        "Job {} completed with {} pages after {} polls",
                        handle.id(),
                        pages.len(),
                        attempt
                    );
                    return Ok(CrawlOutcome::Success { pages, raw });
                }
                CrawlStatus::Failed { error } => {
                    advance(state, JobState::Failed);
                    tracing::warn!("Job {} failed: {}", handle.id(), error);
                    return Ok(CrawlOutcome::Failure {
                        message: error,
                        raw,
                    });
                }
                CrawlStatus::InProgress { label } => {
                    tracing::debug!(
                        "Job {} is {} (attempt {}/{})",
                        handle.id(),
                        label,
                        attempt,
                        policy.max_attempts
                    );
                    observer.on_progress(&PollProgress {
                        job_id: handle.id().to_string(),
                        attempt,
                        max_attempts: policy.max_attempts,
                        label: label.clone(),
                    });
                    last_status = Some(label);
                    last_raw = Some(raw);

                    if attempt < policy.max_attempts {
                        tokio::time::sleep(policy.interval).await;
                    }
                }
            }
        }

        if policy.max_attempts > 0 {
            advance(state, JobState::TimedOut);
        }
        tracing::warn!(
            "Job {} still not finished after {} polls; it may still be running",
            handle.id(),
            policy.max_attempts
        );

        Ok(CrawlOutcome::TimedOut {
            handle: handle.clone(),
            attempts: policy.max_attempts,
            budget: policy.budget(),
            last_status,
            raw: last_raw,
        })
    }

    /// Submits a job and polls it to a terminal outcome
    pub async fn crawl<O>(
        &self,
        request: &CrawlRequest,
        policy: PollPolicy,
        observer: &O,
    ) -> Result<CrawlOutcome, CrawlError>
    where
        O: PollObserver + ?Sized,
    {
        let handle = self.submit(request).await?;
        let outcome = self.poll_until_terminal(&handle, policy, observer).await?;
        Ok(outcome)
    }
}
