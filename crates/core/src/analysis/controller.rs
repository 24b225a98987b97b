//! Analysis job controller
//!
//! ```text
//! Idle -> Starting -> Analyzing -> {Completed | NotFound | TimedOut | Stopped} -> Idle (reset)
//! ```
//!
//! Each `Analyzing` job owns a poll task and its [`CancellationToken`]. The
//! task sleeps one interval after each handled response, so at most one
//! status request per video is ever outstanding. The hard deadline is an
//! absolute instant captured at `start`, raced against both the sleep and
//! the in-flight request.
//!
//! Job slots live behind a `parking_lot::Mutex` that is never held across an
//! `.await`. Every mutation re-checks the slot's generation and status under
//! the lock, so a response that arrives after `stop` or `reset` is dropped.
//!
//! Each mutation also bumps a revision published on a `tokio::sync::watch`
//! channel; [`AnalysisJobController::subscribe`] hands out receivers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use shelfsight_domain::constants::{
    JOB_DEADLINE_SECS, MSG_JOB_COMPLETED, MSG_JOB_NOT_FOUND, MSG_JOB_STOPPED, MSG_JOB_TIMED_OUT,
    POLL_INTERVAL_SECS,
};
use shelfsight_domain::{
    AnalysisConfig, AnalysisJob, AnalysisStatusReport, JobStatus, LogEvent, RemoteJobState,
    RemoteLogEntry, VideoId,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::AnalysisError;
use super::log::LogAggregator;
use super::ports::{AnalysisGateway, RoiDirectory};

/// Timing knobs of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisControllerConfig {
    /// Pause between a handled status response and the next request
    pub poll_interval: Duration,
    /// Hard limit measured from `start`
    pub job_deadline: Duration,
    /// How long `stop`/`reset` wait for a cancelled poll task to wind down
    pub join_timeout: Duration,
}

impl Default for AnalysisControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            job_deadline: Duration::from_secs(JOB_DEADLINE_SECS),
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl From<&AnalysisConfig> for AnalysisControllerConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            job_deadline: config.job_deadline(),
            join_timeout: config.stop_join_timeout(),
        }
    }
}

struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Cancel and wait (bounded) for the task to exit.
    async fn shutdown(self, join_timeout: Duration) {
        self.cancel.cancel();
        match tokio::time::timeout(join_timeout, self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "poll task panicked"),
            Err(_) => warn!("poll task did not complete within timeout"),
        }
    }
}

struct JobSlot {
    job: AnalysisJob,
    log: LogAggregator,
    poller: Option<PollHandle>,
    /// Bumped by every `start` and `reset`; poll tasks carry the value they
    /// were spawned with.
    generation: u64,
}

impl JobSlot {
    fn new(video_id: VideoId) -> Self {
        Self { job: AnalysisJob::idle(video_id), log: LogAggregator::new(), poller: None, generation: 0 }
    }

    fn clear(&mut self) {
        self.job = AnalysisJob::idle(self.job.video_id.clone());
        self.log.clear();
    }

    /// Enter a terminal status from inside the poll task. The handle is
    /// dropped, which detaches the (finishing) task.
    fn settle(&mut self, status: JobStatus) {
        self.job.status = status;
        if let Some(handle) = self.poller.take() {
            handle.cancel.cancel();
        }
    }

    fn append_received(&mut self, entries: &[RemoteLogEntry]) {
        self.log.extend(entries.iter().map(LogEvent::received));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollFlow {
    Continue,
    Finished,
}

struct Shared {
    gateway: Arc<dyn AnalysisGateway>,
    rois: Arc<dyn RoiDirectory>,
    config: AnalysisControllerConfig,
    jobs: Mutex<HashMap<VideoId, JobSlot>>,
    revision: watch::Sender<u64>,
}

/// Owns one analysis job per video.
pub struct AnalysisJobController {
    shared: Arc<Shared>,
}

impl AnalysisJobController {
    pub fn new(
        gateway: Arc<dyn AnalysisGateway>,
        rois: Arc<dyn RoiDirectory>,
        config: AnalysisControllerConfig,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self { shared: Arc::new(Shared { gateway, rois, config, jobs: Mutex::new(HashMap::new()), revision }) }
    }

    pub fn config(&self) -> AnalysisControllerConfig {
        self.shared.config
    }

    /// Start a job for `video_id` and begin polling.
    ///
    /// # Errors
    /// - [`AnalysisError::NoRoisForVideo`] / [`AnalysisError::JobAlreadyActive`] /
    ///   [`AnalysisError::ResetRequired`]: rejected before any request, state untouched
    /// - [`AnalysisError::StartFailed`]: request failed or was refused; job is back to `Idle`
    /// - [`AnalysisError::StartCancelled`]: a `reset` ran while the request was in flight
    #[instrument(skip(self), fields(video = %video_id))]
    pub async fn start(&self, video_id: &VideoId) -> Result<AnalysisJob, AnalysisError> {
        let roi_count = self.shared.rois.roi_count(video_id);
        if roi_count == 0 {
            warn!("no saved ROIs, refusing to start analysis");
            return Err(AnalysisError::NoRoisForVideo);
        }

        let generation = {
            let mut jobs = self.shared.jobs.lock();
            let slot = jobs.entry(video_id.clone()).or_insert_with(|| JobSlot::new(video_id.clone()));
            let status = slot.job.status;
            if status.is_active() {
                return Err(AnalysisError::JobAlreadyActive);
            }
            if status.is_terminal() {
                return Err(AnalysisError::ResetRequired { status });
            }
            slot.clear();
            slot.job.status = JobStatus::Starting;
            slot.generation += 1;
            slot.generation
        };
        self.shared.publish();

        let deadline = Instant::now() + self.shared.config.job_deadline;
        let started_at = Utc::now().timestamp();
        info!(roi_count, "starting analysis");

        let outcome = self.shared.gateway.start_analysis(video_id).await;

        let mut jobs = self.shared.jobs.lock();
        let Some(slot) = jobs
            .get_mut(video_id)
            .filter(|slot| slot.generation == generation && slot.job.status == JobStatus::Starting)
        else {
            debug!("start response discarded after reset");
            return Err(AnalysisError::StartCancelled);
        };
        self.shared.publish();

        let response = match outcome {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                slot.job.status = JobStatus::Idle;
                let reason = response
                    .message
                    .unwrap_or_else(|| format!("backend answered status '{}'", response.status));
                warn!(%reason, "analysis start refused");
                return Err(AnalysisError::StartFailed { reason });
            }
            Err(e) => {
                slot.job.status = JobStatus::Idle;
                warn!(error = %e, "analysis start request failed");
                return Err(AnalysisError::StartFailed { reason: e.to_string() });
            }
        };

        slot.job.started_at_seconds = Some(started_at);
        slot.job.duration_seconds_hint = response.duration_seconds;
        slot.job.progress_percent = 0.0;
        if let Some(initial) = &response.initial_stats {
            slot.job.stats.apply(initial);
        }
        slot.append_received(&response.initial_logs);
        if let Some(message) = response.message.as_deref().filter(|m| !m.is_empty()) {
            slot.log.append(LogEvent::info(message));
        }
        slot.job.status = JobStatus::Analyzing;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            video_id.clone(),
            generation,
            cancel.clone(),
            deadline,
        ));
        slot.poller = Some(PollHandle { cancel, task });

        info!(duration_hint = ?slot.job.duration_seconds_hint, "analysis started");
        Ok(slot.job.clone())
    }

    /// Stop polling a running job. The backend is not told.
    ///
    /// # Errors
    /// [`AnalysisError::NotAnalyzing`] unless the job is `Analyzing`.
    #[instrument(skip(self), fields(video = %video_id))]
    pub async fn stop(&self, video_id: &VideoId) -> Result<AnalysisJob, AnalysisError> {
        let (snapshot, handle) = {
            let mut jobs = self.shared.jobs.lock();
            let status = jobs.get(video_id).map_or(JobStatus::Idle, |slot| slot.job.status);
            let Some(slot) = jobs.get_mut(video_id).filter(|_| status == JobStatus::Analyzing) else {
                return Err(AnalysisError::NotAnalyzing { status });
            };
            slot.job.status = JobStatus::Stopped;
            slot.log.append(LogEvent::info(MSG_JOB_STOPPED));
            (slot.job.clone(), slot.poller.take())
        };
        self.shared.publish();

        if let Some(handle) = handle {
            handle.shutdown(self.shared.config.join_timeout).await;
        }
        info!("analysis stopped by user");
        Ok(snapshot)
    }

    /// Return `video_id` to `Idle` with empty stats and log. Accepted from
    /// any state; an active job is cancelled first. The backend reset is
    /// best effort.
    #[instrument(skip(self), fields(video = %video_id))]
    pub async fn reset(&self, video_id: &VideoId) -> AnalysisJob {
        let (generation, handle) = {
            let mut jobs = self.shared.jobs.lock();
            let slot = jobs.entry(video_id.clone()).or_insert_with(|| JobSlot::new(video_id.clone()));
            slot.generation += 1;
            if slot.job.status.is_active() {
                info!(status = %slot.job.status, "cancelling active job for reset");
            }
            slot.clear();
            (slot.generation, slot.poller.take())
        };
        self.shared.publish();

        if let Some(handle) = handle {
            handle.shutdown(self.shared.config.join_timeout).await;
        }

        if let Err(e) = self.shared.gateway.reset_analysis(video_id).await {
            warn!(error = %e, "backend reset failed; local state reset anyway");
        }

        let mut jobs = self.shared.jobs.lock();
        match jobs.get_mut(video_id) {
            Some(slot) if slot.generation == generation => {
                slot.clear();
                self.shared.publish();
                info!("analysis reset");
                slot.job.clone()
            }
            // a new start won the race; report its state
            Some(slot) => slot.job.clone(),
            None => AnalysisJob::idle(video_id.clone()),
        }
    }

    /// Current job snapshot; `Idle` for unknown videos.
    pub fn snapshot(&self, video_id: &VideoId) -> AnalysisJob {
        self.shared
            .jobs
            .lock()
            .get(video_id)
            .map_or_else(|| AnalysisJob::idle(video_id.clone()), |slot| slot.job.clone())
    }

    pub fn logs(&self, video_id: &VideoId) -> Vec<LogEvent> {
        self.shared.jobs.lock().get(video_id).map(|slot| slot.log.events().to_vec()).unwrap_or_default()
    }

    /// Log events from position `offset` on, plus the current log length.
    pub fn logs_since(&self, video_id: &VideoId, offset: usize) -> (Vec<LogEvent>, usize) {
        self.shared.jobs.lock().get(video_id).map_or((Vec::new(), 0), |slot| {
            let events = slot.log.events();
            (events.get(offset..).unwrap_or_default().to_vec(), events.len())
        })
    }

    /// Receiver that is marked changed after every job mutation, for any
    /// video. Read state through [`Self::snapshot`] once it fires.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Videos whose job is `Starting` or `Analyzing`.
    pub fn active_jobs(&self) -> Vec<VideoId> {
        self.shared
            .jobs
            .lock()
            .iter()
            .filter(|(_, slot)| slot.job.status.is_active())
            .map(|(video_id, _)| video_id.clone())
            .collect()
    }

    /// Cancel every poll task and wait for them to exit. Job states are
    /// left as they are.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let handles: Vec<PollHandle> = {
            let mut jobs = self.shared.jobs.lock();
            jobs.values_mut().filter_map(|slot| slot.poller.take()).collect()
        };
        for handle in handles {
            handle.shutdown(self.shared.config.join_timeout).await;
        }
    }
}

impl Drop for AnalysisJobController {
    fn drop(&mut self) {
        let mut jobs = self.shared.jobs.lock();
        for (video_id, slot) in jobs.iter_mut() {
            if let Some(handle) = slot.poller.take() {
                warn!(video = %video_id, "controller dropped with a running poll task; cancelling");
                handle.cancel.cancel();
            }
        }
    }
}

impl Shared {
    fn publish(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    /// Merge one status response. Runs entirely under the jobs lock.
    fn apply_report(&self, video_id: &VideoId, generation: u64, report: AnalysisStatusReport) -> PollFlow {
        let mut jobs = self.jobs.lock();
        let Some(slot) = jobs
            .get_mut(video_id)
            .filter(|slot| slot.generation == generation && slot.job.status == JobStatus::Analyzing)
        else {
            return PollFlow::Finished;
        };

        let incoming = incoming_logs(&report);

        // the text marker outranks whatever `status` says
        if incoming.iter().any(RemoteLogEntry::carries_sentinel) {
            slot.append_received(&incoming);
            if let Some(update) = &report.updated_stats {
                slot.job.stats.apply(update);
            }
            if let Some(update) = &report.final_stats {
                slot.job.stats.apply(update);
            }
            slot.job.progress_percent = 100.0;
            slot.settle(JobStatus::Completed);
            info!(video = %video_id, "completion marker received");
            return PollFlow::Finished;
        }

        match report.status {
            RemoteJobState::Analyzing => {
                slot.append_received(&incoming);
                if let Some(update) = &report.updated_stats {
                    slot.job.stats.apply(update);
                }
                // zero means "not reported"
                if let Some(progress) = report.progress.filter(|p| p.is_finite() && *p > 0.0) {
                    slot.job.progress_percent = progress.clamp(0.0, 100.0);
                }
                debug!(video = %video_id, new_logs = incoming.len(), progress = slot.job.progress_percent, "status merged");
                PollFlow::Continue
            }
            RemoteJobState::Completed => {
                if let Some(all_logs) = &report.all_logs {
                    slot.log.clear();
                    slot.append_received(all_logs);
                }
                match &report.completion_log {
                    Some(entry) => slot.log.append(LogEvent::received(entry)),
                    None => slot.log.append(LogEvent::info(MSG_JOB_COMPLETED)),
                }
                if let Some(update) = &report.final_stats {
                    slot.job.stats.apply(update);
                }
                slot.job.progress_percent = 100.0;
                slot.settle(JobStatus::Completed);
                info!(video = %video_id, total_customers = slot.job.stats.total_customers, "analysis completed");
                PollFlow::Finished
            }
            RemoteJobState::NotFound => {
                slot.log.append(LogEvent::info(MSG_JOB_NOT_FOUND));
                slot.settle(JobStatus::NotFound);
                warn!(video = %video_id, "analysis session not found on backend");
                PollFlow::Finished
            }
            RemoteJobState::Unknown => {
                debug!(video = %video_id, "unrecognised status, skipping tick");
                PollFlow::Continue
            }
        }
    }

    fn expire(&self, video_id: &VideoId, generation: u64) {
        let mut jobs = self.jobs.lock();
        let Some(slot) = jobs
            .get_mut(video_id)
            .filter(|slot| slot.generation == generation && slot.job.status == JobStatus::Analyzing)
        else {
            return;
        };
        slot.log.append(LogEvent::info(MSG_JOB_TIMED_OUT));
        slot.settle(JobStatus::TimedOut);
        drop(jobs);
        self.publish();
        warn!(video = %video_id, "analysis deadline elapsed");
    }
}

/// A present batch wins, even when empty; the single entry is only read
/// when the batch field is absent.
fn incoming_logs(report: &AnalysisStatusReport) -> Vec<RemoteLogEntry> {
    match (&report.new_logs, &report.new_log) {
        (Some(batch), _) => batch.clone(),
        (None, Some(single)) => vec![single.clone()],
        (None, None) => Vec::new(),
    }
}

async fn poll_loop(
    shared: Arc<Shared>,
    video_id: VideoId,
    generation: u64,
    cancel: CancellationToken,
    deadline: Instant,
) {
    let interval = shared.config.poll_interval;
    let expiry = tokio::time::sleep_until(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(video = %video_id, "poll loop cancelled");
                return;
            }
            () = &mut expiry => {
                shared.expire(&video_id, generation);
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(video = %video_id, "poll loop cancelled with a request in flight");
                return;
            }
            () = &mut expiry => {
                shared.expire(&video_id, generation);
                return;
            }
            result = shared.gateway.analysis_status(&video_id) => result,
        };

        match result {
            Ok(report) => {
                let flow = shared.apply_report(&video_id, generation, report);
                shared.publish();
                if flow == PollFlow::Finished {
                    return;
                }
            }
            Err(e) => debug!(video = %video_id, error = %e, "status poll failed, retrying next tick"),
        }
    }
}
