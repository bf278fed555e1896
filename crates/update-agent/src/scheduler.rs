// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The update state machine.
//!
//! `Idle → WaitingForDownload → Downloading → WaitingForApply → Applying →
//! AwaitingReboot → Verifying → Idle`. Every wait is re-evaluated on the
//! agent tick, the apply runs under the process-wide update lock, and
//! verification happens either in-tick (`doNotReboot`) or on the first
//! tick after the reboot via the persisted state file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use en_southbound::proto::{GetUpdateScheduleResponse, UpdateMode, UpdateStatus};
use en_southbound::{MaintClient, RpcError};
use en_tokens::{clients, ForceRefresh};

use crate::executor::{ExecutorReport, RebootHook, UpdateExecutor};
use crate::schedule::UpdateSchedule;
use crate::statefile::UpdateStateFile;
use crate::verify::check_artifact;

/// Canned granular-log line for kernel-only updates.
pub const KERNEL_ONLY_LOG: &str =
    "SOTA kernel-only update applied; no package manifest produced";

/// Process-wide maintenance lock, capacity 1, shared with other
/// maintenance subsystems.
pub type UpdateLock = Arc<Semaphore>;

pub fn new_update_lock() -> UpdateLock {
    Arc::new(Semaphore::new(1))
}

/// Externally visible machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    WaitingForDownload,
    Downloading,
    WaitingForApply,
    Applying,
    AwaitingReboot,
    Verifying,
}

/// Seam to the maintenance manager.
#[async_trait]
pub trait MaintSource: Send + Sync {
    async fn schedule(&self, guid: &str) -> Result<GetUpdateScheduleResponse, RpcError>;

    async fn report(
        &self,
        guid: &str,
        status: UpdateStatus,
        detail: &str,
        source_version: &str,
    ) -> Result<(), RpcError>;
}

/// Production source over the southbound client.
pub struct SouthboundMaint {
    client: AsyncMutex<MaintClient>,
}

impl SouthboundMaint {
    pub fn new(client: MaintClient) -> Self {
        Self { client: AsyncMutex::new(client) }
    }
}

#[async_trait]
impl MaintSource for SouthboundMaint {
    async fn schedule(&self, guid: &str) -> Result<GetUpdateScheduleResponse, RpcError> {
        self.client.lock().await.get_update_schedule(guid).await
    }

    async fn report(
        &self,
        guid: &str,
        status: UpdateStatus,
        detail: &str,
        source_version: &str,
    ) -> Result<(), RpcError> {
        self.client
            .lock()
            .await
            .report_update_status(guid, status, detail, source_version)
            .await
    }
}

/// Filesystem locations the scheduler touches.
#[derive(Debug, Clone)]
pub struct SchedulerPaths {
    /// Reboot-crossing state file.
    pub state_file: PathBuf,
    /// Installed image identity, used as the source version.
    pub image_id: PathBuf,
    /// Downloaded artifact checked before apply, when produced.
    pub artifact: PathBuf,
    /// System signing certificate; absence triggers the embedded-cert
    /// fallback.
    pub system_cert: PathBuf,
}

impl Default for SchedulerPaths {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("/tmp/inbc-update-status.json"),
            image_id: PathBuf::from("/etc/image-id"),
            artifact: PathBuf::from("/var/cache/edge-node/update.tar"),
            system_cert: PathBuf::from("/etc/intel_edge_node/certs/update-signing.pem"),
        }
    }
}

enum Waiting {
    None,
    Download {
        schedule: UpdateSchedule,
        download_at: DateTime<Utc>,
    },
    Apply {
        schedule: UpdateSchedule,
    },
    Reboot,
}

pub struct Scheduler<M, E, R> {
    guid: String,
    source: M,
    executor: E,
    reboot: R,
    lock: UpdateLock,
    paths: SchedulerPaths,
    /// Force-refresh hook fired on `Unauthenticated` responses.
    refresher: Option<Arc<dyn ForceRefresh>>,
    interval: Duration,
    cancel: CancellationToken,
    phase: Mutex<UpdatePhase>,
    waiting: Mutex<Waiting>,
}

impl<M: MaintSource, E: UpdateExecutor, R: RebootHook> Scheduler<M, E, R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guid: String,
        source: M,
        executor: E,
        reboot: R,
        lock: UpdateLock,
        paths: SchedulerPaths,
        refresher: Option<Arc<dyn ForceRefresh>>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            guid,
            source,
            executor,
            reboot,
            lock,
            paths,
            refresher,
            interval,
            cancel,
            phase: Mutex::new(UpdatePhase::Idle),
            waiting: Mutex::new(Waiting::None),
        }
    }

    async fn refresh_token(&self) {
        let Some(refresher) = &self.refresher else { return };
        if let Err(err) = refresher.force_refresh(clients::UPDATE_AGENT).await {
            warn!(%err, "forced token refresh failed");
        }
    }

    /// Schedule fetch with one forced token refresh before a single
    /// retry when the maintenance manager rejects the bearer.
    async fn fetch_schedule(&self) -> Result<GetUpdateScheduleResponse, RpcError> {
        match self.source.schedule(&self.guid).await {
            Err(err) if err.wants_token_refresh() => {
                self.refresh_token().await;
                self.source.schedule(&self.guid).await
            }
            other => other,
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        *self.phase.lock()
    }

    fn enter(&self, phase: UpdatePhase) {
        debug!(?phase, "update phase");
        *self.phase.lock() = phase;
    }

    fn source_version(&self) -> String {
        en_core::read_to_string_no_symlink(&self.paths.image_id)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    async fn report(&self, status: UpdateStatus, detail: &str) {
        let version = self.source_version();
        let result = match self.source.report(&self.guid, status, detail, &version).await {
            Err(err) if err.wants_token_refresh() => {
                self.refresh_token().await;
                self.source.report(&self.guid, status, detail, &version).await
            }
            other => other,
        };
        if let Err(err) = result {
            warn!(%err, ?status, "update status report failed");
        }
    }

    /// Post-reboot recovery: if a state file survived, verify and report.
    pub async fn verify_after_reboot(&self) {
        let state = match UpdateStateFile::read(&self.paths.state_file) {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(err) => {
                warn!(%err, "unreadable update state file");
                return;
            }
        };

        self.enter(UpdatePhase::Verifying);
        let report = ExecutorReport {
            log: std::fs::read_to_string(self.executor_log_hint()).unwrap_or_default(),
            produced_package: self.paths.artifact.exists(),
        };
        self.verify(&state, &report).await;
        if let Err(err) = UpdateStateFile::remove(&self.paths.state_file) {
            warn!(%err, "failed to remove update state file");
        }
        self.enter(UpdatePhase::Idle);
    }

    // The granular log location mirrors the executor's default; kept in
    // one place for the post-reboot read.
    fn executor_log_hint(&self) -> PathBuf {
        PathBuf::from("/var/log/inbc-update.log")
    }

    async fn verify(&self, state: &UpdateStateFile, report: &ExecutorReport) {
        if !report.produced_package {
            // Kernel-only updates leave no package behind.
            self.report(UpdateStatus::Updated, KERNEL_ONLY_LOG).await;
        } else if !report.log.trim().is_empty() {
            self.report(UpdateStatus::Updated, report.log.trim()).await;
        } else {
            self.report(UpdateStatus::Failed, "executor produced no granular log").await;
        }
        info!(source_version = %state.source_version, "update verification reported");
    }

    /// One tick of the machine at `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) {
        let waiting = std::mem::replace(&mut *self.waiting.lock(), Waiting::None);
        match waiting {
            Waiting::None => self.tick_idle(now).await,
            Waiting::Download { schedule, download_at } => {
                self.tick_download(now, schedule, download_at).await
            }
            Waiting::Apply { schedule } => self.tick_apply(now, schedule).await,
            Waiting::Reboot => {
                // The platform should have taken us down; keep waiting.
                *self.waiting.lock() = Waiting::Reboot;
            }
        }
    }

    async fn tick_idle(&self, now: DateTime<Utc>) {
        self.enter(UpdatePhase::Idle);
        let response = match self.fetch_schedule().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "maintenance schedule fetch failed");
                return;
            }
        };
        let schedule = match UpdateSchedule::from_wire(&response) {
            Ok(Some(schedule)) => schedule,
            Ok(None) => return,
            Err(err) => {
                warn!(%err, "rejected maintenance schedule");
                return;
            }
        };

        let download_at = schedule.download_at(now, &mut rand::thread_rng());
        info!(start = %schedule.start, download_at = %download_at, mode = ?schedule.mode,
              "maintenance window armed");
        // An immediate download starts on this same tick.
        if download_at <= now {
            self.tick_download(now, schedule, download_at).await;
        } else {
            self.enter(UpdatePhase::WaitingForDownload);
            *self.waiting.lock() = Waiting::Download { schedule, download_at };
        }
    }

    async fn tick_download(
        &self,
        now: DateTime<Utc>,
        schedule: UpdateSchedule,
        download_at: DateTime<Utc>,
    ) {
        if schedule.mode == UpdateMode::NoDownload {
            // Apply from cache; nothing to fetch.
            self.enter(UpdatePhase::WaitingForApply);
            *self.waiting.lock() = Waiting::Apply { schedule };
            return;
        }
        if now < download_at {
            self.enter(UpdatePhase::WaitingForDownload);
            *self.waiting.lock() = Waiting::Download { schedule, download_at };
            return;
        }

        self.enter(UpdatePhase::Downloading);
        self.report(UpdateStatus::Downloading, "").await;
        match self.executor.download(&self.cancel).await {
            Ok(()) => {
                self.report(UpdateStatus::Downloaded, "").await;
                if schedule.mode == UpdateMode::DownloadOnly {
                    self.enter(UpdatePhase::Idle);
                } else {
                    self.enter(UpdatePhase::WaitingForApply);
                    *self.waiting.lock() = Waiting::Apply { schedule };
                }
            }
            Err(err) => {
                warn!(%err, "download failed");
                self.report(UpdateStatus::Failed, &err).await;
                self.enter(UpdatePhase::Idle);
            }
        }
    }

    async fn tick_apply(&self, now: DateTime<Utc>, schedule: UpdateSchedule) {
        if now < schedule.start {
            self.enter(UpdatePhase::WaitingForApply);
            *self.waiting.lock() = Waiting::Apply { schedule };
            return;
        }

        let permit = tokio::select! {
            permit = self.lock.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
            _ = self.cancel.cancelled() => return,
        };

        self.enter(UpdatePhase::Applying);
        self.report(UpdateStatus::Started, "").await;

        // Signature verification is a precondition to any apply.
        if self.paths.artifact.exists() {
            let cert_present = self.paths.system_cert.exists();
            match check_artifact(&self.paths.artifact, cert_present) {
                Ok(disposition) => debug!(?disposition, "artifact check passed"),
                Err(err) => {
                    warn!(%err, "artifact rejected before apply");
                    self.report(UpdateStatus::Failed, &err.to_string()).await;
                    self.enter(UpdatePhase::Idle);
                    drop(permit);
                    return;
                }
            }
        }

        let state = UpdateStateFile::sota(&self.source_version());
        if let Err(err) = state.write(&self.paths.state_file) {
            warn!(%err, "cannot persist update state; aborting apply");
            self.enter(UpdatePhase::Idle);
            drop(permit);
            return;
        }

        match self.executor.apply(schedule.mode, &self.cancel).await {
            Ok(report) => {
                if schedule.do_not_reboot {
                    self.enter(UpdatePhase::Verifying);
                    self.verify(&state, &report).await;
                    if let Err(err) = UpdateStateFile::remove(&self.paths.state_file) {
                        warn!(%err, "failed to remove update state file");
                    }
                    self.enter(UpdatePhase::Idle);
                } else {
                    self.enter(UpdatePhase::AwaitingReboot);
                    *self.waiting.lock() = Waiting::Reboot;
                    if let Err(err) = self.reboot.reboot().await {
                        warn!(%err, "reboot request failed; verifying in place");
                        self.enter(UpdatePhase::Verifying);
                        self.verify(&state, &report).await;
                        if let Err(err) = UpdateStateFile::remove(&self.paths.state_file) {
                            warn!(%err, "failed to remove update state file");
                        }
                        *self.waiting.lock() = Waiting::None;
                        self.enter(UpdatePhase::Idle);
                    }
                }
            }
            Err(err) => {
                warn!(%err, "update executor failed");
                self.report(UpdateStatus::Failed, &err).await;
                if let Err(err) = UpdateStateFile::remove(&self.paths.state_file) {
                    warn!(%err, "failed to remove update state file");
                }
                self.enter(UpdatePhase::Idle);
            }
        }
        drop(permit);
    }

    /// Tick loop; checks for a reboot-crossing verification first.
    pub async fn run(self) {
        self.verify_after_reboot().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("update scheduler stopping");
                    return;
                }
                _ = ticker.tick() => self.tick_at(Utc::now()).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
