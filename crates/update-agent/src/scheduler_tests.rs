// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::TimeZone;

struct FakeMaint {
    start: Mutex<i64>,
    do_not_reboot: AtomicBool,
    reports: Mutex<Vec<(UpdateStatus, String)>>,
}

impl FakeMaint {
    fn scheduled_at(start: i64) -> Arc<Self> {
        Arc::new(Self {
            start: Mutex::new(start),
            do_not_reboot: AtomicBool::new(false),
            reports: Mutex::new(Vec::new()),
        })
    }

    fn statuses(&self) -> Vec<UpdateStatus> {
        self.reports.lock().iter().map(|(status, _)| *status).collect()
    }
}

#[async_trait]
impl MaintSource for Arc<FakeMaint> {
    async fn schedule(&self, _guid: &str) -> Result<GetUpdateScheduleResponse, RpcError> {
        Ok(GetUpdateScheduleResponse {
            scheduled_start_utc: *self.start.lock(),
            do_not_reboot: self.do_not_reboot.load(Ordering::SeqCst),
            mode: UpdateMode::Full as i32,
            immediate_download_window_secs: 600,
            download_window_secs: 21_600,
        })
    }

    async fn report(
        &self,
        _guid: &str,
        status: UpdateStatus,
        detail: &str,
        _source_version: &str,
    ) -> Result<(), RpcError> {
        self.reports.lock().push((status, detail.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeExecutor {
    downloads: AtomicU32,
    applies: AtomicU32,
    log: Mutex<String>,
    produced_package: AtomicBool,
    fail_download: AtomicBool,
}

#[async_trait]
impl UpdateExecutor for Arc<FakeExecutor> {
    async fn download(&self, _cancel: &CancellationToken) -> Result<(), String> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_download.load(Ordering::SeqCst) {
            Err("mirror unreachable".to_string())
        } else {
            Ok(())
        }
    }

    async fn apply(
        &self,
        _mode: UpdateMode,
        _cancel: &CancellationToken,
    ) -> Result<ExecutorReport, String> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutorReport {
            log: self.log.lock().clone(),
            produced_package: self.produced_package.load(Ordering::SeqCst),
        })
    }
}

#[derive(Default)]
struct FakeReboot {
    requests: AtomicU32,
}

#[async_trait]
impl RebootHook for Arc<FakeReboot> {
    async fn reboot(&self) -> Result<(), String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    scheduler: Scheduler<Arc<FakeMaint>, Arc<FakeExecutor>, Arc<FakeReboot>>,
    maint: Arc<FakeMaint>,
    executor: Arc<FakeExecutor>,
    reboot: Arc<FakeReboot>,
    _dir: tempfile::TempDir,
}

fn now() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

fn harness(start_offset_secs: i64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("image-id"), "edge-microvisor-3.0\n").unwrap();
    let maint = FakeMaint::scheduled_at(now().timestamp() + start_offset_secs);
    let executor = Arc::new(FakeExecutor::default());
    let reboot = Arc::new(FakeReboot::default());
    let paths = SchedulerPaths {
        state_file: dir.path().join("inbc-update-status.json"),
        image_id: dir.path().join("image-id"),
        artifact: dir.path().join("update.tar"),
        system_cert: dir.path().join("update-signing.pem"),
    };
    let scheduler = Scheduler::new(
        "8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1".to_string(),
        Arc::clone(&maint),
        Arc::clone(&executor),
        Arc::clone(&reboot),
        new_update_lock(),
        paths,
        None,
        std::time::Duration::from_secs(10),
        CancellationToken::new(),
    );
    Harness { scheduler, maint, executor, reboot, _dir: dir }
}

#[tokio::test]
async fn no_schedule_stays_idle() {
    let harness = harness(0);
    *harness.maint.start.lock() = 0;

    harness.scheduler.tick_at(now()).await;

    assert_eq!(harness.scheduler.phase(), UpdatePhase::Idle);
    assert_eq!(harness.executor.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn far_schedule_download_lands_inside_the_window() {
    // Start in 2h with a 6h window: the sampled instant is no later than
    // start − immediate (now + 110 min), so a tick past that point must
    // have downloaded, and never before the first tick.
    let harness = harness(7_200);

    harness.scheduler.tick_at(now()).await;
    harness.scheduler.tick_at(now() + chrono::Duration::minutes(111)).await;

    assert_eq!(harness.executor.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(harness.scheduler.phase(), UpdatePhase::WaitingForApply);
    assert_eq!(
        harness.maint.statuses(),
        vec![UpdateStatus::Downloading, UpdateStatus::Downloaded]
    );
}

#[tokio::test]
async fn imminent_schedule_downloads_immediately() {
    let harness = harness(300);

    harness.scheduler.tick_at(now()).await;

    assert_eq!(harness.executor.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(harness.scheduler.phase(), UpdatePhase::WaitingForApply);
}

#[tokio::test]
async fn apply_waits_for_the_scheduled_start() {
    let harness = harness(300);
    harness.scheduler.tick_at(now()).await;
    assert_eq!(harness.scheduler.phase(), UpdatePhase::WaitingForApply);

    // Before the start: nothing applies.
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(100)).await;
    assert_eq!(harness.executor.applies.load(Ordering::SeqCst), 0);

    // At the start: apply runs, reboot is requested.
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;
    assert_eq!(harness.executor.applies.load(Ordering::SeqCst), 1);
    assert_eq!(harness.reboot.requests.load(Ordering::SeqCst), 1);
    assert_eq!(harness.scheduler.phase(), UpdatePhase::AwaitingReboot);
    // The state file is armed for post-reboot verification.
    assert!(harness._dir.path().join("inbc-update-status.json").exists());
}

#[tokio::test]
async fn do_not_reboot_verifies_in_place() {
    let harness = harness(300);
    harness.maint.do_not_reboot.store(true, Ordering::SeqCst);
    harness.executor.produced_package.store(true, Ordering::SeqCst);
    *harness.executor.log.lock() = "updated kernel and 14 packages".to_string();

    harness.scheduler.tick_at(now()).await;
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;

    assert_eq!(harness.reboot.requests.load(Ordering::SeqCst), 0);
    assert_eq!(harness.scheduler.phase(), UpdatePhase::Idle);
    let statuses = harness.maint.statuses();
    assert!(statuses.contains(&UpdateStatus::Updated));
    assert!(!harness._dir.path().join("inbc-update-status.json").exists());
}

#[tokio::test]
async fn empty_log_with_package_fails_verification() {
    let harness = harness(300);
    harness.maint.do_not_reboot.store(true, Ordering::SeqCst);
    harness.executor.produced_package.store(true, Ordering::SeqCst);

    harness.scheduler.tick_at(now()).await;
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;

    assert!(harness.maint.statuses().contains(&UpdateStatus::Failed));
}

#[tokio::test]
async fn kernel_only_update_reports_the_canned_line() {
    let harness = harness(300);
    harness.maint.do_not_reboot.store(true, Ordering::SeqCst);
    // No package produced: kernel-only.

    harness.scheduler.tick_at(now()).await;
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;

    let reports = harness.maint.reports.lock().clone();
    let updated = reports
        .iter()
        .find(|(status, _)| *status == UpdateStatus::Updated)
        .map(|(_, detail)| detail.clone());
    assert_eq!(updated.as_deref(), Some(KERNEL_ONLY_LOG));
}

#[tokio::test]
async fn failed_download_reports_and_rearms() {
    let harness = harness(300);
    harness.executor.fail_download.store(true, Ordering::SeqCst);

    harness.scheduler.tick_at(now()).await;

    assert!(harness.maint.statuses().contains(&UpdateStatus::Failed));
    assert_eq!(harness.scheduler.phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn unauthenticated_schedule_fetch_forces_one_refresh_then_retries() {
    struct ExpiredBearerMaint {
        fetches: AtomicU32,
    }

    #[async_trait]
    impl MaintSource for Arc<ExpiredBearerMaint> {
        async fn schedule(&self, _guid: &str) -> Result<GetUpdateScheduleResponse, RpcError> {
            if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(RpcError::Unauthenticated);
            }
            Ok(GetUpdateScheduleResponse::default())
        }

        async fn report(
            &self,
            _guid: &str,
            _status: UpdateStatus,
            _detail: &str,
            _source_version: &str,
        ) -> Result<(), RpcError> {
            Ok(())
        }
    }

    struct CountingRefresher {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ForceRefresh for CountingRefresher {
        async fn force_refresh(&self, client: &str) -> Result<(), en_tokens::AuthError> {
            assert_eq!(client, "update-agent");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let maint = Arc::new(ExpiredBearerMaint { fetches: AtomicU32::new(0) });
    let refresher = Arc::new(CountingRefresher { calls: AtomicU32::new(0) });
    let scheduler = Scheduler::new(
        "8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1".to_string(),
        Arc::clone(&maint),
        Arc::new(FakeExecutor::default()),
        Arc::new(FakeReboot::default()),
        new_update_lock(),
        SchedulerPaths {
            state_file: dir.path().join("inbc-update-status.json"),
            image_id: dir.path().join("image-id"),
            artifact: dir.path().join("update.tar"),
            system_cert: dir.path().join("update-signing.pem"),
        },
        Some(Arc::clone(&refresher) as Arc<dyn ForceRefresh>),
        std::time::Duration::from_secs(10),
        CancellationToken::new(),
    );

    scheduler.tick_at(now()).await;

    // One refresh, one retried fetch; nothing scheduled afterwards.
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(maint.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn post_reboot_state_file_drives_verification() {
    let harness = harness(300);
    UpdateStateFile::sota("edge-microvisor-2.9")
        .write(&harness._dir.path().join("inbc-update-status.json"))
        .unwrap();

    harness.scheduler.verify_after_reboot().await;

    // No package file in the temp dir: kernel-only verdict.
    let statuses = harness.maint.statuses();
    assert_eq!(statuses, vec![UpdateStatus::Updated]);
    assert!(!harness._dir.path().join("inbc-update-status.json").exists());
    assert_eq!(harness.scheduler.phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn unsigned_artifact_blocks_the_apply() {
    let harness = harness(300);
    // An artifact exists but neither a system cert nor an embedded one.
    std::fs::write(harness._dir.path().join("update.tar"), b"").unwrap();

    harness.scheduler.tick_at(now()).await;
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;

    assert_eq!(harness.executor.applies.load(Ordering::SeqCst), 0);
    assert!(harness.maint.statuses().contains(&UpdateStatus::Failed));
    assert_eq!(harness.scheduler.phase(), UpdatePhase::Idle);
}

#[tokio::test]
async fn update_lock_serializes_with_other_subsystems() {
    let harness = harness(300);
    // Another maintenance subsystem holds the lock.
    let held = harness.scheduler_lock().try_acquire_owned().unwrap();

    harness.scheduler.tick_at(now()).await;

    // Apply would need the lock; with it held and cancellation fired the
    // tick returns without applying.
    harness.scheduler_cancel().cancel();
    harness.scheduler.tick_at(now() + chrono::Duration::seconds(301)).await;
    assert_eq!(harness.executor.applies.load(Ordering::SeqCst), 0);
    drop(held);
}

impl Harness {
    fn scheduler_lock(&self) -> UpdateLock {
        Arc::clone(&self.scheduler.lock)
    }

    fn scheduler_cancel(&self) -> CancellationToken {
        self.scheduler.cancel.clone()
    }
}
