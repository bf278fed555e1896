// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform update agent.
//!
//! Schedules OS and in-band manageability updates: downloads inside a
//! randomized pre-window, applies at the scheduled instant under the
//! process-wide update lock, and verifies the outcome across the reboot
//! via a persisted state file.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod daemon;
mod executor;
mod schedule;
mod scheduler;
mod statefile;
mod verify;

pub use executor::{ExecutorReport, InbcExecutor, RebootHook, SystemdReboot, UpdateExecutor};
pub use schedule::{ScheduleError, UpdateSchedule};
pub use scheduler::{
    new_update_lock, MaintSource, Scheduler, SchedulerPaths, SouthboundMaint, UpdateLock,
    UpdatePhase, KERNEL_ONLY_LOG,
};
pub use statefile::UpdateStateFile;
pub use verify::{
    check_artifact, VerifyDisposition, VerifyError, MAX_ARCHIVE_SIZE, MAX_FILE_SIZE,
    MAX_IN_MEMORY, MAX_PEM_SIZE,
};
