// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance windows and download-start sampling.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use thiserror::Error;

use en_southbound::proto::{GetUpdateScheduleResponse, UpdateMode};

/// Inside this pre-schedule window the download starts at once.
pub const DEFAULT_IMMEDIATE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Downloads start no earlier than this long before the schedule.
pub const DEFAULT_DOWNLOAD_WINDOW: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduled start {0} is not a valid instant")]
    InvalidStart(i64),

    #[error("immediate window exceeds download window ({immediate:?} > {download:?})")]
    WindowOrder {
        immediate: Duration,
        download: Duration,
    },
}

/// One maintenance window as received from the maintenance manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSchedule {
    pub start: DateTime<Utc>,
    pub immediate_window: Duration,
    pub download_window: Duration,
    pub do_not_reboot: bool,
    pub mode: UpdateMode,
}

impl UpdateSchedule {
    /// Decode the wire schedule; `None` when nothing is scheduled.
    pub fn from_wire(
        response: &GetUpdateScheduleResponse,
    ) -> Result<Option<Self>, ScheduleError> {
        if response.scheduled_start_utc == 0 {
            return Ok(None);
        }
        let start = Utc
            .timestamp_opt(response.scheduled_start_utc, 0)
            .single()
            .ok_or(ScheduleError::InvalidStart(response.scheduled_start_utc))?;

        let immediate_window = window(
            response.immediate_download_window_secs,
            DEFAULT_IMMEDIATE_WINDOW,
        );
        let download_window = window(response.download_window_secs, DEFAULT_DOWNLOAD_WINDOW);
        if immediate_window > download_window {
            return Err(ScheduleError::WindowOrder {
                immediate: immediate_window,
                download: download_window,
            });
        }

        Ok(Some(Self {
            start,
            immediate_window,
            download_window,
            do_not_reboot: response.do_not_reboot,
            mode: response.mode(),
        }))
    }

    /// Pick the download start.
    ///
    /// Inside the immediate window the download begins now; otherwise the
    /// instant is sampled uniformly from
    /// `[start − download_window, start − immediate_window]`, clamped to
    /// `now` when the sample is already past.
    pub fn download_at<R: Rng>(&self, now: DateTime<Utc>, rng: &mut R) -> DateTime<Utc> {
        let immediate =
            chrono::Duration::seconds(self.immediate_window.as_secs() as i64);
        let download = chrono::Duration::seconds(self.download_window.as_secs() as i64);

        if self.start - now <= immediate {
            return now;
        }

        let earliest = (self.start - download).timestamp();
        let latest = (self.start - immediate).timestamp();
        let sampled = rng.gen_range(earliest..=latest);
        let sampled = Utc.timestamp_opt(sampled, 0).single().unwrap_or(now);
        sampled.max(now)
    }
}

fn window(secs: i64, fallback: Duration) -> Duration {
    if secs > 0 {
        Duration::from_secs(secs as u64)
    } else {
        fallback
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
