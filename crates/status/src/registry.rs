// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whitelisted per-agent readiness entries.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use regex::Regex;

use en_wire::AgentStatus;

use crate::StatusError;

fn agent_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new("^[a-z0-9-]{1,40}$").unwrap()
    })
}

/// An agent the node expects to report, registered at service startup.
#[derive(Debug, Clone)]
pub struct ExpectedAgent {
    pub name: String,
    /// The agent's own loop cadence when it differs from the service
    /// heartbeat; widens the freshness window.
    pub interval: Option<Duration>,
}

impl ExpectedAgent {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), interval: None }
    }

    pub fn with_interval(name: &str, interval: Duration) -> Self {
        Self { name: name.to_string(), interval: Some(interval) }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    status: AgentStatus,
    at: Instant,
    interval: Option<Duration>,
}

/// Per-agent readiness map behind a single writer lock.
pub struct ReadinessRegistry {
    /// Service heartbeat: report cadence handed to agents and the base of
    /// every freshness window.
    interval: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ReadinessRegistry {
    /// Register the whitelist. Entries start `Unspecified` and count as
    /// not running until the agent's first report.
    pub fn new(interval: Duration, expected: &[ExpectedAgent]) -> Self {
        let now = Instant::now();
        let entries = expected
            .iter()
            .map(|agent| {
                (
                    agent.name.clone(),
                    Entry { status: AgentStatus::Unspecified, at: now, interval: agent.interval },
                )
            })
            .collect();
        Self { interval, entries: Mutex::new(entries) }
    }

    /// Record a report. Unknown or malformed names never touch the map.
    pub fn report(&self, agent: &str, status: AgentStatus) -> Result<(), StatusError> {
        self.report_at(agent, status, Instant::now())
    }

    pub(crate) fn report_at(
        &self,
        agent: &str,
        status: AgentStatus,
        now: Instant,
    ) -> Result<(), StatusError> {
        if !agent_name_pattern().is_match(agent) {
            return Err(StatusError::InvalidAgentName(agent.to_string()));
        }
        let mut entries = self.entries.lock();
        match entries.get_mut(agent) {
            Some(entry) => {
                entry.status = status;
                entry.at = now;
                Ok(())
            }
            None => Err(StatusError::UnknownAgent(agent.to_string())),
        }
    }

    /// The report cadence agents self-tune to.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `(running, total)` over registered agents at `now`.
    ///
    /// An entry counts as running iff it is `Ready` and fresh within
    /// `2 × max(service interval, agent interval)`.
    pub fn running_at(&self, now: Instant) -> (usize, usize) {
        let entries = self.entries.lock();
        let total = entries.len();
        let running = entries
            .values()
            .filter(|entry| {
                entry.status.is_ready()
                    && now.saturating_duration_since(entry.at) <= self.freshness_window(entry)
            })
            .count();
        (running, total)
    }

    fn freshness_window(&self, entry: &Entry) -> Duration {
        2 * self.interval.max(entry.interval.unwrap_or(self.interval))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
