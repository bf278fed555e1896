// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six-state lifecycle machine as a pure transition function.
//!
//! Encoding the table as `(state, event) -> (state', action)` keeps the
//! machine exhaustively checkable; the async driver in `machine.rs` only
//! sequences fetches and shell runs around it.

use en_southbound::proto::ClusterStatusCode;

/// Lifecycle states. Initial is `Inactive`; terminal only on process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Inactive,
    Registering,
    InstallInProgress,
    Active,
    Deregistering,
    UninstallInProgress,
}

impl ClusterState {
    /// Literal reported upstream and returned by `State()`.
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterState::Inactive => "INACTIVE",
            ClusterState::Registering => "REGISTERING",
            ClusterState::InstallInProgress => "INSTALL_IN_PROGRESS",
            ClusterState::Active => "ACTIVE",
            ClusterState::Deregistering => "DEREGISTERING",
            ClusterState::UninstallInProgress => "UNINSTALL_IN_PROGRESS",
        }
    }

    /// Wire code for `UpdateClusterStatus`.
    pub fn as_code(self) -> ClusterStatusCode {
        match self {
            ClusterState::Inactive => ClusterStatusCode::Inactive,
            ClusterState::Registering => ClusterStatusCode::Registering,
            ClusterState::InstallInProgress => ClusterStatusCode::InstallInProgress,
            ClusterState::Active => ClusterStatusCode::Active,
            ClusterState::Deregistering => ClusterStatusCode::Deregistering,
            ClusterState::UninstallInProgress => ClusterStatusCode::UninstallInProgress,
        }
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External action requests and internal command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Register,
    Deregister,
    InstallOk,
    InstallErr,
    UninstallOk,
    UninstallErr,
}

/// What the driver must do alongside a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Re-apply the same event to the new state (entry states are
    /// pass-through).
    Reenter,
    /// Fetch install/uninstall commands, then run the install.
    FetchAndInstall,
    /// Fetch commands only if the cached uninstall command is empty, then
    /// run the uninstall.
    FetchIfMissingAndUninstall,
    /// Uninstall succeeded: run the configured cleanup shell.
    RunCleanup,
    /// Uninstall failed: drop the cached uninstall command.
    ClearUninstallCmd,
}

/// The transition table. Any pair outside it is an incorrect action
/// request and must leave the state unchanged.
pub fn transition(state: ClusterState, event: Event) -> Option<(ClusterState, Action)> {
    use ClusterState::*;
    use Event::*;

    match (state, event) {
        (Inactive, Register) => Some((Registering, Action::Reenter)),
        (Inactive, Deregister) => Some((Deregistering, Action::Reenter)),

        (Registering, Register) => Some((InstallInProgress, Action::FetchAndInstall)),

        (InstallInProgress, InstallOk) => Some((Active, Action::None)),
        (InstallInProgress, InstallErr) => Some((Inactive, Action::None)),

        (Active, Deregister) => Some((Deregistering, Action::Reenter)),

        (Deregistering, Deregister) => {
            Some((UninstallInProgress, Action::FetchIfMissingAndUninstall))
        }

        (UninstallInProgress, UninstallOk) => Some((Inactive, Action::RunCleanup)),
        (UninstallInProgress, UninstallErr) => Some((Inactive, Action::ClearUninstallCmd)),

        _ => None,
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
