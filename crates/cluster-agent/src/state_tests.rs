// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use yare::parameterized;

#[parameterized(
    inactive_register = { ClusterState::Inactive, Event::Register, ClusterState::Registering },
    inactive_deregister = { ClusterState::Inactive, Event::Deregister, ClusterState::Deregistering },
    registering_register = { ClusterState::Registering, Event::Register, ClusterState::InstallInProgress },
    install_ok = { ClusterState::InstallInProgress, Event::InstallOk, ClusterState::Active },
    install_err = { ClusterState::InstallInProgress, Event::InstallErr, ClusterState::Inactive },
    active_deregister = { ClusterState::Active, Event::Deregister, ClusterState::Deregistering },
    deregistering_deregister = { ClusterState::Deregistering, Event::Deregister, ClusterState::UninstallInProgress },
    uninstall_ok = { ClusterState::UninstallInProgress, Event::UninstallOk, ClusterState::Inactive },
    uninstall_err = { ClusterState::UninstallInProgress, Event::UninstallErr, ClusterState::Inactive },
)]
fn table_transitions(state: ClusterState, event: Event, expected: ClusterState) {
    let (next, _) = transition(state, event).unwrap();
    assert_eq!(next, expected);
}

#[parameterized(
    registering_deregister = { ClusterState::Registering, Event::Deregister },
    install_deregister = { ClusterState::InstallInProgress, Event::Deregister },
    active_register = { ClusterState::Active, Event::Register },
    deregistering_register = { ClusterState::Deregistering, Event::Register },
    uninstalling_register = { ClusterState::UninstallInProgress, Event::Register },
    inactive_install_ok = { ClusterState::Inactive, Event::InstallOk },
    active_uninstall_ok = { ClusterState::Active, Event::UninstallOk },
)]
fn off_table_pairs_are_rejected(state: ClusterState, event: Event) {
    assert!(transition(state, event).is_none());
}

#[test]
fn every_pair_is_either_in_table_or_rejected() {
    use ClusterState::*;
    use Event::*;
    let states =
        [Inactive, Registering, InstallInProgress, Active, Deregistering, UninstallInProgress];
    let events = [Register, Deregister, InstallOk, InstallErr, UninstallOk, UninstallErr];

    let mut allowed = 0;
    for state in states {
        for event in events {
            if transition(state, event).is_some() {
                allowed += 1;
            }
        }
    }
    // Exactly the nine table cells.
    assert_eq!(allowed, 9);
}

#[test]
fn uninstall_outcomes_carry_their_actions() {
    assert_eq!(
        transition(ClusterState::UninstallInProgress, Event::UninstallOk).unwrap().1,
        Action::RunCleanup
    );
    assert_eq!(
        transition(ClusterState::UninstallInProgress, Event::UninstallErr).unwrap().1,
        Action::ClearUninstallCmd
    );
}

#[test]
fn state_literals_match_wire_spelling() {
    assert_eq!(ClusterState::Active.as_str(), "ACTIVE");
    assert_eq!(ClusterState::UninstallInProgress.as_str(), "UNINSTALL_IN_PROGRESS");
    assert_eq!(ClusterState::Inactive.to_string(), "INACTIVE");
}

#[parameterized(
    inactive = { ClusterState::Inactive, ClusterStatusCode::Inactive },
    registering = { ClusterState::Registering, ClusterStatusCode::Registering },
    active = { ClusterState::Active, ClusterStatusCode::Active },
)]
fn codes_mirror_states(state: ClusterState, code: ClusterStatusCode) {
    assert_eq!(state.as_code(), code);
}
