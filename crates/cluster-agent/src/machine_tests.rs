// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Scripted orchestrator: answers RegisterCluster with fixed commands.
struct FakeOrchestrator {
    install_cmd: String,
    uninstall_cmd: String,
    result: RegistrationResult,
    action: ActionRequest,
    register_calls: AtomicU32,
    fail_transport: AtomicBool,
}

impl FakeOrchestrator {
    fn with_commands(install: &str, uninstall: &str) -> Self {
        Self {
            install_cmd: install.to_string(),
            uninstall_cmd: uninstall.to_string(),
            result: RegistrationResult::Ok,
            action: ActionRequest::None,
            register_calls: AtomicU32::new(0),
            fail_transport: AtomicBool::new(false),
        }
    }

    fn rejecting() -> Self {
        Self { result: RegistrationResult::Error, ..Self::with_commands("", "") }
    }

    fn unreachable_service() -> Self {
        Self { fail_transport: AtomicBool::new(true), ..Self::with_commands("", "") }
    }

    fn recover(&self) {
        self.fail_transport.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Orchestrator for &FakeOrchestrator {
    async fn register_cluster(&self, _guid: &str) -> Result<RegisterClusterResponse, RpcError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(RpcError::Unavailable("connection refused".to_string()));
        }
        Ok(RegisterClusterResponse {
            install_cmd: self.install_cmd.clone(),
            uninstall_cmd: self.uninstall_cmd.clone(),
            result: self.result as i32,
        })
    }

    async fn update_cluster_status(
        &self,
        _guid: &str,
        _code: ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError> {
        Ok(self.action)
    }
}

fn machine<'a>(orchestrator: &'a FakeOrchestrator) -> ClusterMachine<&'a FakeOrchestrator> {
    let patch = MicrovisorPatch {
        os_release: "/nonexistent/os-release".into(),
        script: "/nonexistent/script.sh".into(),
    };
    ClusterMachine::new(
        "8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1".to_string(),
        orchestrator,
        None,
        patch,
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn install_happy_path_ends_active() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);

    machine.register().await.unwrap();

    assert_eq!(machine.state().await, ClusterState::Active);
    assert_eq!(machine.state().await.as_str(), "ACTIVE");
    let (install, uninstall) = machine.commands().await;
    assert_eq!((install.as_str(), uninstall.as_str()), ("/bin/true", "/bin/true"));
}

#[tokio::test]
async fn install_failure_ends_inactive() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/false", "/bin/true");
    let machine = machine(&orchestrator);

    let result = machine.register().await;

    assert!(matches!(result, Err(ClusterError::Exec(ExecError::CommandFailed { .. }))));
    assert_eq!(machine.state().await, ClusterState::Inactive);
    assert_eq!(machine.state().await.as_code(), ClusterStatusCode::Inactive);
}

#[tokio::test]
async fn registration_error_response_aborts_to_inactive() {
    let orchestrator = FakeOrchestrator::rejecting();
    let machine = machine(&orchestrator);

    let result = machine.register().await;

    assert!(matches!(result, Err(ClusterError::RegistrationRejected)));
    assert_eq!(machine.state().await, ClusterState::Inactive);
}

#[tokio::test]
async fn transport_error_aborts_to_inactive() {
    let orchestrator = FakeOrchestrator::unreachable_service();
    let machine = machine(&orchestrator);

    let result = machine.register().await;

    assert!(matches!(result, Err(ClusterError::Rpc(RpcError::Unavailable(_)))));
    assert_eq!(machine.state().await, ClusterState::Inactive);
}

#[tokio::test]
async fn deregister_with_missing_cached_command_refetches() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);

    machine.register().await.unwrap();
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 1);

    // Simulate a restart that lost the cache: a fresh machine in Active
    // has no cached uninstall command, so drive one from Inactive.
    let restarted = self::machine(&orchestrator);
    restarted.deregister().await.unwrap();

    // One extra RegisterCluster call for the re-fetch.
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 2);
    assert_eq!(restarted.state().await, ClusterState::Inactive);
    let (install, uninstall) = restarted.commands().await;
    assert!(!install.is_empty());
    assert!(!uninstall.is_empty());
}

#[tokio::test]
async fn deregister_from_active_reuses_cached_command() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);

    machine.register().await.unwrap();
    machine.deregister().await.unwrap();

    assert_eq!(machine.state().await, ClusterState::Inactive);
    // No re-fetch: registration was called exactly once.
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn uninstall_failure_clears_cached_command() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/false");
    let machine = machine(&orchestrator);

    machine.register().await.unwrap();
    let result = machine.deregister().await;

    assert!(matches!(result, Err(ClusterError::Exec(ExecError::CommandFailed { .. }))));
    assert_eq!(machine.state().await, ClusterState::Inactive);
    let (_, uninstall) = machine.commands().await;
    assert!(uninstall.is_empty());
}

#[tokio::test]
async fn cleanup_failure_surfaces_but_machine_is_inactive() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/true");
    let patch = MicrovisorPatch {
        os_release: "/nonexistent/os-release".into(),
        script: "/nonexistent/script.sh".into(),
    };
    let machine = ClusterMachine::new(
        "8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1".to_string(),
        &orchestrator,
        Some("/bin/false".to_string()),
        patch,
        CancellationToken::new(),
    );

    machine.register().await.unwrap();
    let result = machine.deregister().await;

    assert!(matches!(result, Err(ClusterError::CleanupFailed(_))));
    assert_eq!(machine.state().await, ClusterState::Inactive);
}

#[tokio::test]
async fn deregister_retries_fetch_from_deregistering() {
    // First DEREGISTER hits a transport failure during the re-fetch; the
    // machine stays in Deregistering and the next DEREGISTER completes.
    let orchestrator = FakeOrchestrator {
        fail_transport: AtomicBool::new(true),
        ..FakeOrchestrator::with_commands("/bin/true", "/bin/true")
    };
    let machine = machine(&orchestrator);

    assert!(machine.deregister().await.is_err());
    assert_eq!(machine.state().await, ClusterState::Deregistering);

    // The orchestrator comes back; the retried DEREGISTER goes through.
    orchestrator.recover();
    machine.deregister().await.unwrap();
    assert_eq!(machine.state().await, ClusterState::Inactive);
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn incorrect_action_leaves_state_unchanged() {
    let orchestrator = FakeOrchestrator::with_commands("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);
    machine.register().await.unwrap();

    // REGISTER while Active is off the table.
    let result = machine.register().await;

    assert!(matches!(
        result,
        Err(ClusterError::IncorrectActionRequest { state: ClusterState::Active, .. })
    ));
    assert_eq!(machine.state().await, ClusterState::Active);
    // No spurious orchestrator traffic from the rejected action.
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 1);
}
