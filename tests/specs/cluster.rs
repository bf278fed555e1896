// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster lifecycle scenarios against a scripted orchestrator.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cluster_agent::{ClusterMachine, ClusterState, MicrovisorPatch, Orchestrator};
use en_southbound::proto::{
    ActionRequest, ClusterStatusCode, RegisterClusterResponse, RegistrationResult,
};
use en_southbound::RpcError;

struct ScriptedOrchestrator {
    install_cmd: &'static str,
    uninstall_cmd: &'static str,
    register_calls: AtomicU32,
}

impl ScriptedOrchestrator {
    fn new(install_cmd: &'static str, uninstall_cmd: &'static str) -> Self {
        Self { install_cmd, uninstall_cmd, register_calls: AtomicU32::new(0) }
    }
}

#[async_trait]
impl Orchestrator for &ScriptedOrchestrator {
    async fn register_cluster(&self, _guid: &str) -> Result<RegisterClusterResponse, RpcError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RegisterClusterResponse {
            install_cmd: self.install_cmd.to_string(),
            uninstall_cmd: self.uninstall_cmd.to_string(),
            result: RegistrationResult::Ok as i32,
        })
    }

    async fn update_cluster_status(
        &self,
        _guid: &str,
        _code: ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError> {
        Ok(ActionRequest::None)
    }
}

fn machine<'a>(orchestrator: &'a ScriptedOrchestrator) -> ClusterMachine<&'a ScriptedOrchestrator> {
    ClusterMachine::new(
        "8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1".to_string(),
        orchestrator,
        None,
        MicrovisorPatch {
            os_release: "/nonexistent/os-release".into(),
            script: "/nonexistent/script.sh".into(),
        },
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn install_happy_path() {
    let orchestrator = ScriptedOrchestrator::new("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);

    machine.register().await.unwrap();

    assert_eq!(machine.state().await.as_str(), "ACTIVE");
}

#[tokio::test]
async fn install_failure_lands_back_in_inactive() {
    let orchestrator = ScriptedOrchestrator::new("/bin/false", "/bin/true");
    let machine = machine(&orchestrator);

    assert!(machine.register().await.is_err());

    assert_eq!(machine.state().await, ClusterState::Inactive);
    assert_eq!(machine.state().await.as_code(), ClusterStatusCode::Inactive);
}

#[tokio::test]
async fn deregister_refetches_missing_uninstall_command() {
    let orchestrator = ScriptedOrchestrator::new("/bin/true", "/bin/true");
    let machine = machine(&orchestrator);

    // Fresh machine: no cached commands at all.
    machine.deregister().await.unwrap();

    assert_eq!(machine.state().await, ClusterState::Inactive);
    assert_eq!(orchestrator.register_calls.load(Ordering::SeqCst), 1);
    let (install, uninstall) = machine.commands().await;
    assert!(!install.is_empty());
    assert!(!uninstall.is_empty());
}
