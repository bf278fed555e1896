// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async driver around the transition table.
//!
//! `register`/`deregister` hold the writer lock for their full sequence so
//! transitions stay totally ordered; `state()` takes the reader. Shell runs
//! inherit the root cancellation token, so shutdown kills any in-flight
//! install.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use en_southbound::proto::{
    ActionRequest, ClusterStatusCode, RegisterClusterResponse, RegistrationResult,
};
use en_southbound::{ClusterClient, RpcError};

use crate::exec::{run_shell, ExecError};
use crate::patch::MicrovisorPatch;
use crate::state::{transition, ClusterState, Event};

#[derive(Debug, Error)]
pub enum ClusterError {
    /// The orchestrator asked for something the current state forbids.
    /// Logged by the poller, never fatal, state unchanged.
    #[error("incorrect action request {event:?} in state {state}")]
    IncorrectActionRequest { state: ClusterState, event: Event },

    /// `RegisterCluster` answered with result ERROR.
    #[error("cluster registration rejected by orchestrator")]
    RegistrationRejected,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Uninstall succeeded but the configured cleanup shell failed; the
    /// machine is `Inactive` regardless.
    #[error("cleanup after uninstall failed: {0}")]
    CleanupFailed(#[source] ExecError),
}

/// Seam to the cluster orchestrator service.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn register_cluster(&self, guid: &str) -> Result<RegisterClusterResponse, RpcError>;

    async fn update_cluster_status(
        &self,
        guid: &str,
        code: ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError>;
}

/// Production orchestrator over the southbound client.
pub struct SouthboundOrchestrator {
    client: Mutex<ClusterClient>,
}

impl SouthboundOrchestrator {
    pub fn new(client: ClusterClient) -> Self {
        Self { client: Mutex::new(client) }
    }
}

#[async_trait]
impl Orchestrator for SouthboundOrchestrator {
    async fn register_cluster(&self, guid: &str) -> Result<RegisterClusterResponse, RpcError> {
        self.client.lock().await.register_cluster(guid).await
    }

    async fn update_cluster_status(
        &self,
        guid: &str,
        code: ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError> {
        self.client.lock().await.update_cluster_status(guid, code).await
    }
}

#[derive(Debug)]
struct Inner {
    state: ClusterState,
    install_cmd: String,
    uninstall_cmd: String,
}

pub struct ClusterMachine<O> {
    guid: String,
    orchestrator: O,
    /// LVM cleanup shell run after a successful uninstall.
    cleanup_cmd: Option<String>,
    patch: MicrovisorPatch,
    cancel: CancellationToken,
    inner: RwLock<Inner>,
}

impl<O: Orchestrator> ClusterMachine<O> {
    pub fn new(
        guid: String,
        orchestrator: O,
        cleanup_cmd: Option<String>,
        patch: MicrovisorPatch,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            guid,
            orchestrator,
            cleanup_cmd,
            patch,
            cancel,
            inner: RwLock::new(Inner {
                state: ClusterState::Inactive,
                install_cmd: String::new(),
                uninstall_cmd: String::new(),
            }),
        }
    }

    pub fn orchestrator(&self) -> &O {
        &self.orchestrator
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Current state under the reader lock.
    pub async fn state(&self) -> ClusterState {
        self.inner.read().await.state
    }

    fn step(inner: &mut Inner, event: Event) -> Result<ClusterState, ClusterError> {
        match transition(inner.state, event) {
            Some((next, _)) => {
                inner.state = next;
                Ok(next)
            }
            None => Err(ClusterError::IncorrectActionRequest { state: inner.state, event }),
        }
    }

    /// Drive `REGISTER`: fetch commands, install, end `Active`.
    pub async fn register(&self) -> Result<(), ClusterError> {
        let mut inner = self.inner.write().await;

        if inner.state != ClusterState::Registering {
            Self::step(&mut inner, Event::Register)?;
        }

        match self.orchestrator.register_cluster(&self.guid).await {
            Ok(response) if response.result() == RegistrationResult::Ok => {
                inner.install_cmd = response.install_cmd;
                inner.uninstall_cmd = response.uninstall_cmd;
            }
            // Abort the transition: after re-entry the machine reads
            // Inactive again.
            Ok(_) => {
                inner.state = ClusterState::Inactive;
                return Err(ClusterError::RegistrationRejected);
            }
            Err(err) => {
                inner.state = ClusterState::Inactive;
                return Err(err.into());
            }
        }

        // Registering re-enters with the same event once commands are
        // cached.
        Self::step(&mut inner, Event::Register)?;

        info!(state = %ClusterState::InstallInProgress, "installing cluster engine");
        match run_shell("install", &inner.install_cmd, &self.cancel).await {
            Ok(()) => {
                Self::step(&mut inner, Event::InstallOk)?;
                info!(state = %ClusterState::Active, "cluster engine installed");
                Ok(())
            }
            Err(err) => {
                Self::step(&mut inner, Event::InstallErr)?;
                Err(err.into())
            }
        }
    }

    /// Drive `DEREGISTER`: re-fetch commands if the cache is empty, patch,
    /// uninstall, clean up, end `Inactive`.
    pub async fn deregister(&self) -> Result<(), ClusterError> {
        let mut inner = self.inner.write().await;

        if inner.state != ClusterState::Deregistering {
            Self::step(&mut inner, Event::Deregister)?;
        }

        if inner.uninstall_cmd.is_empty() {
            // Stay in Deregistering on failure so the next poll retries
            // the fetch.
            match self.orchestrator.register_cluster(&self.guid).await {
                Ok(response) if response.result() == RegistrationResult::Ok => {
                    inner.install_cmd = response.install_cmd;
                    inner.uninstall_cmd = response.uninstall_cmd;
                }
                Ok(_) => return Err(ClusterError::RegistrationRejected),
                Err(err) => return Err(err.into()),
            }
        }

        Self::step(&mut inner, Event::Deregister)?;

        self.patch.apply(&self.cancel).await;

        info!(state = %ClusterState::UninstallInProgress, "uninstalling cluster engine");
        match run_shell("uninstall", &inner.uninstall_cmd, &self.cancel).await {
            Ok(()) => {
                Self::step(&mut inner, Event::UninstallOk)?;
                if let Some(cleanup) = &self.cleanup_cmd {
                    if let Err(err) = run_shell("cleanup", cleanup, &self.cancel).await {
                        return Err(ClusterError::CleanupFailed(err));
                    }
                }
                info!(state = %ClusterState::Inactive, "cluster engine uninstalled");
                Ok(())
            }
            Err(err) => {
                Self::step(&mut inner, Event::UninstallErr)?;
                inner.uninstall_cmd.clear();
                Err(err.into())
            }
        }
    }

    /// Cached commands, for the poller's logs and tests.
    pub async fn commands(&self) -> (String, String) {
        let inner = self.inner.read().await;
        (inner.install_cmd.clone(), inner.uninstall_cmd.clone())
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
