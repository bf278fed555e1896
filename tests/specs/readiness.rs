// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness service end-to-end over a real UNIX socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use en_status::{
    Aggregate, ExpectedAgent, ProbeResults, ReadinessRegistry, StatusClient, StatusError,
    StatusListener, UnitStates,
};
use en_wire::AgentStatus;

struct NoUnits;

#[async_trait::async_trait]
impl UnitStates for NoUnits {
    async fn is_active(&self, _unit: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn agents_report_and_the_aggregate_reflects_them() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("node-agent.sock");

    let registry = Arc::new(ReadinessRegistry::new(
        Duration::from_secs(10),
        &[
            ExpectedAgent::named("cluster-agent"),
            ExpectedAgent::named("hw-agent"),
            ExpectedAgent::named("telemetry-agent"),
        ],
    ));
    let listener = StatusListener::bind(&socket, Arc::clone(&registry)).unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(listener.run(cancel.clone()));

    // Two agents Ready, one NotReady, one outbound endpoint down.
    StatusClient::new(&socket, "cluster-agent").report(AgentStatus::Ready).await.unwrap();
    StatusClient::new(&socket, "hw-agent").report(AgentStatus::Ready).await.unwrap();
    StatusClient::new(&socket, "telemetry-agent")
        .report(AgentStatus::NotReady)
        .await
        .unwrap();

    let probes = ProbeResults::default();
    probes.set("release-service", false);

    let aggregate =
        Aggregate::compute(&registry, &probes, &[], &NoUnits, Instant::now()).await;

    assert_eq!(aggregate.summary(), "2 of 4 components running");
    assert!(!aggregate.good());

    cancel.cancel();
}

#[tokio::test]
async fn repeated_reports_do_not_inflate_the_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("node-agent.sock");

    let registry = Arc::new(ReadinessRegistry::new(
        Duration::from_secs(10),
        &[ExpectedAgent::named("hw-agent")],
    ));
    let listener = StatusListener::bind(&socket, Arc::clone(&registry)).unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(listener.run(cancel.clone()));

    let client = StatusClient::new(&socket, "hw-agent");
    for _ in 0..5 {
        client.report(AgentStatus::Ready).await.unwrap();
    }

    let aggregate = Aggregate::compute(
        &registry,
        &ProbeResults::default(),
        &[],
        &NoUnits,
        Instant::now(),
    )
    .await;
    assert_eq!(aggregate, Aggregate { running: 1, total: 1 });

    cancel.cancel();
}

#[tokio::test]
async fn unknown_agents_are_refused_but_get_an_interval() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("node-agent.sock");

    let registry = Arc::new(ReadinessRegistry::new(Duration::from_secs(7), &[]));
    let listener = StatusListener::bind(&socket, registry).unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(listener.run(cancel.clone()));

    let client = StatusClient::new(&socket, "stranger");
    assert!(matches!(
        client.report(AgentStatus::Ready).await,
        Err(StatusError::Refused(_))
    ));
    assert_eq!(client.status_interval().await.unwrap(), Duration::from_secs(7));

    cancel.cancel();
}
