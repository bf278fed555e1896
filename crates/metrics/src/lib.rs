// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenTelemetry metric export for the edge-node agents.
//!
//! Each daemon points an OTLP meter provider at the local collector socket
//! (no proxy involvement), tags it with `service.name`/`service.version`,
//! and registers host gauges. The guard flushes on drop so metrics survive
//! a clean shutdown.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod host;

use std::time::Duration;

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::attribute::{SERVICE_NAME, SERVICE_VERSION};
use opentelemetry_semantic_conventions::SCHEMA_URL;
use thiserror::Error;
use tracing::warn;

pub use host::host_snapshot;

/// Default periodic reader cadence; override via config.
pub const DEFAULT_READER_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to initialize metric exporter: {0}")]
    Init(String),
}

/// Exporter knobs, fixed at startup.
#[derive(Debug, Clone)]
pub struct MetricsSettings {
    /// OTLP endpoint, normally a UNIX socket on the node.
    pub endpoint: String,
    pub service_name: String,
    pub service_version: String,
    pub interval: Duration,
}

/// Flushes and shuts the provider down on drop.
pub struct MetricsGuard {
    provider: SdkMeterProvider,
}

impl Drop for MetricsGuard {
    fn drop(&mut self) {
        if let Err(err) = self.provider.force_flush() {
            warn!(%err, "metric flush on shutdown failed");
        }
        if let Err(err) = self.provider.shutdown() {
            warn!(%err, "meter provider shutdown failed");
        }
    }
}

fn resource(settings: &MetricsSettings) -> Resource {
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, settings.service_name.clone()),
                KeyValue::new(SERVICE_VERSION, settings.service_version.clone()),
            ],
            SCHEMA_URL,
        )
        .build()
}

/// Create the meter provider, install it globally, and start the host
/// metrics instrumentation.
pub fn init_metrics(settings: &MetricsSettings) -> Result<MetricsGuard, MetricsError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(settings.endpoint.clone())
        .build()
        .map_err(|e| MetricsError::Init(e.to_string()))?;

    let reader = PeriodicReader::builder(exporter).with_interval(settings.interval).build();

    let provider = SdkMeterProvider::builder()
        .with_resource(resource(settings))
        .with_reader(reader)
        .build();

    global::set_meter_provider(provider.clone());
    host::register_host_metrics(&global::meter("edge-node-host"));

    Ok(MetricsGuard { provider })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
