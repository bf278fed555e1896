// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host gauges: CPU utilization, memory, load average.

use std::sync::Arc;

use opentelemetry::metrics::Meter;
use parking_lot::Mutex;
use sysinfo::System;

/// Point-in-time host readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSnapshot {
    /// Global CPU utilization in [0, 1].
    pub cpu_utilization: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub load_one: f64,
}

/// Read the host counters once.
pub fn host_snapshot(sys: &mut System) -> HostSnapshot {
    sys.refresh_cpu();
    sys.refresh_memory();
    HostSnapshot {
        cpu_utilization: f64::from(sys.global_cpu_info().cpu_usage()) / 100.0,
        memory_used_bytes: sys.used_memory(),
        memory_total_bytes: sys.total_memory(),
        load_one: System::load_average().one,
    }
}

/// Register observable gauges backed by one shared `System`.
pub(crate) fn register_host_metrics(meter: &Meter) {
    let sys = Arc::new(Mutex::new(System::new()));

    let cpu_sys = Arc::clone(&sys);
    meter
        .f64_observable_gauge("system.cpu.utilization")
        .with_description("Global CPU utilization")
        .with_callback(move |observer| {
            let snapshot = host_snapshot(&mut cpu_sys.lock());
            observer.observe(snapshot.cpu_utilization, &[]);
        })
        .build();

    let mem_sys = Arc::clone(&sys);
    meter
        .u64_observable_gauge("system.memory.usage")
        .with_description("Used physical memory in bytes")
        .with_callback(move |observer| {
            let snapshot = host_snapshot(&mut mem_sys.lock());
            observer.observe(snapshot.memory_used_bytes, &[]);
        })
        .build();

    let load_sys = sys;
    meter
        .f64_observable_gauge("system.cpu.load_average.1m")
        .with_description("One-minute load average")
        .with_callback(move |observer| {
            let snapshot = host_snapshot(&mut load_sys.lock());
            observer.observe(snapshot.load_one, &[]);
        })
        .build();
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
