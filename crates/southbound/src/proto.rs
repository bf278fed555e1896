// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages for the orchestrator service catalog.
//!
//! Kept as hand-maintained prost types so the crate carries no protoc build
//! step; tags are frozen and must never be renumbered.

// ---------------------------------------------------------------------------
// Cluster orchestrator southbound
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterClusterRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterClusterResponse {
    #[prost(string, tag = "1")]
    pub install_cmd: String,
    #[prost(string, tag = "2")]
    pub uninstall_cmd: String,
    #[prost(enumeration = "RegistrationResult", default = "Error", tag = "3")]
    pub result: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum RegistrationResult {
    Ok = 0,
    Error = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateClusterStatusRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
    #[prost(enumeration = "ClusterStatusCode", tag = "2")]
    pub code: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateClusterStatusResponse {
    #[prost(enumeration = "ActionRequest", tag = "1")]
    pub action: i32,
}

/// Status code the agent reports each heartbeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum ClusterStatusCode {
    Inactive = 0,
    Registering = 1,
    InstallInProgress = 2,
    Active = 3,
    Deregistering = 4,
    UninstallInProgress = 5,
    Error = 6,
}

/// What the orchestrator wants the agent to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActionRequest {
    None = 0,
    Register = 1,
    Deregister = 2,
}

// ---------------------------------------------------------------------------
// Host manager
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateHostSystemInfoRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
    #[prost(message, optional, tag = "2")]
    pub system_info: Option<SystemInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateHostSystemInfoResponse {}

/// Best-effort hardware inventory. Absent fields mean the collector could
/// not read them, not that the hardware is absent.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SystemInfo {
    #[prost(string, tag = "1")]
    pub cpu_model: String,
    #[prost(uint32, tag = "2")]
    pub cpu_cores: u32,
    #[prost(uint64, tag = "3")]
    pub memory_bytes: u64,
    #[prost(message, repeated, tag = "4")]
    pub disks: Vec<DiskInfo>,
    #[prost(message, repeated, tag = "5")]
    pub interfaces: Vec<InterfaceInfo>,
    #[prost(message, repeated, tag = "6")]
    pub usb_devices: Vec<UsbDeviceInfo>,
    #[prost(message, repeated, tag = "7")]
    pub gpus: Vec<GpuInfo>,
    #[prost(string, tag = "8")]
    pub bios_version: String,
    #[prost(string, tag = "9")]
    pub os_name: String,
    #[prost(string, tag = "10")]
    pub os_version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiskInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub size_bytes: u64,
    #[prost(string, tag = "3")]
    pub model: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterfaceInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub mac: String,
    #[prost(string, repeated, tag = "3")]
    pub addresses: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsbDeviceInfo {
    #[prost(string, tag = "1")]
    pub vendor_id: String,
    #[prost(string, tag = "2")]
    pub product_id: String,
    #[prost(string, tag = "3")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GpuInfo {
    #[prost(string, tag = "1")]
    pub vendor: String,
    #[prost(string, tag = "2")]
    pub model: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateInstanceStateStatusRequest {
    #[prost(string, tag = "1")]
    pub host_guid: String,
    #[prost(enumeration = "InstanceState", tag = "2")]
    pub state: i32,
    #[prost(enumeration = "InstanceStatus", tag = "3")]
    pub status: i32,
    /// Human-readable aggregate, e.g. `"3 of 4 components running"`.
    #[prost(string, tag = "4")]
    pub detail: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateInstanceStateStatusResponse {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum InstanceState {
    Unspecified = 0,
    Running = 1,
    Error = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum InstanceStatus {
    Unspecified = 0,
    Ok = 1,
    Degraded = 2,
}

// ---------------------------------------------------------------------------
// Telemetry manager
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTelemetryConfigRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTelemetryConfigResponse {
    #[prost(message, repeated, tag = "1")]
    pub profiles: Vec<TelemetryProfile>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TelemetryProfile {
    #[prost(enumeration = "CollectorKind", tag = "1")]
    pub collector: i32,
    #[prost(enumeration = "ResourceKind", tag = "2")]
    pub resource: i32,
    /// Collector input name, e.g. a Telegraf plugin or Fluent-Bit tail.
    #[prost(string, tag = "3")]
    pub input: String,
    /// Collection interval in seconds.
    #[prost(int64, tag = "4")]
    pub interval: i64,
    /// Log level / metric granularity knob, collector-defined.
    #[prost(string, tag = "5")]
    pub level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum CollectorKind {
    Unspecified = 0,
    Host = 1,
    Cluster = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResourceKind {
    Unspecified = 0,
    Metrics = 1,
    Logs = 2,
}

// ---------------------------------------------------------------------------
// Maintenance manager
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUpdateScheduleRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUpdateScheduleResponse {
    /// Zero means no update is scheduled.
    #[prost(int64, tag = "1")]
    pub scheduled_start_utc: i64,
    #[prost(bool, tag = "2")]
    pub do_not_reboot: bool,
    #[prost(enumeration = "UpdateMode", tag = "3")]
    pub mode: i32,
    /// Zero falls back to the agent default (10 minutes).
    #[prost(int64, tag = "4")]
    pub immediate_download_window_secs: i64,
    /// Zero falls back to the agent default (6 hours).
    #[prost(int64, tag = "5")]
    pub download_window_secs: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum UpdateMode {
    Full = 0,
    NoDownload = 1,
    DownloadOnly = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlatformUpdateStatusRequest {
    #[prost(string, tag = "1")]
    pub guid: String,
    #[prost(enumeration = "UpdateStatus", tag = "2")]
    pub status: i32,
    /// Granular log line for operators; may be the canned kernel-only line.
    #[prost(string, tag = "3")]
    pub detail: String,
    #[prost(string, tag = "4")]
    pub source_version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlatformUpdateStatusResponse {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum UpdateStatus {
    Unspecified = 0,
    Started = 1,
    Downloading = 2,
    Downloaded = 3,
    Updated = 4,
    Failed = 5,
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod tests;
