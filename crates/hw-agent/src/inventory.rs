// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort host inventory.
//!
//! Partial failures return whatever was readable rather than aborting;
//! a field the host cannot answer is simply left at its default. USB and
//! GPU enumeration go through external collector shells and are out of
//! scope here.

use async_trait::async_trait;

use en_southbound::proto::{DiskInfo, InterfaceInfo, SystemInfo};

const BIOS_VERSION_PATH: &str = "/sys/class/dmi/id/bios_version";

/// Payload builder seam. Implementations must be cancellation-safe.
#[async_trait]
pub trait InventoryBuilder: Send + Sync {
    async fn collect(&self) -> SystemInfo;
}

/// Inventory over the sysinfo crate plus sysfs reads.
#[derive(Default, Clone)]
pub struct SysinfoInventory;

impl SysinfoInventory {
    fn collect_blocking() -> SystemInfo {
        let mut sys = sysinfo::System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let disks = sysinfo::Disks::new_with_refreshed_list()
            .iter()
            .map(|disk| DiskInfo {
                name: disk.name().to_string_lossy().into_owned(),
                size_bytes: disk.total_space(),
                model: String::new(),
            })
            .collect();

        let interfaces = sysinfo::Networks::new_with_refreshed_list()
            .iter()
            .map(|(name, data)| InterfaceInfo {
                name: name.clone(),
                mac: data.mac_address().to_string(),
                addresses: Vec::new(),
            })
            .collect();

        SystemInfo {
            cpu_model: sys.cpus().first().map(|cpu| cpu.brand().to_string()).unwrap_or_default(),
            cpu_cores: sys.cpus().len() as u32,
            memory_bytes: sys.total_memory(),
            disks,
            interfaces,
            usb_devices: Vec::new(),
            gpus: Vec::new(),
            bios_version: std::fs::read_to_string(BIOS_VERSION_PATH)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            os_name: sysinfo::System::name().unwrap_or_default(),
            os_version: sysinfo::System::os_version().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl InventoryBuilder for SysinfoInventory {
    async fn collect(&self) -> SystemInfo {
        // The sysinfo walk does blocking sysfs I/O; keep it off the
        // runtime threads.
        tokio::task::spawn_blocking(Self::collect_blocking).await.unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
