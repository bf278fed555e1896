// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hardware discovery agent.
//!
//! Inventories the host and pushes updates southbound on device events
//! (block/net subsystems) and on a periodic ticker; both feed the same
//! retry-wrapped reporter job. A separate readiness job reports `Ready`
//! only while recent pushes have succeeded.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod daemon;
mod events;
mod inventory;
mod reporter;

pub use events::{DeviceEvent, DeviceEventSource, UdevMonitor};
pub use inventory::{InventoryBuilder, SysinfoInventory};
pub use reporter::{InventorySink, Reporter, SouthboundSink};
