// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profile sets and the dirty/init masks.

use std::collections::HashSet;

use en_southbound::proto::{CollectorKind, ResourceKind, TelemetryProfile};

/// One telemetry profile group: which collector config file it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    HostMetrics,
    HostLogs,
    ClusterMetrics,
    ClusterLogs,
}

/// All four groups, in mask bit order.
pub const GROUPS: [Group; 4] =
    [Group::HostMetrics, Group::HostLogs, Group::ClusterMetrics, Group::ClusterLogs];

impl Group {
    pub fn from_kinds(collector: CollectorKind, resource: ResourceKind) -> Option<Group> {
        match (collector, resource) {
            (CollectorKind::Host, ResourceKind::Metrics) => Some(Group::HostMetrics),
            (CollectorKind::Host, ResourceKind::Logs) => Some(Group::HostLogs),
            (CollectorKind::Cluster, ResourceKind::Metrics) => Some(Group::ClusterMetrics),
            (CollectorKind::Cluster, ResourceKind::Logs) => Some(Group::ClusterLogs),
            _ => None,
        }
    }

    pub fn is_cluster(self) -> bool {
        matches!(self, Group::ClusterMetrics | Group::ClusterLogs)
    }

    pub fn is_metrics(self) -> bool {
        matches!(self, Group::HostMetrics | Group::ClusterMetrics)
    }

    fn bit(self) -> u8 {
        match self {
            Group::HostMetrics => 0b0001,
            Group::HostLogs => 0b0010,
            Group::ClusterMetrics => 0b0100,
            Group::ClusterLogs => 0b1000,
        }
    }
}

/// 4-bit mask indexed by profile group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupMask(u8);

impl GroupMask {
    pub fn set(&mut self, group: Group) {
        self.0 |= group.bit();
    }

    pub fn clear(&mut self, group: Group) {
        self.0 &= !group.bit();
    }

    pub fn is_set(self, group: Group) -> bool {
        self.0 & group.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: GroupMask) -> GroupMask {
        GroupMask(self.0 | other.0)
    }

    /// Groups currently set, in mask bit order.
    pub fn groups(self) -> impl Iterator<Item = Group> {
        GROUPS.into_iter().filter(move |group| self.is_set(*group))
    }
}

/// One profile row as compared for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    pub input: String,
    pub interval: i64,
    pub level: String,
}

/// The received profile rows bucketed per group. Equality is set-based:
/// insertion order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    host_metrics: HashSet<Profile>,
    host_logs: HashSet<Profile>,
    cluster_metrics: HashSet<Profile>,
    cluster_logs: HashSet<Profile>,
}

impl ProfileSet {
    /// Bucket wire profiles, dropping rows with unknown kinds.
    pub fn from_wire(profiles: &[TelemetryProfile]) -> Self {
        let mut set = Self::default();
        for profile in profiles {
            let Some(group) = Group::from_kinds(profile.collector(), profile.resource()) else {
                continue;
            };
            set.bucket_mut(group).insert(Profile {
                input: profile.input.clone(),
                interval: profile.interval,
                level: profile.level.clone(),
            });
        }
        set
    }

    pub fn group(&self, group: Group) -> &HashSet<Profile> {
        match group {
            Group::HostMetrics => &self.host_metrics,
            Group::HostLogs => &self.host_logs,
            Group::ClusterMetrics => &self.cluster_metrics,
            Group::ClusterLogs => &self.cluster_logs,
        }
    }

    fn bucket_mut(&mut self, group: Group) -> &mut HashSet<Profile> {
        match group {
            Group::HostMetrics => &mut self.host_metrics,
            Group::HostLogs => &mut self.host_logs,
            Group::ClusterMetrics => &mut self.cluster_metrics,
            Group::ClusterLogs => &mut self.cluster_logs,
        }
    }

    /// Sorted view of a group for deterministic rendering.
    pub fn sorted(&self, group: Group) -> Vec<&Profile> {
        let mut rows: Vec<&Profile> = self.group(group).iter().collect();
        rows.sort_by(|a, b| a.input.cmp(&b.input));
        rows
    }
}

/// Compute `(dirty, init)` between the applied and received sets.
///
/// Dirty: any row changed or was removed, or the whole group disappeared.
/// Init: the group was empty and is now populated, which forces a gold
/// regeneration instead of an incremental patch.
pub fn diff(applied: &ProfileSet, received: &ProfileSet) -> (GroupMask, GroupMask) {
    let mut dirty = GroupMask::default();
    let mut init = GroupMask::default();

    for group in GROUPS {
        let before = applied.group(group);
        let after = received.group(group);
        if before != after {
            dirty.set(group);
        }
        if before.is_empty() && !after.is_empty() {
            init.set(group);
        }
    }

    (dirty, init)
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
