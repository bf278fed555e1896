// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collector config rendering and atomic placement.
//!
//! Metrics groups become Telegraf configs, log groups Fluent-Bit configs;
//! host vs cluster is distinguished purely by output directory. Every
//! write goes through a temp file and rename so collectors never read a
//! half-written config.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::profile::{Group, Profile, ProfileSet};

/// Separator below which this agent owns the file contents.
const MANAGED_MARKER: &str = "# --- managed inputs below; do not edit ---";

const TELEGRAF_GOLD: &str = "\
[agent]
  interval = \"10s\"
  round_interval = true
  flush_interval = \"10s\"
  omit_hostname = false
";

const FLUENT_BIT_GOLD: &str = "\
[SERVICE]
    Flush        5
    Daemon       Off
    Parsers_File parsers.conf
";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Render a Telegraf (metrics) config.
///
/// `init` regenerates from the gold template; otherwise `existing_base`
/// (the file contents above the managed marker) is preserved.
pub fn render_metrics(
    profiles: &[&Profile],
    init: bool,
    existing_base: Option<&str>,
) -> String {
    let base = pick_base(init, existing_base, TELEGRAF_GOLD);
    let mut out = String::with_capacity(base.len() + profiles.len() * 64);
    out.push_str(&base);
    out.push_str(MANAGED_MARKER);
    out.push('\n');
    for profile in profiles {
        out.push_str(&format!(
            "[[inputs.{}]]\n  interval = \"{}s\"\n  # level: {}\n",
            profile.input, profile.interval, profile.level
        ));
    }
    out
}

/// Render a Fluent-Bit (logs) config.
pub fn render_logs(profiles: &[&Profile], init: bool, existing_base: Option<&str>) -> String {
    let base = pick_base(init, existing_base, FLUENT_BIT_GOLD);
    let mut out = String::with_capacity(base.len() + profiles.len() * 64);
    out.push_str(&base);
    out.push_str(MANAGED_MARKER);
    out.push('\n');
    for profile in profiles {
        out.push_str(&format!(
            "[INPUT]\n    Name     {}\n    Interval {}\n    Level    {}\n",
            profile.input, profile.interval, profile.level
        ));
    }
    out
}

fn pick_base(init: bool, existing_base: Option<&str>, gold: &str) -> String {
    if init {
        return gold.to_string();
    }
    match existing_base {
        Some(base) => base.to_string(),
        None => gold.to_string(),
    }
}

/// Where each group's config lands on disk.
pub struct Renderer {
    host_dir: PathBuf,
    cluster_dir: PathBuf,
}

impl Renderer {
    pub fn new(host_dir: impl Into<PathBuf>, cluster_dir: impl Into<PathBuf>) -> Self {
        Self { host_dir: host_dir.into(), cluster_dir: cluster_dir.into() }
    }

    /// Config file path for a group.
    pub fn path(&self, group: Group) -> PathBuf {
        let dir = if group.is_cluster() { &self.cluster_dir } else { &self.host_dir };
        let file = if group.is_metrics() { "telegraf.conf" } else { "fluent-bit.conf" };
        dir.join(file)
    }

    /// Render and atomically replace the config for `group`.
    pub fn write(&self, group: Group, set: &ProfileSet, init: bool) -> Result<PathBuf, RenderError> {
        let path = self.path(group);
        let existing_base = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| contents.split(MANAGED_MARKER).next().map(str::to_string));

        let profiles = set.sorted(group);
        let rendered = if group.is_metrics() {
            render_metrics(&profiles, init, existing_base.as_deref())
        } else {
            render_logs(&profiles, init, existing_base.as_deref())
        };

        let wrap = |source| RenderError::Write { path: path.clone(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let tmp = path.with_extension("conf.tmp");
        fs::write(&tmp, rendered).map_err(wrap)?;
        fs::rename(&tmp, &path).map_err(wrap)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
