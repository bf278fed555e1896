// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn patch_in(dir: &tempfile::TempDir, os_release: &str) -> MicrovisorPatch {
    let os_release_path = dir.path().join("os-release");
    std::fs::write(&os_release_path, os_release).unwrap();
    let script = dir.path().join("uninstall.sh");
    std::fs::write(&script, "#!/bin/sh\nrm -rf /usr/local/lib/rke2\n").unwrap();
    MicrovisorPatch { os_release: os_release_path, script }
}

#[test]
fn applies_only_on_microvisor_images() {
    let dir = tempfile::tempdir().unwrap();
    let microvisor =
        patch_in(&dir, "NAME=\"Edge Microvisor Toolkit\"\nVERSION_ID=3.0\n");
    assert!(microvisor.applies());

    let other = patch_in(&dir, "NAME=\"Ubuntu\"\nVERSION_ID=24.04\n");
    assert!(!other.applies());
}

#[test]
fn missing_os_release_means_no_patch() {
    let patch = MicrovisorPatch {
        os_release: PathBuf::from("/nonexistent/os-release"),
        script: PathBuf::from("/nonexistent/script.sh"),
    };
    assert!(!patch.applies());
}

#[tokio::test]
async fn apply_rewrites_the_script_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let patch = patch_in(&dir, "NAME=\"Edge Microvisor Toolkit\"\n");
    let cancel = CancellationToken::new();

    patch.apply(&cancel).await;

    let script = std::fs::read_to_string(&patch.script).unwrap();
    assert!(script.contains("/opt/rke2/lib/rke2"));
    assert!(!script.contains("/usr/local"));
}

#[tokio::test]
async fn apply_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let mut patch = patch_in(&dir, "NAME=\"Edge Microvisor Toolkit\"\n");
    patch.script = dir.path().join("missing.sh");
    let cancel = CancellationToken::new();

    // sed exits non-zero on the missing file; apply must not propagate.
    patch.apply(&cancel).await;
}
