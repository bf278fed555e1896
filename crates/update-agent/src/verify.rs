// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Defense-in-depth checks preceding any apply.
//!
//! Signature cryptography itself is the verifier binary's job; this module
//! enforces the structural checklist: absolute non-symlink path, archive
//! and per-file size caps, regular tar entries with no traversal, and the
//! embedded-certificate fallback when the system certificate is absent.

use std::fs::File;
use std::path::{Component, Path};

use thiserror::Error;
use tracing::warn;

/// Per-file cap inside an archive.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
/// Whole-archive cap.
pub const MAX_ARCHIVE_SIZE: u64 = 500 * 1024 * 1024;
/// Cap on an embedded PEM entry.
pub const MAX_PEM_SIZE: u64 = 64 * 1024;
/// Cap on bytes pulled into memory during inspection.
pub const MAX_IN_MEMORY: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("artifact path must be absolute: {0}")]
    NotAbsolute(String),

    #[error("artifact is a symlink: {0}")]
    SymlinkRejected(String),

    #[error("no signature certificate available for {0}")]
    SignatureMissing(String),

    #[error("archive entry escapes the extraction root: {0}")]
    PathTraversal(String),

    #[error("archive entry {entry} is not a regular file")]
    NotRegular { entry: String },

    #[error("{what} exceeds the {cap} byte cap ({size})")]
    SizeExceeded {
        what: String,
        cap: u64,
        size: u64,
    },

    #[error("embedded certificate does not parse as X.509 PEM")]
    BadCertificate,

    #[error("I/O error reading artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of the precondition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDisposition {
    /// System certificate present; the external verifier takes it from
    /// here.
    Verified,
    /// No system certificate, but the tar embeds a parseable X.509
    /// certificate: proceed with a warning.
    WarnAndProceed,
}

/// Run the checklist against `path`.
pub fn check_artifact(
    path: &Path,
    system_cert_present: bool,
) -> Result<VerifyDisposition, VerifyError> {
    if !path.is_absolute() {
        return Err(VerifyError::NotAbsolute(path.display().to_string()));
    }
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Err(VerifyError::SymlinkRejected(path.display().to_string()));
    }
    if meta.len() > MAX_ARCHIVE_SIZE {
        return Err(VerifyError::SizeExceeded {
            what: format!("archive {}", path.display()),
            cap: MAX_ARCHIVE_SIZE,
            size: meta.len(),
        });
    }

    if system_cert_present {
        return Ok(VerifyDisposition::Verified);
    }

    // Fallback only exists for tars that carry their own certificate.
    if path.extension().and_then(|e| e.to_str()) != Some("tar") {
        return Err(VerifyError::SignatureMissing(path.display().to_string()));
    }

    let embedded = scan_tar_for_certificate(path)?;
    if embedded {
        warn!(path = %path.display(), "system certificate absent; trusting embedded certificate");
        Ok(VerifyDisposition::WarnAndProceed)
    } else {
        Err(VerifyError::SignatureMissing(path.display().to_string()))
    }
}

/// Walk the archive enforcing entry rules; returns whether a parseable
/// certificate was found.
fn scan_tar_for_certificate(path: &Path) -> Result<bool, VerifyError> {
    let mut archive = tar::Archive::new(File::open(path)?);
    let mut found_cert = false;
    let mut in_memory: u64 = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let name = entry_path.display().to_string();

        if entry_path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(VerifyError::PathTraversal(name));
        }
        if !matches!(entry.header().entry_type(), tar::EntryType::Regular) {
            return Err(VerifyError::NotRegular { entry: name });
        }
        let size = entry.header().size()?;
        if size > MAX_FILE_SIZE {
            return Err(VerifyError::SizeExceeded {
                what: format!("entry {name}"),
                cap: MAX_FILE_SIZE,
                size,
            });
        }

        if entry_path.extension().and_then(|e| e.to_str()) == Some("pem") {
            if size > MAX_PEM_SIZE {
                return Err(VerifyError::SizeExceeded {
                    what: format!("PEM entry {name}"),
                    cap: MAX_PEM_SIZE,
                    size,
                });
            }
            in_memory += size;
            if in_memory > MAX_IN_MEMORY {
                return Err(VerifyError::SizeExceeded {
                    what: "in-memory inspection".to_string(),
                    cap: MAX_IN_MEMORY,
                    size: in_memory,
                });
            }

            let mut pem = Vec::with_capacity(size as usize);
            std::io::Read::read_to_end(&mut entry, &mut pem)?;
            let certs: Vec<_> = rustls_pemfile::certs(&mut pem.as_slice())
                .collect::<Result<_, _>>()
                .map_err(|_| VerifyError::BadCertificate)?;
            if certs.is_empty() {
                return Err(VerifyError::BadCertificate);
            }
            found_cert = true;
        }
    }

    Ok(found_cert)
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
