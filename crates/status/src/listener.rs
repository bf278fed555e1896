// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the status socket.
//!
//! Accepts connections and serves them in spawned tasks so a slow agent
//! never blocks the rest. Each connection may carry any number of
//! length-prefixed request frames.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use en_wire::{decode, encode, read_message, write_message, ErrorKind, Request, Response};

use crate::registry::ReadinessRegistry;
use crate::StatusError;

pub struct StatusListener {
    listener: UnixListener,
    path: PathBuf,
    registry: Arc<ReadinessRegistry>,
}

impl StatusListener {
    /// Bind the status socket, recovering a stale file left by a previous
    /// run. A live listener on the path is a hard error: two status
    /// services on one node is a deployment fault.
    pub fn bind(path: &Path, registry: Arc<ReadinessRegistry>) -> Result<Self, StatusError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StatusError::Bind(path.to_path_buf(), e))?;
        }

        let listener = match UnixListener::bind(path) {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                if std::os::unix::net::UnixStream::connect(path).is_ok() {
                    return Err(StatusError::Bind(path.to_path_buf(), err));
                }
                // Nothing answers: stale socket from an unclean shutdown.
                info!(path = %path.display(), "removing stale status socket");
                std::fs::remove_file(path)
                    .map_err(|e| StatusError::Bind(path.to_path_buf(), e))?;
                UnixListener::bind(path).map_err(|e| StatusError::Bind(path.to_path_buf(), e))?
            }
            Err(err) => return Err(StatusError::Bind(path.to_path_buf(), err)),
        };

        Ok(Self { listener, path: path.to_path_buf(), registry })
    }

    /// Accept loop; removes the socket file when the root token cancels.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(err) = std::fs::remove_file(&self.path) {
                        warn!(path = %self.path.display(), %err, "failed to remove status socket");
                    }
                    debug!("status listener stopping");
                    return;
                }
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let registry = Arc::clone(&self.registry);
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, &registry).await {
                                    log_connection_error(err);
                                }
                            });
                        }
                        Err(err) => error!(%err, "status accept error"),
                    }
                }
            }
        }
    }
}

fn log_connection_error(err: StatusError) {
    match err {
        StatusError::Protocol(en_wire::ProtocolError::ConnectionClosed) => {
            debug!("agent disconnected")
        }
        other => warn!(err = %other, "status connection error"),
    }
}

async fn handle_connection(
    stream: UnixStream,
    registry: &ReadinessRegistry,
) -> Result<(), StatusError> {
    let (mut reader, mut writer) = stream.into_split();
    serve(&mut reader, &mut writer, registry).await
}

/// Serve request frames until the peer closes.
async fn serve<R, W>(
    reader: &mut R,
    writer: &mut W,
    registry: &ReadinessRegistry,
) -> Result<(), StatusError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = match read_message(reader).await {
            Ok(frame) => frame,
            Err(en_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let response = match decode::<Request>(&frame) {
            Ok(request) => dispatch(registry, request),
            Err(err) => Response::Error {
                kind: ErrorKind::InvalidArgument,
                message: err.to_string(),
            },
        };

        write_message(writer, &encode(&response)?).await?;
    }
}

fn dispatch(registry: &ReadinessRegistry, request: Request) -> Response {
    match request {
        Request::ReportStatus { agent, status } => match registry.report(&agent, status) {
            Ok(()) => Response::Ok,
            Err(err) => error_response(err),
        },
        // Unknown agents still get an interval so a not-yet-whitelisted
        // agent self-tunes instead of hot-looping.
        Request::GetStatusInterval { .. } => {
            Response::Interval { seconds: registry.interval().as_secs() }
        }
    }
}

fn error_response(err: StatusError) -> Response {
    let kind = match err {
        StatusError::UnknownAgent(_) => ErrorKind::UnknownAgent,
        StatusError::InvalidAgentName(_) => ErrorKind::InvalidArgument,
        _ => ErrorKind::Internal,
    };
    Response::Error { kind, message: err.to_string() }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
