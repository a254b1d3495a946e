//! TCP and Unix socket listeners.
//!
//! # Responsibilities
//! - Bind to the configured address or socket path
//! - Clear a stale socket file left by a previous run
//! - Report the bound address for logs and tests

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Invalid bind address: {0}")]
    Address(String),

    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// The socket the relay serves on.
#[derive(Debug)]
pub enum RelayListener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl RelayListener {
    /// Bind per configuration; a Unix socket path takes precedence.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let listener = match &config.unix_socket {
            Some(path) => Self::bind_unix(PathBuf::from(path))?,
            None => {
                let addr: SocketAddr = config
                    .bind_address
                    .parse()
                    .map_err(|e: std::net::AddrParseError| ListenerError::Address(e.to_string()))?;
                RelayListener::Tcp(TcpListener::bind(addr).await?)
            }
        };

        tracing::info!(address = %listener.describe(), "Listener bound");
        Ok(listener)
    }

    fn bind_unix(path: PathBuf) -> Result<Self, ListenerError> {
        if is_socket(&path) {
            std::fs::remove_file(&path)?;
        }
        Ok(RelayListener::Unix(UnixListener::bind(path)?))
    }

    /// Bound TCP address, if this is a TCP listener.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            RelayListener::Tcp(tcp) => tcp.local_addr().ok(),
            RelayListener::Unix(_) => None,
        }
    }

    /// Human-readable bound address.
    pub fn describe(&self) -> String {
        match self {
            RelayListener::Tcp(tcp) => match tcp.local_addr() {
                Ok(addr) => format!("tcp://{}", addr),
                Err(_) => "tcp://?".to_string(),
            },
            RelayListener::Unix(unix) => match unix.local_addr().ok().and_then(|a| a.as_pathname().map(|p| p.display().to_string())) {
                Some(path) => format!("unix://{}", path),
                None => "unix://?".to_string(),
            },
        }
    }
}

fn is_socket(path: &std::path::Path) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_socket())
        .unwrap_or(false)
}
