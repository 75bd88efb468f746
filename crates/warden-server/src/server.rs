//! Listener setup and shutdown for the editor API.
//!
//! [`start_server`] serves until Ctrl-C, then lets in-flight record
//! writes and exports finish before returning.

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// `server:` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on. `0.0.0.0` exposes the editor on every interface.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// The configured host and port as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let text = format!("{}:{}", self.host, self.port);
        text.parse()
            .map_err(|source| ServerError::InvalidAddress { addr: text, source })
    }
}

/// Serve the editor API on the configured address until Ctrl-C.
///
/// # Errors
///
/// [`ServerError::InvalidAddress`] or [`ServerError::Bind`] before any
/// request is accepted, [`ServerError::Serve`] if the accept loop dies.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(%addr, "editor api listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!(%addr, "editor api stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("ctrl-c received, draining requests"),
        Err(e) => {
            warn!(error = %e, "ctrl-c handler unavailable, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Listener failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` from the configuration is not a socket address.
    #[error("invalid listen address {addr:?}: {source}")]
    InvalidAddress {
        /// The joined `host:port` text.
        addr: String,
        /// Why it did not parse.
        source: AddrParseError,
    },

    /// The port is taken or the interface is unavailable.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop failed after start-up.
    #[error("editor api stopped unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_every_interface() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn hostnames_are_not_addresses() {
        let config = ServerConfig {
            host: "localhost".to_owned(),
            port: 9000,
        };
        let err = config.socket_addr().unwrap_err();
        assert!(matches!(&err, ServerError::InvalidAddress { addr, .. } if addr == "localhost:9000"));
    }
}
