//! Crate-level error types

use std::net::SocketAddr;

use crate::transport::TransportError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Control listener could not bind; fatal at startup
    #[error("failed to bind control listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("scene thread failed to start: {0}")]
    SceneStartup(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
