//! Error types for the command channel and actuation devices

use std::io;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to connect to receiver at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("command channel i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("peer closed the connection before acknowledging")]
    Closed,

    #[error("unexpected acknowledgment: {0:?}")]
    BadAck(String),

    #[error("no acknowledgment within {0:?}")]
    AckTimeout(std::time::Duration),

    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("{device} i/o error: {source}")]
    Device {
        device: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} worker has shut down")]
    WorkerGone(&'static str),
}

impl ActuationError {
    pub fn device(device: &'static str, source: io::Error) -> Self {
        ActuationError::Device { device, source }
    }
}
