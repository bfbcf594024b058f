//! Network error types for the Electrum client.

use std::io;
use std::time::Duration;

use peerscout_core::{CoreError, DecodeError, Transport};

/// Errors returned by connect, exchange and discovery calls.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The node lives on an anonymizing overlay we cannot reach.
    #[error("{host}: onion transport is not supported")]
    UnsupportedTransport { host: String },

    /// An explicit dial asked for a transport the node does not advertise.
    #[error("{host} does not offer {transport}")]
    NotOffered { host: String, transport: Transport },

    /// Failed to establish the connection (dial, handshake or timeout).
    #[error("{transport} connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        transport: Transport,
        #[source]
        source: io::Error,
    },

    #[error("write to {addr} failed: {source}")]
    Write {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("read from {addr} failed: {source}")]
    Read {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The peer closed the stream before a full response line arrived.
    #[error("{addr} closed the connection before a complete response line")]
    UnexpectedEof { addr: String },

    #[error("response from {addr} exceeds {limit} bytes")]
    ResponseTooLarge { addr: String, limit: usize },

    /// No response line within the caller's timeout.
    #[error("{addr} did not respond within {after:?}")]
    Timeout { addr: String, after: Duration },

    /// Releasing a connection failed. Only ever logged.
    #[error("closing connection to {addr} failed: {source}")]
    Close {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("could not encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The server answered with a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("tls configuration error: {0}")]
    TlsConfig(#[from] rustls::Error),
}

impl From<CoreError> for NetworkError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidNode(reason) => NetworkError::InvalidNode(reason),
            CoreError::Decode(err) => NetworkError::Decode(err),
            CoreError::Rpc { code, message } => NetworkError::Rpc { code, message },
        }
    }
}

impl NetworkError {
    /// Transport that was being dialed, for connect failures.
    pub fn transport(&self) -> Option<Transport> {
        match self {
            NetworkError::Connect { transport, .. }
            | NetworkError::NotOffered { transport, .. } => Some(*transport),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            NetworkError::Timeout { .. } => true,
            NetworkError::Connect { source, .. } => source.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}
