//! Peerscout Core — Fundamental types, errors, and configuration for the
//! Electrum peer discovery client.
//!
//! Nothing in this crate performs I/O. The network crate drives these types
//! over TCP/TLS connections.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod node;
pub mod peers;
pub mod protocol;

pub use config::ClientConfig;
pub use diagnostics::{DiagnosticsSink, MemorySink, TracingSink};
pub use error::{CoreError, DecodeError};
pub use node::{Node, Transport};
pub use peers::{
    normalize_peers, parse_features, DefaultPorts, NormalizedPeers, PeerFeatures, PeerRejection,
    RawPeer, RejectedPeer, DEFAULT_SSL_PORT, DEFAULT_TCP_PORT,
};
pub use protocol::{Request, Response, RpcError, JSONRPC_VERSION, PEERS_SUBSCRIBE};
