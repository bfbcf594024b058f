//! Peerscout Network Crate
//!
//! Talks to Electrum servers over the newline-delimited JSON-RPC protocol:
//!
//! - **Transport selection**: onion hosts are refused, TLS is used when a
//!   node advertises it, plaintext TCP otherwise. No automatic fallback.
//! - **Request/response exchange**: one request line out, one response line
//!   back, connection closed exactly once.
//! - **Peer discovery**: `server.peers.subscribe` results normalized into
//!   [`Node`] descriptors.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use peerscout_network::{ElectrumClient, Node};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ElectrumClient::with_defaults().unwrap();
//!     let node = Node::new("electrum.example.org", 50001, 50002).unwrap();
//!     let peers = client
//!         .discover_peers(&node, 1, Duration::from_secs(10))
//!         .await
//!         .unwrap();
//!     println!("{} peers", peers.len());
//! }
//! ```

pub mod client;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod tls;
pub mod transport;

pub use client::ElectrumClient;
pub use error::NetworkError;
pub use exchange::Connection;
pub use transport::NodeConnection;

// Re-export the core types callers need alongside the client.
pub use peerscout_core::{ClientConfig, DiagnosticsSink, MemorySink, Node, Request, Transport};
