use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::peers::{DefaultPorts, DEFAULT_SSL_PORT, DEFAULT_TCP_PORT};

/// Client settings shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-call timeout in seconds, used when the caller does not pass one.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Longest accepted response line in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Port assumed for a bare `t` peer feature.
    #[serde(default = "default_tcp_port")]
    pub default_tcp_port: u16,
    /// Port assumed for a bare `s` peer feature.
    #[serde(default = "default_ssl_port")]
    pub default_ssl_port: u16,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_response_bytes() -> usize {
    4 * 1024 * 1024
}
fn default_tcp_port() -> u16 {
    DEFAULT_TCP_PORT
}
fn default_ssl_port() -> u16 {
    DEFAULT_SSL_PORT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
            default_tcp_port: default_tcp_port(),
            default_ssl_port: default_ssl_port(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn default_ports(&self) -> DefaultPorts {
        DefaultPorts {
            tcp: self.default_tcp_port,
            ssl: self.default_ssl_port,
        }
    }
}
