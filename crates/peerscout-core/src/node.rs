//! Node descriptors for Electrum servers.
//!
//! A [`Node`] names a remote endpoint and the transports it advertises. It
//! holds no live resources; connections are opened per call by the network
//! crate and never stored here.

use serde::Serialize;
use std::fmt;
use std::net::Ipv6Addr;

use crate::error::CoreError;

/// Top-level domain of Tor onion services.
const ONION_SUFFIX: &str = ".onion";

/// Transport used to reach a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Plaintext TCP.
    Plain,
    /// TLS over TCP.
    Encrypted,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "tcp"),
            Self::Encrypted => write!(f, "tls"),
        }
    }
}

/// An Electrum server endpoint.
///
/// A port of `0` means the transport is not offered. TLS support and onion
/// classification are derived once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Node {
    host: String,
    tcp_port: u16,
    ssl_port: u16,
    supports_tls: bool,
    onion: bool,
}

impl Node {
    /// Create a node descriptor.
    ///
    /// The host may be a DNS name, an IPv4 literal, an IPv6 literal (with or
    /// without brackets) or an onion address. Surrounding whitespace is
    /// trimmed; an empty host is rejected.
    pub fn new(host: impl Into<String>, tcp_port: u16, ssl_port: u16) -> Result<Self, CoreError> {
        let host = host.into();
        let trimmed = host.trim();
        let host = trimmed
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(trimmed);

        if host.is_empty() {
            return Err(CoreError::InvalidNode("host must not be empty".into()));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidNode(format!(
                "host must not contain whitespace, got: {:?}",
                host
            )));
        }

        let onion = host
            .trim_end_matches('.')
            .to_ascii_lowercase()
            .ends_with(ONION_SUFFIX);

        Ok(Self {
            host: host.to_string(),
            tcp_port,
            ssl_port,
            supports_tls: ssl_port != 0,
            onion,
        })
    }

    /// Host identifier as given (brackets stripped from IPv6 literals).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Plaintext TCP port, `0` when not offered.
    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    /// TLS port, `0` when not offered.
    pub fn ssl_port(&self) -> u16 {
        self.ssl_port
    }

    pub fn supports_tls(&self) -> bool {
        self.supports_tls
    }

    pub fn supports_tcp(&self) -> bool {
        self.tcp_port != 0
    }

    /// Whether the host lives in the Tor onion address space.
    pub fn is_onion(&self) -> bool {
        self.onion
    }

    /// Port advertised for the given transport.
    pub fn port(&self, transport: Transport) -> u16 {
        match transport {
            Transport::Plain => self.tcp_port,
            Transport::Encrypted => self.ssl_port,
        }
    }

    /// `host:port` string suitable for dialing, bracketing IPv6 literals.
    pub fn authority(&self, transport: Transport) -> String {
        let port = self.port(transport);
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, port)
        } else {
            format!("{}:{}", self.host, port)
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)
    }
}
