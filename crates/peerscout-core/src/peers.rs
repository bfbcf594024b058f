//! Parsing of `server.peers.subscribe` results.
//!
//! A server answers with an array of `[address, host, [feature, ...]]`
//! triples. Feature strings are short tokens such as `t50001` (plaintext
//! port), `s50002` (TLS port), `v1.4` (highest protocol version) or `p10000`
//! (pruning limit). A bare `t` or `s` means the transport is offered on its
//! default port.
//!
//! Entries are untrusted. Each one is normalized independently into a
//! [`Node`]; entries that fail are reported as [`RejectedPeer`]s and never
//! abort the batch. Only a result that is not an array at all is an error.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::node::Node;

/// Default Electrum plaintext port.
pub const DEFAULT_TCP_PORT: u16 = 50001;
/// Default Electrum TLS port.
pub const DEFAULT_SSL_PORT: u16 = 50002;

/// Ports assumed for bare `t` / `s` features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPorts {
    pub tcp: u16,
    pub ssl: u16,
}

impl Default for DefaultPorts {
    fn default() -> Self {
        Self {
            tcp: DEFAULT_TCP_PORT,
            ssl: DEFAULT_SSL_PORT,
        }
    }
}

/// Why a peer entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerRejection {
    #[error("entry is not an [address, host, features] triple: {0}")]
    Shape(String),

    #[error("both address and host are empty")]
    MissingHost,

    #[error("invalid host: {0}")]
    InvalidHost(String),

    #[error("bad feature {feature:?}: {reason}")]
    BadFeature { feature: String, reason: String },

    #[error("feature {feature:?} conflicts with an earlier port for the same transport")]
    ConflictingPort { feature: String },

    #[error("no tcp or tls transport advertised")]
    NoTransport,
}

/// Capabilities recovered from a feature list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerFeatures {
    pub tcp_port: Option<u16>,
    pub ssl_port: Option<u16>,
    /// Highest protocol version the peer claims (`v` feature).
    pub protocol_max: Option<String>,
    /// Pruning limit in blocks (`p` feature).
    pub pruning: Option<u64>,
}

/// Parse a feature list into a capability set.
///
/// Unknown prefixes are ignored. A malformed value under a known prefix,
/// a zero port, or two different ports for one transport reject the list,
/// as does a list offering neither transport.
pub fn parse_features<S: AsRef<str>>(
    features: &[S],
    defaults: DefaultPorts,
) -> Result<PeerFeatures, PeerRejection> {
    let mut parsed = PeerFeatures::default();

    for feature in features {
        let feature = feature.as_ref().trim();
        let mut chars = feature.chars();
        let Some(prefix) = chars.next() else {
            continue;
        };
        let value = chars.as_str();

        match prefix {
            't' => set_port(&mut parsed.tcp_port, feature, value, defaults.tcp)?,
            's' => set_port(&mut parsed.ssl_port, feature, value, defaults.ssl)?,
            'v' => {
                if value.is_empty() {
                    return Err(bad_feature(feature, "missing protocol version"));
                }
                parsed.protocol_max = Some(value.to_string());
            }
            'p' => {
                let limit = parse_digits::<u64>(value)
                    .ok_or_else(|| bad_feature(feature, "pruning limit is not a number"))?;
                parsed.pruning = Some(limit);
            }
            _ => {}
        }
    }

    if parsed.tcp_port.is_none() && parsed.ssl_port.is_none() {
        return Err(PeerRejection::NoTransport);
    }
    Ok(parsed)
}

fn bad_feature(feature: &str, reason: &str) -> PeerRejection {
    PeerRejection::BadFeature {
        feature: feature.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_digits<T: std::str::FromStr>(value: &str) -> Option<T> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn set_port(
    slot: &mut Option<u16>,
    feature: &str,
    value: &str,
    default: u16,
) -> Result<(), PeerRejection> {
    let port = if value.is_empty() {
        default
    } else {
        parse_digits::<u16>(value)
            .filter(|port| *port != 0)
            .ok_or_else(|| bad_feature(feature, "port must be a number in 1..=65535"))?
    };

    match *slot {
        Some(existing) if existing != port => Err(PeerRejection::ConflictingPort {
            feature: feature.to_string(),
        }),
        _ => {
            *slot = Some(port);
            Ok(())
        }
    }
}

/// One raw peer-subscription entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String, Vec<String>)")]
pub struct RawPeer {
    pub address: String,
    pub host: String,
    pub features: Vec<String>,
}

impl From<(String, String, Vec<String>)> for RawPeer {
    fn from((address, host, features): (String, String, Vec<String>)) -> Self {
        Self {
            address,
            host,
            features,
        }
    }
}

impl RawPeer {
    /// Convert into a node descriptor. The host name is preferred over the
    /// address when both are present.
    pub fn normalize(&self, defaults: DefaultPorts) -> Result<Node, PeerRejection> {
        let host = if self.host.trim().is_empty() {
            self.address.trim()
        } else {
            self.host.trim()
        };
        if host.is_empty() {
            return Err(PeerRejection::MissingHost);
        }

        let features = parse_features(self.features.as_slice(), defaults)?;
        Node::new(
            host,
            features.tcp_port.unwrap_or(0),
            features.ssl_port.unwrap_or(0),
        )
        .map_err(|e| PeerRejection::InvalidHost(e.to_string()))
    }
}

/// An entry dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPeer {
    /// Position in the server's array.
    pub index: usize,
    /// Compact JSON of the entry as received.
    pub entry: String,
    pub reason: PeerRejection,
}

/// Outcome of normalizing a peer-subscription result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPeers {
    pub nodes: Vec<Node>,
    pub rejected: Vec<RejectedPeer>,
}

/// Normalize a decoded `server.peers.subscribe` result.
pub fn normalize_peers(
    result: Value,
    defaults: DefaultPorts,
) -> Result<NormalizedPeers, DecodeError> {
    let entries = match result {
        Value::Array(entries) => entries,
        other => {
            return Err(DecodeError::MalformedPayload(format!(
                "expected an array of peers, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut normalized = NormalizedPeers::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let compact = entry.to_string();
        let outcome = serde_json::from_value::<RawPeer>(entry)
            .map_err(|e| PeerRejection::Shape(e.to_string()))
            .and_then(|raw| raw.normalize(defaults));

        match outcome {
            Ok(node) => normalized.nodes.push(node),
            Err(reason) => normalized.rejected.push(RejectedPeer {
                index,
                entry: compact,
                reason,
            }),
        }
    }
    Ok(normalized)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
