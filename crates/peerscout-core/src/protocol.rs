//! JSON-RPC envelopes for the Electrum line protocol.
//!
//! Each envelope travels as a single JSON document on its own line. Framing
//! (the trailing newline) is the network crate's concern; these types only
//! encode and decode the document itself.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{CoreError, DecodeError};

/// JSON-RPC version tag sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method asking a server for the peers it knows about.
pub const PEERS_SUBSCRIBE: &str = "server.peers.subscribe";

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.into()
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only an absent field is `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub id: u64,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Build a `server.peers.subscribe` request.
    pub fn peers_subscribe(id: u64) -> Self {
        Self::new(PEERS_SUBSCRIBE, Vec::new(), id)
    }

    /// Serialize to a JSON document without a line terminator.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Error object returned by a server in place of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    /// `Some(Value::Null)` for a void result, `None` when the field is absent.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Decode one response line. Trailing whitespace (the newline) is allowed.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Extract the result payload for the request with id `expected_id`.
    ///
    /// An error object wins over a result. A `null` id is tolerated only on
    /// error responses, since servers cannot echo the id of a request they
    /// failed to parse.
    pub fn into_result(self, expected_id: u64) -> Result<Value, CoreError> {
        match (self.id, self.error) {
            (Some(id), _) if id != expected_id => Err(DecodeError::IdMismatch {
                expected: expected_id,
                actual: Some(id),
            }
            .into()),
            (_, Some(err)) => Err(CoreError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (None, None) => Err(DecodeError::IdMismatch {
                expected: expected_id,
                actual: None,
            }
            .into()),
            (Some(_), None) => self.result.ok_or_else(|| DecodeError::MissingResult.into()),
        }
    }
}
