//! The Electrum client handle.
//!
//! [`ElectrumClient`] holds configuration, the injected diagnostics sink and
//! a prebuilt TLS connector. It owns no connections: every call dials its
//! own, so a single client can be shared across concurrent tasks.

use std::fmt;
use std::sync::Arc;

use peerscout_core::{ClientConfig, DiagnosticsSink, TracingSink};
use tokio_rustls::TlsConnector;
use tracing::Level;

use crate::error::NetworkError;
use crate::tls;

/// Connects to Electrum servers and exchanges JSON-RPC requests with them.
#[derive(Clone)]
pub struct ElectrumClient {
    pub(crate) config: ClientConfig,
    pub(crate) sink: Arc<dyn DiagnosticsSink>,
    pub(crate) tls: TlsConnector,
}

impl ElectrumClient {
    /// Create a client that reports diagnostics to `sink`.
    pub fn new(config: ClientConfig, sink: Arc<dyn DiagnosticsSink>) -> Result<Self, NetworkError> {
        Ok(Self {
            config,
            sink,
            tls: tls::insecure_connector()?,
        })
    }

    /// Default configuration, diagnostics forwarded to `tracing`.
    pub fn with_defaults() -> Result<Self, NetworkError> {
        Self::new(ClientConfig::default(), Arc::new(TracingSink))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn log(&self, level: Level, message: impl AsRef<str>) {
        self.sink.log(level, message.as_ref());
    }
}

impl fmt::Debug for ElectrumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElectrumClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
