pub mod init;
pub mod peers;
pub mod request;

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use peerscout_core::{ClientConfig, Node, TracingSink};
use peerscout_network::ElectrumClient;

/// Target node selection shared by the networked subcommands.
#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Host name or IP address of the Electrum server.
    #[arg(long)]
    pub host: String,

    /// Plaintext TCP port.
    #[arg(long, default_value_t = 50001)]
    pub tcp_port: u16,

    /// TLS port. When set, TLS is used instead of plaintext.
    #[arg(long)]
    pub ssl_port: Option<u16>,

    /// Timeout in seconds for each network phase (overrides the config file).
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl NodeArgs {
    pub fn node(&self) -> anyhow::Result<Node> {
        Ok(Node::new(
            self.host.as_str(),
            self.tcp_port,
            self.ssl_port.unwrap_or(0),
        )?)
    }

    pub fn timeout(&self, config: &ClientConfig) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.timeout())
    }
}

pub fn client(config: &ClientConfig) -> anyhow::Result<ElectrumClient> {
    Ok(ElectrumClient::new(config.clone(), Arc::new(TracingSink))?)
}
