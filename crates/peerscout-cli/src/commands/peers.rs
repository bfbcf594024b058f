//! `peerscout peers` — List the peers a node advertises.

use clap::Args;

use peerscout_core::Node;

use super::NodeArgs;
use crate::config::PeerscoutConfig;

#[derive(Args, Debug)]
pub struct PeersArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Correlation id for the request.
    #[arg(long, default_value_t = 1)]
    pub id: u64,

    /// Print the peer list as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &PeersArgs, config: &PeerscoutConfig) -> anyhow::Result<()> {
    let client = super::client(&config.client)?;
    let node = args.node.node()?;
    let timeout = args.node.timeout(&config.client);

    let peers = client.discover_peers(&node, args.id, timeout).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&peers)?);
    } else {
        print!("{}", render_table(&node, &peers));
    }
    Ok(())
}

fn port_column(port: u16) -> String {
    if port == 0 {
        "-".into()
    } else {
        port.to_string()
    }
}

fn render_table(source: &Node, peers: &[Node]) -> String {
    let mut out = format!("Peers of {} ({}):\n", source, peers.len());
    if peers.is_empty() {
        out.push_str("  (no peers advertised)\n");
        return out;
    }

    let width = peers.iter().map(|p| p.host().len()).max().unwrap_or(0);
    out.push_str(&format!("  {:<width$}  {:>5}  {:>5}\n", "HOST", "TCP", "TLS"));
    for peer in peers {
        let onion = if peer.is_onion() { "  (onion)" } else { "" };
        out.push_str(&format!(
            "  {:<width$}  {:>5}  {:>5}{}\n",
            peer.host(),
            port_column(peer.tcp_port()),
            port_column(peer.ssl_port()),
            onion,
        ));
    }
    out
}
