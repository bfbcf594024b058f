//! `peerscout request` — Send one JSON-RPC request and print the reply line.

use clap::Args;
use serde_json::Value;

use peerscout_core::Request;

use super::NodeArgs;
use crate::config::PeerscoutConfig;

#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Method to call, e.g. `server.peers.subscribe`.
    #[arg(long, required_unless_present = "raw", conflicts_with = "raw")]
    pub method: Option<String>,

    /// Parameters as a JSON array.
    #[arg(long, default_value = "[]")]
    pub params: String,

    /// Correlation id for the request.
    #[arg(long, default_value_t = 1)]
    pub id: u64,

    /// Send this line verbatim instead of building a request.
    #[arg(long)]
    pub raw: Option<String>,
}

pub async fn run(args: &RequestArgs, config: &PeerscoutConfig) -> anyhow::Result<()> {
    let client = super::client(&config.client)?;
    let node = args.node.node()?;
    let timeout = args.node.timeout(&config.client);

    let response = match (&args.raw, &args.method) {
        (Some(raw), _) => client.send_request_bytes(raw.as_bytes(), &node, timeout).await?,
        (None, Some(method)) => {
            let request = build_request(method, &args.params, args.id)?;
            client.send_request(&request, &node, timeout).await?
        }
        (None, None) => anyhow::bail!("either --method or --raw is required"),
    };

    println!("{}", String::from_utf8_lossy(&response));
    Ok(())
}

fn build_request(method: &str, params: &str, id: u64) -> anyhow::Result<Request> {
    let params = match serde_json::from_str::<Value>(params)? {
        Value::Array(params) => params,
        other => anyhow::bail!("--params must be a JSON array, got {}", other),
    };
    Ok(Request::new(method, params, id))
}
