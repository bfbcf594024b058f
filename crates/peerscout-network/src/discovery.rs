//! Peer discovery through `server.peers.subscribe`.

use std::time::Duration;

use peerscout_core::{normalize_peers, Node, NormalizedPeers, Request};
use tracing::Level;

use crate::client::ElectrumClient;
use crate::error::NetworkError;

impl ElectrumClient {
    /// Ask `node` for the peers it knows and return them as node descriptors.
    ///
    /// Individual malformed entries are dropped (logged at DEBUG). Only a
    /// failed call or a result that is not a peer array is an error, so an
    /// `Ok` with no nodes means the server genuinely reported none usable.
    pub async fn discover_peers(
        &self,
        node: &Node,
        request_id: u64,
        timeout: Duration,
    ) -> Result<Vec<Node>, NetworkError> {
        self.discover_peers_detailed(node, request_id, timeout)
            .await
            .map(|normalized| normalized.nodes)
    }

    /// Like [`discover_peers`](Self::discover_peers) but also returns the
    /// rejected entries and why they were dropped.
    pub async fn discover_peers_detailed(
        &self,
        node: &Node,
        request_id: u64,
        timeout: Duration,
    ) -> Result<NormalizedPeers, NetworkError> {
        // Fail before any dial; the selector would refuse anyway.
        self.reject_onion(node)?;

        let request = Request::peers_subscribe(request_id);
        let result = self.call(&request, node, timeout).await.map_err(|e| {
            self.log(
                Level::ERROR,
                format!(
                    "failed to send peer request ID {} to {}: {}",
                    request_id,
                    node.host(),
                    e
                ),
            );
            e
        })?;

        let normalized = normalize_peers(result, self.config.default_ports()).map_err(|e| {
            self.log(
                Level::ERROR,
                format!(
                    "error parsing server peer subscription response from {} for req ID {}: {}",
                    node.host(),
                    request_id,
                    e
                ),
            );
            NetworkError::Decode(e)
        })?;

        for rejected in &normalized.rejected {
            self.log(
                Level::DEBUG,
                format!(
                    "dropping peer entry #{} from {}: {} ({})",
                    rejected.index,
                    node.host(),
                    rejected.reason,
                    rejected.entry
                ),
            );
        }

        self.log(
            Level::INFO,
            format!(
                "successfully retrieved {} peers from {} ({} entries dropped)",
                normalized.nodes.len(),
                node.host(),
                normalized.rejected.len()
            ),
        );
        Ok(normalized)
    }
}
