//! One-shot request/response exchange over a connection.
//!
//! Framing is one JSON document per line. The exchanger writes the request
//! followed by a single `\n`, then reads exactly one line back. The
//! connection is consumed by the call and shut down exactly once on every
//! path (success, write failure, read failure, timeout).

use std::io;
use std::time::Duration;

use peerscout_core::{Node, Request, Response};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::Level;

use crate::client::ElectrumClient;
use crate::error::NetworkError;

/// Upper bound on waiting for a connection to shut down.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// A byte stream to a single peer that the exchanger can drive.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {
    /// Label used in errors and diagnostics, usually `host:port`.
    fn peer(&self) -> &str;
}

impl ElectrumClient {
    /// Send one request line and read one response line.
    ///
    /// `request` must not contain a newline except optionally a single
    /// trailing one, which is not duplicated. The returned bytes exclude the
    /// line terminator.
    pub async fn exchange<C: Connection>(
        &self,
        mut conn: C,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, NetworkError> {
        let peer = conn.peer().to_string();
        let limit = self.config.max_response_bytes;

        let attempt = round_trip(&mut conn, &peer, request, limit);
        let outcome = match tokio::time::timeout(timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => Err(NetworkError::Timeout {
                addr: peer.clone(),
                after: timeout,
            }),
        };

        if let Err(close_err) = close(&mut conn, &peer, timeout.min(CLOSE_GRACE)).await {
            self.log(Level::ERROR, format!("could not close connection: {}", close_err));
        }

        if let Err(ref err) = outcome {
            self.log(Level::ERROR, format!("exchange with {} failed: {}", peer, err));
        }
        outcome
    }

    /// Connect to `node` and exchange a pre-serialized request.
    pub async fn send_request_bytes(
        &self,
        request: &[u8],
        node: &Node,
        timeout: Duration,
    ) -> Result<Vec<u8>, NetworkError> {
        self.log(Level::INFO, format!("attempting to connect to {}", node.host()));
        let conn = self.connect(node, timeout).await?;
        self.log(
            Level::INFO,
            format!(
                "sending request: {} to: {}",
                String::from_utf8_lossy(request).trim_end(),
                node.host()
            ),
        );
        self.exchange(conn, request, timeout).await
    }

    /// Connect to `node`, send `request` and return the raw response line.
    pub async fn send_request(
        &self,
        request: &Request,
        node: &Node,
        timeout: Duration,
    ) -> Result<Vec<u8>, NetworkError> {
        let bytes = request.encode().map_err(NetworkError::Encode)?;

        self.log(Level::INFO, format!("attempting to connect to {}", node.host()));
        let conn = self.connect(node, timeout).await?;

        self.log(
            Level::INFO,
            format!(
                "sending request ID: {} ({}) to: {}",
                request.id,
                request.method,
                node.host()
            ),
        );
        self.exchange(conn, &bytes, timeout).await
    }

    /// Send `request` and decode the response into its result payload.
    ///
    /// The response id must match the request id.
    pub async fn call(
        &self,
        request: &Request,
        node: &Node,
        timeout: Duration,
    ) -> Result<Value, NetworkError> {
        let line = self.send_request(request, node, timeout).await?;
        let response = Response::decode(&line).map_err(|e| {
            self.log(
                Level::ERROR,
                format!(
                    "error decoding response to request ID {} from {}: {}",
                    request.id,
                    node.host(),
                    e
                ),
            );
            NetworkError::Decode(e)
        })?;
        Ok(response.into_result(request.id)?)
    }
}

async fn round_trip<C: Connection>(
    conn: &mut C,
    peer: &str,
    request: &[u8],
    limit: usize,
) -> Result<Vec<u8>, NetworkError> {
    let body = request.strip_suffix(b"\n").unwrap_or(request);
    let mut line = Vec::with_capacity(body.len() + 1);
    line.extend_from_slice(body);
    line.push(b'\n');

    let write = async {
        conn.write_all(&line).await?;
        conn.flush().await
    };
    write.await.map_err(|source| NetworkError::Write {
        addr: peer.to_string(),
        source,
    })?;

    read_line(conn, peer, limit).await
}

async fn read_line<C: Connection>(
    conn: &mut C,
    peer: &str,
    limit: usize,
) -> Result<Vec<u8>, NetworkError> {
    // One byte of headroom for the terminator.
    let mut reader = BufReader::new(conn).take(limit as u64 + 1);
    let mut line = Vec::new();

    let read = reader
        .read_until(b'\n', &mut line)
        .await
        .map_err(|source| NetworkError::Read {
            addr: peer.to_string(),
            source,
        })?;

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        return Ok(line);
    }
    if read > limit {
        return Err(NetworkError::ResponseTooLarge {
            addr: peer.to_string(),
            limit,
        });
    }
    Err(NetworkError::UnexpectedEof {
        addr: peer.to_string(),
    })
}

async fn close<C: Connection>(
    conn: &mut C,
    peer: &str,
    grace: Duration,
) -> Result<(), NetworkError> {
    let source = match tokio::time::timeout(grace, conn.shutdown()).await {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(source)) => source,
        Err(_) => io::Error::new(io::ErrorKind::TimedOut, "shutdown did not complete"),
    };
    Err(NetworkError::Close {
        addr: peer.to_string(),
        source,
    })
}
