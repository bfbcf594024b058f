//! Transport selection for Electrum nodes.
//!
//! Order of preference, first applicable wins:
//! 1. onion hosts are refused outright (no Tor support),
//! 2. TLS when the node advertises a TLS port,
//! 3. plaintext TCP otherwise.
//!
//! A failed TLS attempt is returned as is. The selector never retries the
//! same node over plaintext.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use peerscout_core::{Node, Transport};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::Level;

use crate::client::ElectrumClient;
use crate::error::NetworkError;
use crate::exchange::Connection;
use crate::tls;

enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// A live connection to one node.
pub struct NodeConnection {
    addr: String,
    stream: Stream,
}

impl NodeConnection {
    fn plain(addr: String, stream: TcpStream) -> Self {
        Self {
            addr,
            stream: Stream::Plain(stream),
        }
    }

    fn tls(addr: String, stream: TlsStream<TcpStream>) -> Self {
        Self {
            addr,
            stream: Stream::Tls(Box::new(stream)),
        }
    }

    /// `host:port` this connection was dialed to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn transport(&self) -> Transport {
        match self.stream {
            Stream::Plain(_) => Transport::Plain,
            Stream::Tls(_) => Transport::Encrypted,
        }
    }
}

impl std::fmt::Debug for NodeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConnection")
            .field("addr", &self.addr)
            .field("transport", &self.transport())
            .finish()
    }
}

impl Connection for NodeConnection {
    fn peer(&self) -> &str {
        &self.addr
    }
}

impl AsyncRead for NodeConnection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().stream {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for NodeConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().stream {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().stream {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().stream {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

fn timed_out(timeout: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("no connection within {:?}", timeout),
    )
}

impl ElectrumClient {
    /// Connect to a node using the best transport it advertises.
    pub async fn connect(
        &self,
        node: &Node,
        timeout: Duration,
    ) -> Result<NodeConnection, NetworkError> {
        self.reject_onion(node)?;

        if node.supports_tls() {
            self.log(
                Level::INFO,
                format!("{} supports TLS, attempting TLS connection", node.host()),
            );
            return self.connect_tls(node, timeout).await;
        }

        self.log(
            Level::INFO,
            format!("{} does not advertise TLS, attempting TCP connection", node.host()),
        );
        self.connect_tcp(node, timeout).await
    }

    /// Open a TLS connection to the node's TLS port.
    ///
    /// The timeout covers both the TCP dial and the handshake.
    pub async fn connect_tls(
        &self,
        node: &Node,
        timeout: Duration,
    ) -> Result<NodeConnection, NetworkError> {
        self.reject_onion(node)?;
        if !node.supports_tls() {
            self.log(
                Level::ERROR,
                format!("{} does not support TLS, not attempting to connect", node.host()),
            );
            return Err(NetworkError::NotOffered {
                host: node.host().to_string(),
                transport: Transport::Encrypted,
            });
        }

        let addr = node.authority(Transport::Encrypted);
        let result = match tokio::time::timeout(timeout, self.dial_tls(node, &addr)).await {
            Ok(result) => result,
            Err(_) => Err(timed_out(timeout)),
        };

        match result {
            Ok(stream) => {
                self.log(
                    Level::INFO,
                    format!("successfully established TLS connection to {}", addr),
                );
                Ok(NodeConnection::tls(addr, stream))
            }
            Err(source) => Err(self.connect_failed(addr, Transport::Encrypted, source)),
        }
    }

    /// Open a plaintext TCP connection to the node's TCP port.
    ///
    /// The port is not checked; a zero port is dialed and fails at the OS.
    pub async fn connect_tcp(
        &self,
        node: &Node,
        timeout: Duration,
    ) -> Result<NodeConnection, NetworkError> {
        self.reject_onion(node)?;

        let addr = node.authority(Transport::Plain);
        self.log(Level::INFO, format!("establishing TCP connection to {}", addr));

        let result = match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(timed_out(timeout)),
        };

        match result {
            Ok(stream) => {
                self.log(
                    Level::INFO,
                    format!("successfully established TCP connection to {}", addr),
                );
                Ok(NodeConnection::plain(addr, stream))
            }
            Err(source) => Err(self.connect_failed(addr, Transport::Plain, source)),
        }
    }

    async fn dial_tls(&self, node: &Node, addr: &str) -> io::Result<TlsStream<TcpStream>> {
        let server_name = tls::server_name(node.host())?;
        let tcp = TcpStream::connect(addr).await?;

        match self.tls.connect(server_name, tcp).into_fallible().await {
            Ok(stream) => Ok(stream),
            Err((err, mut tcp)) => {
                // Handshake failed on an open socket; release it before reporting.
                if let Err(close_err) = tcp.shutdown().await {
                    self.log(
                        Level::ERROR,
                        format!(
                            "could not close connection to {} after failed TLS handshake: {}",
                            addr, close_err
                        ),
                    );
                }
                Err(err)
            }
        }
    }

    pub(crate) fn reject_onion(&self, node: &Node) -> Result<(), NetworkError> {
        if node.is_onion() {
            self.log(
                Level::ERROR,
                format!(
                    "failed to connect to {}: onion transport is not supported",
                    node.host()
                ),
            );
            return Err(NetworkError::UnsupportedTransport {
                host: node.host().to_string(),
            });
        }
        Ok(())
    }

    fn connect_failed(
        &self,
        addr: String,
        transport: Transport,
        source: io::Error,
    ) -> NetworkError {
        self.log(
            Level::ERROR,
            format!("could not establish {} connection to {}: {}", transport, addr, source),
        );
        NetworkError::Connect {
            addr,
            transport,
            source,
        }
    }
}
