//! Test harness: an in-process fake Electrum server.
//!
//! Each accepted connection reads one request line, hands the decoded
//! request to a responder closure and writes back whatever bytes it returns.
//! The server speaks plaintext TCP, or TLS with a throwaway self-signed
//! certificate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use peerscout_core::{Node, Request};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

type Responder = dyn Fn(&Request) -> Vec<u8> + Send + Sync;

const PARSE_ERROR: &[u8] =
    b"{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32700,\"message\":\"parse error\"}}\n";

/// A local server speaking the Electrum line protocol.
pub struct FakeServer {
    port: u16,
    tls: bool,
    accepted: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Request>>>,
    task: JoinHandle<()>,
}

impl FakeServer {
    /// Start a plaintext server whose replies are produced by `responder`.
    /// The reply is written as is; include the trailing newline to complete
    /// a line.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Request) -> Vec<u8> + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(responder), None).await
    }

    /// Like [`start`](Self::start), but every connection must complete a TLS
    /// handshake first.
    pub async fn start_tls<F>(responder: F) -> Self
    where
        F: Fn(&Request) -> Vec<u8> + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(responder), Some(self_signed_acceptor())).await
    }

    /// Reply to every request with a JSON-RPC result echoing its id.
    pub async fn with_result(result: serde_json::Value) -> Self {
        Self::start(move |request| result_line(request.id, &result)).await
    }

    /// TLS variant of [`with_result`](Self::with_result).
    pub async fn with_result_tls(result: serde_json::Value) -> Self {
        Self::start_tls(move |request| result_line(request.id, &result)).await
    }

    async fn spawn(responder: Arc<Responder>, acceptor: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake server");
        let port = listener.local_addr().expect("local addr").port();
        let tls = acceptor.is_some();
        let accepted = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let accepted = Arc::clone(&accepted);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let requests = Arc::clone(&requests);
                    let responder = Arc::clone(&responder);
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        match acceptor {
                            Some(acceptor) => {
                                if let Ok(stream) = acceptor.accept(stream).await {
                                    serve(stream, &requests, responder.as_ref()).await;
                                }
                            }
                            None => serve(stream, &requests, responder.as_ref()).await,
                        }
                    });
                }
            })
        };

        Self {
            port,
            tls,
            accepted,
            requests,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Node descriptor pointing at this server: TLS-only for a TLS server,
    /// plaintext-only otherwise.
    pub fn node(&self) -> Node {
        let (tcp_port, ssl_port) = if self.tls { (0, self.port) } else { (self.port, 0) };
        Node::new("127.0.0.1", tcp_port, ssl_port).expect("valid node")
    }

    /// Number of connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve<S>(stream: S, requests: &Mutex<Vec<Request>>, responder: &Responder)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read, mut write) = tokio::io::split(stream);
    let mut line = String::new();
    if BufReader::new(read).read_line(&mut line).await.is_err() {
        return;
    }
    let request = match serde_json::from_str::<Request>(&line) {
        Ok(request) => request,
        Err(_) => {
            let _ = write.write_all(PARSE_ERROR).await;
            let _ = write.shutdown().await;
            return;
        }
    };
    let reply = responder(&request);
    if let Ok(mut seen) = requests.lock() {
        seen.push(request);
    }
    let _ = write.write_all(&reply).await;
    let _ = write.shutdown().await;
}

/// TLS acceptor presenting a freshly generated self-signed certificate.
fn self_signed_acceptor() -> TlsAcceptor {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("self-signed certificate");
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("server certificate");
    TlsAcceptor::from(Arc::new(config))
}

/// A complete JSON-RPC result line.
pub fn result_line(id: u64, result: &serde_json::Value) -> Vec<u8> {
    let mut line = serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    }))
    .expect("serialize reply");
    line.push(b'\n');
    line
}
