//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{FromRequestParts, State};
use axum::http::{HeaderMap, Request, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, MaybeTlsStream, WebSocketStream};

use header_proxy::config::{validate_config, RawConfig};
use header_proxy::echo::{echo_router, echo_socket};
use header_proxy::http::is_websocket_upgrade;
use header_proxy::{HttpServer, Shutdown};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Subprotocol the capturing backend selects when a client offers it.
pub const CAPTURE_PROTOCOL: &str = "chat";

pub type ClientSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A running proxy. Dropping it shuts the server down.
pub struct TestProxy {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
}

impl TestProxy {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

/// Settings for a proxy in front of `backend`.
pub fn proxy_settings(backend: SocketAddr, headers: &[(&str, &str)]) -> RawConfig {
    RawConfig {
        host: Some("127.0.0.1".into()),
        backend: Some(format!("http://{backend}")),
        insert_header: headers.iter().map(|(n, _)| n.to_string()).collect(),
        insert_header_val: headers.iter().map(|(_, v)| v.to_string()).collect(),
        ..Default::default()
    }
}

/// Start a proxy on a free port with the given settings.
pub async fn start_proxy(mut settings: RawConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    settings.port = Some(addr.port());

    let server = HttpServer::new(validate_config(settings).unwrap());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.signal();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        _shutdown: shutdown,
    }
}

/// A port nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start the echo backend.
pub async fn start_echo_backend() -> SocketAddr {
    serve(echo_router()).await
}

/// What a backend observed for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Start a backend that reports every request it sees.
///
/// Plain requests get `captured`; upgrades are accepted (selecting
/// [`CAPTURE_PROTOCOL`] if offered) and echoed.
pub async fn start_capture_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let router = Router::new()
        .route("/", any(capture_handler))
        .route("/{*path}", any(capture_handler))
        .with_state(tx);
    (serve(router).await, rx)
}

async fn capture_handler(
    State(tx): State<mpsc::UnboundedSender<Captured>>,
    request: Request<Body>,
) -> Response {
    let _ = tx.send(Captured {
        uri: request.uri().clone(),
        headers: request.headers().clone(),
    });

    if !is_websocket_upgrade(request.headers()) {
        return "captured".into_response();
    }

    let (mut parts, _body) = request.into_parts();
    match <WebSocketUpgrade as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => upgrade.protocols([CAPTURE_PROTOCOL]).on_upgrade(echo_socket),
        Err(rejection) => rejection.into_response(),
    }
}

/// Start a WebSocket backend that sends `messages` as soon as a client
/// connects, then waits for the client to leave.
pub async fn start_pushing_backend(messages: Vec<Message>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let messages = messages.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                for message in messages {
                    if ws.send(message).await.is_err() {
                        return;
                    }
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });
    addr
}

/// Start a WebSocket backend that completes the handshake and then drops
/// the TCP connection without a close frame.
pub async fn start_abrupt_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(ws) = accept_async(stream).await {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    drop(ws);
                }
            });
        }
    });
    addr
}

/// Receive the next data message, failing on timeout or close.
pub async fn next_data_message(socket: &mut ClientSocket) -> Message {
    loop {
        let message = tokio::time::timeout(TEST_TIMEOUT, socket.next())
            .await
            .expect("timed out waiting for message")
            .expect("connection ended")
            .expect("websocket error");
        match message {
            Message::Text(_) | Message::Binary(_) => return message,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected data message, got {other:?}"),
        }
    }
}

/// HTTP client that ignores proxy settings from the environment.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start a WebSocket backend that reports, once per session, when the
/// proxy side went away (close frame, error or end of stream).
pub async fn start_watching_backend() -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    if message.is_close() {
                        break;
                    }
                }
                let _ = tx.send(());
            });
        }
    });
    (addr, rx)
}

/// Start a WebSocket backend that starts the close handshake right after
/// accepting, then reports whether the proxy answered with a close frame.
pub async fn start_closing_backend() -> (SocketAddr, mpsc::UnboundedReceiver<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                tokio::time::sleep(Duration::from_millis(50)).await;
                if ws.close(None).await.is_err() {
                    let _ = tx.send(false);
                    return;
                }
                let mut acknowledged = false;
                while let Some(Ok(message)) = ws.next().await {
                    acknowledged |= message.is_close();
                }
                let _ = tx.send(acknowledged);
            });
        }
    });
    (addr, rx)
}

/// Write a raw HTTP request and read the response until it contains
/// `expected` or the connection ends.
pub async fn raw_exchange(addr: SocketAddr, request: &str, expected: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 1024];
    let _ = tokio::time::timeout(TEST_TIMEOUT, async {
        while !String::from_utf8_lossy(&response).contains(expected) {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => response.extend_from_slice(&buf[..n]),
            }
        }
    })
    .await;

    String::from_utf8_lossy(&response).into_owned()
}
