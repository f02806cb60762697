//! Echo backend used to exercise the proxy.
//!
//! Plain requests get their body sent back. WebSocket connections get every
//! text and binary message sent back unchanged, with the same type.

use axum::{
    body::{Body, Bytes},
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::FromRequestParts,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::http::is_websocket_upgrade;

/// Maximum plain request body echoed back.
pub const MAX_ECHO_BODY: usize = 16 * 1024 * 1024;

/// Router that echoes everything on every path.
pub fn echo_router() -> Router {
    Router::new()
        .route("/", any(echo_handler))
        .route("/{*path}", any(echo_handler))
}

async fn echo_handler(request: Request<Body>) -> Response {
    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        headers = ?request.headers(),
        "Request received"
    );

    if is_websocket_upgrade(request.headers()) {
        let (mut parts, _body) = request.into_parts();
        let upgrade = <WebSocketUpgrade as FromRequestParts<()>>::from_request_parts(&mut parts, &());
        return match upgrade.await {
            Ok(upgrade) => upgrade.on_upgrade(echo_socket),
            Err(rejection) => {
                tracing::warn!(error = %rejection, "Error upgrading websocket connection");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error upgrading websocket connection",
                )
                    .into_response()
            }
        };
    }

    match axum::body::to_bytes(request.into_body(), MAX_ECHO_BODY).await {
        Ok(body) => body.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Error reading body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(b"error reading body"),
            )
                .into_response()
        }
    }
}

/// Send every data message back on the same socket until it closes.
pub async fn echo_socket(mut socket: WebSocket) {
    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "Error while reading next message");
                return;
            }
        };

        match message {
            Message::Text(_) | Message::Binary(_) => {
                if let Err(e) = socket.send(message).await {
                    tracing::debug!(error = %e, "Error while writing message");
                    return;
                }
            }
            Message::Close(_) => return,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}
