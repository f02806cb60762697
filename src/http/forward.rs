//! Plain HTTP forwarding to the single backend.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the backend (paths joined, queries merged)
//! - Strip hop-by-hop headers in both directions
//! - Append the client address to `X-Forwarded-For`
//! - Stream request and response bodies without buffering
//!
//! # Design Decisions
//! - The inbound `Host` header is preserved
//! - Upstream failures are returned to the caller; the server answers 500

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::{Position, Url};

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Errors raised while forwarding a plain request.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid backend uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Single-host reverse proxy for non-upgrade requests.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    backend: Url,
}

impl Forwarder {
    pub fn new(backend: Url) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, backend }
    }

    /// Forward `request` to the backend and return its response.
    ///
    /// Headers are sent as given apart from hop-by-hop removal and the
    /// `X-Forwarded-For` entry; injection happens before this call.
    pub async fn forward(
        &self,
        mut request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        *request.uri_mut() = backend_uri(&self.backend, request.uri())?;
        // Outbound connections are plain HTTP/1.1 regardless of the inbound protocol.
        *request.version_mut() = Version::HTTP_11;

        strip_hop_by_hop(request.headers_mut());
        if let Some(addr) = client_addr {
            append_forwarded_for(request.headers_mut(), addr.ip());
        }

        tracing::debug!(uri = %request.uri(), method = %request.method(), "Forwarding request");

        let response: Response<Incoming> = self.client.request(request).await?;
        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Map an inbound URI onto the backend base URL.
pub fn backend_uri(backend: &Url, inbound: &Uri) -> Result<Uri, ForwardError> {
    let origin = &backend[..Position::BeforePath];
    let path = join_paths(backend.path(), inbound.path());

    let base_query = backend.query().filter(|q| !q.is_empty());
    let inbound_query = inbound.query().filter(|q| !q.is_empty());
    let uri = match (base_query, inbound_query) {
        (Some(a), Some(b)) => format!("{origin}{path}?{a}&{b}"),
        (Some(q), None) | (None, Some(q)) => format!("{origin}{path}?{q}"),
        (None, None) => format!("{origin}{path}"),
    };
    Ok(uri.parse()?)
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Append `client` to `X-Forwarded-For`, folding prior values into one.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
