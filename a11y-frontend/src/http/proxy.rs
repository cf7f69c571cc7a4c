//! Forwarding of rewritten `/api/scan` requests to the scanning backend

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Extension, OriginalUri},
    http::{header, HeaderMap, Method, Response, StatusCode},
    response::IntoResponse,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::State;

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no rewrite rule matches {0}")]
    NoRoute(String),

    #[error("backend request to {target} timed out")]
    Timeout { target: Url },

    #[error("backend request to {target} failed: {source}")]
    Upstream {
        target: Url,
        #[source]
        source: reqwest::Error,
    },
}

impl ProxyError {
    fn upstream(target: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProxyError::Timeout {
                target: target.clone(),
            }
        } else {
            ProxyError::Upstream {
                target: target.clone(),
                source,
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoRoute(_) => StatusCode::NOT_FOUND,
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        warn!(error = %self, %status, "proxy request failed");

        (status, self.to_string()).into_response()
    }
}

/// Copies `headers` without the hop-by-hop set or any name listed in `Connection`.
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    headers
        .iter()
        .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
        .filter(|(name, _)| !listed.iter().any(|token| token == name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[instrument(skip_all, fields(%method, path = %uri.path()))]
pub async fn forward(
    Extension(state): Extension<Arc<State>>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<axum::response::Response, ProxyError> {
    let target = state
        .rewrites
        .resolve(uri.path(), uri.query())
        .ok_or_else(|| ProxyError::NoRoute(uri.path().to_owned()))?;

    debug!(%target, "forwarding to backend");

    let upstream = state
        .client
        .request(method, target.clone())
        .headers(end_to_end(&headers))
        .body(body)
        .send()
        .await
        .map_err(|err| ProxyError::upstream(&target, err))?;

    let status = upstream.status();
    let headers = end_to_end(upstream.headers());
    let body = upstream
        .bytes()
        .await
        .map_err(|err| ProxyError::upstream(&target, err))?;

    debug!(%status, len = body.len(), "backend responded");

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(response.into_response())
}
