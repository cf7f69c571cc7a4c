use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};
use http::{header::HeaderName, Request, Version};
use hyper::Body;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    trace::{DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::{debug, instrument, trace};
use url::Url;

use crate::cli::Opts;
use crate::rewrite::RewriteTable;
use crate::scan::ScanClient;
use crate::Error;

mod api;
mod pages;
mod proxy;
mod request_id;

use request_id::MakeRequestUlid;

#[derive(Debug, Clone)]
pub(crate) struct State {
    /// Maps `/api/scan` paths onto the backend
    rewrites: RewriteTable,
    /// Pooled client used for proxied requests
    client: reqwest::Client,
    /// Typed backend client used by the server-rendered pages
    scans: ScanClient,
}

impl State {
    fn new(backend: Url, timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::HttpClientBuildFailed)?;
        let rewrites = RewriteTable::new(backend);

        debug!(backend = %rewrites.backend(), ?timeout, "configured scanning backend");

        Ok(Self {
            scans: ScanClient::new(client.clone(), rewrites.clone()),
            rewrites,
            client,
        })
    }
}

fn http_flavor_from_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "unknown",
    }
}

fn app(state: Arc<State>) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(pages::router())
        .nest("/api", api::router())
        // Add a tracing layer that adds standard tags, unlike tower's tracing layer
        .layer(
            ServiceBuilder::new()
                .set_x_request_id(MakeRequestUlid)
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(move |request: &Request<Body>| {
                            let request_id = request
                                .headers()
                                .get(&x_request_id)
                                .and_then(|value| value.to_str().ok())
                                .unwrap_or_default();

                            tracing::debug_span!("request",
                                http.method = %request.method(),
                                http.target = %request.uri(),
                                http.flavor = %http_flavor_from_version(request.version()),
                                request_id = %request_id,
                            )
                        })
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                )
                .propagate_x_request_id()
                .layer(CompressionLayer::new())
                .layer(Extension(state)),
        )
}

#[instrument(skip_all)]
pub async fn start_server(opts: &Opts, handle: axum_server::Handle) -> Result<(), Error> {
    trace!("creating http server");

    let state = Arc::new(State::new(opts.backend_url.clone(), opts.backend_timeout)?);
    let http_opts = &opts.http_opts;

    let addr = (http_opts.host.as_str(), http_opts.port)
        .to_socket_addrs()
        .map_err(Error::InvalidListeningAddress)?
        .next()
        .ok_or_else(|| Error::UnresolvedListeningAddress(http_opts.host.clone()))?;

    debug!(%addr, "binding to address");

    axum_server::bind(addr)
        .handle(handle)
        .serve(app(state).into_make_service())
        .await
        .map_err(Error::HttpServerBindingFailed)?;

    Ok(())
}
