//! Helpers shared by the unit tests

use std::net::{SocketAddr, TcpListener};

use axum::Router;
use url::Url;

use crate::rewrite::RewriteTable;
use crate::scan::ScanClient;

/// Serve `router` on an ephemeral local port, standing in for the scanning backend.
pub async fn spawn_backend(router: Router) -> Url {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(router.into_make_service());
    let addr = server.local_addr();

    tokio::spawn(server);

    Url::parse(&format!("http://{addr}")).unwrap()
}

/// A backend URL nothing is listening on.
pub fn closed_backend() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Url::parse(&format!("http://{addr}")).unwrap()
}

pub fn scan_client(backend: Url) -> ScanClient {
    ScanClient::new(reqwest::Client::new(), RewriteTable::new(backend))
}
