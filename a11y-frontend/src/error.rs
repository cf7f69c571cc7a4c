//! Error types

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Cannot set global tracing subscriber")]
    #[diagnostic(code(a11y_frontend::default_subscriber_error))]
    DefaultSubscriberInitFailed(#[from] tracing_subscriber::util::TryInitError),

    #[error("Cannot build the backend http client")]
    #[diagnostic(code(a11y_frontend::http_client_error))]
    HttpClientBuildFailed(#[source] reqwest::Error),

    #[error("Cannot bind http server to the requested address")]
    #[diagnostic(code(a11y_frontend::http_bind_error))]
    HttpServerBindingFailed(#[source] std::io::Error),

    #[error("Listening address is invalid")]
    #[diagnostic(code(a11y_frontend::invalid_address_error))]
    InvalidListeningAddress(#[source] std::io::Error),

    #[error("Listening address {0} does not resolve to a socket address")]
    #[diagnostic(
        code(a11y_frontend::unresolved_address_error),
        help("pass an IP address or a resolvable host name with --host")
    )]
    UnresolvedListeningAddress(String),
}
