//! CLI arguments

use std::num::ParseIntError;
use std::time::Duration;

use clap::Parser;
use url::Url;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Opts {
    /// Base URL of the scanning backend
    #[clap(long, env = "NEXT_PUBLIC_BACKEND_URL")]
    pub backend_url: Url,

    /// Give up on backend requests after this many seconds.
    ///
    /// Requests wait indefinitely when unset.
    #[clap(long, env = "A11Y_FRONTEND_BACKEND_TIMEOUT", value_parser = parse_seconds)]
    pub backend_timeout: Option<Duration>,

    #[clap(flatten)]
    pub tracing_opts: TracingOpts,

    #[clap(flatten)]
    pub http_opts: HttpOpts,
}

#[derive(Parser, Debug, Clone)]
pub struct TracingOpts {
    /// Enable tracing.
    #[clap(
        long = "tracing-enabled",
        env = "A11Y_FRONTEND_TRACING_ENABLED",
        action = clap::ArgAction::Set,
        value_parser = clap::value_parser!(bool),
        default_value = "true",
        default_missing_value = "true"
    )]
    pub enabled: bool,

    /// Select the log output format.
    #[clap(
        long = "log-format",
        value_enum,
        default_value = "text",
        env = "A11Y_FRONTEND_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct HttpOpts {
    /// Listening address for the HTTP server.
    #[clap(long, default_value = "0.0.0.0", env = "A11Y_FRONTEND_HOST")]
    pub host: String,

    /// Listening port for the HTTP server.
    #[clap(short, long, default_value = "3000", env = "A11Y_FRONTEND_PORT")]
    pub port: u16,
}

fn parse_seconds(value: &str) -> Result<Duration, ParseIntError> {
    value.parse().map(Duration::from_secs)
}
