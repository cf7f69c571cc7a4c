//! Application tracing

use tracing_subscriber::{prelude::*, EnvFilter, Registry};

use crate::cli::{LogFormat, TracingOpts};
use crate::Error;

pub fn init(tracing_opts: &TracingOpts) -> Result<(), Error> {
    if !tracing_opts.enabled {
        return Ok(());
    }

    let (text_layer, json_layer) = match tracing_opts.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    let env_filter = EnvFilter::from_default_env();

    Registry::default()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(Error::from)?;

    Ok(())
}
