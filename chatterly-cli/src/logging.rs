//! Tracing subscriber setup for the CLI. Events go to stderr so command
//! output on stdout stays clean.

use shared::config::{ClientConfig, LogFormat};
use std::io;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self, MakeWriter},
    util::SubscriberInitExt,
};

/// Install the global subscriber and return the configured level.
pub fn initialize_tracing(config: &ClientConfig) -> String {
    build_subscriber(config, io::stderr, true).init();
    config.logging.level.clone()
}

/// JSON output never carries ANSI codes.
fn build_subscriber<W>(
    config: &ClientConfig,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = fmt::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_writer(writer);

    match config.logging.format {
        LogFormat::Json => Box::new(builder.json().with_ansi(false).finish()),
        LogFormat::Text => Box::new(builder.with_ansi(ansi).finish()),
    }
}

fn build_env_filter(config: &ClientConfig) -> EnvFilter {
    let default_level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}
