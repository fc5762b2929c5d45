//! CLI log initialization over `tracing-subscriber`, with per-stage
//! targets so one stage can be turned up without drowning in the rest.

use std::io;

use cbuild_config::Stage;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored multi-line format (development use)
    Pretty,
    /// Compact format
    Compact,
    /// JSON format (tool integration)
    Json,
}

/// Initialize the log system with the given level and format.
pub fn init(level: &str, format: LogFormat) {
    let level: LevelFilter = level.parse().unwrap_or(LevelFilter::WARN);

    let mut targets = Targets::new().with_default(level);
    for stage in [
        Stage::Session,
        Stage::Toolchain,
        Stage::Pipeline,
        Stage::Artifact,
    ] {
        targets = targets.with_target(stage.target(), level);
    }

    let layer = create_format_layer(format).with_filter(targets);
    tracing_subscriber::registry().with(layer).init();
}

/// Create formatter layer based on format; all logs go to stderr so that
/// stdout stays reserved for build outcomes.
fn create_format_layer(format: LogFormat) -> impl Layer<tracing_subscriber::Registry> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}
