//! Setup for the application logging.
//!
//! It redirects the log records to the standard output, filtered by the
//! `logging.threshold` of the configuration and laid out as `logging.style`
//! asks.
use std::sync::Once;

use swarm_tracker_configuration::{Configuration, Style, Threshold};
use tracing::info;
use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// It redirects the log info to the standard output with the threshold defined in the configuration.
pub fn setup(cfg: &Configuration) {
    let tracing_level = map_to_tracing_level_filter(&cfg.logging.threshold);

    if tracing_level == LevelFilter::OFF {
        return;
    }

    let style = cfg.logging.style;

    INIT.call_once(|| {
        tracing_stdout_init(tracing_level, style);
    });
}

fn map_to_tracing_level_filter(threshold: &Threshold) -> LevelFilter {
    match threshold {
        Threshold::Off => LevelFilter::OFF,
        Threshold::Error => LevelFilter::ERROR,
        Threshold::Warn => LevelFilter::WARN,
        Threshold::Info => LevelFilter::INFO,
        Threshold::Debug => LevelFilter::DEBUG,
        Threshold::Trace => LevelFilter::TRACE,
    }
}

fn tracing_stdout_init(filter: LevelFilter, style: Style) {
    let builder = tracing_subscriber::fmt().with_max_level(filter).with_ansi(style != Style::Json);

    let () = match style {
        Style::Default => builder.init(),
        Style::Compact => builder.compact().init(),
        Style::Json => builder.json().init(),
    };

    info!(?style, "Logging initialized");
}
