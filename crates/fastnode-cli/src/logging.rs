//! Logging initialization for the CLI.
//!
//! Library crates only emit `tracing` events; the subscriber lives here.
//! Plugin dispatch logs at DEBUG (which plugin answered) and TRACE (every
//! callback invocation), so `-vv` shows the whole resolve walk.

use fastnode_core::Config;
use tracing::Level;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

/// Crates whose events follow the `-v` level.
const OWN_TARGETS: &[&str] = &["fastnode_core", "fastnode_cli"];

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Logs always go to stderr so `--json`
/// stdout stays a single document.
///
/// `RUST_LOG` sets the baseline; verbosity raises our own crates on top.
/// Calling this twice keeps the first subscriber.
pub fn init(config: &Config) {
    let level = level_for(config.verbosity);

    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    for target in OWN_TARGETS {
        if let Ok(directive) = format!("{target}={level}").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    // JSON lines, e.g.
    // {"timestamp":"...","level":"DEBUG","fields":{"message":"onResolve matched","request_id":"#1"},"target":"fastnode_core::bundler::plugin::report"}
    let _ = if config.json_logs {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
}
