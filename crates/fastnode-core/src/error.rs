use std::path::PathBuf;
use thiserror::Error;

/// Core error type for setup-time failures.
///
/// Errors raised while resolving a single specifier are
/// [`PluginError`](crate::bundler::plugin::PluginError)s and go to the native
/// core instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid filter {filter:?} in plugin {plugin:?}: {source}")]
    InvalidFilter {
        plugin: String,
        filter: String,
        #[source]
        source: regex_lite::Error,
    },
}
