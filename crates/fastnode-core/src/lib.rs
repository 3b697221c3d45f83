#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod bundler;
pub mod config;
pub mod error;
pub mod version;

pub use bundler::plugin::{
    ImportKind, MaybeAsync, OnResolveArgs, OnResolveResult, RequestId, ResolveOutcome,
    ResolvePipeline, ResolveRequest, ResolvedModule, ResolverHost,
};
pub use config::{Config, PluginsConfig};
pub use error::Error;
pub use version::VERSION;
