//! Plugin system for the bundler's resolve step.
//!
//! Plugins register `onResolve` callbacks during setup. For every import edge
//! the native core hands over, the pipeline tries the callbacks registered for
//! the edge's namespace and reports a resolved module, a fallthrough to the
//! default resolver, or an error.
//!
//! ## Example
//!
//! ```ignore
//! use fastnode_core::bundler::plugin::{
//!     MaybeAsync, OnResolveResult, Plugin, PluginBuilder, PluginConstraints,
//! };
//!
//! struct Wat;
//!
//! impl Plugin for Wat {
//!     fn name(&self) -> &str { "wat" }
//!
//!     fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), fastnode_core::Error> {
//!         build.on_resolve(PluginConstraints::filter("^wat$"), |_args| {
//!             MaybeAsync::resolved(OnResolveResult::path("/tmp/woah.js"))
//!         })
//!     }
//! }
//! ```

mod builtin;
mod dispatch;
mod drain;
mod error;
mod namespace;
mod registry;
mod report;
mod rules;
mod types;

pub use builtin::{AliasPlugin, DataUrlPlugin, ExternalPlugin, VirtualPlugin, VIRTUAL_NAMESPACE};
pub use dispatch::{ResolveOutcome, ResolvePipeline};
pub use drain::{drain_settled, settle, Drained, MaybeAsync, Settled};
pub use error::{PluginError, ValidationError};
pub use namespace::{validate, LoaderSet, PathConvention};
pub use registry::{PluginRegistration, PluginRegistry, ResolveCallback};
pub use report::{RecordingHost, Report, Reporter, ResolverHost};
pub use rules::{RuleConfig, RulePlugin};
pub use types::{
    ImportKind, OnResolveArgs, OnResolveResult, RequestId, ResolveRequest, ResolvedModule,
    DATAURL_NAMESPACE, FILE_NAMESPACE,
};

use serde_json::Value;
use std::sync::Arc;

use crate::error::Error;

impl MaybeAsync<Value> {
    /// Claim the specifier.
    pub fn resolved(result: OnResolveResult) -> Self {
        Self::Ready(result.into_value())
    }

    /// Let the next plugin try.
    pub fn decline() -> Self {
        Self::Ready(Value::Null)
    }
}

/// A bundler plugin.
///
/// `setup` runs once, before any resolution, and registers the plugin's
/// callbacks through the builder.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error>;
}

/// Which specifiers a callback applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConstraints {
    /// Regular expression tested against the specifier.
    pub filter: String,
    /// Namespace of the importing module. `None` means `"file"`.
    pub namespace: Option<String>,
}

impl PluginConstraints {
    pub fn filter(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            namespace: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Handed to [`Plugin::setup`].
pub struct PluginBuilder<'r> {
    registry: &'r mut PluginRegistry,
    plugin: String,
}

impl PluginBuilder<'_> {
    /// Register an `onResolve` callback.
    pub fn on_resolve<F>(&mut self, constraints: PluginConstraints, callback: F) -> Result<(), Error>
    where
        F: Fn(&OnResolveArgs) -> MaybeAsync<Value> + Send + Sync + 'static,
    {
        let namespace = constraints.namespace.as_deref().unwrap_or(FILE_NAMESPACE);
        self.registry
            .register(namespace, &constraints.filter, &self.plugin, Arc::new(callback))
    }

    /// Declare that this plugin loads modules in `namespace`.
    pub fn on_load_namespace(&mut self, namespace: &str) {
        self.registry.register_loader(namespace);
    }
}

impl PluginRegistry {
    /// Run a plugin's setup against this registry.
    pub fn add_plugin(&mut self, plugin: &dyn Plugin) -> Result<(), Error> {
        let mut builder = PluginBuilder {
            plugin: plugin.name().to_string(),
            registry: self,
        };
        plugin.setup(&mut builder)
    }

    /// Build a registry from plugins, in order.
    pub fn from_plugins(plugins: &[Box<dyn Plugin>]) -> Result<Self, Error> {
        let mut registry = Self::new();
        for plugin in plugins {
            registry.add_plugin(plugin.as_ref())?;
        }
        Ok(registry)
    }
}
