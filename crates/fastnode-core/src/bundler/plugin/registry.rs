//! Registered `onResolve` callbacks and `onLoad` namespaces.
//!
//! The registry is filled once during plugin setup and then only read.
//! Callbacks are grouped by namespace and kept in registration order; that
//! order decides which plugin wins when several match.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde_json::Value;
use std::sync::Arc;

use super::drain::MaybeAsync;
use super::namespace::LoaderSet;
use super::types::{OnResolveArgs, FILE_NAMESPACE};
use crate::error::Error;

/// An `onResolve` callback.
///
/// Returns the plugin's raw answer: an object shaped like
/// [`OnResolveResult`](super::OnResolveResult) to claim the specifier,
/// anything else to decline.
pub type ResolveCallback = Arc<dyn Fn(&OnResolveArgs) -> MaybeAsync<Value> + Send + Sync>;

/// One `onResolve` registration.
#[derive(Clone)]
pub struct PluginRegistration {
    /// Name of the plugin that registered this callback.
    pub plugin: String,
    pub filter: regex_lite::Regex,
    pub callback: ResolveCallback,
}

impl PluginRegistration {
    #[must_use]
    pub fn matches(&self, specifier: &str) -> bool {
        self.filter.is_match(specifier)
    }
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("plugin", &self.plugin)
            .field("filter", &self.filter.as_str())
            .finish_non_exhaustive()
    }
}

/// Resolver and loader registrations for one bundler instance.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    on_resolve: HashMap<String, Vec<PluginRegistration>>,
    loaders: HashSet<String>,
}

/// `""` and `"file"` name the same namespace.
pub(crate) fn normalize_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        FILE_NAMESPACE
    } else {
        namespace
    }
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an `onResolve` callback for specifiers matching `filter`.
    pub fn register(
        &mut self,
        namespace: &str,
        filter: &str,
        plugin: &str,
        callback: ResolveCallback,
    ) -> Result<(), Error> {
        let filter = regex_lite::Regex::new(filter).map_err(|source| Error::InvalidFilter {
            plugin: plugin.to_string(),
            filter: filter.to_string(),
            source,
        })?;
        self.register_compiled(namespace, filter, plugin, callback);
        Ok(())
    }

    /// Register a callback whose filter is already compiled.
    pub fn register_compiled(
        &mut self,
        namespace: &str,
        filter: regex_lite::Regex,
        plugin: &str,
        callback: ResolveCallback,
    ) {
        self.on_resolve
            .entry(normalize_namespace(namespace).to_string())
            .or_default()
            .push(PluginRegistration {
                plugin: plugin.to_string(),
                filter,
                callback,
            });
    }

    /// Record that `namespace` has an `onLoad` handler.
    pub fn register_loader(&mut self, namespace: &str) {
        self.loaders.insert(normalize_namespace(namespace).to_string());
    }

    /// Resolvers for `namespace`, in registration order.
    #[must_use]
    pub fn lookup(&self, namespace: &str) -> &[PluginRegistration] {
        self.on_resolve
            .get(normalize_namespace(namespace))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_loader(&self, namespace: &str) -> bool {
        self.loaders.contains(normalize_namespace(namespace))
    }

    /// Whether any resolver could be interested in `path`.
    ///
    /// Lets the native core skip the pipeline entirely for specifiers no
    /// filter matches.
    #[must_use]
    pub fn any_matches(&self, namespace: &str, path: &str) -> bool {
        self.lookup(namespace).iter().any(|reg| reg.matches(path))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_resolve.is_empty()
    }
}

impl LoaderSet for PluginRegistry {
    fn has_loader(&self, namespace: &str) -> bool {
        PluginRegistry::has_loader(self, namespace)
    }
}
