use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::bundler::plugin::{
    AliasPlugin, DataUrlPlugin, ExternalPlugin, PathConvention, Plugin, PluginRegistry,
    RuleConfig, RulePlugin, VirtualPlugin,
};
use crate::error::Error;

/// Default plugin manifest name, looked up in the working directory.
pub const PLUGINS_FILE: &str = "howth.plugins.json";

/// Runtime configuration for the howth CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Explicit plugin manifest. Defaults to `<cwd>/howth.plugins.json`.
    pub plugins_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            plugins_file: None,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Use an explicit plugin manifest.
    #[must_use]
    pub fn with_plugins_file(mut self, path: Option<PathBuf>) -> Self {
        self.plugins_file = path;
        self
    }

    /// Load the plugin manifest.
    ///
    /// A missing default manifest yields an empty config; a missing explicit
    /// one is an error.
    pub fn load_plugins(&self) -> Result<PluginsConfig, Error> {
        match &self.plugins_file {
            Some(path) => PluginsConfig::load(&self.cwd.join(path)),
            None => {
                let path = self.cwd.join(PLUGINS_FILE);
                if path.is_file() {
                    PluginsConfig::load(&path)
                } else {
                    Ok(PluginsConfig::default())
                }
            }
        }
    }
}

/// Contents of `howth.plugins.json`.
///
/// Plugins are registered in a fixed order: `rules` (in file order), then
/// `alias`, `virtual_modules`, `external`, and finally the `data:` URL
/// plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Overrides the host's absolute-path rules for `file` results.
    #[serde(default)]
    pub path_convention: Option<PathConvention>,

    /// Namespaces that have an `onLoad` handler.
    #[serde(default)]
    pub loaders: Vec<String>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Import alias prefix to target directory.
    #[serde(default)]
    pub alias: BTreeMap<String, String>,

    /// Ids served as `virtual:<id>`.
    #[serde(default)]
    pub virtual_modules: Vec<String>,

    /// Packages left for the runtime.
    #[serde(default)]
    pub external: Vec<String>,
}

impl PluginsConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Instantiate the configured plugins, in registration order.
    #[must_use]
    pub fn plugins(&self, root: &Path) -> Vec<Box<dyn Plugin>> {
        let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();

        if !self.rules.is_empty() {
            plugins.push(Box::new(RulePlugin::new(self.rules.clone())));
        }

        if !self.alias.is_empty() {
            let mut alias = AliasPlugin::new(root);
            for (from, to) in &self.alias {
                alias = alias.alias(from, to);
            }
            plugins.push(Box::new(alias));
        }

        if !self.virtual_modules.is_empty() {
            let mut virtual_plugin = VirtualPlugin::new();
            for id in &self.virtual_modules {
                virtual_plugin = virtual_plugin.module(id);
            }
            plugins.push(Box::new(virtual_plugin));
        }

        if !self.external.is_empty() {
            let mut external = ExternalPlugin::new();
            for package in &self.external {
                external = external.package(package);
            }
            plugins.push(Box::new(external));
        }

        plugins.push(Box::new(DataUrlPlugin));
        plugins
    }

    /// Build the registry for a bundler rooted at `root`.
    pub fn build_registry(&self, root: &Path) -> Result<PluginRegistry, Error> {
        let mut registry = PluginRegistry::from_plugins(&self.plugins(root))?;
        for namespace in &self.loaders {
            registry.register_loader(namespace);
        }
        Ok(registry)
    }

    #[must_use]
    pub fn path_convention(&self) -> PathConvention {
        self.path_convention.unwrap_or_else(PathConvention::host)
    }
}
