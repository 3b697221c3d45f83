//! Built-in resolve plugins.

use rustc_hash::FxHashSet as HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{
    MaybeAsync, OnResolveArgs, OnResolveResult, Plugin, PluginBuilder, PluginConstraints,
    DATAURL_NAMESPACE,
};
use crate::error::Error;

/// Namespace used by [`VirtualPlugin`].
pub const VIRTUAL_NAMESPACE: &str = "virtual";

/// Regex matching any of `names` exactly or followed by a `/` subpath.
fn prefix_filter<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let alternatives: Vec<String> = names.into_iter().map(regex_lite::escape).collect();
    format!("^(?:{})(?:/|$)", alternatives.join("|"))
}

/// Join `rel` onto `base`, folding `.` and `..` without touching the
/// filesystem. `..` never climbs above the root.
fn lexical_join(base: &Path, rel: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(rel).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Plugin that handles import aliases.
///
/// Maps import paths like `@/components` to `<root>/src/components`.
/// Relative targets are joined onto the root, so `../shared` points next to
/// it.
pub struct AliasPlugin {
    root: PathBuf,
    aliases: Vec<(String, String)>,
}

impl AliasPlugin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aliases: Vec::new(),
        }
    }

    /// Add an alias.
    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.push((from.into(), to.into()));
        self
    }

    fn target(&self, to: &str) -> String {
        lexical_join(&self.root, to).to_string_lossy().into_owned()
    }

    /// Apply the first alias matching `specifier`.
    pub fn rewrite(&self, specifier: &str) -> Option<String> {
        for (from, to) in &self.aliases {
            if specifier == from {
                return Some(self.target(to));
            }
            if let Some(rest) = specifier.strip_prefix(from.as_str()) {
                if rest.starts_with('/') {
                    return Some(self.target(&format!("{to}{rest}")));
                }
            }
        }
        None
    }
}

impl Plugin for AliasPlugin {
    fn name(&self) -> &str {
        "alias"
    }

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error> {
        if self.aliases.is_empty() {
            return Ok(());
        }
        let filter = prefix_filter(self.aliases.iter().map(|(from, _)| from.as_str()));
        let this = Arc::new(Self {
            root: self.root.clone(),
            aliases: self.aliases.clone(),
        });
        build.on_resolve(PluginConstraints::filter(filter), move |args: &OnResolveArgs| {
            match this.rewrite(&args.path) {
                Some(path) => MaybeAsync::resolved(OnResolveResult::path(path)),
                None => MaybeAsync::decline(),
            }
        })
    }
}

/// Plugin that creates virtual modules.
///
/// `virtual:<id>` resolves into the `virtual` namespace when `<id>` is known,
/// and the plugin declares a loader for that namespace. Module source is the
/// loader's business; only the ids live here.
#[derive(Default)]
pub struct VirtualPlugin {
    modules: HashSet<String>,
}

impl VirtualPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a virtual module id.
    pub fn module(mut self, id: impl Into<String>) -> Self {
        self.modules.insert(id.into());
        self
    }
}

impl Plugin for VirtualPlugin {
    fn name(&self) -> &str {
        "virtual"
    }

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error> {
        build.on_load_namespace(VIRTUAL_NAMESPACE);
        let ids = self.modules.clone();
        build.on_resolve(PluginConstraints::filter("^virtual:"), move |args: &OnResolveArgs| {
            match args.path.strip_prefix("virtual:") {
                Some(id) if ids.contains(id) => MaybeAsync::resolved(
                    OnResolveResult::path(id).namespace(VIRTUAL_NAMESPACE),
                ),
                _ => MaybeAsync::decline(),
            }
        })
    }
}

/// Plugin that marks packages as external (left for the runtime).
#[derive(Default)]
pub struct ExternalPlugin {
    packages: Vec<String>,
}

impl ExternalPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` and its subpaths external.
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.packages.push(name.into());
        self
    }
}

impl Plugin for ExternalPlugin {
    fn name(&self) -> &str {
        "external"
    }

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error> {
        if self.packages.is_empty() {
            return Ok(());
        }
        let filter = prefix_filter(self.packages.iter().map(String::as_str));
        build.on_resolve(PluginConstraints::filter(filter), |args: &OnResolveArgs| {
            MaybeAsync::resolved(OnResolveResult::path(args.path.clone()).external(true))
        })
    }
}

/// Plugin that routes `data:` specifiers into the `dataurl` namespace.
pub struct DataUrlPlugin;

impl Plugin for DataUrlPlugin {
    fn name(&self) -> &str {
        "dataurl"
    }

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error> {
        build.on_resolve(PluginConstraints::filter("^data:"), |args: &OnResolveArgs| {
            MaybeAsync::resolved(OnResolveResult::path(args.path.clone()).namespace(DATAURL_NAMESPACE))
        })
    }
}
