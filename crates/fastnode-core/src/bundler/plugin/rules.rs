//! Declarative resolve rules read from the plugin manifest.
//!
//! ```json
//! {
//!   "rules": [
//!     { "filter": "^env$", "path": "/project/src/env.prod.js" },
//!     { "filter": "^icons:(.*)$", "path": "$1", "result_namespace": "icons" },
//!     { "filter": "^https?://", "external": true, "defer": true }
//!   ]
//! }
//! ```
//!
//! `path` is a replacement template expanded against the filter's captures;
//! without one the specifier itself is used. `defer` answers through a
//! pending future instead of synchronously. Each rule is registered under
//! its own label (`rules/<name>`) so errors point at the offending rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{MaybeAsync, OnResolveArgs, OnResolveResult, Plugin, PluginBuilder, FILE_NAMESPACE};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Reported in diagnostics. Defaults to `rule-<index>`.
    #[serde(default)]
    pub name: Option<String>,
    pub filter: String,
    /// Namespace of importers this rule applies to.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub result_namespace: Option<String>,
    #[serde(default)]
    pub external: Option<bool>,
    #[serde(default)]
    pub defer: bool,
}

/// Plugin built from the manifest's `rules`, registered in file order.
#[derive(Debug, Clone, Default)]
pub struct RulePlugin {
    rules: Vec<RuleConfig>,
}

impl RulePlugin {
    #[must_use]
    pub fn new(rules: Vec<RuleConfig>) -> Self {
        Self { rules }
    }
}

fn answer(rule: &RuleConfig, filter: &regex_lite::Regex, args: &OnResolveArgs) -> Value {
    let path = match &rule.path {
        Some(template) => filter.replace(&args.path, template.as_str()).into_owned(),
        None => args.path.clone(),
    };
    OnResolveResult {
        path: Some(path),
        namespace: rule.result_namespace.clone(),
        external: rule.external,
    }
    .into_value()
}

impl Plugin for RulePlugin {
    fn name(&self) -> &str {
        "rules"
    }

    fn setup(&self, build: &mut PluginBuilder<'_>) -> Result<(), Error> {
        for (index, rule) in self.rules.iter().enumerate() {
            let label = match &rule.name {
                Some(name) => format!("{}/{name}", self.name()),
                None => format!("{}/rule-{index}", self.name()),
            };
            let filter = regex_lite::Regex::new(&rule.filter).map_err(|source| {
                Error::InvalidFilter {
                    plugin: label.clone(),
                    filter: rule.filter.clone(),
                    source,
                }
            })?;
            let namespace = rule.namespace.as_deref().unwrap_or(FILE_NAMESPACE);

            let rule_for_callback = rule.clone();
            let template = filter.clone();
            build.registry.register_compiled(
                namespace,
                filter,
                &label,
                Arc::new(move |args: &OnResolveArgs| {
                    let rule = &rule_for_callback;
                    let value = answer(rule, &template, args);
                    if rule.defer {
                        MaybeAsync::pending(async move {
                            tokio::task::yield_now().await;
                            MaybeAsync::Ready(value)
                        })
                    } else {
                        MaybeAsync::Ready(value)
                    }
                }),
            );
        }
        Ok(())
    }
}
