//! Bundler integration points.
//!
//! The native module graph builder owns parsing, graph walking and chunking.
//! This module only holds the plugin-driven resolve step it calls into:
//!
//! 1. **Registry** - plugins register `onResolve` callbacks at setup
//! 2. **Dispatch** - each import edge is offered to matching callbacks in order
//! 3. **Validation** - a claimed result is checked against namespace rules
//! 4. **Report** - the outcome goes back to the native core by request id

pub mod plugin;

pub use plugin::{
    Plugin, PluginBuilder, PluginConstraints, PluginError, PluginRegistry, ResolveOutcome,
    ResolvePipeline, ResolveRequest, ResolvedModule, ResolverHost,
    // Built-in plugins
    AliasPlugin, DataUrlPlugin, ExternalPlugin, RulePlugin, VirtualPlugin,
};
