use thiserror::Error;

/// A plugin claimed a specifier but returned something unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("onResolve plugin \"path\" must be a non-empty string")]
    MissingPath,

    #[error("onResolve plugin \"path\" must be absolute when the namespace is \"file\", got {path:?}")]
    NotAbsolute { path: String },

    #[error("onResolve plugin \"path\" must not contain \"..\" segments when the namespace is \"file\", got {path:?}")]
    ParentTraversal { path: String },

    #[error("onResolve plugin \"path\" must start with \"data:\" when the namespace is \"dataurl\", got {path:?}")]
    NotDataUrl { path: String },

    #[error("Expected onLoad plugin for namespace {namespace:?} to exist")]
    MissingLoader { namespace: String },

    #[error("onResolve plugin returned an invalid result: {0}")]
    Shape(String),
}

/// Failure attributed to one plugin while resolving one request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("[{plugin}] {source}")]
    Invalid {
        plugin: String,
        #[source]
        source: ValidationError,
    },

    #[error("[{plugin}] onResolve failed: {message}")]
    Rejected { plugin: String, message: String },
}

impl PluginError {
    /// A callback failure. Plugin name is filled in by the dispatcher.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            plugin: String::new(),
            message: message.into(),
        }
    }

    pub fn invalid(plugin: impl Into<String>, source: ValidationError) -> Self {
        Self::Invalid {
            plugin: plugin.into(),
            source,
        }
    }

    #[must_use]
    pub fn plugin(&self) -> &str {
        match self {
            Self::Invalid { plugin, .. } | Self::Rejected { plugin, .. } => plugin,
        }
    }

    /// Attach the plugin name if the callback didn't.
    #[must_use]
    pub fn with_plugin(mut self, name: &str) -> Self {
        match &mut self {
            Self::Invalid { plugin, .. } | Self::Rejected { plugin, .. } => {
                if plugin.is_empty() {
                    *plugin = name.to_string();
                }
            }
        }
        self
    }

    /// Stable code for machine-readable output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "PLUGIN_INVALID_RESULT",
            Self::Rejected { .. } => "PLUGIN_REJECTED",
        }
    }
}
