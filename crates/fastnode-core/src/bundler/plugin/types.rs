//! Request and result shapes shared by the resolve pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ValidationError;

/// The default namespace, backed by the real filesystem.
pub const FILE_NAMESPACE: &str = "file";

/// Namespace for inline `data:` URIs.
pub const DATAURL_NAMESPACE: &str = "dataurl";

/// Opaque token correlating a resolve call with the native core's pending
/// operation. Only the native core creates these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a specifier was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    EntryPoint,
    #[default]
    ImportStatement,
    RequireCall,
    DynamicImport,
    RequireResolve,
    ImportRule,
    UrlToken,
    Internal,
}

impl ImportKind {
    pub const ALL: [ImportKind; 8] = [
        Self::EntryPoint,
        Self::ImportStatement,
        Self::RequireCall,
        Self::DynamicImport,
        Self::RequireResolve,
        Self::ImportRule,
        Self::UrlToken,
        Self::Internal,
    ];

    /// Decode the numeric kind id sent by the native core.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntryPoint => "entry-point",
            Self::ImportStatement => "import-statement",
            Self::RequireCall => "require-call",
            Self::DynamicImport => "dynamic-import",
            Self::RequireResolve => "require-resolve",
            Self::ImportRule => "import-rule",
            Self::UrlToken => "url-token",
            Self::Internal => "internal",
        }
    }
}

impl std::str::FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown import kind: {s}"))
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One import edge the native core wants resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub specifier: String,
    /// Referencing module. Empty for entry points.
    pub importer: String,
    pub namespace: String,
    pub kind: ImportKind,
    pub request_id: RequestId,
}

impl ResolveRequest {
    /// Build a request. An empty namespace means `"file"`.
    pub fn new(
        request_id: RequestId,
        specifier: impl Into<String>,
        importer: impl Into<String>,
        namespace: impl Into<String>,
        kind: ImportKind,
    ) -> Self {
        let mut namespace = namespace.into();
        if namespace.is_empty() {
            namespace = FILE_NAMESPACE.to_string();
        }
        Self {
            specifier: specifier.into(),
            importer: importer.into(),
            namespace,
            kind,
            request_id,
        }
    }

    /// The read-only view handed to plugin callbacks.
    #[must_use]
    pub fn args(&self) -> OnResolveArgs {
        OnResolveArgs {
            path: self.specifier.clone(),
            importer: self.importer.clone(),
            namespace: self.namespace.clone(),
            kind: self.kind,
            resolve_dir: None,
            plugin_data: None,
        }
    }
}

/// Arguments passed to an `onResolve` callback.
///
/// `resolve_dir` and `plugin_data` are reserved and not populated yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnResolveArgs {
    pub path: String,
    pub importer: String,
    pub namespace: String,
    pub kind: ImportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_data: Option<Value>,
}

/// What a plugin returns when it claims a specifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnResolveResult {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
}

impl OnResolveResult {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn external(mut self, external: bool) -> Self {
        self.external = Some(external);
        self
    }

    /// Read a plugin's dynamic output.
    ///
    /// `Ok(None)` means the plugin declined (anything that is not an object).
    /// An object with fields of the wrong type is a validation error.
    pub fn from_value(value: Value) -> Result<Option<Self>, ValidationError> {
        if !value.is_object() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ValidationError::Shape(e.to_string()))
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A finalized resolution, handed to the native core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    pub path: String,
    pub namespace: String,
    pub external: bool,
}
