//! Signaling the outcome of a resolve request back to the native core.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, trace};

use super::error::PluginError;
use super::types::{RequestId, ResolvedModule};

/// The native resolver core, as seen from the pipeline.
pub trait ResolverHost: Send + Sync {
    /// `Some` hands the import edge over to the core; `None` asks it to fall
    /// back to its own default resolution.
    fn on_resolve_async(&self, request_id: RequestId, resolved: Option<ResolvedModule>);

    /// Report a fatal error for one request, attributed to the plugin at
    /// `plugin_index`.
    fn add_error(&self, request_id: RequestId, error: PluginError, plugin_index: usize);
}

impl<H: ResolverHost + ?Sized> ResolverHost for std::sync::Arc<H> {
    fn on_resolve_async(&self, request_id: RequestId, resolved: Option<ResolvedModule>) {
        (**self).on_resolve_async(request_id, resolved);
    }

    fn add_error(&self, request_id: RequestId, error: PluginError, plugin_index: usize) {
        (**self).add_error(request_id, error, plugin_index);
    }
}

/// Single-use reporter for one request.
///
/// Every method consumes the reporter, so a request gets exactly one
/// terminal report.
#[must_use = "a request must be reported exactly once"]
pub struct Reporter<'h, H: ?Sized> {
    host: &'h H,
    request_id: RequestId,
}

impl<'h, H: ResolverHost + ?Sized> Reporter<'h, H> {
    pub fn new(host: &'h H, request_id: RequestId) -> Self {
        Self { host, request_id }
    }

    pub fn resolved(self, module: ResolvedModule) {
        debug!(
            request_id = %self.request_id,
            path = %module.path,
            namespace = %module.namespace,
            external = module.external,
            "onResolve matched"
        );
        self.host.on_resolve_async(self.request_id, Some(module));
    }

    pub fn fallthrough(self) {
        trace!(request_id = %self.request_id, "onResolve fallthrough");
        self.host.on_resolve_async(self.request_id, None);
    }

    pub fn error(self, error: PluginError, plugin_index: usize) {
        debug!(request_id = %self.request_id, plugin_index, %error, "onResolve failed");
        self.host.add_error(self.request_id, error, plugin_index);
    }
}

/// A terminal report as received by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Report {
    Resolved {
        request_id: RequestId,
        #[serde(flatten)]
        module: ResolvedModule,
    },
    Fallthrough {
        request_id: RequestId,
    },
    Error {
        request_id: RequestId,
        #[serde(serialize_with = "serialize_display")]
        error: PluginError,
        plugin_index: usize,
    },
}

impl Report {
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Resolved { request_id, .. }
            | Self::Fallthrough { request_id }
            | Self::Error { request_id, .. } => *request_id,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    error: &PluginError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A host that keeps every report it receives, in arrival order.
///
/// Used by the CLI and by tests in place of the native core.
#[derive(Debug, Default)]
pub struct RecordingHost {
    reports: Mutex<Vec<Report>>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.lock().clone()
    }

    /// Reports addressed to `request_id`.
    #[must_use]
    pub fn reports_for(&self, request_id: RequestId) -> Vec<Report> {
        self.lock()
            .iter()
            .filter(|r| r.request_id() == request_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Report>> {
        // A poisoned lock still holds every report pushed before the panic.
        self.reports
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ResolverHost for RecordingHost {
    fn on_resolve_async(&self, request_id: RequestId, resolved: Option<ResolvedModule>) {
        let report = match resolved {
            Some(module) => Report::Resolved { request_id, module },
            None => Report::Fallthrough { request_id },
        };
        self.lock().push(report);
    }

    fn add_error(&self, request_id: RequestId, error: PluginError, plugin_index: usize) {
        self.lock().push(Report::Error {
            request_id,
            error,
            plugin_index,
        });
    }
}
