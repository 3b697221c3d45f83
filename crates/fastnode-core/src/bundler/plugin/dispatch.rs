//! Running one resolve request through the registered `onResolve` plugins.
//!
//! Plugins for the request's namespace are tried strictly in registration
//! order. The first one whose filter matches and whose callback returns an
//! object wins; a callback returning anything else defers to the next plugin.
//! An object that fails validation, or a callback that fails, ends the
//! request with an error attributed to that plugin's position.

use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::drain::{settle, Settled};
use super::error::{PluginError, ValidationError};
use super::namespace::{validate, PathConvention};
use super::registry::{normalize_namespace, PluginRegistry};
use super::report::{Reporter, ResolverHost};
use super::types::{OnResolveResult, ResolveRequest, ResolvedModule};

/// Final decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(ResolvedModule),
    /// No plugin claimed the specifier.
    Fallthrough,
    Failed {
        error: PluginError,
        plugin_index: usize,
    },
}

/// The resolve pipeline for one bundler instance.
pub struct ResolvePipeline<H> {
    registry: Arc<PluginRegistry>,
    host: H,
    convention: PathConvention,
}

impl<H: ResolverHost> ResolvePipeline<H> {
    pub fn new(registry: Arc<PluginRegistry>, host: H) -> Self {
        Self {
            registry,
            host,
            convention: PathConvention::host(),
        }
    }

    /// Override which absolute-path rules apply to `file` results.
    pub fn with_path_convention(mut self, convention: PathConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Resolve `request` and report the outcome to the host.
    pub async fn run(&self, request: ResolveRequest) {
        let reporter = Reporter::new(&self.host, request.request_id);
        match self.dispatch(&request).await {
            ResolveOutcome::Resolved(module) => reporter.resolved(module),
            ResolveOutcome::Fallthrough => reporter.fallthrough(),
            ResolveOutcome::Failed {
                error,
                plugin_index,
            } => reporter.error(error, plugin_index),
        }
    }

    /// Decide the outcome for `request` without reporting it.
    ///
    /// Only awaits when a callback's future is still pending.
    pub async fn dispatch(&self, request: &ResolveRequest) -> ResolveOutcome {
        let args = request.args();

        for (index, registration) in self.registry.lookup(&request.namespace).iter().enumerate() {
            if !registration.matches(&request.specifier) {
                continue;
            }

            trace!(
                request_id = %request.request_id,
                specifier = %request.specifier,
                plugin = %registration.plugin,
                index,
                "invoking onResolve"
            );

            let Settled {
                result,
                suspensions,
            } = settle((registration.callback)(&args)).await;

            let value = match result {
                Ok(value) => value,
                Err(error) => {
                    return ResolveOutcome::Failed {
                        error: error.with_plugin(&registration.plugin),
                        plugin_index: index,
                    }
                }
            };

            match self.finalize(request, value) {
                Ok(Some(module)) => {
                    trace!(plugin = %registration.plugin, suspensions, "onResolve claimed specifier");
                    return ResolveOutcome::Resolved(module);
                }
                Ok(None) => {}
                Err(source) => {
                    return ResolveOutcome::Failed {
                        error: PluginError::invalid(&registration.plugin, source),
                        plugin_index: index,
                    }
                }
            }
        }

        ResolveOutcome::Fallthrough
    }

    /// Turn a callback's answer into a resolved module, `None` if it declined.
    fn finalize(
        &self,
        request: &ResolveRequest,
        value: Value,
    ) -> Result<Option<ResolvedModule>, ValidationError> {
        let Some(result) = OnResolveResult::from_value(value)? else {
            return Ok(None);
        };

        let path = result.path.unwrap_or_default();
        let namespace = result
            .namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| normalize_namespace(&request.namespace).to_string());
        let external = result.external.unwrap_or(false);

        validate(
            &path,
            &namespace,
            external,
            self.registry.as_ref(),
            self.convention,
        )?;

        Ok(Some(ResolvedModule {
            path,
            namespace,
            external,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::drain::MaybeAsync;
    use super::super::report::{RecordingHost, Report};
    use super::super::types::{ImportKind, OnResolveArgs, RequestId};
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn request(specifier: &str, namespace: &str) -> ResolveRequest {
        ResolveRequest::new(
            RequestId::new(1),
            specifier,
            "/src/index.js",
            namespace,
            ImportKind::ImportStatement,
        )
    }

    fn returning(value: Value) -> super::super::registry::ResolveCallback {
        Arc::new(move |_args: &OnResolveArgs| MaybeAsync::Ready(value.clone()))
    }

    fn pipeline(registry: PluginRegistry) -> ResolvePipeline<RecordingHost> {
        ResolvePipeline::new(Arc::new(registry), RecordingHost::new())
            .with_path_convention(PathConvention::Posix)
    }

    fn outcome_of(registry: PluginRegistry, specifier: &str, namespace: &str) -> ResolveOutcome {
        pipeline(registry)
            .dispatch(&request(specifier, namespace))
            .now_or_never()
            .expect("synchronous plugins should not suspend")
    }

    #[test]
    fn test_first_match_wins_and_later_plugins_are_not_invoked() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();

        for (name, answer) in [
            ("declines", Value::Null),
            ("claims", json!({ "path": "/claimed.js" })),
            ("never", json!({ "path": "/never.js" })),
        ] {
            let calls = Arc::clone(&calls);
            registry
                .register(
                    "file",
                    ".*",
                    name,
                    Arc::new(move |_args: &OnResolveArgs| {
                        calls.lock().unwrap().push(name);
                        MaybeAsync::Ready(answer.clone())
                    }),
                )
                .unwrap();
        }

        let outcome = outcome_of(registry, "x", "file");
        assert_eq!(
            outcome,
            ResolveOutcome::Resolved(ResolvedModule {
                path: "/claimed.js".into(),
                namespace: "file".into(),
                external: false,
            })
        );
        assert_eq!(*calls.lock().unwrap(), ["declines", "claims"]);
    }

    #[test]
    fn test_non_matching_filter_is_not_invoked() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invoked);
        let mut registry = PluginRegistry::new();
        registry
            .register(
                "file",
                "^virtual:",
                "v",
                Arc::new(move |_args: &OnResolveArgs| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    MaybeAsync::Ready(json!({ "path": "/v.js" }))
                }),
            )
            .unwrap();

        assert_eq!(outcome_of(registry, "lodash", "file"), ResolveOutcome::Fallthrough);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_sees_request_view() {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let mut registry = PluginRegistry::new();
        registry
            .register(
                "file",
                ".*",
                "spy",
                Arc::new(move |args: &OnResolveArgs| {
                    *slot.lock().unwrap() = Some(args.clone());
                    MaybeAsync::Ready(Value::Null)
                }),
            )
            .unwrap();

        outcome_of(registry, "./dep", "file");
        let args = seen.lock().unwrap().clone().unwrap();
        assert_eq!(args.path, "./dep");
        assert_eq!(args.importer, "/src/index.js");
        assert_eq!(args.namespace, "file");
        assert_eq!(args.kind, ImportKind::ImportStatement);
        assert!(args.resolve_dir.is_none());
    }

    #[test]
    fn test_namespace_defaults_to_request_namespace() {
        let mut registry = PluginRegistry::new();
        registry.register_loader("virtual");
        registry
            .register("virtual", ".*", "p", returning(json!({ "path": "mod" })))
            .unwrap();
        registry
            .register("virtual", ".*", "p", returning(json!({ "path": "mod", "namespace": "" })))
            .unwrap();

        match outcome_of(registry, "x", "virtual") {
            ResolveOutcome::Resolved(module) => assert_eq!(module.namespace, "virtual"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_empty_request_namespace_is_file() {
        let registry = || {
            let mut registry = PluginRegistry::new();
            registry
                .register("file", "^bad$", "bad", returning(json!({ "path": "relative/../x.js" })))
                .unwrap();
            registry
                .register("file", "^good$", "good", returning(json!({ "path": "/x.js" })))
                .unwrap();
            registry
        };
        // Built without `ResolveRequest::new`, so the namespace stays empty.
        let unnormalized = |specifier: &str| ResolveRequest {
            specifier: specifier.to_string(),
            importer: "/src/index.js".to_string(),
            namespace: String::new(),
            kind: ImportKind::ImportStatement,
            request_id: RequestId::new(1),
        };

        let outcome = pipeline(registry())
            .dispatch(&unnormalized("bad"))
            .now_or_never()
            .unwrap();
        assert!(matches!(
            outcome,
            ResolveOutcome::Failed {
                error: PluginError::Invalid {
                    source: ValidationError::NotAbsolute { .. },
                    ..
                },
                plugin_index: 0,
            }
        ));

        let outcome = pipeline(registry())
            .dispatch(&unnormalized("good"))
            .now_or_never()
            .unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::Resolved(ResolvedModule {
                path: "/x.js".into(),
                namespace: "file".into(),
                external: false,
            })
        );
    }

    #[test]
    fn test_validation_failure_is_fatal_not_fallthrough() {
        let mut registry = PluginRegistry::new();
        registry
            .register("file", ".*", "bad", returning(json!({ "path": "relative/file.js" })))
            .unwrap();
        registry
            .register("file", ".*", "good", returning(json!({ "path": "/ok.js" })))
            .unwrap();

        match outcome_of(registry, "x", "file") {
            ResolveOutcome::Failed {
                error,
                plugin_index,
            } => {
                assert_eq!(plugin_index, 0);
                assert_eq!(error.plugin(), "bad");
                assert!(matches!(
                    error,
                    PluginError::Invalid {
                        source: ValidationError::NotAbsolute { .. },
                        ..
                    }
                ));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_external_type_is_error() {
        let mut registry = PluginRegistry::new();
        registry
            .register("file", ".*", "p", returning(json!({ "path": "/a.js", "external": 1 })))
            .unwrap();

        assert!(matches!(
            outcome_of(registry, "x", "file"),
            ResolveOutcome::Failed {
                error: PluginError::Invalid {
                    source: ValidationError::Shape(_),
                    ..
                },
                plugin_index: 0,
            }
        ));
    }

    #[test]
    fn test_rejection_reports_plugin_index() {
        let mut registry = PluginRegistry::new();
        registry
            .register("file", "^other$", "skipped", returning(Value::Null))
            .unwrap();
        registry
            .register(
                "file",
                ".*",
                "fails",
                Arc::new(|_args: &OnResolveArgs| {
                    MaybeAsync::from_future(async { Err(PluginError::rejected("disk on fire")) })
                }),
            )
            .unwrap();

        let pipeline = pipeline(registry);
        pipeline
            .run(request("x", "file"))
            .now_or_never()
            .expect("settled rejection should not suspend");

        assert_eq!(
            pipeline.host().reports(),
            vec![Report::Error {
                request_id: RequestId::new(1),
                error: PluginError::Rejected {
                    plugin: "fails".into(),
                    message: "disk on fire".into(),
                },
                plugin_index: 1,
            }]
        );
    }

    #[test]
    fn test_external_result_skips_loader_check() {
        let mut registry = PluginRegistry::new();
        registry
            .register(
                "file",
                ".*",
                "p",
                returning(json!({ "path": "x", "namespace": "custom-ns", "external": true })),
            )
            .unwrap();

        assert_eq!(
            outcome_of(registry, "x", "file"),
            ResolveOutcome::Resolved(ResolvedModule {
                path: "x".into(),
                namespace: "custom-ns".into(),
                external: true,
            })
        );
    }

    #[tokio::test]
    async fn test_pending_future_is_awaited() {
        let mut registry = PluginRegistry::new();
        registry
            .register(
                "file",
                ".*",
                "slow",
                Arc::new(|_args: &OnResolveArgs| {
                    MaybeAsync::pending(async {
                        tokio::task::yield_now().await;
                        MaybeAsync::Ready(json!({ "path": "/slow.js" }))
                    })
                }),
            )
            .unwrap();

        let pipeline = pipeline(registry);
        pipeline.run(request("x", "file")).await;
        assert_eq!(pipeline.host().reports().len(), 1);
        assert!(matches!(
            &pipeline.host().reports()[0],
            Report::Resolved { module, .. } if module.path == "/slow.js"
        ));
    }
}
