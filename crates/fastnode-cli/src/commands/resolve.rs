//! `howth resolve` command implementation.
//!
//! Runs one specifier through the configured `onResolve` plugins and prints
//! what the native core would have been told.

use fastnode_core::bundler::plugin::{
    ImportKind, RecordingHost, Report, RequestId, ResolvePipeline, ResolveRequest,
};
use fastnode_core::version::RESOLVE_SCHEMA_VERSION;
use fastnode_core::Config;
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Resolve command action.
#[derive(Debug, Clone)]
pub struct ResolveAction {
    /// Import specifier to resolve.
    pub specifier: String,
    /// Referencing module (empty for entry points).
    pub importer: String,
    /// Namespace of the importer.
    pub namespace: String,
    /// How the specifier is imported.
    pub kind: ImportKind,
}

/// JSON output for resolve command.
#[derive(Serialize)]
struct ResolveResultJson {
    schema_version: u32,
    ok: bool,
    specifier: String,
    #[serde(flatten)]
    report: Report,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

/// Run the resolve command.
pub fn run(action: ResolveAction, config: &Config, json: bool) -> Result<()> {
    let start = Instant::now();

    let plugins = config.load_plugins().into_diagnostic()?;
    let registry = plugins.build_registry(&config.cwd).into_diagnostic()?;
    debug!(
        namespace = %action.namespace,
        matches = registry.any_matches(&action.namespace, &action.specifier),
        "Loaded resolve plugins"
    );

    let pipeline = ResolvePipeline::new(Arc::new(registry), RecordingHost::new())
        .with_path_convention(plugins.path_convention());
    let request = ResolveRequest::new(
        RequestId::new(1),
        action.specifier.clone(),
        action.importer,
        action.namespace,
        action.kind,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(pipeline.run(request));

    let duration_ms = start.elapsed().as_millis() as u64;

    let report = pipeline
        .host()
        .reports()
        .into_iter()
        .next()
        .ok_or_else(|| miette!("resolve pipeline finished without reporting"))?;

    let (ok, error_code) = match &report {
        Report::Error { error, .. } => (false, Some(error.code())),
        _ => (true, None),
    };

    if json {
        let json_result = ResolveResultJson {
            schema_version: RESOLVE_SCHEMA_VERSION,
            ok,
            specifier: action.specifier,
            report,
            duration_ms,
            error_code,
        };
        println!("{}", serde_json::to_string(&json_result).into_diagnostic()?);
    } else {
        match &report {
            Report::Resolved { module, .. } => {
                let external = if module.external { " (external)" } else { "" };
                println!(
                    "  {} -> {}:{}{}",
                    action.specifier, module.namespace, module.path, external
                );
            }
            Report::Fallthrough { .. } => {
                println!("  {} -> (default resolver)", action.specifier);
            }
            Report::Error {
                error,
                plugin_index,
                ..
            } => {
                eprintln!("error: {error}");
                eprintln!("  at plugin #{plugin_index}");
            }
        }
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
