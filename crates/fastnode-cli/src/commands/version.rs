use fastnode_core::version::{version_string, RESOLVE_SCHEMA_VERSION, VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// JSON output for version command.
#[derive(Serialize)]
struct VersionJson {
    version: &'static str,
    resolve_schema_version: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let out = VersionJson {
            version: VERSION,
            resolve_schema_version: RESOLVE_SCHEMA_VERSION,
        };
        println!("{}", serde_json::to_string(&out).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
