#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use fastnode_core::bundler::plugin::{ImportKind, FILE_NAMESPACE};
use fastnode_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "howth")]
#[command(author, version, about = "Run import specifiers through bundler resolve plugins", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Plugin manifest (defaults to howth.plugins.json in the working directory)
    #[arg(long, global = true, value_name = "FILE", env = "HOWTH_PLUGINS")]
    plugins: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve an import specifier through the configured plugins
    Resolve {
        /// The import specifier (e.g., "@/utils", "virtual:env", "lodash")
        specifier: String,

        /// Module that contains the import (empty for entry points)
        #[arg(long, default_value = "")]
        importer: String,

        /// Namespace of the importing module
        #[arg(long, default_value = FILE_NAMESPACE)]
        namespace: String,

        /// Import kind (import-statement, require-call, dynamic-import, ...)
        #[arg(long, default_value = "import-statement")]
        kind: ImportKind,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Build config
    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_plugins_file(cli.plugins);

    match cli.command {
        None | Some(Commands::Version) => commands::version::run(cli.json),
        Some(Commands::Resolve {
            specifier,
            importer,
            namespace,
            kind,
        }) => {
            logging::init(&config);
            commands::resolve::run(
                commands::resolve::ResolveAction {
                    specifier,
                    importer,
                    namespace,
                    kind,
                },
                &config,
                cli.json,
            )
        }
    }
}
