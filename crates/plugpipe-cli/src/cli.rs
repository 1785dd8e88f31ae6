//! Command-line grammar.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "plugpipe",
    version,
    about = "Run an executable as a one-shot plugin over its standard streams",
    after_help = "Configuration flags (--config-path, --log-filter, --log-format, --codec) \
                  must precede the command."
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Check that a path names a regular file usable as a plugin.
    Check {
        /// Path to the plugin executable.
        plugin: PathBuf,
    },
    /// Send one document to a plugin and print the document it returns.
    Run {
        /// Path to the plugin executable.
        plugin: PathBuf,
        /// Read the input document from this file instead of stdin.
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Arguments passed verbatim to the plugin.
        #[arg(last = true, value_name = "ARGS")]
        arguments: Vec<String>,
    },
}
