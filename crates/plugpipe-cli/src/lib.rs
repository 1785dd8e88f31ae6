//! Command-line runtime for plugpipe.
//!
//! `plugpipe check <PLUGIN>` validates a plugin path. `plugpipe run <PLUGIN>`
//! reads one document from a file or stdin, hands it to the plugin, and
//! writes the plugin's answer to stdout, re-encoded in the configured format.
//! Whatever the plugin wrote to stderr is forwarded to stderr.
//!
//! IO streams and configuration loading are parameters so the runtime can be
//! driven from tests without touching the process's own streams.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use plugpipe::{Codec, CodecFormat, PluginHandle};
use plugpipe_config::Config;
use serde_json::Value;
use tracing::info;

mod cli;
mod config;
mod errors;
pub mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

/// Tracing target for CLI operations.
const CLI_TARGET: &str = "plugpipe::cli";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R: Read, W: Write, E: Write> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams {
        stdin,
        stdout,
        stderr,
    };
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            // --help and --version are successful outcomes on stdout.
            return match write!(io.stdout, "{error}") {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => return report(&mut *io.stderr, &AppError::CliUsage(error)),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| {
            telemetry::initialise(&config)?;
            Ok(config)
        })
        .and_then(|config| execute(cli.command, &config, io));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(&mut *io.stderr, &error),
    }
}

fn report(stderr: &mut impl Write, error: &AppError) -> ExitCode {
    drop(writeln!(stderr, "plugpipe: {error}"));
    ExitCode::FAILURE
}

fn execute<R, W, E>(
    command: CliCommand,
    config: &Config,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<(), AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    match command {
        CliCommand::Check { plugin } => {
            let handle = PluginHandle::load_with_codec(plugin, config.codec())?;
            writeln!(io.stdout, "ok: {}", handle.path().display()).map_err(AppError::WriteOutput)
        }
        CliCommand::Run {
            plugin,
            input,
            arguments,
        } => run_plugin(&plugin, input.as_deref(), &arguments, config.codec(), io),
    }
}

fn run_plugin<R, W, E>(
    plugin: &Path,
    input: Option<&Path>,
    arguments: &[String],
    codec: CodecFormat,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<(), AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let document = read_input(input, &mut *io.stdin)?;
    let mut request = Value::Null;
    codec
        .decode_into(&document, &mut request)
        .map_err(AppError::ParseInput)?;

    let mut handle = PluginHandle::load_with_codec(plugin, codec)?;
    let mut response = Value::Null;
    let outcome = handle.invoke(&request, &mut response, arguments);

    // Plugin diagnostics are useful whether or not the call succeeded.
    if !handle.error_output().is_empty() {
        io.stderr
            .write_all(handle.error_output().as_bytes())
            .map_err(AppError::WriteOutput)?;
    }
    outcome?;

    info!(
        target: CLI_TARGET,
        plugin = %plugin.display(),
        state = %handle.state(),
        "plugin run complete"
    );

    let rendered = codec.encode(&response).map_err(AppError::RenderOutput)?;
    io.stdout.write_all(&rendered).map_err(AppError::WriteOutput)?;
    io.stdout.flush().map_err(AppError::WriteOutput)
}

fn read_input(input: Option<&Path>, stdin: &mut impl Read) -> Result<Vec<u8>, AppError> {
    match input {
        Some(path) => fs::read(path).map_err(|source| AppError::ReadInput {
            origin: path.to_path_buf(),
            source,
        }),
        None => {
            let mut buffer = Vec::new();
            stdin
                .read_to_end(&mut buffer)
                .map_err(|source| AppError::ReadInput {
                    origin: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(buffer)
        }
    }
}
