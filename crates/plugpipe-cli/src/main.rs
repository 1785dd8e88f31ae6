//! CLI entrypoint for plugpipe.
//!
//! The binary delegates to [`plugpipe_cli::run`], which loads configuration,
//! parses the command, and runs or checks the requested plugin.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    plugpipe_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
