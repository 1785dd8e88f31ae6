//! Pipe plumbing for a single plugin process.
//!
//! [`communicate`] feeds the child's stdin on the calling thread while two
//! scoped threads drain stdout and stderr into memory. Draining concurrently
//! keeps a plugin that writes a large response before it has consumed all of
//! its input from blocking on a full pipe while we block writing to it.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ExitStatus};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::error::PluginError;

/// Tracing target for plugin process operations.
pub(crate) const PROCESS_TARGET: &str = "plugpipe::process";

/// Everything observed from one plugin process after it has been reaped.
pub(crate) struct Outcome {
    /// Result of feeding stdin (encode, write, close).
    pub(crate) input: Result<(), PluginError>,
    /// Exit status, or the error returned while waiting.
    pub(crate) status: io::Result<ExitStatus>,
    /// Bytes captured from stdout.
    pub(crate) stdout: io::Result<Vec<u8>>,
    /// Bytes captured from stderr.
    pub(crate) stderr: io::Result<Vec<u8>>,
}

/// Runs `feed` against the child's stdin, reaps the child, and collects both
/// output streams.
///
/// The child is always waited on, whatever `feed` returns. `feed` takes
/// ownership of stdin so the pipe is closed on every exit path, at the latest
/// when `feed` returns.
pub(crate) fn communicate<F>(child: &mut Child, feed: F) -> Outcome
where
    F: FnOnce(ChildStdin) -> Result<(), PluginError>,
{
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| {
        let stdout_reader = scope.spawn(move || drain(stdout));
        let stderr_reader = scope.spawn(move || drain(stderr));

        let input = match stdin {
            Some(pipe) => feed(pipe),
            None => Ok(()),
        };

        let status = child.wait();
        debug!(target: PROCESS_TARGET, ?status, "plugin process reaped");

        Outcome {
            input,
            status,
            stdout: join(stdout_reader),
            stderr: join(stderr_reader),
        }
    })
}

/// Writes the whole input document to the plugin.
///
/// A plugin may legitimately exit without reading its input; the resulting
/// broken pipe is not an error here because the exit status decides the
/// outcome of the call.
pub(crate) fn write_input(
    path: &Path,
    stdin: &mut impl Write,
    bytes: &[u8],
) -> Result<(), PluginError> {
    match stdin.write_all(bytes) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(
                target: PROCESS_TARGET,
                plugin = %path.display(),
                "plugin closed stdin before reading all input"
            );
            Ok(())
        }
        Err(err) => Err(PluginError::Write {
            path: path.to_path_buf(),
            source: Arc::new(err),
        }),
    }
}

/// Flushes and drops stdin, signalling end of input to the plugin.
pub(crate) fn close_input(path: &Path, mut stdin: ChildStdin) -> Result<(), PluginError> {
    let flushed = stdin.flush();
    drop(stdin);
    match flushed {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(PluginError::Close {
            path: path.to_path_buf(),
            source: Arc::new(err),
        }),
    }
}

fn drain(stream: Option<impl Read>) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = stream {
        reader.read_to_end(&mut buffer)?;
    }
    Ok(buffer)
}

fn join(reader: thread::ScopedJoinHandle<'_, io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    reader
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stream reader thread panicked")))
}
