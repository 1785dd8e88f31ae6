//! Plugin handles: validation of a plugin path and one-shot invocation.
//!
//! A [`PluginHandle`] binds a validated executable path to a codec. Each
//! [`PluginHandle::invoke`] call spawns the executable with the supplied
//! arguments, writes one encoded input document to its stdin, closes the
//! pipe, waits for the process to exit, and decodes its stdout into the
//! caller's output target. Whatever the plugin wrote to stderr is kept on the
//! handle until the next invocation.
//!
//! # Example
//!
//! ```rust,no_run
//! use plugpipe::PluginHandle;
//!
//! # fn main() -> Result<(), plugpipe::PluginError> {
//! let mut handle = PluginHandle::load("/usr/local/bin/summarise")?;
//! let mut summary: Vec<String> = Vec::new();
//! handle.invoke(&vec!["alpha", "beta"], &mut summary, &["--verbose"])?;
//! assert!(handle.error_output().is_empty());
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::Display;
use tracing::{debug, warn};

use crate::codec::{Codec, Yaml};
use crate::error::{CapturedStream, PluginError};
use crate::process::{self, Outcome};

/// Tracing target for handle operations.
const HANDLE_TARGET: &str = "plugpipe::handle";

/// Progress of the most recent invocation on a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum InvocationState {
    /// No invocation has run since the handle was validated.
    #[default]
    Idle,
    /// The process is being spawned.
    Spawning,
    /// The process is running.
    Started,
    /// The encoded input has been written to stdin.
    InputWritten,
    /// Stdin has been closed.
    InputClosed,
    /// The process has exited and been reaped.
    Waited,
    /// The output document was decoded; the call succeeded.
    Decoded,
    /// The call failed.
    Failed,
}

impl InvocationState {
    /// Returns `true` for [`Decoded`](Self::Decoded) and
    /// [`Failed`](Self::Failed).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Decoded | Self::Failed)
    }
}

/// Transient state of the most recent invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Invocation {
    arguments: Vec<String>,
    error_output: String,
    state: InvocationState,
}

impl Invocation {
    /// Discards everything from the previous invocation.
    fn reset<A: AsRef<str>>(&mut self, arguments: &[A]) {
        *self = Self {
            arguments: arguments.iter().map(|arg| arg.as_ref().to_owned()).collect(),
            ..Self::default()
        };
    }

    fn advance(&mut self, state: InvocationState) {
        debug!(target: HANDLE_TARGET, from = %self.state, to = %state, "invocation state");
        self.state = state;
    }
}

/// A validated plugin executable and the state of its latest invocation.
///
/// Only one invocation runs at a time: [`invoke`](Self::invoke) takes
/// `&mut self`. Callers needing parallel calls use one handle per call.
#[derive(Debug, Clone)]
pub struct PluginHandle<C = Yaml> {
    path: PathBuf,
    codec: C,
    invocation: Invocation,
}

impl PluginHandle<Yaml> {
    /// Validates `path` and binds it to the YAML codec.
    ///
    /// # Errors
    ///
    /// See [`load_with_codec`](Self::load_with_codec).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PluginError> {
        Self::load_with_codec(path, Yaml)
    }
}

impl<C: Codec> PluginHandle<C> {
    /// Validates `path` and binds it to `codec`.
    ///
    /// Only the entry's metadata is read; the file is neither opened nor
    /// executed. Whether the file is actually executable is left to the
    /// operating system at spawn time.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] when the metadata cannot be read and
    /// [`PluginError::InvalidPlugin`] when the entry is not a regular file.
    pub fn load_with_codec(path: impl Into<PathBuf>, codec: C) -> Result<Self, PluginError> {
        let plugin_path = path.into();
        let metadata = fs::metadata(&plugin_path).map_err(|source| PluginError::NotFound {
            path: plugin_path.clone(),
            source: Arc::new(source),
        })?;

        if !metadata.is_file() {
            return Err(PluginError::InvalidPlugin { path: plugin_path });
        }

        debug!(
            target: HANDLE_TARGET,
            plugin = %plugin_path.display(),
            format = %codec.format(),
            "plugin validated"
        );

        Ok(Self {
            path: plugin_path,
            codec,
            invocation: Invocation::default(),
        })
    }

    /// Runs the plugin once.
    ///
    /// `input` is encoded and written to the plugin's stdin; on success the
    /// document the plugin wrote to stdout replaces `*output`. An empty
    /// stdout leaves `*output` untouched. `arguments` are passed to the
    /// process verbatim, without any shell interpretation.
    ///
    /// Any state left by a previous call is discarded first. On failure
    /// `*output` must not be relied upon.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SpawnFailed`] if the process cannot start,
    /// [`PluginError::Encode`], [`PluginError::Write`] or
    /// [`PluginError::Close`] if the input cannot be delivered,
    /// [`PluginError::Read`] if an output stream cannot be drained,
    /// [`PluginError::Execution`] if the process exits unsuccessfully, and
    /// [`PluginError::Decode`] if stdout is not a valid document.
    pub fn invoke<I, O, A>(
        &mut self,
        input: &I,
        output: &mut O,
        arguments: &[A],
    ) -> Result<(), PluginError>
    where
        I: Serialize,
        O: DeserializeOwned,
        A: AsRef<str>,
    {
        self.invocation.reset(arguments);
        let result = self.run(input, output);
        match &result {
            Ok(()) => self.invocation.advance(InvocationState::Decoded),
            Err(error) => {
                warn!(
                    target: HANDLE_TARGET,
                    plugin = %self.path.display(),
                    kind = %error.kind(),
                    %error,
                    "plugin invocation failed"
                );
                self.invocation.advance(InvocationState::Failed);
            }
        }
        result
    }

    fn run<I, O>(&mut self, input: &I, output: &mut O) -> Result<(), PluginError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        self.invocation.advance(InvocationState::Spawning);
        let mut command = Command::new(&self.path);
        command
            .args(&self.invocation.arguments)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            target: HANDLE_TARGET,
            plugin = %self.path.display(),
            arguments = ?self.invocation.arguments,
            "spawning plugin process"
        );

        let mut child = command
            .spawn()
            .map_err(|source| PluginError::SpawnFailed {
                path: self.path.clone(),
                source: Arc::new(source),
            })?;
        self.invocation.advance(InvocationState::Started);

        let path = self.path.as_path();
        let codec = &self.codec;
        let invocation = &mut self.invocation;
        let Outcome {
            input: delivered,
            status,
            stdout: stdout_bytes,
            stderr: stderr_bytes,
        } = process::communicate(&mut child, |mut stdin| {
            let bytes = codec.encode(input).map_err(|source| PluginError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(
                target: HANDLE_TARGET,
                plugin = %path.display(),
                input_bytes = bytes.len(),
                "writing input document"
            );
            process::write_input(path, &mut stdin, &bytes)?;
            invocation.advance(InvocationState::InputWritten);
            process::close_input(path, stdin)?;
            invocation.advance(InvocationState::InputClosed);
            Ok(())
        });

        let stderr_text = stderr_bytes.map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        if let Ok(text) = &stderr_text {
            self.invocation.error_output.clone_from(text);
        }
        if let Ok(exit) = &status {
            debug!(target: HANDLE_TARGET, plugin = %path.display(), status = %exit, "plugin exited");
        }

        delivered?;
        let stderr =
            stderr_text.map_err(|source| self.read_error(CapturedStream::Stderr, source))?;

        let exit = status.map_err(|source| PluginError::Execution {
            path: self.path.clone(),
            reason: source.to_string(),
            stderr: stderr.clone(),
        })?;
        self.invocation.advance(InvocationState::Waited);
        if !exit.success() {
            return Err(PluginError::Execution {
                path: self.path.clone(),
                reason: exit.to_string(),
                stderr,
            });
        }

        let stdout =
            stdout_bytes.map_err(|source| self.read_error(CapturedStream::Stdout, source))?;
        let replaced =
            self.codec
                .decode_into(&stdout, output)
                .map_err(|source| PluginError::Decode {
                    path: self.path.clone(),
                    source,
                })?;
        debug!(
            target: HANDLE_TARGET,
            plugin = %self.path.display(),
            output_bytes = stdout.len(),
            replaced,
            "decoded output document"
        );
        Ok(())
    }

    fn read_error(&self, stream: CapturedStream, source: std::io::Error) -> PluginError {
        PluginError::Read {
            path: self.path.clone(),
            stream,
            source: Arc::new(source),
        }
    }

    /// Path of the plugin executable.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Codec used for input and output documents.
    #[must_use]
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Arguments passed to the most recent invocation.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.invocation.arguments
    }

    /// Text the plugin wrote to stderr during the most recent invocation.
    ///
    /// Populated whenever the process was started, including calls that
    /// later failed.
    #[must_use]
    pub const fn error_output(&self) -> &str {
        self.invocation.error_output.as_str()
    }

    /// Progress of the most recent invocation.
    #[must_use]
    pub const fn state(&self) -> InvocationState {
        self.invocation.state
    }
}
