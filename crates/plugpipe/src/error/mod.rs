//! Domain errors raised while validating and invoking plugins.
//!
//! Every variant carries the plugin path so callers can report which
//! executable failed. I/O errors are wrapped in `Arc` to satisfy the
//! `result_large_err` Clippy lint and keep the error `Send + Sync`.

use std::path::PathBuf;
use std::sync::Arc;

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::codec::CodecError;

/// Standard stream captured from a plugin process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CapturedStream {
    /// The plugin's standard output (the result document).
    Stdout,
    /// The plugin's standard error (diagnostic text).
    Stderr,
}

/// Errors arising from plugin validation and invocation.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin path does not exist or its metadata could not be read.
    #[error("plugin '{path}' not found: {source}")]
    NotFound {
        /// Path that was checked.
        path: PathBuf,
        /// Underlying metadata error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The plugin path exists but is not a regular file.
    #[error("plugin '{path}' is not a regular file")]
    InvalidPlugin {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The operating system refused to start the plugin process.
    #[error("plugin '{path}' failed to start: {source}")]
    SpawnFailed {
        /// Plugin path.
        path: PathBuf,
        /// Underlying spawn error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The input document could not be serialised.
    #[error("failed to encode input for plugin '{path}': {source}")]
    Encode {
        /// Plugin path.
        path: PathBuf,
        /// Codec failure.
        #[source]
        source: CodecError,
    },

    /// Writing the input document to the plugin's stdin failed.
    #[error("failed to write input to plugin '{path}': {source}")]
    Write {
        /// Plugin path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Closing the plugin's stdin failed.
    #[error("failed to close stdin of plugin '{path}': {source}")]
    Close {
        /// Plugin path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Draining one of the plugin's output streams failed.
    #[error("failed to read {stream} of plugin '{path}': {source}")]
    Read {
        /// Plugin path.
        path: PathBuf,
        /// Stream that could not be read.
        stream: CapturedStream,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The plugin exited with a failure status, or waiting for it failed.
    #[error("plugin '{path}' failed: {reason}: {stderr}")]
    Execution {
        /// Plugin path.
        path: PathBuf,
        /// Exit status or wait failure description.
        reason: String,
        /// Everything the plugin wrote to stderr.
        stderr: String,
    },

    /// The plugin's output document could not be deserialised.
    #[error("failed to decode output of plugin '{path}': {source}")]
    Decode {
        /// Plugin path.
        path: PathBuf,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
}

/// Discriminant of [`PluginError`] for callers that branch on the failure
/// category without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PluginErrorKind {
    /// See [`PluginError::NotFound`].
    NotFound,
    /// See [`PluginError::InvalidPlugin`].
    InvalidPlugin,
    /// See [`PluginError::SpawnFailed`].
    Spawn,
    /// See [`PluginError::Encode`].
    Encode,
    /// See [`PluginError::Write`].
    Write,
    /// See [`PluginError::Close`].
    Close,
    /// See [`PluginError::Read`].
    Read,
    /// See [`PluginError::Execution`].
    Execution,
    /// See [`PluginError::Decode`].
    Decode,
}

impl PluginError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> PluginErrorKind {
        match self {
            Self::NotFound { .. } => PluginErrorKind::NotFound,
            Self::InvalidPlugin { .. } => PluginErrorKind::InvalidPlugin,
            Self::SpawnFailed { .. } => PluginErrorKind::Spawn,
            Self::Encode { .. } => PluginErrorKind::Encode,
            Self::Write { .. } => PluginErrorKind::Write,
            Self::Close { .. } => PluginErrorKind::Close,
            Self::Read { .. } => PluginErrorKind::Read,
            Self::Execution { .. } => PluginErrorKind::Execution,
            Self::Decode { .. } => PluginErrorKind::Decode,
        }
    }

    /// Returns the path of the plugin that produced the error.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path, .. }
            | Self::InvalidPlugin { path }
            | Self::SpawnFailed { path, .. }
            | Self::Encode { path, .. }
            | Self::Write { path, .. }
            | Self::Close { path, .. }
            | Self::Read { path, .. }
            | Self::Execution { path, .. }
            | Self::Decode { path, .. } => path,
        }
    }
}
