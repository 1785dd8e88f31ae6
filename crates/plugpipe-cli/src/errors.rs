//! Error type for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use plugpipe::{CodecError, PluginError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read input document from {}: {source}", origin.display())]
    ReadInput { origin: PathBuf, source: io::Error },
    #[error("failed to parse input document: {0}")]
    ParseInput(CodecError),
    #[error("failed to render plugin output: {0}")]
    RenderOutput(CodecError),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
