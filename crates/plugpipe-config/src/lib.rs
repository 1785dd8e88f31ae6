//! Layered configuration for the plugpipe command-line tool.
//!
//! Values are merged by `ortho_config` from, in increasing precedence: the
//! built-in defaults, a `plugpipe.toml` configuration file (or the file named
//! by `--config-path` / `PLUGPIPE_CONFIG_PATH`), `PLUGPIPE_*` environment
//! variables, and command-line flags.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, default_codec, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use plugpipe::CodecFormat;

/// Command-line flags owned by the configuration loader.
///
/// These must precede the subcommand on the command line; everything from
/// the first token not listed here onwards belongs to the command.
pub const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--log-filter", "--log-format", "--codec"];

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PLUGPIPE")]
pub struct Config {
    /// `tracing` filter directive, e.g. `plugpipe=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log line format written to stderr.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Document format used for plugin input and output.
    #[serde(default = "default_codec")]
    #[ortho_config(default = default_codec())]
    pub codec: CodecFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            codec: default_codec(),
        }
    }
}

impl Config {
    /// Loads configuration from files, the environment, and the given
    /// command-line arguments (the first item is the program name).
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when any layer fails to
    /// parse.
    pub fn from_args<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = std::ffi::OsString>,
    {
        Self::load_from_iter(args)
    }

    /// Filter directive for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Plugin document format.
    #[must_use]
    pub const fn codec(&self) -> CodecFormat {
        self.codec
    }
}
