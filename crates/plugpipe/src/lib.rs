//! One-shot out-of-process plugins over standard streams.
//!
//! A plugin is any executable that reads a single serialised document from
//! its stdin, writes a single serialised document to its stdout, and exits.
//! Diagnostic text goes to stderr, which is captured and surfaced alongside
//! errors but never parsed.
//!
//! Using a plugin takes two steps:
//!
//! 1. [`PluginHandle::load`] validates that the path names a regular file.
//! 2. [`PluginHandle::invoke`] spawns it, writes the encoded input, waits for
//!    it to exit, and decodes its output into a caller-supplied target.
//!
//! Documents are YAML by default; any [`Codec`] can be plugged in with
//! [`PluginHandle::load_with_codec`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use plugpipe::{Json, PluginHandle};
//!
//! # fn main() -> Result<(), plugpipe::PluginError> {
//! let mut handle = PluginHandle::load_with_codec("/usr/bin/jq-filter", Json)?;
//! let mut result: BTreeMap<String, u32> = BTreeMap::new();
//! handle.invoke(&BTreeMap::from([("hits", 3)]), &mut result, &[".hits"])?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod handle;
mod process;

#[cfg(test)]
mod tests;

pub use self::codec::{Codec, CodecError, CodecFormat, Json, Yaml};
pub use self::error::{CapturedStream, PluginError, PluginErrorKind};
pub use self::handle::{InvocationState, PluginHandle};
