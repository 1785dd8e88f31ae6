//! Configuration loading helpers for the plugpipe CLI.
//!
//! Configuration flags come before the subcommand. The split here hands those
//! flags to `ortho_config` and leaves the remaining tokens for clap, so plugin
//! arguments after `--` are never mistaken for configuration.

use std::ffi::{OsStr, OsString};

use plugpipe_config::{CONFIG_CLI_FLAGS, Config};

use crate::errors::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration-flag subset of the command
    /// line (program name first).
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::from_args(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let argument_text = argument.to_string_lossy();
    if !argument_text.starts_with("--") {
        return FlagAction::Skip;
    }

    let (flag, has_inline_value) = match argument_text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*argument_text, false),
    };

    if CONFIG_CLI_FLAGS.contains(&flag) {
        return FlagAction::Include {
            needs_value: !has_inline_value,
        };
    }

    FlagAction::Skip
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command tokens. Both halves
/// keep the program name as their first element.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut tokens = args.iter();
    let Some(program) = tokens.next() else {
        return ConfigArgumentSplit::default();
    };

    let mut split = ConfigArgumentSplit {
        config_arguments: vec![program.clone()],
        command_arguments: vec![program.clone()],
    };
    let mut pending_value = false;

    while let Some(argument) = tokens.next() {
        if pending_value {
            split.config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }

        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                split.config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            FlagAction::Skip => {
                split.command_arguments.push(argument.clone());
                split.command_arguments.extend(tokens.by_ref().cloned());
                break;
            }
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--log-filter", FlagAction::Include { needs_value: true })]
    #[case("--codec", FlagAction::Include { needs_value: true })]
    #[case("run", FlagAction::Skip)]
    #[case("--input", FlagAction::Skip)]
    fn classifies_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(process_config_flag(OsStr::new(argument)), expected);
    }

    #[test]
    fn splits_leading_configuration_flags() {
        let split = split_config_arguments(&os(&[
            "plugpipe",
            "--codec",
            "json",
            "--log-filter=debug",
            "run",
            "/bin/cat",
            "--",
            "--codec",
            "yaml",
        ]));
        assert_eq!(
            split.config_arguments,
            os(&["plugpipe", "--codec", "json", "--log-filter=debug"])
        );
        assert_eq!(
            split.command_arguments,
            os(&["plugpipe", "run", "/bin/cat", "--", "--codec", "yaml"])
        );
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_config_arguments(&[]), ConfigArgumentSplit::default());
    }

    #[test]
    fn program_only_keeps_program_in_both_halves() {
        let split = split_config_arguments(&os(&["plugpipe"]));
        assert_eq!(split.config_arguments, os(&["plugpipe"]));
        assert_eq!(split.command_arguments, os(&["plugpipe"]));
    }
}
