//! Configuration loading for the bridge CLI.
//!
//! Configuration flags precede the subcommand. They are split off and handed
//! to `ortho_config`, while the remaining tokens are parsed by clap.

use std::ffi::OsString;

use bridge_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// Flags understood by the configuration loader.
///
/// Kept in step with the fields of [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--daemon-socket",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

/// Arguments partitioned between the configuration loader and clap.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command tokens.
///
/// The program name is copied to both halves. Splitting stops at the first
/// token that is not a configuration flag or its value.
pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut tokens = rest.iter().peekable();
    while let Some(token) = tokens.next_if(|token| config_flag(token).is_some()) {
        config_arguments.push(token.clone());
        if config_flag(token) == Some(true)
            && let Some(value) = tokens.next()
        {
            config_arguments.push(value.clone());
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(tokens.cloned());
    ArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

/// Returns whether `token` is a configuration flag and, if so, whether its
/// value follows as a separate token.
fn config_flag(token: &OsString) -> Option<bool> {
    let text = token.to_str()?;
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text, false),
    };
    CONFIG_CLI_FLAGS
        .contains(&flag)
        .then_some(!inline_value)
}
