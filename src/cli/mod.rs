// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for `pico-cli` commands.
//!
//! Every command runs in-process against a [`Pico`](crate::Pico) runtime and
//! returns a process exit code.
//!
//! ## Usage
//!
//! ```bash
//! pico-cli create model.toml model.dat --arg 2.0
//! pico-cli info model.dat
//! pico-cli eval model.dat x=1.5
//! pico-cli convert legacy.dat
//! ```

pub mod config_cmd;
pub mod convert_cmd;
pub mod create_cmd;
pub mod eval_cmd;
pub mod info_cmd;

pub use config_cmd::{run_defaults, run_show};
pub use convert_cmd::run_convert;
pub use create_cmd::run_create;
pub use eval_cmd::run_eval;
pub use info_cmd::run_info;

/// Exit code for a successful command.
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed operation.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for malformed command lines.
pub const EXIT_USAGE: i32 = 2;

/// Split `args` into positionals and `--flag VALUE` pairs.
///
/// `value_flags` lists flags that take a value; `switches` lists flags that
/// don't. Anything else starting with `--` is rejected.
pub(crate) fn split_args<'a>(
    args: &'a [String],
    value_flags: &[&str],
    switches: &[&str],
) -> Result<ParsedArgs<'a>, String> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if value_flags.contains(&arg.as_str()) {
            let value = iter
                .next()
                .ok_or_else(|| format!("{} requires a value", arg))?;
            parsed.values.push((arg.as_str(), value.as_str()));
        } else if switches.contains(&arg.as_str()) {
            parsed.switches.push(arg.as_str());
        } else if arg.starts_with("--") {
            return Err(format!("unknown option '{}'", arg));
        } else {
            parsed.positionals.push(arg.as_str());
        }
    }
    Ok(parsed)
}

#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positionals: Vec<&'a str>,
    pub values: Vec<(&'a str, &'a str)>,
    pub switches: Vec<&'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// All values given for `flag`, in order.
    pub fn values_of(&self, flag: &str) -> Vec<&'a str> {
        self.values
            .iter()
            .filter(|(f, _)| *f == flag)
            .map(|(_, v)| *v)
            .collect()
    }

    /// The last value given for `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&'a str> {
        self.values
            .iter()
            .rev()
            .find(|(f, _)| *f == flag)
            .map(|(_, v)| *v)
    }

    pub fn has(&self, switch: &str) -> bool {
        self.switches.contains(&switch)
    }
}
