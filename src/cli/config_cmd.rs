// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig, EnvConfig};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    print_config(&EnvConfig::default().effective_config());
}

fn print_config(cfg: &EffectiveConfig) {
    for line in render_config(cfg) {
        println!("{}", line);
    }
}

fn render_config(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("PICO_CHECK_VERSION={}", cfg.check_version),
        format!("PICO_VERBOSE={}", cfg.verbose),
        format!("PICO_FACTORY_ENTRY={}", cfg.factory_entry),
        format!("PICO_CONVERTED_SUFFIX={}", cfg.converted_suffix),
        format!("PICO_LOG_LEVEL={}", cfg.log_level),
        format!("PICO_LOG_FORMAT={}", cfg.log_format),
        format!("PICO_LOG_FILE={}", cfg.log_file.as_deref().unwrap_or("")),
    ]
}
