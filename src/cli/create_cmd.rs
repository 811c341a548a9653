// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! `create` subcommand: write a datafile from a module source.

use std::path::PathBuf;

use crate::cli::{split_args, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
use crate::Pico;

const USAGE: &str = "usage: pico-cli create <codefile> <datafile> [--arg JSON]... [--existing DATAFILE]";

#[derive(Debug, PartialEq)]
struct CreateArgs {
    code: PathBuf,
    output: PathBuf,
    factory_args: Vec<serde_json::Value>,
    existing: Option<PathBuf>,
}

fn parse(args: &[String]) -> Result<CreateArgs, String> {
    let parsed = split_args(args, &["--arg", "--existing"], &[])?;
    let [code, output] = parsed.positionals.as_slice() else {
        return Err("expected <codefile> and <datafile>".to_string());
    };
    let factory_args = parsed
        .values_of("--arg")
        .into_iter()
        .map(|raw| {
            serde_json::from_str(raw).map_err(|e| format!("--arg '{}' is not valid JSON: {}", raw, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CreateArgs {
        code: PathBuf::from(*code),
        output: PathBuf::from(*output),
        factory_args,
        existing: parsed.value_of("--existing").map(PathBuf::from),
    })
}

/// Run `create`. Returns 0 on success, 1 on failure, 2 on usage errors.
pub fn run_create(pico: &Pico, args: &[String]) -> i32 {
    let parsed = match parse(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("{}", USAGE);
            return EXIT_USAGE;
        }
    };

    match pico.create(
        &parsed.code,
        &parsed.output,
        &parsed.factory_args,
        parsed.existing.as_deref(),
    ) {
        Ok(report) => {
            println!("Wrote {}", report.output_path.display());
            println!("  logical name: {}", report.logical_name);
            println!("  version:      {}", report.format_version);
            println!("  bytes:        {}", report.bytes_written);
            if report.reused {
                println!("  model reused from existing datafile");
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}
