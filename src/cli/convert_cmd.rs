// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! `convert` subcommand: rewrite a datafile in the current container layout.

use std::path::PathBuf;

use crate::cli::{split_args, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
use crate::Pico;

const USAGE: &str = "usage: pico-cli convert <datafile> [--code FILE]";

fn parse(args: &[String]) -> Result<(PathBuf, Option<PathBuf>), String> {
    let parsed = split_args(args, &["--code"], &[])?;
    let [datafile] = parsed.positionals.as_slice() else {
        return Err("expected exactly one <datafile>".to_string());
    };
    Ok((
        PathBuf::from(*datafile),
        parsed.value_of("--code").map(PathBuf::from),
    ))
}

/// Run `convert`. Prints the path of the converted datafile.
pub fn run_convert(pico: &Pico, args: &[String]) -> i32 {
    let (datafile, code) = match parse(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("{}", USAGE);
            return EXIT_USAGE;
        }
    };

    match pico.converter().convert(&datafile, code.as_deref()) {
        Ok(report) => {
            println!("Wrote {}", report.output_path.display());
            println!(
                "  container revision {} -> {}",
                report.from_revision, report.to_revision
            );
            if report.version_stamped {
                println!("  stamped PICO version {}", report.format_version);
            }
            if report.code_replaced {
                println!("  code replaced");
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}
