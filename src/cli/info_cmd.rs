// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! `info` subcommand: load a datafile and describe it.

use std::path::PathBuf;

use crate::cli::{split_args, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
use crate::models::{CodeOrigin, Provenance};
use crate::{LoadedModel, Pico};

const USAGE: &str = "usage: pico-cli info <datafile> [--no-version-check] [--module FILE]";

#[derive(Debug, PartialEq)]
struct InfoArgs {
    datafile: PathBuf,
    module: Option<PathBuf>,
    check_version: bool,
}

fn parse(args: &[String]) -> Result<InfoArgs, String> {
    let parsed = split_args(args, &["--module"], &["--no-version-check"])?;
    let [datafile] = parsed.positionals.as_slice() else {
        return Err("expected exactly one <datafile>".to_string());
    };
    Ok(InfoArgs {
        datafile: PathBuf::from(*datafile),
        module: parsed.value_of("--module").map(PathBuf::from),
        check_version: !parsed.has("--no-version-check"),
    })
}

/// Run `info`. Returns 0 on success, 1 on failure, 2 on usage errors.
pub fn run_info(pico: &Pico, args: &[String]) -> i32 {
    let parsed = match parse(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("{}", USAGE);
            return EXIT_USAGE;
        }
    };

    let mut options = pico.load_options();
    options.override_code_path = parsed.module;
    options.check_version = options.check_version && parsed.check_version;

    match pico.load_with(&parsed.datafile, &options) {
        Ok(loaded) => {
            for line in describe(&loaded) {
                println!("{}", line);
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

fn describe(loaded: &LoadedModel) -> Vec<String> {
    let p: &Provenance = loaded.provenance();
    let mut lines = vec![
        format!("Datafile:      {}", p.datafile.display()),
        format!("Logical name:  {}", p.logical_name),
        format!(
            "PICO version:  {}",
            p.format_version.as_deref().unwrap_or("(not recorded)")
        ),
        format!("Container rev: {}", p.container_revision),
        format!("Model type:    {}", loaded.model().type_tag()),
        format!("Code:          {}", origin_label(&p.code_origin)),
        format!("Payload:       {} bytes", p.payload_bytes),
        format!("Inputs:        {}", loaded.inputs().join(", ")),
        format!("Outputs:       {}", loaded.outputs().join(", ")),
    ];
    for warning in loaded.warnings() {
        lines.push(format!("Warning:       {}", warning));
    }
    lines
}

fn origin_label(origin: &CodeOrigin) -> String {
    match origin {
        CodeOrigin::Embedded => "embedded".to_string(),
        CodeOrigin::Override(path) => format!("override ({})", path.display()),
    }
}
