// Copyright 2024-2026 PICO Contributors
// SPDX-License-Identifier: Apache-2.0

//! `eval` subcommand: load a datafile and evaluate the model once.

use std::path::PathBuf;

use crate::cli::{split_args, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
use crate::models::{Inputs, Outputs};
use crate::Pico;

const USAGE: &str = "usage: pico-cli eval <datafile> [--output NAME]... NAME=VALUE...";

#[derive(Debug, PartialEq)]
struct EvalArgs {
    datafile: PathBuf,
    outputs: Vec<String>,
    inputs: Inputs,
}

fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing input name in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("input '{}' has a non-numeric value '{}'", name, value))?;
    Ok((name.to_string(), value))
}

fn parse(args: &[String]) -> Result<EvalArgs, String> {
    let parsed = split_args(args, &["--output"], &[])?;
    let Some((datafile, assignments)) = parsed.positionals.split_first() else {
        return Err("expected <datafile>".to_string());
    };
    let inputs = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Inputs, _>>()?;
    Ok(EvalArgs {
        datafile: PathBuf::from(*datafile),
        outputs: parsed.values_of("--output").into_iter().map(String::from).collect(),
        inputs,
    })
}

/// Run `eval`. Prints one `name = [values]` line per output.
pub fn run_eval(pico: &Pico, args: &[String]) -> i32 {
    let parsed = match parse(args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("{}", USAGE);
            return EXIT_USAGE;
        }
    };

    let loaded = match pico.load(&parsed.datafile) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let selection = (!parsed.outputs.is_empty()).then_some(parsed.outputs.as_slice());
    match loaded.evaluate(selection, &parsed.inputs) {
        Ok(outputs) => {
            for line in render_outputs(&outputs) {
                println!("{}", line);
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Cannot compute: {}", e);
            EXIT_FAILURE
        }
    }
}

fn render_outputs(outputs: &Outputs) -> Vec<String> {
    outputs
        .iter()
        .map(|(name, values)| {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            format!("{} = [{}]", name, rendered.join(", "))
        })
        .collect()
}
