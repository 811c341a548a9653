//! `pico-cli` entry point.
//!
//! ## CLI Subcommands
//!
//! - `pico-cli create` - Write a datafile from a module source
//! - `pico-cli info` - Load a datafile and describe it
//! - `pico-cli eval` - Evaluate the model in a datafile
//! - `pico-cli convert` - Rewrite a datafile in the current layout
//! - `pico-cli config show|defaults` - Print configuration

use std::process::ExitCode;

use pico_core::cli::{self, EXIT_USAGE};
use pico_core::config;
use pico_core::telemetry::init_logging;
use pico_core::{Pico, PicoConfig};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let rest = args.get(2..).unwrap_or_default();

    match command {
        "create" | "info" | "eval" | "convert" => {
            let env = config::load();
            if let Err(e) = init_logging(&env.log) {
                eprintln!("Warning: logging disabled: {}", e);
            }
            let pico = Pico::new(PicoConfig::from(&env));
            let code = match command {
                "create" => cli::run_create(&pico, rest),
                "info" => cli::run_info(&pico, rest),
                "eval" => cli::run_eval(&pico, rest),
                _ => cli::run_convert(&pico, rest),
            };
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    cli::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    cli::run_defaults();
                    ExitCode::SUCCESS
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::from(EXIT_USAGE as u8)
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("pico-cli {}", pico_core::VERSION);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::from(EXIT_USAGE as u8)
        }
    }
}

fn print_usage() {
    eprintln!(
        "pico-cli - PICO datafile tool v{}

USAGE:
    pico-cli <COMMAND> [OPTIONS]

COMMANDS:
    create     Write a datafile from a module source
    info       Load a datafile and describe it
    eval       Evaluate the model stored in a datafile
    convert    Rewrite a datafile in the current container layout
    config     Show configuration (show, defaults)
    version    Show version information
    help       Show this help message

ENVIRONMENT:
    PICO_CHECK_VERSION     Reject incompatible datafiles (default: true)
    PICO_VERBOSE           Log load steps at info (default: false)
    PICO_FACTORY_ENTRY     Factory entry point for create (default: get_pico)
    PICO_CONVERTED_SUFFIX  Suffix for converted files (default: _converted)
    PICO_LOG_LEVEL         Log filter (default: warn)
    PICO_LOG_FORMAT        pretty or json (default: pretty)
    PICO_LOG_FILE          Write logs to a file instead of stderr

EXIT CODES:
    0  Success
    1  Operation failed
    2  Usage error
",
        pico_core::VERSION
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "create" => {
            eprintln!(
                "pico-cli create - Write a datafile

USAGE:
    pico-cli create <CODEFILE> <DATAFILE> [--arg JSON]... [--existing DATAFILE]

OPTIONS:
    --arg JSON           Positional factory argument (repeatable)
    --existing DATAFILE  Reuse the model and logical name of DATAFILE

DESCRIPTION:
    Compiles CODEFILE, calls its factory entry point and writes the model
    together with the code to DATAFILE. With --existing, the model comes
    from an existing datafile and only the code is refreshed. The write is
    atomic: on failure any previous DATAFILE is left untouched.

EXAMPLES:
    pico-cli create lens.toml lens.dat --arg 2.0
    pico-cli create lens.toml lens_v2.dat --existing lens.dat
"
            );
        }
        "info" => {
            eprintln!(
                "pico-cli info - Describe a datafile

USAGE:
    pico-cli info <DATAFILE> [--no-version-check] [--module FILE]

OPTIONS:
    --no-version-check  Load even if the recorded version is incompatible
    --module FILE       Use FILE instead of the embedded code
"
            );
        }
        "eval" => {
            eprintln!(
                "pico-cli eval - Evaluate a datafile's model

USAGE:
    pico-cli eval <DATAFILE> [--output NAME]... NAME=VALUE...

OPTIONS:
    --output NAME  Compute only NAME (repeatable; default: all outputs)

EXAMPLES:
    pico-cli eval lens.dat z=0.3 mass=1.2
    pico-cli eval lens.dat --output flux z=0.3
"
            );
        }
        "convert" => {
            eprintln!(
                "pico-cli convert - Rewrite a datafile in the current layout

USAGE:
    pico-cli convert <DATAFILE> [--code FILE]

OPTIONS:
    --code FILE  Replace the stored code with the contents of FILE

DESCRIPTION:
    Writes <stem>$PICO_CONVERTED_SUFFIX.<ext> next to DATAFILE. The original
    file is not modified.
"
            );
        }
        "config" => {
            eprintln!(
                "pico-cli config - Show configuration

USAGE:
    pico-cli config [show|defaults]
"
            );
        }
        _ => {
            eprintln!("No detailed help for '{}'", command);
            print_usage();
        }
    }
}
