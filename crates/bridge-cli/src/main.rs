//! CLI entry point for the m68bridge binary.

use std::env;
use std::io::{self, Write};
use std::process;

use bridge_cli::{
    init_logging, parse_args, report_error, run_dump, run_load, Command, CommandError,
    ParseResult, USAGE_TEXT,
};
use bridge_core::{Bridge, BridgeConfig, SimulatedBoard};
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

fn run(command: &Command) -> Result<(), CommandError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

    let result = match command {
        Command::Dump(args) => run_dump(&mut bridge, args, &mut out),
        Command::Load(args) => run_load(&mut bridge, args, &mut out),
    };
    out.flush()?;
    result
}

fn main() {
    init_logging();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            print!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => match run(&command) {
            Ok(()) => 0,
            Err(error) => {
                let _ = report_error(&error, &mut io::stderr());
                error.exit_code()
            }
        },
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!();
            eprint!("{USAGE_TEXT}");
            1
        }
    };

    process::exit(exit_code);
}
