//! Command-line front-ends for the banked memory bridge.
//!
//! `m68bridge dump` renders target memory as hex and ASCII, `m68bridge load`
//! streams a binary image into target memory and verifies it. Both run the
//! bridge self-test first and exit with status 1 on any failure.

/// Positional argument parsing.
pub mod args;
pub use args::{
    parse_args, parse_dump_args, parse_load_args, Command, DumpArgs, LoadArgs, ParseResult,
    USAGE_TEXT,
};

/// Command runners and error reporting.
pub mod commands;
pub use commands::{check_bridge, report_error, run_dump, run_load, CommandError};

/// Subscriber setup for `tracing` output.
pub mod logging;
pub use logging::{init_logging, DEFAULT_FILTER};

#[cfg(test)]
use rstest as _;
