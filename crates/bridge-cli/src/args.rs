//! Positional argument parsing for the `dump` and `load` commands.

use std::ffi::OsString;
use std::path::PathBuf;

use bridge_core::{parse_hex, DEFAULT_DUMP_SPAN, DEFAULT_LOAD_ADDR, MAX_DUMP_SPAN};

/// Usage text printed for `--help` and after usage errors.
pub const USAGE_TEXT: &str = "\
Usage: m68bridge <command> [arguments]

Commands:
  dump <start> [<end>] [-init]                 Hex dump of target memory
  load <file> [<address>] [-run] [-noverify]   Load a binary image into target memory

Addresses are hexadecimal: $10000, 0x10000 or 10000.

dump options:
  <end>        Last address to show (default: start + $FF, at most start + $FFFF)
  -init        Reset the MC68000 and set SSP=$00FF00, PC=<start>

load options:
  <address>    Load address (default: $010000)
  -run         Start the MC68000 after loading (PC=<address>)
  -noverify    Skip read-back verification

Examples:
  m68bridge dump $10000 $1003F
  m68bridge dump 0x0 0xFF -init
  m68bridge load program.bin 0x20000 -run
";

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Dump target memory.
    Dump(DumpArgs),
    /// Load a binary image.
    Load(LoadArgs),
}

/// Arguments of the `dump` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpArgs {
    /// First address to show.
    pub start: u32,
    /// Last address to show, after clamping.
    pub end: u32,
    /// `end` was cut down to the maximum dump span.
    pub clamped: bool,
    /// Reset the target and write vectors before dumping.
    pub init: bool,
}

/// Arguments of the `load` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadArgs {
    /// Image file.
    pub path: PathBuf,
    /// Target address of the first image byte.
    pub load_addr: u32,
    /// Start the target at `load_addr` after loading.
    pub run: bool,
    /// Re-read and compare the image after loading.
    pub verify: bool,
}

/// Outcome of command-line parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// A command to run.
    Command(Command),
    /// Help was requested.
    Help,
}

/// Parses the arguments following the program name.
///
/// # Errors
///
/// Returns a message describing the first usage error found.
pub fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let rest: Vec<String> = args
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    match first.to_string_lossy().as_ref() {
        "dump" => parse_dump_args(&rest)
            .map(Command::Dump)
            .map(ParseResult::Command),
        "load" => parse_load_args(&rest)
            .map(Command::Load)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

/// Parses `<start> [<end>] [-init]`.
///
/// `-init` is recognised right after the range; a second token starting
/// with `-` means no end address was given.
///
/// # Errors
///
/// Returns a message when `start` is missing or lies above `end`.
pub fn parse_dump_args(args: &[String]) -> Result<DumpArgs, String> {
    let start_text = args
        .first()
        .ok_or_else(|| "missing start address".to_string())?;
    let start = parse_hex(start_text);

    let (end, option) = match args.get(1) {
        Some(text) if !text.starts_with('-') => (parse_hex(text), args.get(2)),
        other => (start.saturating_add(DEFAULT_DUMP_SPAN), other),
    };
    let init = option.is_some_and(|opt| opt == "-init");

    if start > end {
        return Err("start address must be less than or equal to end address".to_string());
    }

    let clamped = end - start > MAX_DUMP_SPAN;
    let end = if clamped { start + MAX_DUMP_SPAN } else { end };

    Ok(DumpArgs {
        start,
        end,
        clamped,
        init,
    })
}

fn is_option(arg: &str, name: &str) -> bool {
    arg.eq_ignore_ascii_case(name)
}

/// Parses `<file> [<address>] [-run] [-noverify]`.
///
/// Options are matched case-insensitively in positions 2 to 4. A second
/// token starting with `-` leaves the load address at its default.
///
/// # Errors
///
/// Returns a message when the file name is missing.
pub fn parse_load_args(args: &[String]) -> Result<LoadArgs, String> {
    let path = args
        .first()
        .map(PathBuf::from)
        .ok_or_else(|| "missing filename".to_string())?;

    let mut parsed = LoadArgs {
        path,
        load_addr: DEFAULT_LOAD_ADDR,
        run: false,
        verify: true,
    };

    for (position, arg) in args.iter().enumerate().take(4).skip(1) {
        if position == 1 && !arg.starts_with('-') {
            parsed.load_addr = parse_hex(arg);
        } else if is_option(arg, "-run") {
            parsed.run = true;
        } else if is_option(arg, "-noverify") {
            parsed.verify = false;
        }
    }

    Ok(parsed)
}
