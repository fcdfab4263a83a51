//! Command runners shared by the `dump` and `load` front-ends.
//!
//! Each runner prints progress to the supplied writer and returns a
//! [`CommandError`] on the first failure; the caller maps that to exit
//! status 1.

use std::io::{self, Write};

use bridge_core::{
    dump, BootSequence, Bridge, BridgeError, FileImage, MemoryRange, PortBus, RangeError,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::args::{DumpArgs, LoadArgs};

/// Failures that end a command run.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A bridge operation failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The requested dump range was invalid.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Progress output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CommandError {
    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Runs the initialization check every command starts with.
///
/// # Errors
///
/// Returns [`BridgeError::SelfTest`] when the pattern does not read back.
pub fn check_bridge<B: PortBus>(
    bridge: &mut Bridge<B>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    writeln!(out, "Initialization check...")?;
    bridge.self_test()?;
    writeln!(out, "Memory R/W test: OK")?;
    Ok(())
}

fn print_vectors(out: &mut impl Write, sequence: &BootSequence) -> io::Result<()> {
    let vectors = sequence.vectors();
    writeln!(out, "SSP set to 0x{:08X}", vectors.ssp)?;
    writeln!(out, "PC set to 0x{:08X}", vectors.pc)
}

/// Dumps the requested range, optionally initializing the target first.
///
/// # Errors
///
/// Returns the first self-test, range or output failure.
pub fn run_dump<B: PortBus>(
    bridge: &mut Bridge<B>,
    args: &DumpArgs,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let range = MemoryRange::new(args.start, args.end)?;
    if args.clamped {
        warn!(start = args.start, end = args.end, "dump span clamped");
        writeln!(out, "Warning: Display limited to 64KB from start address.")?;
    }

    check_bridge(bridge, out)?;

    if args.init {
        writeln!(out, "Initializing MC68000...")?;
        let sequence = BootSequence::new(args.start).ssp(bridge.config().default_ssp);
        bridge.boot(&sequence);
        print_vectors(out, &sequence)?;
    }

    writeln!(
        out,
        "Dumping memory from {:08X} to {:08X}",
        range.start(),
        range.end()
    )?;
    writeln!(out)?;

    let policy = bridge.config().dump_read_policy;
    let lines = dump(bridge, range, policy, out)?;
    info!(lines, "dump complete");

    writeln!(out)?;
    writeln!(out, "Dump complete.")?;
    Ok(())
}

/// Loads an image file, verifies it unless skipped, and optionally starts
/// the target at the load address.
///
/// # Errors
///
/// Returns the first self-test, I/O, verification or output failure.
pub fn run_load<B: PortBus>(
    bridge: &mut Bridge<B>,
    args: &LoadArgs,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    writeln!(out, "File: {}", args.path.display())?;
    writeln!(out, "Load address: 0x{:08X}", args.load_addr)?;
    if args.run {
        writeln!(
            out,
            "Will run MC68000 after loading (PC=0x{:08X})",
            args.load_addr
        )?;
    }

    check_bridge(bridge, out)?;

    let image = FileImage::new(&args.path);
    let mut progress_output: io::Result<()> = Ok(());
    let loaded = bridge.load_image_with_progress(&image, args.load_addr, |addr, len| {
        if progress_output.is_ok() {
            progress_output = writeln!(out, "Writing {len} bytes at address 0x{addr:08X}");
        }
    })?;
    progress_output?;
    writeln!(out, "Loaded {} bytes to memory.", loaded.bytes_written)?;

    if args.verify {
        writeln!(out, "Verifying...")?;
        let verified = match bridge.verify_image(&image, args.load_addr) {
            Ok(report) => report,
            Err(error) => {
                if let BridgeError::Verify { mismatches, .. } = &error {
                    writeln!(out, "Verification failed with {} errors.", mismatches.len())?;
                }
                return Err(error.into());
            }
        };
        writeln!(
            out,
            "Verification successful: {} bytes match.",
            verified.bytes_compared
        )?;
    }

    if args.run {
        writeln!(out, "Starting MC68000 program...")?;
        let sequence = BootSequence::new(args.load_addr)
            .ssp(bridge.config().default_ssp)
            .start(true);
        bridge.boot(&sequence);
        print_vectors(out, &sequence)?;
        writeln!(out, "MC68000 started.")?;
    }

    writeln!(out, "Operation completed successfully.")?;
    Ok(())
}

/// Prints `error` as a diagnostic, listing every recorded mismatch.
///
/// # Errors
///
/// Propagates write failures from `err`.
pub fn report_error(error: &CommandError, err: &mut impl Write) -> io::Result<()> {
    writeln!(err, "error: {error}")?;
    if let CommandError::Bridge(BridgeError::Verify {
        mismatches,
        truncated,
    }) = error
    {
        for mismatch in mismatches {
            writeln!(err, "  mismatch {mismatch}")?;
        }
        if *truncated {
            writeln!(err, "  too many errors, verification aborted")?;
        }
    }
    Ok(())
}
