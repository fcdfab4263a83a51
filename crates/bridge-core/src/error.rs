use std::io;

use thiserror::Error;

use crate::Mismatch;

/// Failures surfaced by bridge operations.
///
/// None of these are retried; callers report them and abort the run.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Read-back of the self-test pattern did not match what was written.
    #[error(
        "memory self-test failed at 0x{addr:08X}: wrote 0x{expected:02X}, read back 0x{actual:02X}"
    )]
    SelfTest {
        /// Logical address that was tested.
        addr: u32,
        /// Pattern written.
        expected: u8,
        /// Value read back.
        actual: u8,
    },
    /// The image source could not be opened or read.
    #[error("i/o error on image '{name}': {source}")]
    Io {
        /// Human-readable image name (usually its path).
        name: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Target memory differs from the image.
    #[error(
        "verification failed with {} mismatch(es){}",
        .mismatches.len(),
        truncation_note(.truncated)
    )]
    Verify {
        /// Recorded mismatches in address order.
        mismatches: Vec<Mismatch>,
        /// True when comparison stopped at the mismatch limit.
        truncated: bool,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn truncation_note(truncated: &bool) -> &'static str {
    if *truncated {
        ", aborted early"
    } else {
        ""
    }
}

/// Invalid address range supplied to the dump engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RangeError {
    /// `start` lies above `end`.
    #[error("start address 0x{start:08X} is greater than end address 0x{end:08X}")]
    StartAfterEnd {
        /// Requested start address.
        start: u32,
        /// Requested end address.
        end: u32,
    },
}
