//! Hex + ASCII rendering of target memory ranges.
//!
//! Line layout:
//!
//! ```text
//! 00001000: 48 65 6C 6C 6F 00 00 00  00 00 00 00 00 00 00 00 | Hello........... |
//! ```

use std::fmt::Write as _;
use std::io;

use crate::{DumpReadPolicy, RangeError, TargetMemory};

/// Bytes rendered on one dump line.
pub const BYTES_PER_LINE: u32 = 16;

const LINE_MASK: u32 = !(BYTES_PER_LINE - 1);
const HALF_LINE: u32 = BYTES_PER_LINE / 2;

/// Inclusive logical address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryRange {
    start: u32,
    end: u32,
}

impl MemoryRange {
    /// Builds `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::StartAfterEnd`] when `start > end`.
    pub const fn new(start: u32, end: u32) -> Result<Self, RangeError> {
        if start > end {
            Err(RangeError::StartAfterEnd { start, end })
        } else {
            Ok(Self { start, end })
        }
    }

    /// First address in the range.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Last address in the range.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Number of addresses covered.
    #[must_use]
    pub fn len(self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Always `false`; an inclusive range covers at least one address.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Start of the first dump line (start rounded down to 16 bytes).
    #[must_use]
    pub const fn first_line(self) -> u32 {
        self.start & LINE_MASK
    }

    /// Start addresses of every dump line covering this range, ascending.
    pub fn line_starts(self) -> impl Iterator<Item = u32> {
        let end = self.end;
        std::iter::successors(Some(self.first_line()), move |line| {
            line.checked_add(BYTES_PER_LINE).filter(|next| *next <= end)
        })
    }
}

const fn is_printable(byte: u8) -> bool {
    matches!(byte, 32..=126)
}

/// Renders the dump line starting at `line_start`.
///
/// Positions after `end` are blank. With [`DumpReadPolicy::Faithful`] each
/// shown byte is read once for the hex column and again for the ASCII column.
pub fn dump_line<M: TargetMemory + ?Sized>(
    mem: &mut M,
    line_start: u32,
    end: u32,
    policy: DumpReadPolicy,
) -> String {
    let addrs = || (0..BYTES_PER_LINE).map(move |i| line_start.wrapping_add(i));
    let mut cached = [0_u8; BYTES_PER_LINE as usize];
    let mut line = String::with_capacity(80);

    let _ = write!(line, "{line_start:08X}: ");
    for (i, addr) in addrs().enumerate() {
        if addr <= end {
            let byte = mem.read_byte(addr);
            cached[i] = byte;
            let _ = write!(line, "{byte:02X}");
        } else {
            line.push_str("  ");
        }
        if i + 1 == HALF_LINE as usize {
            line.push(' ');
        }
        line.push(' ');
    }

    line.push_str("| ");
    for (i, addr) in addrs().enumerate() {
        if addr <= end {
            let byte = match policy {
                DumpReadPolicy::Faithful => mem.read_byte(addr),
                DumpReadPolicy::SingleRead => cached[i],
            };
            line.push(if is_printable(byte) {
                char::from(byte)
            } else {
                '.'
            });
        } else {
            line.push(' ');
        }
    }
    line.push_str(" |");

    line
}

/// Writes every line covering `range` to `out`, one per output line.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn dump<M, W>(
    mem: &mut M,
    range: MemoryRange,
    policy: DumpReadPolicy,
    out: &mut W,
) -> io::Result<usize>
where
    M: TargetMemory + ?Sized,
    W: io::Write + ?Sized,
{
    let mut lines = 0;
    for line_start in range.line_starts() {
        writeln!(out, "{}", dump_line(mem, line_start, range.end(), policy))?;
        lines += 1;
    }
    Ok(lines)
}

/// Collects the dump of `range` into owned lines.
pub fn dump_to_lines<M: TargetMemory + ?Sized>(
    mem: &mut M,
    range: MemoryRange,
    policy: DumpReadPolicy,
) -> Vec<String> {
    range
        .line_starts()
        .map(|line_start| dump_line(mem, line_start, range.end(), policy))
        .collect()
}
