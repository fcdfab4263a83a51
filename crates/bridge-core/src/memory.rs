//! Byte-addressed view of target memory used by every higher-level operation.

/// Single-byte peek/poke over the target's logical address space.
///
/// Each call is one complete banked access; implementations must not cache
/// bank state between calls.
pub trait TargetMemory {
    /// Reads the byte at logical address `addr`.
    fn read_byte(&mut self, addr: u32) -> u8;

    /// Writes `value` to logical address `addr`.
    fn write_byte(&mut self, addr: u32, value: u8);
}

impl<M: TargetMemory + ?Sized> TargetMemory for &mut M {
    fn read_byte(&mut self, addr: u32) -> u8 {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        (**self).write_byte(addr, value);
    }
}
