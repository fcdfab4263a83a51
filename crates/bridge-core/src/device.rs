//! Bridge hardware device: bank register, one-shot page window, reset line.
//!
//! The bank register and the page-switch pulse are shared hardware state with
//! no owner. [`Device`] is the only type that touches them, and it only does
//! so from inside a [`CriticalSection`], which masks interrupts for exactly
//! one bank select plus one window access.

use crate::{PortBus, PortMap};

/// Level driven onto the target reset line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResetLine {
    /// Target held in reset.
    Held,
    /// Target released and fetching from its vectors.
    Released,
}

impl ResetLine {
    /// Value written to the reset port for this level.
    #[must_use]
    pub const fn port_value(self) -> u8 {
        match self {
            Self::Held => 0x00,
            Self::Released => 0x01,
        }
    }
}

/// Direction of the single memory access made through the page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowAccess {
    /// Load one byte.
    Read,
    /// Store the given byte.
    Write(u8),
}

/// Bridge hardware reached through a host [`PortBus`].
#[derive(Debug)]
pub struct Device<B: PortBus> {
    bus: B,
    ports: PortMap,
}

impl<B: PortBus> Device<B> {
    /// Wraps a host bus using the given port assignments.
    pub const fn new(bus: B, ports: PortMap) -> Self {
        Self { bus, ports }
    }

    /// Port assignments in use.
    #[must_use]
    pub const fn ports(&self) -> PortMap {
        self.ports
    }

    /// Shared access to the underlying host bus.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the underlying host bus.
    pub const fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consumes the device and returns the host bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Drives the target reset line.
    pub fn set_reset_line(&mut self, line: ResetLine) {
        self.bus.out(self.ports.reset, line.port_value());
    }

    /// Masks interrupts and returns a guard that unmasks them when dropped.
    pub fn critical_section(&mut self) -> CriticalSection<'_, B> {
        self.bus.disable_interrupts();
        CriticalSection { device: self }
    }
}

/// Scoped interrupt mask around one bank select and one window access.
///
/// Interrupts are re-enabled when the guard is dropped, including when the
/// window access unwinds. [`CriticalSection::access_window`] consumes the
/// guard, so a section can never cover more than one access.
#[derive(Debug)]
pub struct CriticalSection<'a, B: PortBus> {
    device: &'a mut Device<B>,
}

impl<B: PortBus> CriticalSection<'_, B> {
    /// Writes the bank selector register.
    pub fn select_bank(&mut self, bank: u8) {
        let port = self.device.ports.bank;
        self.device.bus.out(port, bank);
    }

    /// Pulses the page switch and performs exactly one access at `offset`.
    ///
    /// Returns the byte read, or the byte written for [`WindowAccess::Write`].
    #[must_use]
    pub fn access_window(self, offset: u16, access: WindowAccess) -> u8 {
        let port = self.device.ports.page_switch;
        let bus = &mut self.device.bus;
        match access {
            WindowAccess::Read => {
                bus.out(port, 0x00);
                bus.load(offset)
            }
            WindowAccess::Write(value) => {
                bus.out(port, value);
                bus.store(offset, value);
                value
            }
        }
    }
}

impl<B: PortBus> Drop for CriticalSection<'_, B> {
    fn drop(&mut self) {
        self.device.bus.enable_interrupts();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::{Device, ResetLine, WindowAccess};
    use crate::{PortBus, PortMap};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Out(u8, u8),
        Load(u16),
        Store(u16, u8),
        Di,
        Ei,
    }

    #[derive(Default)]
    struct RecordingBus {
        ops: Vec<Op>,
    }

    impl PortBus for RecordingBus {
        fn out(&mut self, port: u8, value: u8) {
            self.ops.push(Op::Out(port, value));
        }

        fn load(&mut self, addr: u16) -> u8 {
            self.ops.push(Op::Load(addr));
            0x5A
        }

        fn store(&mut self, addr: u16, value: u8) {
            self.ops.push(Op::Store(addr, value));
        }

        fn disable_interrupts(&mut self) {
            self.ops.push(Op::Di);
        }

        fn enable_interrupts(&mut self) {
            self.ops.push(Op::Ei);
        }
    }

    #[test]
    fn read_sequence_is_bracketed_by_interrupt_mask() {
        let mut device = Device::new(RecordingBus::default(), PortMap::default());

        let mut section = device.critical_section();
        section.select_bank(0x12);
        let value = section.access_window(0x3456, WindowAccess::Read);

        assert_eq!(value, 0x5A);
        assert_eq!(
            device.bus().ops,
            vec![
                Op::Di,
                Op::Out(0xDF, 0x12),
                Op::Out(0xD2, 0x00),
                Op::Load(0x3456),
                Op::Ei,
            ]
        );
    }

    #[test]
    fn write_sequence_stores_exactly_once() {
        let mut device = Device::new(RecordingBus::default(), PortMap::default());

        let mut section = device.critical_section();
        section.select_bank(0x01);
        let written = section.access_window(0x0000, WindowAccess::Write(0xC3));

        assert_eq!(written, 0xC3);
        assert_eq!(
            device.bus().ops,
            vec![
                Op::Di,
                Op::Out(0xDF, 0x01),
                Op::Out(0xD2, 0xC3),
                Op::Store(0x0000, 0xC3),
                Op::Ei,
            ]
        );
    }

    #[test]
    fn dropping_an_unused_section_still_unmasks() {
        let mut device = Device::new(RecordingBus::default(), PortMap::default());
        drop(device.critical_section());
        assert_eq!(device.bus().ops, vec![Op::Di, Op::Ei]);
    }

    /// Bus whose loads fault, tracking only the interrupt mask.
    struct FaultingBus {
        interrupts_enabled: bool,
    }

    impl PortBus for FaultingBus {
        fn out(&mut self, _port: u8, _value: u8) {}

        fn load(&mut self, addr: u16) -> u8 {
            panic!("bus fault at 0x{addr:04X}");
        }

        fn store(&mut self, _addr: u16, _value: u8) {}

        fn disable_interrupts(&mut self) {
            self.interrupts_enabled = false;
        }

        fn enable_interrupts(&mut self) {
            self.interrupts_enabled = true;
        }
    }

    #[test]
    fn fault_inside_section_still_unmasks() {
        let mut device = Device::new(
            FaultingBus {
                interrupts_enabled: true,
            },
            PortMap::default(),
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut section = device.critical_section();
            section.select_bank(0x02);
            section.access_window(0x0010, WindowAccess::Read)
        }));

        assert!(outcome.is_err());
        assert!(device.bus().interrupts_enabled);
    }

    #[test]
    fn reset_line_levels_map_to_port_values() {
        let mut device = Device::new(RecordingBus::default(), PortMap::default());
        device.set_reset_line(ResetLine::Held);
        device.set_reset_line(ResetLine::Released);
        assert_eq!(
            device.into_bus().ops,
            vec![Op::Out(0xD5, 0x00), Op::Out(0xD5, 0x01)]
        );
    }
}
