//! Host-side hardware seam: port output, host memory access, interrupt mask.

/// Primitive host operations the bridge is built from.
///
/// Implementations model the host CPU's view of its own bus: a write to an
/// I/O port, a single load or store through the host address space, and the
/// interrupt mask. The bridge never assumes anything about port state that
/// it did not write itself immediately before use.
pub trait PortBus {
    /// Writes `value` to I/O port `port`.
    fn out(&mut self, port: u8, value: u8);

    /// Executes one load from host address `addr`.
    fn load(&mut self, addr: u16) -> u8;

    /// Executes one store of `value` to host address `addr`.
    fn store(&mut self, addr: u16, value: u8);

    /// Masks maskable interrupts.
    fn disable_interrupts(&mut self);

    /// Unmasks maskable interrupts.
    fn enable_interrupts(&mut self);
}

impl<B: PortBus + ?Sized> PortBus for &mut B {
    fn out(&mut self, port: u8, value: u8) {
        (**self).out(port, value);
    }

    fn load(&mut self, addr: u16) -> u8 {
        (**self).load(addr)
    }

    fn store(&mut self, addr: u16, value: u8) {
        (**self).store(addr, value);
    }

    fn disable_interrupts(&mut self) {
        (**self).disable_interrupts();
    }

    fn enable_interrupts(&mut self) {
        (**self).enable_interrupts();
    }
}
