//! Banked access primitive and the bridge session built around it.

use tracing::{debug, info};

use crate::{
    decompose, BridgeConfig, BridgeError, Device, PortBus, ResetLine, TargetMemory, WindowAccess,
};

/// Exclusive owner of the bridge hardware for one session.
///
/// Every target byte goes through [`Bridge::read_byte`] or
/// [`Bridge::write_byte`], which rewrite the bank register on each call.
/// Both take `&mut self`; an embedding that shares a bridge between threads
/// must lock the whole `Bridge`, not only the bank register.
#[derive(Debug)]
pub struct Bridge<B: PortBus> {
    device: Device<B>,
    config: BridgeConfig,
    reset_line: Option<ResetLine>,
}

impl<B: PortBus> Bridge<B> {
    /// Opens a bridge over `bus` using `config`.
    pub const fn new(bus: B, config: BridgeConfig) -> Self {
        Self {
            device: Device::new(bus, config.ports),
            config,
            reset_line: None,
        }
    }

    /// Configuration this bridge was opened with.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Underlying bridge device.
    #[must_use]
    pub const fn device(&self) -> &Device<B> {
        &self.device
    }

    /// Exclusive access to the underlying bridge device.
    pub const fn device_mut(&mut self) -> &mut Device<B> {
        &mut self.device
    }

    /// Closes the bridge and returns the host bus.
    pub fn into_bus(self) -> B {
        self.device.into_bus()
    }

    /// Last level this bridge drove onto the reset line, if any.
    #[must_use]
    pub const fn reset_line(&self) -> Option<ResetLine> {
        self.reset_line
    }

    pub(crate) fn drive_reset_line(&mut self, line: ResetLine) {
        self.device.set_reset_line(line);
        self.reset_line = Some(line);
    }

    /// Reads one byte of target memory.
    pub fn read_byte(&mut self, addr: u32) -> u8 {
        self.access(addr, WindowAccess::Read)
    }

    /// Writes one byte of target memory.
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        let _ = self.access(addr, WindowAccess::Write(value));
    }

    fn access(&mut self, addr: u32, access: WindowAccess) -> u8 {
        let banked = decompose(addr);
        let mut section = self.device.critical_section();
        section.select_bank(banked.bank);
        section.access_window(banked.offset, access)
    }

    /// Writes the self-test pattern and checks that it reads back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SelfTest`] when the read-back differs.
    pub fn self_test(&mut self) -> Result<(), BridgeError> {
        let addr = self.config.self_test_addr;
        let expected = self.config.self_test_pattern;

        self.write_byte(addr, expected);
        let actual = self.read_byte(addr);
        debug!(addr, expected, actual, "self-test read-back");

        if actual == expected {
            info!("memory self-test passed");
            Ok(())
        } else {
            Err(BridgeError::SelfTest {
                addr,
                expected,
                actual,
            })
        }
    }
}

impl<B: PortBus> TargetMemory for Bridge<B> {
    fn read_byte(&mut self, addr: u32) -> u8 {
        Self::read_byte(self, addr)
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        Self::write_byte(self, addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::Bridge;
    use crate::{BridgeConfig, BridgeError, SimulatedBoard};

    #[test]
    fn write_then_read_round_trips_across_banks() {
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        for (addr, value) in [(0x00_0000, 0x11), (0x01_FFFF, 0x22), (0xFE_1234, 0x33)] {
            bridge.write_byte(addr, value);
        }

        assert_eq!(bridge.read_byte(0x00_0000), 0x11);
        assert_eq!(bridge.read_byte(0x01_FFFF), 0x22);
        assert_eq!(bridge.read_byte(0xFE_1234), 0x33);
        assert_eq!(bridge.read_byte(0x02_0000), 0x00);
    }

    #[test]
    fn every_access_rewrites_bank_register_under_mask() {
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        bridge.write_byte(0x03_0010, 0xAA);
        bridge.write_byte(0x03_0011, 0xBB);
        let _ = bridge.read_byte(0x03_0010);

        let stats = bridge.device().bus().stats();
        assert_eq!(stats.bank_writes, 3);
        assert_eq!(stats.target_writes, 2);
        assert_eq!(stats.target_reads, 1);
        assert_eq!(stats.unmasked_window_accesses, 0);
        assert!(bridge.device().bus().interrupts_enabled());
    }

    #[test]
    fn self_test_passes_on_attached_target() {
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        assert!(bridge.self_test().is_ok());
        assert_eq!(bridge.into_bus().peek(0x0100), 0xA5);
    }

    #[test]
    fn self_test_fails_on_detached_target() {
        let mut bridge = Bridge::new(SimulatedBoard::detached(), BridgeConfig::default());
        let error = bridge.self_test().expect_err("detached target must fail");
        assert!(matches!(
            error,
            BridgeError::SelfTest {
                addr: 0x0100,
                expected: 0xA5,
                actual: 0xFF,
            }
        ));
    }

    #[test]
    fn page_window_does_not_leak_into_host_memory() {
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        bridge.write_byte(0x00_4000, 0x77);

        let board = bridge.into_bus();
        assert_eq!(board.peek(0x00_4000), 0x77);
        assert_eq!(board.host_ram()[0x4000], 0x00);
    }
}
