//! Simulated host board with a banked target behind the page window.
//!
//! The board decodes the bridge ports the way the real hardware does: the
//! bank register latches on every write, a write to the page-switch port arms
//! the window for exactly the next memory access, and the reset port drives
//! the target reset line. Accesses made without an armed window land in the
//! host's own 64 KiB RAM.

use tracing::trace;

use crate::{
    compose, decompose, PortBus, PortMap, ResetLine, BANK_COUNT, BANK_SIZE, PC_VECTOR_ADDR,
    SSP_VECTOR_ADDR,
};

/// Value returned by reads from a target that does not respond.
pub const OPEN_BUS: u8 = 0xFF;

/// Counters of bus activity observed by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoardStats {
    /// Writes to the bank register port.
    pub bank_writes: u64,
    /// Loads served by target memory through the window.
    pub target_reads: u64,
    /// Stores delivered to target memory through the window.
    pub target_writes: u64,
    /// Loads and stores served by host RAM.
    pub host_accesses: u64,
    /// Window accesses performed while interrupts were enabled.
    pub unmasked_window_accesses: u64,
    /// Stores to the vector area while the target was released.
    pub vector_writes_while_running: u64,
}

/// Host board model implementing [`PortBus`].
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    ports: PortMap,
    host_ram: Box<[u8]>,
    banks: Vec<Option<Box<[u8]>>>,
    bank_register: u8,
    window_armed: bool,
    interrupts_enabled: bool,
    reset_line: ResetLine,
    attached: bool,
    stats: BoardStats,
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBoard {
    /// Board with the default port map and an attached, zeroed target.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ports(PortMap::default())
    }

    /// Board decoding the given port map.
    #[must_use]
    pub fn with_ports(ports: PortMap) -> Self {
        Self {
            ports,
            host_ram: vec![0; BANK_SIZE as usize].into_boxed_slice(),
            banks: vec![None; BANK_COUNT],
            bank_register: 0,
            window_armed: false,
            interrupts_enabled: true,
            reset_line: ResetLine::Held,
            attached: true,
            stats: BoardStats::default(),
        }
    }

    /// Board whose co-processor module is missing: window stores are lost
    /// and window loads float to [`OPEN_BUS`].
    #[must_use]
    pub fn detached() -> Self {
        Self {
            attached: false,
            ..Self::new()
        }
    }

    /// Activity counters.
    #[must_use]
    pub const fn stats(&self) -> BoardStats {
        self.stats
    }

    /// Clears the activity counters.
    pub fn reset_stats(&mut self) {
        self.stats = BoardStats::default();
    }

    /// Current bank register contents.
    #[must_use]
    pub const fn bank_register(&self) -> u8 {
        self.bank_register
    }

    /// Returns `true` when maskable interrupts are enabled.
    #[must_use]
    pub const fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Level currently on the target reset line.
    #[must_use]
    pub const fn target_reset_line(&self) -> ResetLine {
        self.reset_line
    }

    /// Host RAM contents.
    #[must_use]
    pub fn host_ram(&self) -> &[u8] {
        &self.host_ram
    }

    /// Reads target memory directly, bypassing the bridge.
    #[must_use]
    pub fn peek(&self, addr: u32) -> u8 {
        let banked = decompose(addr);
        self.banks[usize::from(banked.bank)]
            .as_ref()
            .map_or(0, |bank| bank[usize::from(banked.offset)])
    }

    /// Writes target memory directly, bypassing the bridge.
    pub fn poke(&mut self, addr: u32, value: u8) {
        let banked = decompose(addr);
        self.bank_mut(banked.bank)[usize::from(banked.offset)] = value;
    }

    fn bank_mut(&mut self, bank: u8) -> &mut [u8] {
        self.banks[usize::from(bank)]
            .get_or_insert_with(|| vec![0; BANK_SIZE as usize].into_boxed_slice())
    }

    /// Consumes the one-shot window, returning whether it was armed.
    fn take_window(&mut self) -> bool {
        let armed = std::mem::take(&mut self.window_armed);
        if armed && self.interrupts_enabled {
            self.stats.unmasked_window_accesses += 1;
        }
        armed
    }
}

impl PortBus for SimulatedBoard {
    fn out(&mut self, port: u8, value: u8) {
        if port == self.ports.bank {
            self.bank_register = value;
            self.stats.bank_writes += 1;
        } else if port == self.ports.page_switch {
            self.window_armed = true;
        } else if port == self.ports.reset {
            self.reset_line = if value & 0x01 == 0 {
                ResetLine::Held
            } else {
                ResetLine::Released
            };
            trace!(line = ?self.reset_line, "reset line driven");
        } else {
            trace!(port, value, "write to unmapped port ignored");
        }
    }

    fn load(&mut self, addr: u16) -> u8 {
        if !self.take_window() {
            self.stats.host_accesses += 1;
            return self.host_ram[usize::from(addr)];
        }
        self.stats.target_reads += 1;
        if self.attached {
            self.peek(compose(self.bank_register, addr))
        } else {
            OPEN_BUS
        }
    }

    fn store(&mut self, addr: u16, value: u8) {
        if !self.take_window() {
            self.stats.host_accesses += 1;
            self.host_ram[usize::from(addr)] = value;
            return;
        }
        self.stats.target_writes += 1;
        let logical = compose(self.bank_register, addr);
        if self.reset_line == ResetLine::Released
            && (SSP_VECTOR_ADDR..PC_VECTOR_ADDR + 4).contains(&logical)
        {
            self.stats.vector_writes_while_running += 1;
        }
        if self.attached {
            self.poke(logical, value);
        }
    }

    fn disable_interrupts(&mut self) {
        self.interrupts_enabled = false;
    }

    fn enable_interrupts(&mut self) {
        self.interrupts_enabled = true;
    }
}
