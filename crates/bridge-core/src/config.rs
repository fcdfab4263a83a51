//! Bridge configuration: port assignments, fixed constants, and policies.

/// Bank register port on the host I/O bus.
pub const DEFAULT_BANK_PORT: u8 = 0xDF;
/// Page-switch pulse port on the host I/O bus.
pub const DEFAULT_PAGE_SWITCH_PORT: u8 = 0xD2;
/// Target reset/start port on the host I/O bus.
pub const DEFAULT_RESET_PORT: u8 = 0xD5;

/// Logical address used by the start-up read-back self-test.
pub const DEFAULT_SELF_TEST_ADDR: u32 = 0x00_0100;
/// Pattern written and read back by the self-test.
pub const DEFAULT_SELF_TEST_PATTERN: u8 = 0xA5;
/// Initial supervisor stack pointer written by boot sequences.
pub const DEFAULT_SSP: u32 = 0x00_FF00;
/// Default load address for binary images.
pub const DEFAULT_LOAD_ADDR: u32 = 0x01_0000;
/// Chunk size used when streaming images from their source.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Mismatch count at which verification gives up.
pub const DEFAULT_MAX_VERIFY_MISMATCHES: usize = 10;
/// Span added to `start` when a dump has no explicit end address.
pub const DEFAULT_DUMP_SPAN: u32 = 255;
/// Largest `end - start` a single dump is allowed to cover.
pub const MAX_DUMP_SPAN: u32 = 65535;

/// Port numbers that address the bridge hardware on the host I/O bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PortMap {
    /// Port holding the bank selector.
    pub bank: u8,
    /// Port whose write arms the page switch for one memory access.
    pub page_switch: u8,
    /// Port controlling the target reset line.
    pub reset: u8,
}

impl Default for PortMap {
    fn default() -> Self {
        Self {
            bank: DEFAULT_BANK_PORT,
            page_switch: DEFAULT_PAGE_SWITCH_PORT,
            reset: DEFAULT_RESET_PORT,
        }
    }
}

/// How the dump engine fetches bytes shown in both the hex and ASCII columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DumpReadPolicy {
    /// Read each byte once per rendered column (two target reads per byte).
    ///
    /// Matches the historical tool byte-for-byte, including on targets where
    /// a read has side effects.
    #[default]
    Faithful,
    /// Read each byte once and render both columns from that value.
    SingleRead,
}

/// Top-level immutable configuration for a bridge instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BridgeConfig {
    /// Host port assignments.
    pub ports: PortMap,
    /// Self-test address.
    pub self_test_addr: u32,
    /// Self-test pattern.
    pub self_test_pattern: u8,
    /// SSP written by boot sequences that do not override it.
    pub default_ssp: u32,
    /// Load address used when the caller gives none.
    pub default_load_addr: u32,
    /// Image streaming chunk size in bytes.
    pub chunk_size: usize,
    /// Verification stops once this many mismatches are recorded.
    pub max_verify_mismatches: usize,
    /// Dump read policy.
    pub dump_read_policy: DumpReadPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ports: PortMap::default(),
            self_test_addr: DEFAULT_SELF_TEST_ADDR,
            self_test_pattern: DEFAULT_SELF_TEST_PATTERN,
            default_ssp: DEFAULT_SSP,
            default_load_addr: DEFAULT_LOAD_ADDR,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_verify_mismatches: DEFAULT_MAX_VERIFY_MISMATCHES,
            dump_read_policy: DumpReadPolicy::Faithful,
        }
    }
}
