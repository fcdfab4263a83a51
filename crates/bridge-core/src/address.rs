//! Logical address decomposition into bank selector and in-bank page offset.

/// Size in bytes of one bank window (64 KiB).
pub const BANK_SIZE: u32 = 0x1_0000;

/// Number of selectable banks (8-bit selector).
pub const BANK_COUNT: usize = 256;

/// Mask of the address bits the bridge can actually reach (24 bits).
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Bank and in-bank offset for one logical target address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BankedAddress {
    /// Bits 16..=23 of the logical address, written to the bank register.
    pub bank: u8,
    /// Bits 0..=15 of the logical address, used as the page-switched address.
    pub offset: u16,
}

impl BankedAddress {
    /// Returns the 24-bit logical address this pair refers to.
    #[must_use]
    pub const fn logical(self) -> u32 {
        compose(self.bank, self.offset)
    }
}

/// Splits a logical address into its bank selector and page offset.
///
/// Bits above 23 are ignored: the bank register is only 8 bits wide.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn decompose(addr: u32) -> BankedAddress {
    BankedAddress {
        bank: ((addr >> 16) & 0xFF) as u8,
        offset: (addr & 0xFFFF) as u16,
    }
}

/// Rebuilds the 24-bit logical address from a bank selector and page offset.
#[must_use]
pub const fn compose(bank: u8, offset: u16) -> u32 {
    ((bank as u32) << 16) | offset as u32
}
