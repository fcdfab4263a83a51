//! Target reset control and initial vector setup.

use tracing::{debug, warn};

use crate::{Bridge, PortBus, ResetLine, TargetMemory, DEFAULT_SSP};

/// Logical address of the initial supervisor stack pointer vector.
pub const SSP_VECTOR_ADDR: u32 = 0x00_0000;
/// Logical address of the initial program counter vector.
pub const PC_VECTOR_ADDR: u32 = 0x00_0004;

/// Initial stack pointer and entry point fetched by the target on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VectorPair {
    /// Initial supervisor stack pointer.
    pub ssp: u32,
    /// Initial program counter.
    pub pc: u32,
}

impl VectorPair {
    /// Big-endian byte image of the pair as stored at addresses `0..=7`.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 8] {
        let [s0, s1, s2, s3] = self.ssp.to_be_bytes();
        let [p0, p1, p2, p3] = self.pc.to_be_bytes();
        [s0, s1, s2, s3, p0, p1, p2, p3]
    }
}

/// Writes `vectors` to target low memory, SSP first, most significant byte first.
pub fn write_vectors<M: TargetMemory + ?Sized>(mem: &mut M, vectors: VectorPair) {
    for (addr, byte) in (SSP_VECTOR_ADDR..).zip(vectors.to_bytes()) {
        mem.write_byte(addr, byte);
    }
}

/// Reads the vector pair currently stored in target low memory.
pub fn read_vectors<M: TargetMemory + ?Sized>(mem: &mut M) -> VectorPair {
    let mut word = |base: u32| {
        let mut bytes = [0; 4];
        for (addr, byte) in (base..).zip(bytes.iter_mut()) {
            *byte = mem.read_byte(addr);
        }
        u32::from_be_bytes(bytes)
    };
    let ssp = word(SSP_VECTOR_ADDR);
    let pc = word(PC_VECTOR_ADDR);
    VectorPair { ssp, pc }
}

/// Reset, vector setup, and optional release of the target, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BootSequence {
    vectors: VectorPair,
    start: bool,
}

impl BootSequence {
    /// New sequence entering the target at `entry` with the default SSP.
    ///
    /// The target is left held in reset unless [`BootSequence::start`] is set.
    #[must_use]
    pub const fn new(entry: u32) -> Self {
        Self {
            vectors: VectorPair {
                ssp: DEFAULT_SSP,
                pc: entry,
            },
            start: false,
        }
    }

    /// Overrides the initial stack pointer.
    #[must_use]
    pub const fn ssp(mut self, ssp: u32) -> Self {
        self.vectors.ssp = ssp;
        self
    }

    /// Chooses whether to release the target once vectors are written.
    #[must_use]
    pub const fn start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Vectors this sequence writes.
    #[must_use]
    pub const fn vectors(&self) -> VectorPair {
        self.vectors
    }

    /// Returns `true` when the target is released at the end of the sequence.
    #[must_use]
    pub const fn starts_target(&self) -> bool {
        self.start
    }
}

impl<B: PortBus> Bridge<B> {
    /// Holds the target processor in reset.
    pub fn reset(&mut self) {
        debug!("target reset asserted");
        self.drive_reset_line(ResetLine::Held);
    }

    /// Releases the target processor from reset.
    pub fn start(&mut self) {
        debug!("target reset released");
        self.drive_reset_line(ResetLine::Released);
    }

    /// Writes the SSP and PC vectors into target low memory.
    ///
    /// Only meaningful while the target is held in reset. This is not
    /// enforced; a warning is logged when the bridge last released the target.
    pub fn set_vectors(&mut self, ssp: u32, pc: u32) {
        if self.reset_line() == Some(ResetLine::Released) {
            warn!(ssp, pc, "writing reset vectors while the target is running");
        }
        write_vectors(self, VectorPair { ssp, pc });
    }

    /// Runs `sequence`: reset, write vectors, then release if requested.
    pub fn boot(&mut self, sequence: &BootSequence) {
        let vectors = sequence.vectors();
        self.reset();
        self.set_vectors(vectors.ssp, vectors.pc);
        if sequence.starts_target() {
            self.start();
        }
        debug!(
            ssp = vectors.ssp,
            pc = vectors.pc,
            started = sequence.starts_target(),
            "boot sequence complete"
        );
    }
}
