//! Banked memory bridge between an 8-bit host and a port-switched MC68000
//! co-processor.
//!
//! The host reaches target memory one byte at a time: it latches a bank
//! selector into a port, pulses the page switch, and performs exactly one
//! load or store through the shared page. Everything else in this crate
//! (target control, memory dumps, image load and verify) is built on that
//! primitive.

/// Logical address decomposition into bank selector and page offset.
pub mod address;
pub use address::{compose, decompose, BankedAddress, ADDRESS_MASK, BANK_COUNT, BANK_SIZE};

/// Host port bus abstraction.
pub mod port;
pub use port::PortBus;

/// Bridge configuration and port assignments.
pub mod config;
pub use config::{
    BridgeConfig, DumpReadPolicy, PortMap, DEFAULT_BANK_PORT, DEFAULT_CHUNK_SIZE,
    DEFAULT_DUMP_SPAN, DEFAULT_LOAD_ADDR, DEFAULT_MAX_VERIFY_MISMATCHES, DEFAULT_PAGE_SWITCH_PORT,
    DEFAULT_RESET_PORT, DEFAULT_SELF_TEST_ADDR, DEFAULT_SELF_TEST_PATTERN, DEFAULT_SSP,
    MAX_DUMP_SPAN,
};

/// Bridge hardware device and interrupt-masked critical section.
pub mod device;
pub use device::{CriticalSection, Device, ResetLine, WindowAccess};

/// Error taxonomy for bridge operations.
pub mod error;
pub use error::{BridgeError, RangeError};

/// Byte-level target memory trait.
pub mod memory;
pub use memory::TargetMemory;

/// Banked access primitive and self-test.
pub mod bridge;
pub use bridge::Bridge;

/// Target reset control and vector setup.
pub mod control;
pub use control::{
    read_vectors, write_vectors, BootSequence, VectorPair, PC_VECTOR_ADDR, SSP_VECTOR_ADDR,
};

/// Hex + ASCII memory dump engine.
pub mod dump;
pub use dump::{dump, dump_line, dump_to_lines, MemoryRange, BYTES_PER_LINE};

/// Streaming image load and verification.
pub mod image;
pub use image::{
    load, load_with_progress, verify, FileImage, ImageSource, LoadReport, MemoryImage, Mismatch,
    VerifyReport,
};

/// Permissive hexadecimal literal parsing.
pub mod hex;
pub use hex::parse_hex;

/// Simulated host board for hosted builds and tests.
pub mod sim;
pub use sim::{BoardStats, SimulatedBoard, OPEN_BUS};

#[cfg(test)]
use proptest as _;
