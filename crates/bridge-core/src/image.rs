//! Streaming binary image load and read-back verification.
//!
//! Images are never buffered whole: both passes open the source from the
//! beginning and walk it in fixed-size chunks, so host memory use is bounded
//! by the chunk size regardless of image length.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Bridge, BridgeError, PortBus, TargetMemory};

/// Re-openable byte stream holding a target image.
pub trait ImageSource {
    /// Opens the stream positioned at its first byte.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the source cannot be opened.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Name used in diagnostics.
    fn name(&self) -> String;
}

/// Image stored in a file on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    /// Image backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImage {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Image held in host memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryImage {
    /// Named in-memory image.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Image contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ImageSource for MemoryImage {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadReport {
    /// First logical address written.
    pub start: u32,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Number of chunks read from the source.
    pub chunks: usize,
}

/// One byte that differs between the image and target memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Mismatch {
    /// Logical address compared.
    pub addr: u32,
    /// Byte from the image.
    pub expected: u8,
    /// Byte read from target memory.
    pub actual: u8,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at 0x{:08X}: file=0x{:02X}, memory=0x{:02X}",
            self.addr, self.expected, self.actual
        )
    }
}

/// Outcome of a verification pass with no mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyReport {
    /// First logical address compared.
    pub start: u32,
    /// Total bytes compared.
    pub bytes_compared: u64,
}

fn io_error(source: &(impl ImageSource + ?Sized), error: io::Error) -> BridgeError {
    BridgeError::Io {
        name: source.name(),
        source: error,
    }
}

/// Fills `buf` from `reader` until it is full or the stream ends.
fn read_chunk(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Streams `source` into target memory starting at `start`.
///
/// Bytes already written stay written if reading fails part-way through.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] when the source cannot be opened or read.
pub fn load<M, S>(
    mem: &mut M,
    source: &S,
    start: u32,
    chunk_size: usize,
) -> Result<LoadReport, BridgeError>
where
    M: TargetMemory + ?Sized,
    S: ImageSource + ?Sized,
{
    load_with_progress(mem, source, start, chunk_size, |_, _| {})
}

/// Same as [`load`], calling `progress(addr, len)` before each chunk is
/// written.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] when the source cannot be opened or read.
pub fn load_with_progress<M, S, F>(
    mem: &mut M,
    source: &S,
    start: u32,
    chunk_size: usize,
    mut progress: F,
) -> Result<LoadReport, BridgeError>
where
    M: TargetMemory + ?Sized,
    S: ImageSource + ?Sized,
    F: FnMut(u32, usize),
{
    let mut reader = source.open().map_err(|e| io_error(source, e))?;
    let mut buf = vec![0; chunk_size.max(1)];
    let mut addr = start;
    let mut report = LoadReport {
        start,
        bytes_written: 0,
        chunks: 0,
    };

    info!(image = %source.name(), start, "loading image");
    loop {
        let len = read_chunk(&mut reader, &mut buf).map_err(|e| io_error(source, e))?;
        if len == 0 {
            break;
        }
        debug!(len, addr, "writing chunk");
        progress(addr, len);

        for byte in &buf[..len] {
            mem.write_byte(addr, *byte);
            addr = addr.wrapping_add(1);
        }
        report.bytes_written += len as u64;
        report.chunks += 1;
    }

    info!(bytes = report.bytes_written, "image loaded");
    Ok(report)
}

/// Re-reads `source` and compares it byte-for-byte with target memory.
///
/// Comparison stops as soon as `max_mismatches` differences are recorded.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] when the source cannot be reopened or read and
/// [`BridgeError::Verify`] when any byte differs.
pub fn verify<M, S>(
    mem: &mut M,
    source: &S,
    start: u32,
    chunk_size: usize,
    max_mismatches: usize,
) -> Result<VerifyReport, BridgeError>
where
    M: TargetMemory + ?Sized,
    S: ImageSource + ?Sized,
{
    let limit = max_mismatches.max(1);
    let mut reader = source.open().map_err(|e| io_error(source, e))?;
    let mut buf = vec![0; chunk_size.max(1)];
    let mut addr = start;
    let mut mismatches = Vec::new();
    let mut compared = 0_u64;

    info!(image = %source.name(), start, "verifying image");
    loop {
        let len = read_chunk(&mut reader, &mut buf).map_err(|e| io_error(source, e))?;
        if len == 0 {
            break;
        }

        for expected in &buf[..len] {
            let actual = mem.read_byte(addr);
            compared += 1;
            if actual != *expected {
                let mismatch = Mismatch {
                    addr,
                    expected: *expected,
                    actual,
                };
                warn!(%mismatch, "verification mismatch");
                mismatches.push(mismatch);
                if mismatches.len() >= limit {
                    return Err(BridgeError::Verify {
                        mismatches,
                        truncated: true,
                    });
                }
            }
            addr = addr.wrapping_add(1);
        }
    }

    if mismatches.is_empty() {
        info!(bytes = compared, "verification successful");
        Ok(VerifyReport {
            start,
            bytes_compared: compared,
        })
    } else {
        Err(BridgeError::Verify {
            mismatches,
            truncated: false,
        })
    }
}

impl<B: PortBus> Bridge<B> {
    /// Loads `source` at `start` using the configured chunk size.
    ///
    /// # Errors
    ///
    /// See [`load`].
    pub fn load_image<S: ImageSource + ?Sized>(
        &mut self,
        source: &S,
        start: u32,
    ) -> Result<LoadReport, BridgeError> {
        let chunk_size = self.config().chunk_size;
        load(self, source, start, chunk_size)
    }

    /// Loads `source` at `start`, reporting each chunk to `progress`.
    ///
    /// # Errors
    ///
    /// See [`load_with_progress`].
    pub fn load_image_with_progress<S, F>(
        &mut self,
        source: &S,
        start: u32,
        progress: F,
    ) -> Result<LoadReport, BridgeError>
    where
        S: ImageSource + ?Sized,
        F: FnMut(u32, usize),
    {
        let chunk_size = self.config().chunk_size;
        load_with_progress(self, source, start, chunk_size, progress)
    }

    /// Verifies `source` at `start` using the configured chunk size and limit.
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify_image<S: ImageSource + ?Sized>(
        &mut self,
        source: &S,
        start: u32,
    ) -> Result<VerifyReport, BridgeError> {
        let chunk_size = self.config().chunk_size;
        let limit = self.config().max_verify_mismatches;
        verify(self, source, start, chunk_size, limit)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::{load, read_chunk, verify, FileImage, ImageSource, MemoryImage, Mismatch};
    use crate::{Bridge, BridgeConfig, BridgeError, SimulatedBoard};

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    /// Yields at most three bytes per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.0.len().min(buf.len()).min(3);
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn read_chunk_fills_across_short_reads() {
        let data = pattern(10);
        let mut reader = Trickle(&data);
        let mut buf = [0; 8];

        assert_eq!(read_chunk(&mut reader, &mut buf).expect("read"), 8);
        assert_eq!(buf, data[..8]);
        assert_eq!(read_chunk(&mut reader, &mut buf).expect("read"), 2);
        assert_eq!(read_chunk(&mut reader, &mut buf).expect("read"), 0);
    }

    #[test]
    fn load_writes_sequential_bytes_in_chunks() {
        let image = MemoryImage::new("pattern", pattern(2500));
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        let report = load(&mut bridge, &image, 0x2_0000, 1024).expect("load");

        assert_eq!(report.bytes_written, 2500);
        assert_eq!(report.chunks, 3);
        let board = bridge.into_bus();
        assert!((0x2_0000..0x2_0000 + 2500)
            .zip(image.bytes())
            .all(|(addr, byte)| board.peek(addr) == *byte));
        assert_eq!(board.peek(0x2_0000 + 2500), 0);
    }

    #[test]
    fn progress_reports_each_chunk_address_and_length() {
        let image = MemoryImage::new("pattern", pattern(2500));
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        let mut chunks = Vec::new();

        let report = bridge
            .load_image_with_progress(&image, 0x2_0000, |addr, len| chunks.push((addr, len)))
            .expect("load");

        assert_eq!(report.chunks, 3);
        assert_eq!(
            chunks,
            vec![(0x2_0000, 1024), (0x2_0400, 1024), (0x2_0800, 452)]
        );
    }

    #[test]
    fn load_crosses_bank_boundary() {
        let image = MemoryImage::new("span", pattern(64));
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        let _ = bridge.load_image(&image, 0x1_FFE0).expect("load");

        let board = bridge.into_bus();
        assert_eq!(board.peek(0x1_FFFF), image.bytes()[31]);
        assert_eq!(board.peek(0x2_0000), image.bytes()[32]);
    }

    #[test]
    fn empty_image_loads_and_verifies_trivially() {
        let image = MemoryImage::new("empty", Vec::new());
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        let loaded = bridge.load_image(&image, 0x1_0000).expect("load");
        let verified = bridge.verify_image(&image, 0x1_0000).expect("verify");

        assert_eq!(loaded.bytes_written, 0);
        assert_eq!(loaded.chunks, 0);
        assert_eq!(verified.bytes_compared, 0);
    }

    #[test]
    fn missing_file_is_reported_as_io_error() {
        let image = FileImage::new("/nonexistent/dir/image.bin");
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());

        let error = bridge.load_image(&image, 0).expect_err("open must fail");

        match error {
            BridgeError::Io { name, source } => {
                assert_eq!(name, image.name());
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_flipped_byte_reports_one_mismatch() {
        let image = MemoryImage::new("pattern", pattern(2000));
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        let _ = bridge.load_image(&image, 0x2_0000).expect("load");

        let original = image.bytes()[0x123];
        bridge.device_mut().bus_mut().poke(0x2_0123, !original);

        let error = bridge
            .verify_image(&image, 0x2_0000)
            .expect_err("verify must fail");
        match error {
            BridgeError::Verify {
                mismatches,
                truncated,
            } => {
                assert!(!truncated);
                assert_eq!(
                    mismatches,
                    vec![Mismatch {
                        addr: 0x2_0123,
                        expected: original,
                        actual: !original,
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn verification_gives_up_at_mismatch_limit() {
        let loaded = MemoryImage::new("zeros", vec![0x00; 40]);
        let other = MemoryImage::new("ones", vec![0xFF; 40]);
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        let _ = bridge.load_image(&loaded, 0x3000).expect("load");
        bridge.device_mut().bus_mut().reset_stats();

        let error = verify(&mut bridge, &other, 0x3000, 16, 10).expect_err("verify must fail");

        match error {
            BridgeError::Verify {
                mismatches,
                truncated,
            } => {
                assert!(truncated);
                assert_eq!(mismatches.len(), 10);
                assert_eq!(mismatches[9].addr, 0x3009);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bridge.device().bus().stats().target_reads, 10);
    }

    #[test]
    fn nine_mismatches_run_to_end_of_stream() {
        let mut bytes = vec![0x00; 30];
        for byte in bytes.iter_mut().step_by(3).take(9) {
            *byte = 0x55;
        }
        let expected = MemoryImage::new("sparse", bytes);
        let mut bridge = Bridge::new(SimulatedBoard::new(), BridgeConfig::default());
        bridge.device_mut().bus_mut().reset_stats();

        let error = bridge
            .verify_image(&expected, 0x100)
            .expect_err("verify must fail");

        match error {
            BridgeError::Verify {
                mismatches,
                truncated,
            } => {
                assert!(!truncated);
                assert_eq!(mismatches.len(), 9);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bridge.device().bus().stats().target_reads, 30);
    }

    #[test]
    fn mismatch_display_matches_report_format() {
        let mismatch = Mismatch {
            addr: 0x0001_0010,
            expected: 0x4E,
            actual: 0x00,
        };
        assert_eq!(
            mismatch.to_string(),
            "at 0x00010010: file=0x4E, memory=0x00"
        );
    }
}
