use std::io;

/// How a [`Compressor`] step should treat the frame it is building.
///
/// The variants are ordered by finality: `Continue` ingests more input and
/// produces output opportunistically, `Flush` forces out everything
/// derivable from input consumed so far without ending the frame, and `End`
/// finalizes the frame. An adapter that has driven `End` is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mode {
    Continue,
    Flush,
    End,
}

/// Tunable compressor parameter, applied before any data is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    CompressionLevel(i32),
    /// Append a content checksum to the frame. Changes both the compressed
    /// bytes and their length.
    ChecksumFlag(bool),
}

/// Outcome of a single codec step.
///
/// A step may consume zero bytes, produce zero bytes, or both; callers must
/// tolerate no-progress steps and keep driving until their own termination
/// condition is met. Errors never travel through `Step` — a failed step is
/// an `Err` carrying the codec's error name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Step {
    /// Bytes consumed from the input view on this call.
    pub consumed: usize,
    /// Bytes produced into the output view on this call.
    pub produced: usize,
    /// Zero when the requested operation fully completed: for
    /// [`Mode::Flush`] and [`Mode::End`] the codec has no internal state
    /// left to emit, and for decompression the frame is complete. Nonzero
    /// means more work remains even if the input view was fully consumed.
    pub remaining: usize,
}

/// Core compression abstraction.
///
/// Each implementation owns one opaque native compression context. The
/// context is created at construction, used only by the owning adapter, and
/// destroyed exactly once when the implementation is dropped.
pub trait Compressor {
    /// Apply a tunable parameter. Call before writing any data.
    fn set_parameter(&mut self, param: Param) -> io::Result<()>;

    /// Run one compression step: read from `input`, write into `output`,
    /// honoring `mode`. `input` may be empty once the caller has exhausted
    /// its pending bytes and is draining the codec's internal state.
    fn compress(&mut self, output: &mut [u8], input: &[u8], mode: Mode) -> io::Result<Step>;
}

/// Streaming decompression counterpart of [`Compressor`].
pub trait Decompressor {
    /// Run one decompression step: read compressed bytes from `input`,
    /// write decompressed bytes into `output`.
    fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> io::Result<Step>;
}
