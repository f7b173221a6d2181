use std::io;

use zstd::zstd_safe::{self, CCtx, CParameter, DCtx, InBuffer, OutBuffer};

use zpipe_core::{Compressor, Decompressor, Mode, Param, Step};

fn compress_error(code: usize) -> io::Error {
    io::Error::other(format!(
        "zstd compress failed: {}",
        zstd_safe::get_error_name(code)
    ))
}

fn decompress_error(code: usize) -> io::Error {
    io::Error::other(format!(
        "zstd decompress failed: {}",
        zstd_safe::get_error_name(code)
    ))
}

/// Streaming Zstandard compressor over a native `ZSTD_CCtx`.
///
/// The context is created here, owned exclusively by the adapter this is
/// handed to, and freed when the value drops. Parameters left untouched use
/// zstd's defaults (level 3, no checksum).
pub struct ZstdCompressor {
    ctx: CCtx<'static>,
}

impl ZstdCompressor {
    pub fn new() -> io::Result<Self> {
        let ctx = CCtx::try_create()
            .ok_or_else(|| io::Error::other("ZSTD_createCCtx failed: out of memory"))?;
        Ok(Self { ctx })
    }

    /// Shorthand for a compressor with a non-default compression level.
    pub fn with_level(level: i32) -> io::Result<Self> {
        let mut compressor = Self::new()?;
        compressor.set_parameter(Param::CompressionLevel(level))?;
        Ok(compressor)
    }
}

impl Compressor for ZstdCompressor {
    fn set_parameter(&mut self, param: Param) -> io::Result<()> {
        let param = match param {
            Param::CompressionLevel(level) => CParameter::CompressionLevel(level),
            Param::ChecksumFlag(on) => CParameter::ChecksumFlag(on),
        };
        self.ctx.set_parameter(param).map_err(compress_error)?;
        Ok(())
    }

    fn compress(&mut self, output: &mut [u8], input: &[u8], mode: Mode) -> io::Result<Step> {
        let mut out = OutBuffer::around(output);

        if !input.is_empty() {
            let mut inp = InBuffer::around(input);
            let hint = self
                .ctx
                .compress_stream(&mut out, &mut inp)
                .map_err(compress_error)?;
            let remaining = match mode {
                Mode::Continue => hint,
                // Input must fully drain before flush/end state can be
                // consulted, so whatever the hint says, work remains.
                Mode::Flush | Mode::End => hint.max(1),
            };
            return Ok(Step {
                consumed: inp.pos(),
                produced: out.pos(),
                remaining,
            });
        }

        let remaining = match mode {
            Mode::Continue => 0,
            Mode::Flush => self.ctx.flush_stream(&mut out).map_err(compress_error)?,
            Mode::End => self.ctx.end_stream(&mut out).map_err(compress_error)?,
        };
        Ok(Step {
            consumed: 0,
            produced: out.pos(),
            remaining,
        })
    }
}

/// Streaming Zstandard decompressor over a native `ZSTD_DCtx`.
pub struct ZstdDecompressor {
    ctx: DCtx<'static>,
}

impl ZstdDecompressor {
    pub fn new() -> io::Result<Self> {
        let ctx = DCtx::try_create()
            .ok_or_else(|| io::Error::other("ZSTD_createDCtx failed: out of memory"))?;
        Ok(Self { ctx })
    }
}

impl Decompressor for ZstdDecompressor {
    fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> io::Result<Step> {
        let mut out = OutBuffer::around(output);
        let mut inp = InBuffer::around(input);

        // Zero when the current frame is complete, nonzero when the codec
        // still expects input or output space.
        let remaining = self
            .ctx
            .decompress_stream(&mut out, &mut inp)
            .map_err(decompress_error)?;

        Ok(Step {
            consumed: inp.pos(),
            produced: out.pos(),
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_shot_compress(compressor: &mut ZstdCompressor, original: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 1024 + original.len()];
        let mut written = 0;
        let mut fed = 0;
        loop {
            let step = compressor
                .compress(&mut out[written..], &original[fed..], Mode::End)
                .unwrap();
            fed += step.consumed;
            written += step.produced;
            if fed == original.len() && step.remaining == 0 {
                break;
            }
        }
        out.truncate(written);
        out
    }

    #[test]
    fn one_shot_round_trips_through_reference_decoder() {
        let mut compressor = ZstdCompressor::new().unwrap();
        let compressed = one_shot_compress(&mut compressor, b"hello world");
        assert_eq!(zstd::decode_all(&compressed[..]).unwrap(), b"hello world");
    }

    #[test]
    fn checksum_flag_changes_and_lengthens_output() {
        let mut plain = ZstdCompressor::new().unwrap();
        let mut checked = ZstdCompressor::new().unwrap();
        checked.set_parameter(Param::ChecksumFlag(true)).unwrap();

        let without = one_shot_compress(&mut plain, b"hello world");
        let with = one_shot_compress(&mut checked, b"hello world");

        // The xxhash64 content checksum appends 4 bytes and flips a frame
        // header bit.
        assert_eq!(with.len(), without.len() + 4);
        assert_ne!(with, without);
        assert_eq!(zstd::decode_all(&with[..]).unwrap(), b"hello world");
    }

    #[test]
    fn decompress_step_reports_frame_completion() {
        let compressed = zstd::encode_all(&b"abc"[..], 3).unwrap();
        let mut decompressor = ZstdDecompressor::new().unwrap();

        let mut out = [0u8; 64];
        let step = decompressor.decompress(&mut out, &compressed).unwrap();
        assert_eq!(step.consumed, compressed.len());
        assert_eq!(&out[..step.produced], b"abc");
        assert_eq!(step.remaining, 0);
    }

    #[test]
    fn garbage_input_reports_zstd_error_name() {
        let mut decompressor = ZstdDecompressor::new().unwrap();
        let mut out = [0u8; 64];
        let err = decompressor
            .decompress(&mut out, b"this is not zstd data")
            .unwrap_err();
        assert!(
            err.to_string().starts_with("zstd decompress failed:"),
            "unexpected message: {}",
            err
        );
    }
}
