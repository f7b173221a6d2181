mod zstd_codec;

pub use zstd_codec::{ZstdCompressor, ZstdDecompressor};

use std::io::{self, Read, Write};

use zpipe_core::{CompressWriter, DecompressReader};

/// Returns a writer that compresses its data with Zstandard before
/// forwarding to `sink`. The caller must close (or drop) it to finalize the
/// frame.
pub fn zstd_compress<W: Write>(sink: W) -> io::Result<CompressWriter<W>> {
    Ok(CompressWriter::new(sink, Box::new(ZstdCompressor::new()?)))
}

/// Returns a reader that decompresses Zstandard data after reading from
/// `source`.
pub fn zstd_decompress<R: Read>(source: R) -> io::Result<DecompressReader<R>> {
    Ok(DecompressReader::new(
        source,
        Box::new(ZstdDecompressor::new()?),
    ))
}
