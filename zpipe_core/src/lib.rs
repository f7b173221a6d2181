pub mod buffer;
pub mod codec;
pub mod reader;
pub mod writer;

pub use buffer::{ByteQueue, SEGMENT_SIZE};
pub use codec::{Compressor, Decompressor, Mode, Param, Step};
pub use reader::DecompressReader;
pub use writer::CompressWriter;
