use std::io::{self, Read};

use crate::buffer::ByteQueue;
use crate::codec::{Decompressor, Step};

/// Streaming decompression adapter over any [`Read`] source.
///
/// # Read contract
/// Each read first refills: while the decompressed output queue is empty,
/// at least one compressed byte is requested from the source and one codec
/// step is run. The read is then served from the output queue; a zero-byte
/// result is a clean end of stream.
///
/// Every decompress step reports `remaining == 0` when the frame is
/// complete and nonzero otherwise. The most recent value is tracked so an
/// exhausted source mid-frame surfaces as [`io::ErrorKind::UnexpectedEof`]
/// at the read that discovers the truncation — never proactively at open or
/// close. An immediately empty source is a valid zero-byte payload.
///
/// `close` is idempotent: it clears the output queue, destroys the codec
/// context, and releases the source, in that order. Dropping the reader
/// closes it. Operating on a closed reader is a precondition violation and
/// panics.
pub struct DecompressReader<R: Read> {
    /// Compressed upstream. `None` once closed.
    source: Option<R>,
    /// Codec context. `None` once closed; dropping it destroys the native
    /// state exactly once.
    codec: Option<Box<dyn Decompressor>>,
    /// Compressed bytes read from the source, not yet consumed by the codec.
    input: ByteQueue,
    /// Decompressed bytes not yet served to the caller. Strict FIFO,
    /// refilled only when empty.
    output: ByteQueue,
    /// `remaining` from the most recent decompress step; nonzero means the
    /// frame was left mid-stream.
    last_result: usize,
}

impl<R: Read> DecompressReader<R> {
    /// Wrap `source`, taking ownership of a freshly created codec context.
    pub fn new(source: R, codec: Box<dyn Decompressor>) -> Self {
        Self {
            source: Some(source),
            codec: Some(codec),
            input: ByteQueue::new(),
            output: ByteQueue::new(),
            last_result: 0,
        }
    }

    /// True once [`close`] has run.
    ///
    /// [`close`]: DecompressReader::close
    pub fn is_closed(&self) -> bool {
        self.codec.is_none()
    }

    /// Release everything this reader owns. Idempotent. There is no
    /// decompression work to finalize, so this never drives the codec.
    pub fn close(&mut self) -> io::Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        self.output.clear();
        self.codec = None;
        self.source = None;
        Ok(())
    }

    /// Decompress until the output queue has at least one byte or the
    /// source is exhausted.
    ///
    /// Loops past steps that consume input without producing output (frame
    /// headers), and tolerates steps that make no progress at all as long
    /// as the source keeps supplying bytes.
    fn refill(&mut self) -> io::Result<()> {
        while self.output.is_empty() {
            if !self.request(1)? {
                if self.last_result != 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "source exhausted before end of frame",
                    ));
                }
                return Ok(());
            }

            let step = self.step()?;
            self.last_result = step.remaining;
        }
        Ok(())
    }

    /// One codec step from the input queue's front chunk into the output
    /// queue's writable chunk, committing exactly what was processed.
    fn step(&mut self) -> io::Result<Step> {
        let Self {
            codec,
            input,
            output,
            ..
        } = self;
        let codec = codec.as_mut().expect("codec alive while reader open");

        let step = codec.decompress(output.writable_chunk(), input.chunk())?;
        input.consume(step.consumed);
        output.commit(step.produced);
        Ok(step)
    }

    /// Ensure at least `count` compressed bytes are buffered, reading from
    /// the source as needed. Returns false if the source is exhausted first.
    fn request(&mut self, count: usize) -> io::Result<bool> {
        while self.input.len() < count {
            let Self { source, input, .. } = self;
            let source = source.as_mut().expect("source alive while reader open");

            let space = input.writable_chunk();
            let n = match source.read(space) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                return Ok(false);
            }
            input.commit(n);
        }
        Ok(true)
    }
}

impl<R: Read> Read for DecompressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        assert!(!self.is_closed(), "closed");
        if buf.is_empty() {
            return Ok(0);
        }

        self.refill()?;
        Ok(self.output.read_into(buf))
    }
}

impl<R: Read> Drop for DecompressReader<R> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Identity "codec" whose wire format is the raw bytes themselves.
    /// `remaining` is always 0, so any stopping point is a clean frame end.
    struct MirrorDecompressor {
        destroyed: Rc<RefCell<u32>>,
    }

    impl MirrorDecompressor {
        fn new(destroyed: &Rc<RefCell<u32>>) -> Box<dyn Decompressor> {
            Box::new(Self {
                destroyed: Rc::clone(destroyed),
            })
        }
    }

    impl Decompressor for MirrorDecompressor {
        fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> io::Result<Step> {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            Ok(Step {
                consumed: n,
                produced: n,
                remaining: 0,
            })
        }
    }

    impl Drop for MirrorDecompressor {
        fn drop(&mut self) {
            *self.destroyed.borrow_mut() += 1;
        }
    }

    /// Treats the first `header_len` bytes as a frame header that produces
    /// no output, then mirrors the rest. `remaining` stays nonzero until at
    /// least one payload byte has been decoded.
    struct HeaderedDecompressor {
        header_len: usize,
        decoded_any: bool,
    }

    impl Decompressor for HeaderedDecompressor {
        fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> io::Result<Step> {
            if self.header_len > 0 {
                let n = input.len().min(self.header_len);
                self.header_len -= n;
                return Ok(Step {
                    consumed: n,
                    produced: 0,
                    remaining: 1,
                });
            }
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            if n > 0 {
                self.decoded_any = true;
            }
            Ok(Step {
                consumed: n,
                produced: n,
                remaining: usize::from(!self.decoded_any),
            })
        }
    }

    /// Never reports frame completion, so source exhaustion always looks
    /// like a truncated frame.
    struct UnfinishedDecompressor;

    impl Decompressor for UnfinishedDecompressor {
        fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> io::Result<Step> {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            Ok(Step {
                consumed: n,
                produced: n,
                remaining: 1,
            })
        }
    }

    fn mirror_reader(data: &[u8]) -> (DecompressReader<&[u8]>, Rc<RefCell<u32>>) {
        let destroyed = Rc::new(RefCell::new(0));
        let reader = DecompressReader::new(data, MirrorDecompressor::new(&destroyed));
        (reader, destroyed)
    }

    #[test]
    fn reads_everything_from_source() {
        let (mut reader, _) = mirror_reader(b"stream me");
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"stream me");
    }

    #[test]
    fn empty_source_reads_zero_bytes() {
        let (mut reader, _) = mirror_reader(b"");
        let mut out = Vec::new();
        assert_eq!(reader.read_to_end(&mut out).unwrap(), 0);
        reader.close().unwrap();
    }

    #[test]
    fn zero_length_read_has_no_side_effects() {
        let (mut reader, _) = mirror_reader(b"data");
        assert_eq!(reader.read(&mut []).unwrap(), 0);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"data");
    }

    #[test]
    fn partial_reads_serve_fifo() {
        let (mut reader, _) = mirror_reader(b"abcdef");
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"cd");
    }

    #[test]
    fn header_only_chunks_do_not_end_the_stream() {
        let reader_codec = Box::new(HeaderedDecompressor {
            header_len: 4,
            decoded_any: false,
        });
        let mut reader = DecompressReader::new(&b"HDR!payload"[..], reader_codec);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }

    #[test]
    fn truncated_frame_fails_with_unexpected_eof() {
        let mut reader = DecompressReader::new(&b"cut off"[..], Box::new(UnfinishedDecompressor));

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // Bytes decoded before the truncation were still served.
        assert_eq!(out, b"cut off");
    }

    #[test]
    fn close_is_idempotent_and_destroys_once() {
        let (mut reader, destroyed) = mirror_reader(b"x");
        reader.close().unwrap();
        reader.close().unwrap();
        assert!(reader.is_closed());
        drop(reader);
        assert_eq!(*destroyed.borrow(), 1);
    }

    #[test]
    fn drop_closes_implicitly() {
        let (reader, destroyed) = mirror_reader(b"x");
        drop(reader);
        assert_eq!(*destroyed.borrow(), 1);
    }

    #[test]
    #[should_panic(expected = "closed")]
    fn read_after_close_panics() {
        let (mut reader, _) = mirror_reader(b"x");
        reader.close().unwrap();
        let mut buf = [0u8; 1];
        let _ = reader.read(&mut buf);
    }
}
