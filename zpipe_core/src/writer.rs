use std::io::{self, Write};

use crate::buffer::ByteQueue;
use crate::codec::{Compressor, Mode};

/// Streaming compression adapter over any [`Write`] destination.
///
/// # Write contract
/// Written bytes are staged in a pending queue and fed to the codec in full
/// 8 KiB transfer units; a partial tail is held back until more data, a
/// [`flush`], or [`close`] arrives. Compressed output is staged and emitted
/// to the destination segment by segment, so a long write never accumulates
/// unbounded compressed data in memory.
///
/// `flush` forces the codec to emit everything derivable from input
/// consumed so far (a zstd flush boundary) and flushes the destination, so
/// a concurrent reader of the destination can decode all bytes written so
/// far. `close` finalizes the frame, then always releases the codec context
/// and the destination, even when finalization fails; the first error is
/// reported after cleanup completes. Dropping the writer closes it, but the
/// error-reporting path is an explicit [`close`].
///
/// A failed `write` or `flush` leaves the writer open with a live codec
/// context, so a later explicit `close` still cleans up.
///
/// Operating on a closed writer is a precondition violation and panics.
///
/// [`flush`]: Write::flush
/// [`close`]: CompressWriter::close
pub struct CompressWriter<W: Write> {
    /// Destination for compressed data. `None` once closed.
    sink: Option<W>,
    /// Codec context. `None` once closed; dropping it destroys the native
    /// state exactly once.
    codec: Option<Box<dyn Compressor>>,
    /// Caller bytes not yet consumed by the codec. Strict FIFO.
    pending: ByteQueue,
    /// Compressed bytes not yet written to `sink`.
    staging: ByteQueue,
}

impl<W: Write> CompressWriter<W> {
    /// Wrap `sink`, taking ownership of a freshly created codec context.
    pub fn new(sink: W, codec: Box<dyn Compressor>) -> Self {
        Self {
            sink: Some(sink),
            codec: Some(codec),
            pending: ByteQueue::new(),
            staging: ByteQueue::new(),
        }
    }

    /// True once [`close`] has run; the codec context is destroyed and all
    /// further data operations panic.
    ///
    /// [`close`]: CompressWriter::close
    pub fn is_closed(&self) -> bool {
        self.codec.is_none()
    }

    /// Finalize the compressed frame and release everything this writer
    /// owns. Idempotent.
    ///
    /// The frame-end drive, the codec-context destruction, and the
    /// destination release all happen even if an earlier step fails; the
    /// first error is returned once cleanup is complete.
    pub fn close(&mut self) -> io::Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let finalize = self.drive(Mode::End);
        let drain = {
            let Self { sink, staging, .. } = self;
            let sink = sink.as_mut().expect("sink open during close");
            emit_all(sink, staging).and_then(|()| sink.flush())
        };
        self.codec = None;
        self.sink = None;

        finalize.and(drain)
    }

    /// Run the codec until `mode`'s termination condition holds.
    ///
    /// Each iteration performs at most one codec step, one segment-complete
    /// emission, and one error check. A step may consume or produce zero
    /// bytes; termination relies on the codec eventually draining its input
    /// and (for `Flush`/`End`) reporting a zero `remaining`.
    fn drive(&mut self, mode: Mode) -> io::Result<()> {
        let Self {
            sink,
            codec,
            pending,
            staging,
        } = self;
        let (Some(sink), Some(codec)) = (sink.as_mut(), codec.as_mut()) else {
            panic!("closed");
        };

        let mut input_remaining = match mode {
            // Only feed full transfer units; hold a partial tail back so
            // small writes don't trigger eager codec invocations.
            Mode::Continue => {
                let ready = pending.complete_segment_len();
                if ready == 0 {
                    return Ok(());
                }
                ready
            }
            Mode::Flush | Mode::End => pending.len(),
        };

        loop {
            let step = {
                let chunk = pending.chunk();
                // An empty view once input is exhausted: the codec still
                // has internal state to drain for Flush/End.
                let input = &chunk[..chunk.len().min(input_remaining)];
                let output = staging.writable_chunk();
                codec.compress(output, input, mode)?
            };

            pending.consume(step.consumed);
            input_remaining -= step.consumed;
            staging.commit(step.produced);

            emit_complete_segments(sink, staging)?;

            let finished = match mode {
                Mode::Continue => input_remaining == 0,
                Mode::Flush | Mode::End => input_remaining == 0 && step.remaining == 0,
            };
            if finished {
                return Ok(());
            }
        }
    }
}

impl<W: Write> Write for CompressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        assert!(!self.is_closed(), "closed");

        self.pending.push(buf);
        self.drive(Mode::Continue)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        assert!(!self.is_closed(), "closed");

        self.drive(Mode::Flush)?;
        let Self { sink, staging, .. } = self;
        let sink = sink.as_mut().expect("sink open while writer open");
        emit_all(sink, staging)?;
        sink.flush()
    }
}

impl<W: Write> Drop for CompressWriter<W> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Write full staging segments downstream, keeping a partial tail staged.
fn emit_complete_segments<W: Write>(sink: &mut W, staging: &mut ByteQueue) -> io::Result<()> {
    let mut ready = staging.complete_segment_len();
    while ready > 0 {
        let chunk = staging.chunk();
        let take = chunk.len().min(ready);
        sink.write_all(&chunk[..take])?;
        staging.consume(take);
        ready -= take;
    }
    Ok(())
}

/// Write everything staged downstream, partial tail included.
fn emit_all<W: Write>(sink: &mut W, staging: &mut ByteQueue) -> io::Result<()> {
    while !staging.is_empty() {
        let chunk = staging.chunk();
        sink.write_all(chunk)?;
        let n = chunk.len();
        staging.consume(n);
    }
    Ok(())
}
