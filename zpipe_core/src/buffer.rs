use std::collections::VecDeque;

/// Fixed size of every [`ByteQueue`] segment: 8 KiB.
///
/// This is also the transfer-unit threshold for [`CompressWriter`]'s
/// continue-mode policy: input is only fed to the codec once at least one
/// full segment has accumulated.
///
/// [`CompressWriter`]: crate::CompressWriter
pub const SEGMENT_SIZE: usize = 8 * 1024;

/// One fixed-capacity segment. `start..end` is the readable region;
/// `end..SEGMENT_SIZE` is writable tail space.
struct Segment {
    data: Box<[u8]>,
    start: usize,
    end: usize,
}

impl Segment {
    fn new() -> Self {
        Self {
            data: vec![0u8; SEGMENT_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    fn readable(&self) -> usize {
        self.end - self.start
    }
}

/// Unbounded FIFO byte queue backed by fixed-size segments.
///
/// # Cursor contract
/// Reads go through [`chunk`] (borrow the next contiguous readable region)
/// followed by [`consume`] (release exactly the bytes actually used).
/// Writes go through [`writable_chunk`] (borrow tail space, growing the
/// queue so at least one byte is writable) followed by [`commit`] (publish
/// exactly the bytes actually written). A borrowed view must not outlive a
/// single codec step.
///
/// Bytes are consumed strictly in the order they were appended; consumption
/// never shifts unrelated data.
///
/// [`chunk`]: ByteQueue::chunk
/// [`consume`]: ByteQueue::consume
/// [`writable_chunk`]: ByteQueue::writable_chunk
/// [`commit`]: ByteQueue::commit
#[derive(Default)]
pub struct ByteQueue {
    segments: VecDeque<Segment>,
    len: usize,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes held in full transfer units: the total length minus a
    /// partially filled tail segment. A tail whose write cursor has reached
    /// the segment boundary counts as complete even if partially consumed.
    pub fn complete_segment_len(&self) -> usize {
        match self.segments.back() {
            Some(tail) if tail.end < SEGMENT_SIZE => self.len - tail.readable(),
            _ => self.len,
        }
    }

    /// Append a copy of `src`, filling tail space before growing.
    pub fn push(&mut self, mut src: &[u8]) {
        while !src.is_empty() {
            let space = self.writable_chunk();
            let n = space.len().min(src.len());
            space[..n].copy_from_slice(&src[..n]);
            self.commit(n);
            src = &src[n..];
        }
    }

    /// The next contiguous readable region, empty when the queue is empty.
    pub fn chunk(&self) -> &[u8] {
        match self.segments.front() {
            Some(segment) => &segment.data[segment.start..segment.end],
            None => &[],
        }
    }

    /// Drop `n` bytes from the front. `n` must not exceed [`len`].
    ///
    /// [`len`]: ByteQueue::len
    pub fn consume(&mut self, mut n: usize) {
        debug_assert!(n <= self.len, "consume {} of {}", n, self.len);
        self.len -= n;
        while n > 0 {
            let front = self.segments.front_mut().expect("consume past end");
            let take = n.min(front.readable());
            front.start += take;
            n -= take;
            if front.start == front.end {
                self.segments.pop_front();
            }
        }
    }

    /// Borrow writable tail space, appending a fresh segment when the tail
    /// is full, so the returned slice is never empty.
    pub fn writable_chunk(&mut self) -> &mut [u8] {
        let needs_tail = match self.segments.back() {
            None => true,
            Some(tail) => tail.end == SEGMENT_SIZE,
        };
        if needs_tail {
            self.segments.push_back(Segment::new());
        }
        let tail = self.segments.back_mut().expect("tail segment");
        &mut tail.data[tail.end..]
    }

    /// Publish `n` bytes written into the most recent [`writable_chunk`].
    ///
    /// [`writable_chunk`]: ByteQueue::writable_chunk
    pub fn commit(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let tail = self.segments.back_mut().expect("commit without writable_chunk");
        debug_assert!(n <= SEGMENT_SIZE - tail.end, "commit past segment end");
        tail.end += n;
        self.len += n;
    }

    /// Copy up to `dst.len()` bytes into `dst`, consuming them. Returns the
    /// number of bytes copied (0 when the queue is empty).
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < dst.len() && !self.is_empty() {
            let chunk = self.chunk();
            let n = chunk.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            self.consume(n);
            copied += n;
        }
        copied
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.len = 0;
    }
}
