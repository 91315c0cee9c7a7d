use std::io::Read;

use crossbeam_channel::{bounded, Receiver, Sender};
use memchr::memrchr;

use crate::Error;

/// A line-aligned slice of the input: starts at the beginning of a line and
/// ends just after a terminator (except possibly the very last segment of an
/// unterminated file). The backing buffer comes from a [`BufferPool`] and is
/// returned there by whichever worker consumes the segment.
pub struct Segment {
    buf: Vec<u8>,
    len: usize,
}

impl Segment {
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Gives the backing buffer back for recycling.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buf
    }
}

/// Fixed set of reusable read buffers. Implemented as a pre-filled bounded
/// channel: `acquire` blocks when every buffer is in flight, which is how
/// backpressure reaches the reader when the segment queue is also full.
#[derive(Clone)]
pub struct BufferPool {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl BufferPool {
    pub fn new(capacity: usize, block_size: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        for _ in 0..capacity {
            tx.send(vec![0u8; block_size])
                .expect("freshly created pool cannot be full");
        }
        Self { tx, rx }
    }

    pub fn acquire(&self) -> Vec<u8> {
        self.rx.recv().expect("pool holds its own sender")
    }

    pub fn release(&self, buf: Vec<u8>) {
        // Fails only once the pool itself is gone, at which point the buffer
        // can simply be dropped.
        let _ = self.tx.send(buf);
    }
}

/// Reads the source in large blocks and emits line-aligned [`Segment`]s.
///
/// Each block is read in after whatever partial trailing line the previous
/// block left behind; a backward scan finds the last terminator, everything
/// up to it becomes a segment, and the tail is copied to the front of a
/// freshly acquired buffer.
pub struct ChunkReader<R> {
    source: R,
    pool: BufferPool,
    block_size: usize,
    buf: Vec<u8>,
    filled: usize,
    eof: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R, pool: BufferPool, block_size: usize) -> Self {
        let buf = pool.acquire();
        Self {
            source,
            pool,
            block_size,
            buf,
            filled: 0,
            eof: false,
        }
    }

    /// Next line-aligned segment, or `Ok(None)` once the source is drained.
    pub fn next_segment(&mut self) -> Result<Option<Segment>, Error> {
        while !self.eof && self.filled < self.buf.len() {
            let n = self.source.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                self.eof = true;
            } else {
                self.filled += n;
            }
        }
        if self.filled == 0 {
            return Ok(None);
        }
        match memrchr(b'\n', &self.buf[..self.filled]) {
            Some(at) => {
                let end = at + 1;
                let mut next = self.pool.acquire();
                let tail = self.filled - end;
                next[..tail].copy_from_slice(&self.buf[end..self.filled]);
                let full = std::mem::replace(&mut self.buf, next);
                self.filled = tail;
                Ok(Some(Segment { buf: full, len: end }))
            }
            None if self.eof => {
                // Unterminated final line: flushed as one complete record.
                let len = self.filled;
                self.filled = 0;
                let full = std::mem::take(&mut self.buf);
                Ok(Some(Segment { buf: full, len }))
            }
            None => Err(Error::LineTooLong(self.block_size)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{BufferPool, ChunkReader};
    use crate::Error;

    fn segments(input: &[u8], block_size: usize) -> Vec<Vec<u8>> {
        let pool = BufferPool::new(4, block_size);
        let mut reader = ChunkReader::new(input, pool.clone(), block_size);
        let mut out = Vec::new();
        while let Some(segment) = reader.next_segment().expect("well-formed input") {
            out.push(segment.bytes().to_vec());
            pool.release(segment.into_buffer());
        }
        out
    }

    #[test]
    fn segments_are_line_aligned_and_lossless() {
        let input = b"Abidjan;5.0\nOslo;-3.2\nXy;9.9\nOslo;1.1\n";
        for block_size in [12, 13, 16, 64] {
            let got = segments(input, block_size);
            for segment in &got {
                assert_eq!(
                    segment.last(),
                    Some(&b'\n'),
                    "partial line leaked at block_size {block_size}"
                );
            }
            let rejoined: Vec<u8> = got.concat();
            assert_eq!(rejoined, input, "bytes lost at block_size {block_size}");
        }
    }

    #[test]
    fn line_split_across_blocks_is_carried_over() {
        // 11-byte block ends mid "Oslo;-3.2" line
        let got = segments(b"X;5.0\nX;-3.2\n", 11);
        assert_eq!(got[0], b"X;5.0\n");
        assert_eq!(got[1], b"X;-3.2\n");
    }

    #[test]
    fn unterminated_final_line_is_flushed() {
        let got = segments(b"A;1.0\nB;2.0", 64);
        assert_eq!(got.last().unwrap().as_slice(), b"B;2.0");
        let rejoined: Vec<u8> = got.concat();
        assert_eq!(rejoined, b"A;1.0\nB;2.0");
    }

    #[test]
    fn empty_input_produces_no_segments() {
        assert!(segments(b"", 16).is_empty());
    }

    #[test]
    fn line_longer_than_block_fails_fast() {
        let pool = BufferPool::new(2, 4);
        let mut reader = ChunkReader::new(b"much-too-long;1.0\n".as_slice(), pool, 4);
        match reader.next_segment() {
            Err(Error::LineTooLong(4)) => {}
            Err(other) => panic!("expected LineTooLong, got {other:?}"),
            Ok(_) => panic!("expected LineTooLong, got a segment"),
        }
    }

    #[test]
    fn reader_reuses_released_buffers() {
        // pool of 2 with one buffer held by the reader itself: only works if
        // consumed buffers actually make it back
        let input: Vec<u8> = b"K;1.0\n".repeat(50);
        let pool = BufferPool::new(2, 16);
        let mut reader = ChunkReader::new(input.as_slice(), pool.clone(), 16);
        let mut total = 0;
        while let Some(segment) = reader.next_segment().expect("well-formed input") {
            total += segment.bytes().len();
            pool.release(segment.into_buffer());
        }
        assert_eq!(total, input.len());
    }
}
