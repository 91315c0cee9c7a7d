use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;
use memchr::memchr;

use crate::chunk::{BufferPool, Segment};
use crate::keymap::{self, KeyMap};
use crate::stats::RunningStats;
use crate::Error;

/// One aggregation worker: consumes segments until the channel disconnects
/// and returns its private map.
///
/// On the first malformed record the worker flips `failed` (the reader polls
/// it and stops producing) but keeps draining the channel, recycling buffers,
/// so a full queue can never wedge the reader. The error is returned once the
/// channel closes.
pub fn aggregate(
    segments: &Receiver<Segment>,
    pool: &BufferPool,
    failed: &AtomicBool,
) -> Result<KeyMap<RunningStats>, Error> {
    let mut map = KeyMap::default();
    let mut first_err = None;
    for segment in segments {
        if first_err.is_none() {
            if let Err(e) = consume(&mut map, segment.bytes()) {
                failed.store(true, Ordering::Relaxed);
                first_err = Some(e);
            }
        }
        pool.release(segment.into_buffer());
    }
    match first_err {
        None => Ok(map),
        Some(e) => Err(e),
    }
}

/// Splits a line-aligned segment into `key;value` records and folds them into
/// `map`. Key bytes are copied out of the segment only on first sight of the
/// key; the segment itself is recycled by the caller.
fn consume(map: &mut KeyMap<RunningStats>, bytes: &[u8]) -> Result<(), Error> {
    let mut rest = bytes;
    while !rest.is_empty() {
        // last record of an unterminated file has no '\n'
        let (line, next) = match memchr(b'\n', rest) {
            Some(nl) => (&rest[..nl], &rest[nl + 1..]),
            None => (rest, &[][..]),
        };
        let line = match line {
            [head @ .., b'\r'] => head,
            _ => line,
        };
        // the ';' search stays within the line so a delimiterless line is
        // caught instead of fusing with the line after it
        let semi = memchr(b';', line).ok_or(Error::MissingDelimiter)?;
        let raw = &line[semi + 1..];
        let value = lexical_core::parse::<f64>(raw)
            .map_err(|_| Error::BadNumber(String::from_utf8_lossy(raw).into_owned()))?;
        keymap::record(map, &line[..semi], value);
        rest = next;
    }
    Ok(())
}
