use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::bounded;

use crate::chunk::{BufferPool, ChunkReader, Segment};
use crate::keymap::{self, KeyMap};
use crate::stats::RunningStats;
use crate::worker;
use crate::Error;

/// Pipeline tuning. The defaults match the intended production shape; tests
/// shrink them to force block boundaries and pool contention.
#[derive(Debug, Clone)]
pub struct Options {
    /// Bytes per read block. Must exceed the longest input line.
    pub block_size: usize,
    /// In-flight segments between the reader and the workers.
    pub queue_capacity: usize,
    /// Aggregation threads.
    pub workers: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            block_size: 10 * 1024 * 1024,
            queue_capacity: 20,
            workers: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Aggregates the file at `path` and returns `(key, stats)` rows sorted by
/// byte-lexicographic key order.
pub fn run(path: &Path, options: &Options) -> Result<Vec<(Box<[u8]>, RunningStats)>, Error> {
    let file = File::open(path)?;
    aggregate_source(file, options)
}

/// Full pipeline over any byte source: reader thread → bounded segment queue
/// → worker pool → merge → sort.
pub fn aggregate_source<R: Read>(
    source: R,
    options: &Options,
) -> Result<Vec<(Box<[u8]>, RunningStats)>, Error> {
    let workers = options.workers.max(1);
    // one buffer per queue slot, per worker, plus the one the reader holds
    let pool = BufferPool::new(options.queue_capacity + workers + 1, options.block_size);
    let (tx, rx) = bounded::<Segment>(options.queue_capacity);
    let failed = AtomicBool::new(false);

    let maps = thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = rx.clone();
            let pool = &pool;
            let failed = &failed;
            handles.push(s.spawn(move || worker::aggregate(&rx, pool, failed)));
        }
        drop(rx);

        // the reader runs here, on the scope's own thread
        let mut reader = ChunkReader::new(source, pool.clone(), options.block_size);
        let mut read_err = None;
        while !failed.load(Ordering::Relaxed) {
            match reader.next_segment() {
                Ok(Some(segment)) => {
                    if tx.send(segment).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    read_err = Some(e);
                    break;
                }
            }
        }
        // closing the queue lets every worker drain and exit
        drop(tx);

        let mut maps = Vec::with_capacity(workers);
        let mut worker_err = None;
        for handle in handles {
            match handle.join().expect("worker thread panicked") {
                Ok(map) => maps.push(map),
                Err(e) => worker_err = worker_err.or(Some(e)),
            }
        }
        match worker_err.or(read_err) {
            Some(e) => Err(e),
            None => Ok(maps),
        }
    })?;

    let mut table: KeyMap<RunningStats> = KeyMap::default();
    for map in maps {
        keymap::merge_into(&mut table, map);
    }
    Ok(sorted_rows(table))
}

/// Merge output → ordered result rows. Shared with the baseline so the two
/// implementations sort and format identically.
pub fn sorted_rows(table: KeyMap<RunningStats>) -> Vec<(Box<[u8]>, RunningStats)> {
    let mut rows: Vec<_> = table.into_iter().collect();
    rows.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Renders `key min/mean/max`, one row per line, one fractional digit.
pub fn write_report(
    out: &mut impl Write,
    rows: &[(Box<[u8]>, RunningStats)],
) -> io::Result<()> {
    for (key, stats) in rows {
        out.write_all(key)?;
        writeln!(out, " {:.1}/{:.1}/{:.1}", stats.min, stats.mean(), stats.max)?;
    }
    Ok(())
}
