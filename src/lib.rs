//! Parallel min/mean/max aggregation over `key;value` text files.
//!
//! A single reader thread slices the input into line-aligned byte segments,
//! a bounded channel hands them to a fixed pool of workers, each worker
//! aggregates into a private byte-keyed map, and a final reduce pass merges,
//! sorts and formats. [`baseline`] holds a single-threaded implementation
//! that produces byte-identical output and serves as the correctness oracle.

pub mod baseline;
pub mod chunk;
pub mod keymap;
pub mod lines;
pub mod pipeline;
pub mod stats;
pub mod worker;

use thiserror::Error;

/// Fatal conditions. The input contract is strict: any malformed record
/// aborts the whole run rather than being skipped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    /// A full read block contained no line terminator. Lines are bounded in
    /// practice, so this is treated as corrupt input rather than a reason to
    /// grow the buffer.
    #[error("line longer than the {0}-byte read block")]
    LineTooLong(usize),

    #[error("record is missing the ';' delimiter")]
    MissingDelimiter,

    #[error("unparseable numeric field {0:?}")]
    BadNumber(String),
}
