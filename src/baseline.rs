//! Single-threaded reference implementation. Slow but obviously correct; the
//! parallel pipeline is validated against its output, which is guaranteed
//! byte-identical because both go through [`pipeline::sorted_rows`] and
//! [`pipeline::write_report`].

use std::fs::File;
use std::path::Path;

use memchr::memchr;
use memmap2::Mmap;

use crate::keymap::{self, KeyMap};
use crate::lines::Lines;
use crate::pipeline;
use crate::stats::RunningStats;
use crate::Error;

pub fn run(path: &Path) -> Result<Vec<(Box<[u8]>, RunningStats)>, Error> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    aggregate_bytes(&mmap)
}

pub fn aggregate_bytes(bytes: &[u8]) -> Result<Vec<(Box<[u8]>, RunningStats)>, Error> {
    let mut map: KeyMap<RunningStats> = KeyMap::default();
    for line in Lines::new(bytes) {
        let semi = memchr(b';', line).ok_or(Error::MissingDelimiter)?;
        let raw = &line[semi + 1..];
        let value = lexical_core::parse::<f64>(raw)
            .map_err(|_| Error::BadNumber(String::from_utf8_lossy(raw).into_owned()))?;
        keymap::record(&mut map, &line[..semi], value);
    }
    Ok(pipeline::sorted_rows(map))
}

#[cfg(test)]
mod test {
    use super::aggregate_bytes;
    use crate::pipeline::write_report;

    fn report(input: &[u8]) -> String {
        let rows = aggregate_bytes(input).unwrap();
        let mut out = Vec::new();
        write_report(&mut out, &rows).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn aggregates_and_sorts() {
        assert_eq!(
            report(b"B;5.0\nA;1.0\nB;3.0\n"),
            "A 1.0/1.0/1.0\nB 3.0/4.0/5.0\n"
        );
    }

    #[test]
    fn final_line_without_newline_counts() {
        assert_eq!(report(b"A;1.0\nA;3.0"), "A 1.0/2.0/3.0\n");
    }

    #[test]
    fn rejects_bad_number() {
        assert!(aggregate_bytes(b"A;abc\n").is_err());
    }

    #[test]
    fn rejects_line_without_delimiter() {
        assert!(matches!(
            aggregate_bytes(b"X\nB;2.0\n"),
            Err(crate::Error::MissingDelimiter)
        ));
        assert!(matches!(
            aggregate_bytes(b"A;1.0\n\nB;2.0\n"),
            Err(crate::Error::MissingDelimiter)
        ));
    }
}
