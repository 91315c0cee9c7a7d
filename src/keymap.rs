use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

use crate::stats::RunningStats;

/// Hash map keyed by raw byte spans, using the prefix-word hasher below.
///
/// Keys are stored owned (`Box<[u8]>`) but looked up by `&[u8]` through
/// `Borrow`, so the hot path never allocates for a key that is already
/// present.
pub type KeyMap<V> = HashMap<Box<[u8]>, V, BuildHasherDefault<PrefixWordHasher>>;

/// Hashes a byte key by reading its leading bytes as one little-endian
/// integer: up to 16 bytes, zero-extended. Short keys therefore hash their
/// entire content; keys longer than 16 bytes hash only their prefix. Two long
/// keys sharing a 16-byte prefix collide, an intentional trade-off: map
/// equality is always a full byte comparison, so a collision only costs
/// extra probes, never a wrong merge.
#[derive(Default)]
pub struct PrefixWordHasher {
    hash: u64,
}

const SEED: u64 = 0x517c_c1b7_2722_0a95;

impl PrefixWordHasher {
    #[inline]
    fn mix(&mut self, word: u64) {
        self.hash = (self.hash.rotate_left(5) ^ word).wrapping_mul(SEED);
    }
}

impl Hasher for PrefixWordHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut padded = [0u8; 16];
        let take = bytes.len().min(16);
        padded[..take].copy_from_slice(&bytes[..take]);
        let wide = u128::from_le_bytes(padded);
        self.mix(wide as u64);
        self.mix((wide >> 64) as u64);
    }

    // Length prefixes arrive through write_usize; keep them out of the
    // byte-prefix path.
    #[inline]
    fn write_usize(&mut self, n: usize) {
        self.mix(n as u64);
    }

    #[inline]
    fn write_u8(&mut self, n: u8) {
        self.mix(n as u64);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }
}

/// Insert-if-absent-else-update for one observation. The key bytes are copied
/// out of the (recyclable) segment only when the key is first seen.
#[inline]
pub fn record(map: &mut KeyMap<RunningStats>, key: &[u8], value: f64) {
    match map.get_mut(key) {
        Some(stats) => stats.add(value),
        None => {
            map.insert(Box::from(key), RunningStats::new(value));
        }
    }
}

/// Folds `src` into `dst` entry by entry, reusing `src`'s owned keys.
pub fn merge_into(dst: &mut KeyMap<RunningStats>, src: KeyMap<RunningStats>) {
    for (key, stats) in src {
        match dst.get_mut(key.as_ref()) {
            Some(existing) => existing.merge(&stats),
            None => {
                dst.insert(key, stats);
            }
        }
    }
}
