//! Valid-symbol runs and the canonical windows inside them.
//!
//! A run is a maximal span of {A,C,G,T} (either case). Invalid symbols end
//! the current run and scanning resumes right after them, so a run of length
//! `L` contributes exactly `max(L - k + 1, 0)` windows.

use crate::kmer::canonical::{CanonicalKmer, KmerRoller, encode_base};

/// Windows contributed by a run of `run_len` symbols.
#[inline]
pub fn window_count(run_len: usize, k: usize) -> u64 {
    if k == 0 || run_len < k {
        0
    } else {
        (run_len - k + 1) as u64
    }
}

/// Iterator over the maximal valid runs of a record.
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    seq: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.seq.len() && encode_base(self.seq[self.pos]).is_none() {
            self.pos += 1;
        }
        if self.pos >= self.seq.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.seq.len() && encode_base(self.seq[self.pos]).is_some() {
            self.pos += 1;
        }
        Some(&self.seq[start..self.pos])
    }
}

pub fn runs(seq: &[u8]) -> Runs<'_> {
    Runs { seq, pos: 0 }
}

/// Total windows in one record: the counting pass of the sampler.
pub fn count_windows(seq: &[u8], k: usize) -> u64 {
    runs(seq).map(|run| window_count(run.len(), k)).sum()
}

/// Lazy canonical k-mers of a record, left to right.
#[derive(Debug, Clone)]
pub struct CanonicalKmers<'a> {
    seq: &'a [u8],
    pos: usize,
    roller: KmerRoller,
    windows: u64,
}

impl CanonicalKmers<'_> {
    /// Windows yielded so far.
    pub fn windows_seen(&self) -> u64 {
        self.windows
    }
}

impl Iterator for CanonicalKmers<'_> {
    type Item = CanonicalKmer;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.seq.len() {
            let base = self.seq[self.pos];
            self.pos += 1;
            if let Some(kmer) = self.roller.push(base) {
                self.windows += 1;
                return Some(kmer);
            }
        }
        None
    }
}

/// Canonical k-mers of `seq`. `k` must already be validated.
pub fn canonical_kmers(seq: &[u8], k: usize) -> CanonicalKmers<'_> {
    CanonicalKmers {
        seq,
        pos: 0,
        roller: KmerRoller::new(k),
        windows: 0,
    }
}
