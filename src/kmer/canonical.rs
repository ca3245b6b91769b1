//! Strand-canonical k-mer encoding.
//!
//! K-mers are packed two bits per base into a `u64` (k <= 32):
//!
//! - A -> 00, C -> 01, G -> 10, T -> 11
//!
//! With this order the integer comparison of two packed k-mers of the same
//! length equals the lexicographic comparison of their strings, so
//! `min(forward, reverse_complement)` is exactly the lexicographically smaller
//! strand. Complement is `3 - bits` (A<->T, C<->G).

use crate::error::AppError;

/// Largest k that fits the 2-bit `u64` packing.
pub const MAX_K: usize = 32;

/// Canonical representative of `{window, reverse_complement(window)}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKmer(pub u64);

impl CanonicalKmer {
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Decode back to an upper-case string of length `k`.
    pub fn to_string_k(self, k: usize) -> String {
        decode_kmer(self.0, k)
    }
}

/// Reject k values the packing cannot represent.
pub fn validate_k(k: usize) -> Result<usize, AppError> {
    if k == 0 || k > MAX_K {
        return Err(AppError::input(format!(
            "k must be in 1..={MAX_K}, got {k}"
        )));
    }
    Ok(k)
}

#[inline]
pub const fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

#[inline]
pub const fn decode_base(bits: u64) -> u8 {
    match bits & 0b11 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

#[inline]
const fn complement_bits(bits: u64) -> u64 {
    3 - bits
}

#[inline]
fn kmer_mask(k: usize) -> u64 {
    if k >= MAX_K {
        u64::MAX
    } else {
        (1u64 << (2 * k)) - 1
    }
}

/// Pack a window. Returns `None` if any symbol is outside {A,C,G,T}.
pub fn encode_kmer(window: &[u8]) -> Option<u64> {
    debug_assert!(window.len() <= MAX_K);
    window
        .iter()
        .try_fold(0u64, |acc, &b| encode_base(b).map(|bits| (acc << 2) | bits))
}

pub fn decode_kmer(kmer: u64, k: usize) -> String {
    (0..k)
        .rev()
        .map(|i| decode_base(kmer >> (2 * i)) as char)
        .collect()
}

pub fn reverse_complement(kmer: u64, k: usize) -> u64 {
    let mut rc = 0u64;
    let mut fwd = kmer;
    for _ in 0..k {
        rc = (rc << 2) | complement_bits(fwd & 0b11);
        fwd >>= 2;
    }
    rc
}

pub fn canonical(kmer: u64, k: usize) -> CanonicalKmer {
    CanonicalKmer(kmer.min(reverse_complement(kmer, k)))
}

/// String-level canonicalization, for tables and tests.
///
/// Returns `None` if the window contains an invalid symbol or is longer than
/// [`MAX_K`].
pub fn canonical_str(window: &str) -> Option<String> {
    if window.is_empty() || window.len() > MAX_K {
        return None;
    }
    let k = window.len();
    encode_kmer(window.as_bytes()).map(|bits| canonical(bits, k).to_string_k(k))
}

pub fn reverse_complement_str(window: &str) -> Option<String> {
    if window.is_empty() || window.len() > MAX_K {
        return None;
    }
    let k = window.len();
    encode_kmer(window.as_bytes()).map(|bits| decode_kmer(reverse_complement(bits, k), k))
}

/// Rolling forward / reverse-complement encoder over a stream of bases.
///
/// Each valid base costs O(1); an invalid base resets the window so k-mers
/// never span a gap.
#[derive(Debug, Clone)]
pub struct KmerRoller {
    k: usize,
    mask: u64,
    rc_shift: usize,
    fwd: u64,
    rc: u64,
    filled: usize,
}

impl KmerRoller {
    pub fn new(k: usize) -> Self {
        debug_assert!((1..=MAX_K).contains(&k));
        Self {
            k,
            mask: kmer_mask(k),
            rc_shift: 2 * (k - 1),
            fwd: 0,
            rc: 0,
            filled: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn reset(&mut self) {
        self.fwd = 0;
        self.rc = 0;
        self.filled = 0;
    }

    /// Feed one symbol.
    ///
    /// Returns the canonical k-mer ending at this symbol once `k` consecutive
    /// valid symbols have been seen; invalid symbols reset and return `None`.
    #[inline]
    pub fn push(&mut self, base: u8) -> Option<CanonicalKmer> {
        let Some(bits) = encode_base(base) else {
            self.reset();
            return None;
        };
        self.fwd = ((self.fwd << 2) | bits) & self.mask;
        self.rc = (self.rc >> 2) | (complement_bits(bits) << self.rc_shift);
        if self.filled < self.k {
            self.filled += 1;
        }
        if self.filled == self.k {
            Some(CanonicalKmer(self.fwd.min(self.rc)))
        } else {
            None
        }
    }
}
