//! Canonical k-mer occurrence counting.
//!
//! Produces the `kmer<TAB>count` tables that the rank/frequency fits consume.

use ahash::AHashMap;

use crate::domain::ItemError;
use crate::io::fasta::RecordSource;
use crate::kmer::canonical::{CanonicalKmer, canonical_str, encode_kmer};
use crate::kmer::runs::canonical_kmers;

/// Occurrence counts of canonical k-mers for one genome.
#[derive(Debug, Clone)]
pub struct KmerCounts {
    pub k: usize,
    pub counts: AHashMap<CanonicalKmer, u64>,
    /// Windows processed (sum of all counts).
    pub total: u64,
}

impl KmerCounts {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            counts: AHashMap::new(),
            total: 0,
        }
    }

    pub fn add_sequence(&mut self, seq: &[u8]) {
        for kmer in canonical_kmers(seq, self.k) {
            *self.counts.entry(kmer).or_insert(0) += 1;
            self.total += 1;
        }
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, kmer: &str) -> u64 {
        canonical_str(kmer)
            .and_then(|c| encode_kmer(c.as_bytes()))
            .and_then(|bits| self.counts.get(&CanonicalKmer(bits)).copied())
            .unwrap_or(0)
    }

    /// `(kmer, count)` sorted by count descending, ties by k-mer ascending.
    pub fn sorted_desc(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(CanonicalKmer, u64)> =
            self.counts.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
            .into_iter()
            .map(|(kmer, count)| (kmer.to_string_k(self.k), count))
            .collect()
    }

    /// Counts only, as floats, in descending order.
    pub fn count_values(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.counts.values().map(|&c| c as f64).collect();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        values
    }
}

/// Count every canonical k-mer of a genome. `k` must already be validated.
pub fn count_canonical<S: RecordSource>(source: &S, k: usize) -> Result<KmerCounts, ItemError> {
    let mut counts = KmerCounts::new(k);
    source.for_each_record(|_, seq| counts.add_sequence(seq))?;
    Ok(counts)
}
