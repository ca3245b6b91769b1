//! Two-pass growth-curve sampling.
//!
//! Pass 1 counts the valid windows `T` of the genome. Pass 2 streams the
//! windows again, inserting each canonical k-mer into a distinct set, and
//! records `(distinct, processed)` the first time progress reaches each
//! integer percentile of `T`.
//!
//! `T` has to be known before the first checkpoint can be placed, which is why
//! the source is read twice. When `T < 100` a single window can cross several
//! percentiles; every crossed percentile gets the same snapshot, so a curve
//! always has exactly [`PERCENTILES`] points.

use ahash::AHashSet;
use tracing::debug;

use crate::domain::{GrowthCurve, GrowthPoint, ItemError};
use crate::error::AppError;
use crate::io::fasta::RecordSource;
use crate::kmer::canonical::{CanonicalKmer, validate_k};
use crate::kmer::runs::{canonical_kmers, count_windows};

/// Checkpoints per curve.
pub const PERCENTILES: u32 = 100;

/// Emits a checkpoint for every percentile crossed by the running count.
#[derive(Debug, Clone)]
struct PercentileTracker {
    total_windows: u64,
    /// Next percentile still pending (1..=100; 101 once complete).
    next: u32,
    points: Vec<GrowthPoint>,
}

impl PercentileTracker {
    fn new(total_windows: u64) -> Self {
        Self {
            total_windows,
            next: 1,
            points: Vec::with_capacity(PERCENTILES as usize),
        }
    }

    fn observe(&mut self, processed: u64, distinct: u64) {
        let pct = (u128::from(processed) * 100 / u128::from(self.total_windows)) as u32;
        while self.next <= pct.min(PERCENTILES) {
            self.points.push(GrowthPoint {
                distinct,
                total: processed,
            });
            self.next += 1;
        }
    }

    fn finish(mut self, processed: u64, distinct: u64) -> GrowthCurve {
        while self.next <= PERCENTILES {
            self.points.push(GrowthPoint {
                distinct,
                total: processed,
            });
            self.next += 1;
        }
        GrowthCurve {
            points: self.points,
        }
    }
}

/// Growth-curve sampler for a fixed k.
///
/// Holds no state between calls; every [`GrowthSampler::sample`] owns its own
/// distinct set, which is dropped when the curve is returned.
#[derive(Debug, Clone, Copy)]
pub struct GrowthSampler {
    k: usize,
}

impl GrowthSampler {
    pub fn new(k: usize) -> Result<Self, AppError> {
        Ok(Self { k: validate_k(k)? })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Counting pass: total valid windows across all records.
    pub fn count_windows<S: RecordSource>(&self, source: &S) -> Result<u64, ItemError> {
        let mut total = 0u64;
        source.for_each_record(|_, seq| total += count_windows(seq, self.k))?;
        Ok(total)
    }

    /// Produce the 100-point growth curve of `source`.
    ///
    /// Returns [`ItemError::NoValidData`] when the genome has no valid window.
    pub fn sample<S: RecordSource>(&self, source: &S) -> Result<GrowthCurve, ItemError> {
        let total_windows = self.count_windows(source)?;
        if total_windows == 0 {
            return Err(ItemError::NoValidData);
        }
        debug!(k = self.k, total_windows, "counting pass complete");

        let mut seen: AHashSet<CanonicalKmer> = AHashSet::new();
        let mut tracker = PercentileTracker::new(total_windows);
        let mut processed = 0u64;

        source.for_each_record(|_, seq| {
            for kmer in canonical_kmers(seq, self.k) {
                seen.insert(kmer);
                processed += 1;
                tracker.observe(processed, seen.len() as u64);
            }
        })?;

        if processed != total_windows {
            // The source changed between passes.
            return Err(ItemError::Unreadable(format!(
                "window count changed between passes ({total_windows} then {processed})"
            )));
        }

        debug!(distinct = seen.len(), processed, "streaming pass complete");
        Ok(tracker.finish(processed, seen.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fasta::MemoryRecords;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn assert_curve_invariants(curve: &GrowthCurve) {
        assert_eq!(curve.len(), PERCENTILES as usize);
        for w in curve.points.windows(2) {
            assert!(w[0].distinct <= w[1].distinct);
            assert!(w[0].total <= w[1].total);
        }
        for p in &curve.points {
            assert!(p.distinct <= p.total);
        }
    }

    #[test]
    fn small_genome_duplicates_snapshots() {
        let source = MemoryRecords::from_pairs([("r", "ATCGATCGATCG")]);
        let sampler = GrowthSampler::new(3).unwrap();
        assert_eq!(sampler.count_windows(&source).unwrap(), 10);

        let curve = sampler.sample(&source).unwrap();
        assert_curve_invariants(&curve);

        // Window 1 (ATC) covers percentiles 1..=10, window 2 (TCG -> CGA) 11..=20.
        for p in &curve.points[..10] {
            assert_eq!(*p, GrowthPoint { distinct: 1, total: 1 });
        }
        for p in &curve.points[10..20] {
            assert_eq!(*p, GrowthPoint { distinct: 2, total: 2 });
        }
        assert_eq!(curve.last(), Some(GrowthPoint { distinct: 2, total: 10 }));
    }

    #[test]
    fn large_genome_has_strictly_increasing_totals() {
        let mut rng = StdRng::seed_from_u64(7);
        let seq: Vec<u8> = (0..5_000)
            .map(|_| *[b'A', b'C', b'G', b'T', b'N'].choose(&mut rng).unwrap())
            .collect();
        let source = MemoryRecords::from_pairs([("r1", seq.clone()), ("r2", seq)]);
        let sampler = GrowthSampler::new(5).unwrap();
        let total = sampler.count_windows(&source).unwrap();
        assert!(total >= 100);

        let curve = sampler.sample(&source).unwrap();
        assert_curve_invariants(&curve);
        for w in curve.points.windows(2) {
            assert!(w[0].total < w[1].total);
        }
        assert_eq!(curve.last().unwrap().total, total);
        // The second record repeats the first, so no new k-mers appear after 50%.
        assert_eq!(curve.points[49].distinct, curve.last().unwrap().distinct);
    }

    #[test]
    fn all_invalid_genome_reports_no_data() {
        let source = MemoryRecords::from_pairs([("r", "NNNNNNNNNN")]);
        let err = GrowthSampler::new(3).unwrap().sample(&source).unwrap_err();
        assert_eq!(err, ItemError::NoValidData);
    }

    #[test]
    fn exactly_one_window() {
        let source = MemoryRecords::from_pairs([("r", "NACGN")]);
        let curve = GrowthSampler::new(3).unwrap().sample(&source).unwrap();
        assert_curve_invariants(&curve);
        assert!(curve.points.iter().all(|p| *p == GrowthPoint { distinct: 1, total: 1 }));
    }

    #[test]
    fn rejects_invalid_k() {
        assert!(GrowthSampler::new(0).is_err());
        assert!(GrowthSampler::new(40).is_err());
    }
}
