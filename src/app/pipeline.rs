//! Batch drivers shared by every subcommand.
//!
//! Each driver follows the same shape:
//! resolve the unit's inputs -> process each file independently -> write records
//!
//! Files are processed on a rayon pool sized by `--jobs`; results are collected
//! in input order, so output never depends on scheduling. A per-file problem
//! becomes an [`ItemError`] and a record line; only run-level problems (bad
//! partition, unwritable output) stop the batch.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    CountConfig, FitResult, FrequencySample, GrowthConfig, GrowthFitRecord, HeapsFitConfig, ItemError, LawFit,
    RankFitConfig, RankFitRecord, ShuffleConfig, UnitConfig, ZipfCheckConfig,
};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::fit::{FitOptions, best_by_bic, fit_growth_laws, fit_law, zipf_check};
use crate::growth::GrowthSampler;
use crate::io::{
    FastxFile, MemoryRecords, WorkPartition, ensure_dir, read_all, read_count_table,
    read_growth_series, resolve_input, write_count_table, write_fasta, write_growth_curve, write_json,
    write_lines,
};
use crate::kmer::{count_canonical, validate_k};
use crate::math::gini;
use crate::report::{
    RunSummary, format_growth_error, format_growth_fit, format_rank_error, format_rank_fit,
    format_run_summary, format_zipf_check,
};

/// One partition entry: how it is labelled in records, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    /// The entry exactly as listed in the partition.
    pub label: String,
    pub path: PathBuf,
}

impl InputItem {
    /// File name component, used as the record id for count tables.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.label.clone())
    }
}

/// Per-file result as seen by the driver.
#[derive(Debug)]
enum Outcome {
    Done,
    Skipped,
    Item(ItemError),
}

/// Load the partition and list the unit's inputs in order.
pub fn unit_inputs(unit: &UnitConfig) -> Result<Vec<InputItem>, AppError> {
    let partition = WorkPartition::load(&unit.schedule)?;
    let files = partition.files(&unit.unit_id)?;
    info!(unit = %unit.unit_id, files = files.len(), "work unit resolved");
    Ok(files
        .iter()
        .map(|entry| InputItem {
            label: entry.to_string_lossy().into_owned(),
            path: resolve_input(entry, unit.input_dir.as_deref()),
        })
        .collect())
}

fn build_pool(jobs: usize) -> Result<rayon::ThreadPool, AppError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to start worker pool: {e}")))
}

/// Apply `f` to every item on the unit's pool, keeping input order.
fn map_ordered<R, F>(unit: &UnitConfig, items: &[InputItem], f: F) -> Result<Vec<R>, AppError>
where
    R: Send,
    F: Fn(&InputItem) -> R + Sync,
{
    let pool = build_pool(unit.jobs)?;
    Ok(pool.install(|| items.par_iter().map(&f).collect()))
}

/// Fold outcomes into a summary, logging each per-item condition.
fn tally(
    command: &str,
    items: &[InputItem],
    outcomes: Vec<Result<Outcome, AppError>>,
) -> Result<RunSummary, AppError> {
    let mut summary = RunSummary::default();
    for (item, outcome) in items.iter().zip(outcomes) {
        match outcome? {
            Outcome::Done => summary.record_ok(),
            Outcome::Skipped => {
                debug!(file = %item.label, "output exists, skipping");
                summary.record_skipped();
            }
            Outcome::Item(err) => {
                warn!(file = %item.label, condition = %err, detail = ?err, "item not processed");
                summary.record_err(&err);
            }
        }
    }
    info!("{}", format_run_summary(command, &summary));
    Ok(summary)
}

fn finish(command: &str, summary: RunSummary) -> Result<RunSummary, AppError> {
    if summary.nothing_produced() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("{command}: no input produced a result."),
        ));
    }
    Ok(summary)
}

/// `GCF_1.fna.gz` -> `GCF_1`.
pub fn genome_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Sample a growth curve per genome and persist it as `<file name>.txt`.
pub fn run_growth(unit: &UnitConfig, config: &GrowthConfig) -> Result<RunSummary, AppError> {
    let sampler = GrowthSampler::new(config.k)?;
    ensure_dir(&config.output_dir)?;
    let items = unit_inputs(unit)?;

    let outcomes = map_ordered(unit, &items, |item| -> Result<Outcome, AppError> {
        let out = config.output_dir.join(format!("{}.txt", item.file_name()));
        if out.exists() && !config.overwrite {
            return Ok(Outcome::Skipped);
        }
        match sampler.sample(&FastxFile::new(&item.path)) {
            Ok(curve) => {
                write_growth_curve(&out, &curve)?;
                if let Some(last) = curve.last() {
                    debug!(file = %item.label, distinct = last.distinct, total = last.total, "curve written");
                }
                Ok(Outcome::Done)
            }
            Err(err) => Ok(Outcome::Item(err)),
        }
    })?;

    finish("growth", tally("growth", &items, outcomes)?)
}

/// Write a `kmer<TAB>count` table per genome as `<stem>_kmers_<k>.txt`.
pub fn run_count(unit: &UnitConfig, config: &CountConfig) -> Result<RunSummary, AppError> {
    let k = validate_k(config.k)?;
    ensure_dir(&config.output_dir)?;
    let items = unit_inputs(unit)?;

    let outcomes = map_ordered(unit, &items, |item| -> Result<Outcome, AppError> {
        let counts = match count_canonical(&FastxFile::new(&item.path), k) {
            Ok(c) => c,
            Err(err) => return Ok(Outcome::Item(err)),
        };
        if counts.total == 0 {
            return Ok(Outcome::Item(ItemError::NoValidData));
        }
        let out = config
            .output_dir
            .join(format!("{}_kmers_{k}.txt", genome_stem(&item.path)));
        write_count_table(&out, &counts)?;
        info!(
            file = %item.label,
            distinct = counts.distinct(),
            total = counts.total,
            gini = gini(&counts.count_values()),
            "k-mers counted"
        );
        Ok(Outcome::Done)
    })?;

    finish("count", tally("count", &items, outcomes)?)
}

fn rank_fit_one(item: &InputItem, config: &RankFitConfig) -> (Vec<String>, RankFitRecord, Outcome) {
    let id = item.file_name();
    let failed = |err: ItemError| {
        let lines: Vec<String> = config
            .laws
            .iter()
            .map(|_| format_rank_error(&id, &err))
            .collect();
        let record = RankFitRecord {
            file: id.clone(),
            fits: Vec::new(),
            best: None,
            error: Some(err.to_string()),
        };
        (lines, record, Outcome::Item(err))
    };

    let table = match read_count_table(&item.path) {
        Ok(t) => t,
        Err(err) => return failed(err),
    };
    if table.malformed > 0 {
        debug!(file = %item.label, malformed = table.malformed, "skipped malformed rows");
    }
    let Some(sample) = FrequencySample::from_counts(table.counts) else {
        return failed(ItemError::NoValidData);
    };

    let opts = FitOptions::new(config.max_evaluations);
    let fits: Vec<LawFit> = config
        .laws
        .iter()
        .map(|&law| LawFit {
            law,
            result: fit_law(law, &sample.ranks, &sample.frequencies, &opts),
        })
        .collect();

    let best = best_by_bic(&fits).map(|f| f.law);
    if let Some(law) = best.filter(|_| fits.len() > 1) {
        info!(file = %item.label, best = law.display_name(), "lowest BIC");
    }

    let lines: Vec<String> = fits.iter().map(|f| format_rank_fit(&id, f)).collect();
    let outcome = match best {
        Some(_) => Outcome::Done,
        None => Outcome::Item(ItemError::FitNonConvergence(
            fits.iter()
                .find_map(|f| match &f.result {
                    FitResult::Failed { reason } => Some(reason.clone()),
                    FitResult::Fitted { .. } => None,
                })
                .unwrap_or_default(),
        )),
    };
    let record = RankFitRecord {
        file: id,
        fits,
        best,
        error: None,
    };
    (lines, record, outcome)
}

/// Fit the selected rank/frequency laws to each count table.
///
/// Every table contributes one line per requested law, in law order.
pub fn run_rank_fit(unit: &UnitConfig, config: &RankFitConfig) -> Result<RunSummary, AppError> {
    let items = unit_inputs(unit)?;
    let results = map_ordered(unit, &items, |item| rank_fit_one(item, config))?;

    let mut lines = Vec::new();
    let mut records = Vec::with_capacity(results.len());
    let mut outcomes = Vec::with_capacity(results.len());
    for (item_lines, record, outcome) in results {
        lines.extend(item_lines);
        records.push(record);
        outcomes.push(Ok(outcome));
    }

    write_lines(&config.output, &lines)?;
    if let Some(path) = &config.export_json {
        write_json(path, &records)?;
    }
    finish("rank-fit", tally("rank-fit", &items, outcomes)?)
}

fn heaps_fit_one(item: &InputItem, config: &HeapsFitConfig) -> (String, GrowthFitRecord, Outcome) {
    let failed = |err: ItemError| {
        let record = GrowthFitRecord {
            file: item.label.clone(),
            fit: None,
            error: Some(err.to_string()),
        };
        (format_growth_error(&item.label, &err), record, Outcome::Item(err))
    };

    let series = match read_growth_series(&item.path) {
        Ok(s) => s,
        Err(err) => return failed(err),
    };
    if series.malformed > 0 {
        debug!(file = %item.label, malformed = series.malformed, "skipped malformed lines");
    }

    let opts = FitOptions::new(config.max_evaluations);
    let fit = match fit_growth_laws(&series.distinct, &series.total, config.menzerath_only, &opts) {
        Ok(f) => f,
        Err(err) => return failed(err),
    };

    let line = format_growth_fit(&item.label, &fit);
    let any_fitted = fit.menzerath.is_fitted() || fit.heaps.as_ref().is_some_and(|h| h.is_fitted());
    let outcome = if any_fitted {
        Outcome::Done
    } else {
        Outcome::Item(ItemError::FitNonConvergence(crate::fit::NON_CONVERGENCE.to_string()))
    };
    let record = GrowthFitRecord {
        file: item.label.clone(),
        fit: Some(fit),
        error: None,
    };
    (line, record, outcome)
}

/// Fit Heaps' law and the Menzerath relation to each growth series.
pub fn run_heaps_fit(unit: &UnitConfig, config: &HeapsFitConfig) -> Result<RunSummary, AppError> {
    let items = unit_inputs(unit)?;
    let results = map_ordered(unit, &items, |item| heaps_fit_one(item, config))?;

    let mut lines = Vec::with_capacity(results.len());
    let mut records = Vec::with_capacity(results.len());
    let mut outcomes = Vec::with_capacity(results.len());
    for (line, record, outcome) in results {
        lines.push(line);
        records.push(record);
        outcomes.push(Ok(outcome));
    }

    write_lines(&config.output, &lines)?;
    if let Some(path) = &config.export_json {
        write_json(path, &records)?;
    }
    finish("heaps-fit", tally("heaps-fit", &items, outcomes)?)
}

/// Compare each count table against the one-parameter `C / rank` law.
pub fn run_zipf_check(unit: &UnitConfig, config: &ZipfCheckConfig) -> Result<RunSummary, AppError> {
    let items = unit_inputs(unit)?;
    let results = map_ordered(unit, &items, |item| {
        let id = item.file_name();
        let check = read_count_table(&item.path).and_then(|table| {
            FrequencySample::from_counts(table.counts)
                .and_then(|sample| zipf_check(&sample.counts))
                .ok_or(ItemError::NoValidData)
        });
        match check {
            Ok(c) => (format_zipf_check(&id, &c), Outcome::Done),
            Err(err) => (format_rank_error(&id, &err), Outcome::Item(err)),
        }
    })?;

    let (lines, outcomes): (Vec<String>, Vec<_>) = results
        .into_iter()
        .map(|(line, outcome)| (line, Ok(outcome)))
        .unzip();
    write_lines(&config.output, &lines)?;
    finish("zipf-check", tally("zipf-check", &items, outcomes)?)
}

/// Seed for one genome: the run seed mixed with its file name.
fn shuffle_seed(seed: u64, name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    name.hash(&mut hasher);
    hasher.finish()
}

/// Permute the symbols of every record in place.
///
/// Composition and record lengths are preserved; only order changes.
pub fn shuffle_records(records: &mut MemoryRecords, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for seq in records.sequences_mut() {
        seq.shuffle(&mut rng);
    }
}

/// Write a symbol-shuffled copy of each genome as `<stem>_shuffled.fna`.
pub fn run_shuffle(unit: &UnitConfig, config: &ShuffleConfig) -> Result<RunSummary, AppError> {
    ensure_dir(&config.output_dir)?;
    let items = unit_inputs(unit)?;

    let outcomes = map_ordered(unit, &items, |item| -> Result<Outcome, AppError> {
        let mut records = match read_all(&FastxFile::new(&item.path)) {
            Ok(r) => r,
            Err(err) => return Ok(Outcome::Item(err)),
        };
        if records.is_empty() {
            return Ok(Outcome::Item(ItemError::NoValidData));
        }
        shuffle_records(&mut records, shuffle_seed(config.seed, &item.file_name()));

        let out = config
            .output_dir
            .join(format!("{}_shuffled.fna", genome_stem(&item.path)));
        write_fasta(&out, &records)
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", out.display())))?;
        Ok(Outcome::Done)
    })?;

    finish("shuffle", tally("shuffle", &items, outcomes)?)
}
