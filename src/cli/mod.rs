//! Command-line parsing for the k-mer growth and law-fitting tool.
//!
//! Argument parsing stays here; `app` turns the parsed arguments into the
//! explicit config structs each pipeline stage takes.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::RankLawSpec;
use crate::fit::{GROWTH_FIT_MAX_EVALUATIONS, RANK_FIT_MAX_EVALUATIONS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "kmer-laws",
    version,
    about = "Canonical k-mer growth curves and rank/frequency law fits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample a 100-point distinct-vs-total growth curve per genome.
    Growth(GrowthArgs),
    /// Write a canonical k-mer count table per genome.
    Count(CountArgs),
    /// Fit rank/frequency laws (truncated power law, Zipf–Mandelbrot) to count tables.
    RankFit(RankFitArgs),
    /// Fit Heaps' law and the Menzerath relation to growth series.
    HeapsFit(HeapsFitArgs),
    /// Compare count tables against the pure `C / rank` Zipf law.
    ZipfCheck(ZipfCheckArgs),
    /// Write symbol-shuffled control copies of each genome.
    Shuffle(ShuffleArgs),
}

/// Work-unit selection, shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct UnitArgs {
    /// JSON partition file mapping unit id -> list of input paths.
    #[arg(long)]
    pub schedule: PathBuf,

    /// Unit id to process. Falls back to `SLURM_PROCID` (also read from `.env`).
    #[arg(long)]
    pub bucket: Option<String>,

    /// Base directory for relative partition entries.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Worker threads for the files of this unit.
    #[arg(short = 'j', long, default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Debug, Args, Clone)]
pub struct GrowthArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// k-mer length (1..=32).
    #[arg(short = 'k', long, default_value_t = 8)]
    pub k: usize,

    /// Directory receiving one `<file name>.txt` curve per genome.
    #[arg(short = 'o', long)]
    pub output_dir: PathBuf,

    /// Recompute curves whose output file already exists.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CountArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// k-mer length (1..=32).
    #[arg(short = 'k', long, default_value_t = 8)]
    pub k: usize,

    /// Directory receiving one `<stem>_kmers_<k>.txt` table per genome.
    #[arg(short = 'o', long)]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RankFitArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// Which law(s) to fit.
    #[arg(long, value_enum, default_value_t = RankLawSpec::All)]
    pub law: RankLawSpec,

    /// Model evaluation budget per fit.
    #[arg(long, default_value_t = RANK_FIT_MAX_EVALUATIONS)]
    pub max_evaluations: usize,

    /// Result file (one line per file and law).
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Also write every fit result as JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct HeapsFitArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// Fit only the Menzerath relation.
    #[arg(long)]
    pub menzerath_only: bool,

    /// Model evaluation budget per fit.
    #[arg(long, default_value_t = GROWTH_FIT_MAX_EVALUATIONS)]
    pub max_evaluations: usize,

    /// Result file. Defaults to `results_bucket_<unit>.txt`.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Also write every fit result as JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ZipfCheckArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// Result file (one line per count table).
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ShuffleArgs {
    #[command(flatten)]
    pub unit: UnitArgs,

    /// Directory receiving `<stem>_shuffled.fna` files.
    #[arg(short = 'o', long)]
    pub output_dir: PathBuf,

    /// Base seed, mixed with each file name.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
