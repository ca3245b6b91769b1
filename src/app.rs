//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging
//! - parses CLI arguments
//! - resolves the work unit
//! - builds per-stage configs and dispatches to `pipeline`

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Command, CountArgs, GrowthArgs, HeapsFitArgs, RankFitArgs, ShuffleArgs, UnitArgs, ZipfCheckArgs,
};
use crate::domain::{
    CountConfig, GrowthConfig, HeapsFitConfig, RankFitConfig, ShuffleConfig, UnitConfig,
    ZipfCheckConfig,
};
use crate::error::AppError;
use crate::io::{resolve_unit_id, unit_id_from_env};

pub mod pipeline;

/// Entry point for the `kmer-laws` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    let summary = match cli.command {
        Command::Growth(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_growth(&unit, &growth_config(&args))?
        }
        Command::Count(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_count(&unit, &count_config(&args))?
        }
        Command::RankFit(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_rank_fit(&unit, &rank_fit_config(&args))?
        }
        Command::HeapsFit(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_heaps_fit(&unit, &heaps_fit_config(&args, &unit.unit_id))?
        }
        Command::ZipfCheck(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_zipf_check(&unit, &zipf_check_config(&args))?
        }
        Command::Shuffle(args) => {
            let unit = unit_config(&args.unit)?;
            pipeline::run_shuffle(&unit, &shuffle_config(&args))?
        }
    };

    tracing::debug!(?summary, "run complete");
    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn unit_config(args: &UnitArgs) -> Result<UnitConfig, AppError> {
    let env_value = if args.bucket.is_none() {
        unit_id_from_env()
    } else {
        None
    };
    if args.jobs == 0 {
        return Err(AppError::input("--jobs must be at least 1."));
    }
    Ok(UnitConfig {
        schedule: args.schedule.clone(),
        unit_id: resolve_unit_id(args.bucket.as_deref(), env_value)?,
        input_dir: args.input_dir.clone(),
        jobs: args.jobs,
    })
}

pub fn growth_config(args: &GrowthArgs) -> GrowthConfig {
    GrowthConfig {
        k: args.k,
        output_dir: args.output_dir.clone(),
        overwrite: args.overwrite,
    }
}

pub fn count_config(args: &CountArgs) -> CountConfig {
    CountConfig {
        k: args.k,
        output_dir: args.output_dir.clone(),
    }
}

pub fn rank_fit_config(args: &RankFitArgs) -> RankFitConfig {
    RankFitConfig {
        laws: args.law.laws(),
        max_evaluations: args.max_evaluations,
        output: args.output.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn heaps_fit_config(args: &HeapsFitArgs, unit_id: &str) -> HeapsFitConfig {
    HeapsFitConfig {
        menzerath_only: args.menzerath_only,
        max_evaluations: args.max_evaluations,
        output: args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("results_bucket_{unit_id}.txt"))),
        export_json: args.export_json.clone(),
    }
}

pub fn zipf_check_config(args: &ZipfCheckArgs) -> ZipfCheckConfig {
    ZipfCheckConfig {
        output: args.output.clone(),
    }
}

pub fn shuffle_config(args: &ShuffleArgs) -> ShuffleConfig {
    ShuffleConfig {
        output_dir: args.output_dir.clone(),
        seed: args.seed,
    }
}
