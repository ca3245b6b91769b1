use std::fs;
use std::path::{Path, PathBuf};

use kmer_laws::app::pipeline::{
    run_count, run_growth, run_heaps_fit, run_rank_fit, run_shuffle, run_zipf_check,
};
use kmer_laws::domain::{
    CountConfig, GrowthConfig, HeapsFitConfig, LawKind, RankFitConfig, ShuffleConfig, UnitConfig,
    ZipfCheckConfig,
};
use kmer_laws::error::EXIT_NO_DATA;
use kmer_laws::fit::{GROWTH_FIT_MAX_EVALUATIONS, RANK_FIT_MAX_EVALUATIONS};
use rand::prelude::*;
use rand::rngs::StdRng;

fn random_genome(path: &Path, len: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let seq: String = (0..len)
        .map(|_| *[b'A', b'C', b'G', b'T'].choose(&mut rng).unwrap() as char)
        .collect();
    fs::write(path, format!(">chr1\n{seq}\n>chr2\nNNNN{seq}\n")).unwrap();
}

fn unit(dir: &Path, files: &[&str]) -> UnitConfig {
    let schedule = dir.join("partition.json");
    let partition = serde_json::json!({ "0": files });
    fs::write(&schedule, partition.to_string()).unwrap();
    UnitConfig {
        schedule,
        unit_id: "0".to_string(),
        input_dir: Some(dir.to_path_buf()),
        jobs: 2,
    }
}

fn lines(path: &PathBuf) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn growth_curves_have_one_line_per_percentile_and_are_not_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    random_genome(&dir.path().join("g.fna"), 3_000, 1);
    let unit = unit(dir.path(), &["g.fna", "absent.fna"]);
    let config = GrowthConfig {
        k: 5,
        output_dir: dir.path().join("curves"),
        overwrite: false,
    };

    let summary = run_growth(&unit, &config).unwrap();
    assert_eq!((summary.succeeded, summary.missing), (1, 1));

    let curve = lines(&config.output_dir.join("g.fna.txt"));
    assert_eq!(curve.len(), 100);
    let pairs: Vec<(u64, u64)> = curve
        .iter()
        .map(|l| {
            let (v, n) = l.split_once(':').unwrap();
            (v.parse().unwrap(), n.parse().unwrap())
        })
        .collect();
    assert!(pairs.iter().all(|(v, n)| v <= n));
    assert!(pairs.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 < w[1].1));
    // Two copies of the same 3000-base sequence, k = 5.
    assert_eq!(pairs[99].1, 2 * (3_000 - 5 + 1));

    let again = run_growth(&unit, &config).unwrap();
    assert_eq!(again.skipped, 1);
}

#[test]
fn counted_tables_feed_rank_fits_and_zipf_checks() {
    let dir = tempfile::tempdir().unwrap();
    random_genome(&dir.path().join("g.fna"), 2_000, 2);

    let genomes = unit(dir.path(), &["g.fna"]);
    let tables = dir.path().join("tables");
    run_count(
        &genomes,
        &CountConfig {
            k: 4,
            output_dir: tables.clone(),
        },
    )
    .unwrap();
    let table = tables.join("g_kmers_4.txt");
    let rows = lines(&table);
    assert_eq!(rows[0], "#kmer\tcount");
    // 4^4 / 2 + 4^2 / 2 canonical 4-mers at most.
    assert!(rows.len() - 1 <= 136);

    let counts_unit = unit(
        dir.path(),
        &[table.to_str().unwrap(), "tables/missing_kmers_4.txt"],
    );
    let output = dir.path().join("rank_fits.txt");
    let export = dir.path().join("rank_fits.json");
    let summary = run_rank_fit(
        &counts_unit,
        &RankFitConfig {
            laws: vec![LawKind::TruncatedPowerLaw, LawKind::ZipfMandelbrot],
            max_evaluations: RANK_FIT_MAX_EVALUATIONS,
            output: output.clone(),
            export_json: Some(export.clone()),
        },
    )
    .unwrap();
    assert_eq!(summary.items, 2);
    assert_eq!(summary.missing, 1);

    let records = lines(&output);
    assert_eq!(records.len(), 4);
    assert!(records[0].starts_with("g_kmers_4.txt: "));
    assert!(records[0].contains("lambda=") || records[0].contains("FitError="));
    assert!(records[1].contains("beta=") || records[1].contains("FitError="));
    assert_eq!(records[2], "missing_kmers_4.txt: FileNotFound");
    assert_eq!(records[3], "missing_kmers_4.txt: FileNotFound");

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["error"], "FileNotFound");

    let zipf_out = dir.path().join("zipf.txt");
    run_zipf_check(&counts_unit, &ZipfCheckConfig { output: zipf_out.clone() }).unwrap();
    let zipf = lines(&zipf_out);
    assert!(zipf[0].starts_with("g_kmers_4.txt: R2="));
    assert!(zipf[0].contains(" Spearman="));
    assert_eq!(zipf[1], "missing_kmers_4.txt: FileNotFound");
}

#[test]
fn heaps_fit_reports_laws_and_inline_failures() {
    let dir = tempfile::tempdir().unwrap();
    let series: String = (1..=100)
        .map(|i| {
            let n = (i * 10_000) as f64;
            format!("{}:{}\n", (3.0 * n.powf(0.7)).round() as u64, n as u64)
        })
        .collect();
    fs::write(dir.path().join("series.txt"), series).unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();

    let unit = unit(dir.path(), &["series.txt", "empty.txt", "gone.txt"]);
    let output = dir.path().join("results.txt");
    let summary = run_heaps_fit(
        &unit,
        &HeapsFitConfig {
            menzerath_only: false,
            max_evaluations: GROWTH_FIT_MAX_EVALUATIONS,
            output: output.clone(),
            export_json: None,
        },
    )
    .unwrap();
    assert_eq!((summary.succeeded, summary.no_data, summary.missing), (1, 1, 1));

    let records = lines(&output);
    assert_eq!(records.len(), 3);
    let fields: Vec<&str> = records[0].split('\t').collect();
    assert_eq!(fields[0], "series.txt");
    let beta: f64 = fields[2].strip_prefix("β:").unwrap().parse().unwrap();
    assert!((beta - 0.7).abs() < 0.01, "{}", records[0]);
    let b_m: f64 = fields[4].strip_prefix("b_M:").unwrap().parse().unwrap();
    assert!((b_m + 0.3).abs() < 0.01, "{}", records[0]);
    assert_eq!(records[1], "empty.txt\tNoData");
    assert_eq!(records[2], "gone.txt\tFileNotFound");
}

#[test]
fn unit_without_any_result_exits_with_no_data() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("n.fna"), ">r\nNNNNNNNN\n").unwrap();
    let unit = unit(dir.path(), &["n.fna", "absent.fna"]);
    let err = run_growth(
        &unit,
        &GrowthConfig {
            k: 3,
            output_dir: dir.path().join("out"),
            overwrite: true,
        },
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), EXIT_NO_DATA);
}

#[test]
fn unknown_unit_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut unit = unit(dir.path(), &[]);
    unit.unit_id = "9".to_string();
    let err = run_zipf_check(&unit, &ZipfCheckConfig { output: dir.path().join("z.txt") }).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn shuffled_genomes_keep_length() {
    let dir = tempfile::tempdir().unwrap();
    random_genome(&dir.path().join("g.fna"), 500, 3);
    let unit = unit(dir.path(), &["g.fna"]);
    let out_dir = dir.path().join("shuffled");
    run_shuffle(&unit, &ShuffleConfig { output_dir: out_dir.clone(), seed: 7 }).unwrap();

    let original = fs::read_to_string(dir.path().join("g.fna")).unwrap();
    let shuffled = fs::read_to_string(out_dir.join("g_shuffled.fna")).unwrap();
    assert_eq!(original.len(), shuffled.len());
    assert_ne!(original, shuffled);
    assert!(shuffled.starts_with(">chr1\n"));
}
