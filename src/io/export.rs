//! Result persistence.
//!
//! Text records go to one file per run (one line per input); the optional JSON
//! export carries the full fit results, with non-finite numbers as `null`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

/// Create `dir` (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::input(format!("Failed to create output directory '{}': {e}", dir.display()))
    })
}

/// Write `lines`, each terminated by a newline.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}")
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    out.flush()
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}

/// Pretty-printed JSON export.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create JSON export '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value)
        .map_err(|e| AppError::input(format!("Failed to write JSON export '{}': {e}", path.display())))?;
    out.flush().map_err(|e| {
        AppError::input(format!("Failed to write JSON export '{}': {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitResult, LawFit, LawKind, RankFitRecord};

    #[test]
    fn lines_are_newline_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_lines(&path, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn json_export_tags_fit_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.json");
        let records = vec![RankFitRecord {
            file: "g_kmers_8.txt".into(),
            fits: vec![LawFit {
                law: LawKind::ZipfMandelbrot,
                result: FitResult::failed("fit did not converge"),
            }],
            best: None,
            error: None,
        }];
        write_json(&path, &records).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["fits"][0]["law"], "zipf_mandelbrot");
        assert_eq!(value[0]["fits"][0]["result"]["status"], "failed");
        assert_eq!(value[0]["fits"][0]["result"]["reason"], "fit did not converge");
    }

    #[test]
    fn json_export_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("bucket_0").join("fits.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failures_are_reported() {
        let full = Path::new("/dev/full");
        let err = write_json(full, &vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(write_lines(full, &["a".to_string()]).is_err());
    }
}
