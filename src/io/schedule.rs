//! Work-unit partition.
//!
//! The partition file is a JSON object mapping a unit id to the ordered list
//! of input paths that unit processes:
//!
//! ```json
//! { "0": ["a.fna.gz", "b.fna.gz"], "1": ["c.fna.gz"] }
//! ```
//!
//! Any problem with the partition itself is a hard stop: without it there is
//! no work to do.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Environment variable consulted when no unit id is given on the command line.
pub const UNIT_ID_ENV: &str = "SLURM_PROCID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkPartition {
    units: BTreeMap<String, Vec<PathBuf>>,
}

impl WorkPartition {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::input(format!("Failed to open partition file '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(file).map_err(|e| {
            AppError::input(format!("Invalid partition file '{}': {e}", path.display()))
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| AppError::input(format!("Invalid partition JSON: {e}")))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Ordered input list of `unit_id`.
    pub fn files(&self, unit_id: &str) -> Result<&[PathBuf], AppError> {
        self.units.get(unit_id).map(Vec::as_slice).ok_or_else(|| {
            AppError::input(format!(
                "Unit '{unit_id}' not found in partition ({} units)",
                self.units.len()
            ))
        })
    }
}

/// Read [`UNIT_ID_ENV`], loading `.env` first if present.
pub fn unit_id_from_env() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var(UNIT_ID_ENV).ok()
}

/// Pick the unit id: explicit argument first, then the environment value.
pub fn resolve_unit_id(arg: Option<&str>, env_value: Option<String>) -> Result<String, AppError> {
    if let Some(id) = arg {
        return Ok(id.trim().to_string());
    }
    match env_value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(AppError::input(format!(
            "No work unit given: pass --bucket or set {UNIT_ID_ENV}."
        ))),
    }
}

/// Resolve a partition entry against an optional base directory.
pub fn resolve_input(entry: &Path, input_dir: Option<&Path>) -> PathBuf {
    match input_dir {
        Some(dir) if entry.is_relative() => dir.join(entry),
        _ => entry.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_units_in_order() {
        let p = WorkPartition::from_json_str(r#"{"0": ["b.fna", "a.fna"], "1": []}"#).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(
            p.files("0").unwrap(),
            &[PathBuf::from("b.fna"), PathBuf::from("a.fna")]
        );
        assert!(p.files("1").unwrap().is_empty());
    }

    #[test]
    fn unknown_unit_is_a_hard_stop() {
        let p = WorkPartition::from_json_str(r#"{"0": []}"#).unwrap();
        assert_eq!(p.files("7").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn malformed_partition_is_a_hard_stop() {
        assert!(WorkPartition::from_json_str("[1, 2]").is_err());
        assert!(WorkPartition::load(Path::new("/no/such/partition.json")).is_err());
    }

    #[test]
    fn argument_beats_environment() {
        assert_eq!(resolve_unit_id(Some("3"), Some("9".into())).unwrap(), "3");
        assert_eq!(resolve_unit_id(None, Some(" 9 ".into())).unwrap(), "9");
        assert!(resolve_unit_id(None, None).is_err());
        assert!(resolve_unit_id(None, Some(String::new())).is_err());
    }

    #[test]
    fn relative_entries_join_input_dir() {
        let base = Path::new("/data");
        assert_eq!(resolve_input(Path::new("g.fna"), Some(base)), PathBuf::from("/data/g.fna"));
        assert_eq!(resolve_input(Path::new("/abs/g.fna"), Some(base)), PathBuf::from("/abs/g.fna"));
        assert_eq!(resolve_input(Path::new("g.fna"), None), PathBuf::from("g.fna"));
    }
}
