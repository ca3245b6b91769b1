//! Growth series files: one `distinct:total` line per checkpoint.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{GrowthCurve, ItemError};
use crate::error::AppError;

/// A growth series as read back from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthSeries {
    pub distinct: Vec<f64>,
    pub total: Vec<f64>,
    /// Lines skipped because they did not hold two numbers.
    pub malformed: usize,
}

impl GrowthSeries {
    pub fn len(&self) -> usize {
        self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct.is_empty()
    }
}

pub fn parse_growth_series<R: Read>(reader: R) -> GrowthSeries {
    let mut series = GrowthSeries::default();
    let records = csv::ReaderBuilder::new()
        .delimiter(b':')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records();

    for result in records {
        let pair = result.ok().and_then(|record| {
            if record.len() != 2 {
                return None;
            }
            let v = record.get(0)?.parse::<f64>().ok()?;
            let n = record.get(1)?.parse::<f64>().ok()?;
            Some((v, n))
        });
        match pair {
            Some((v, n)) => {
                series.distinct.push(v);
                series.total.push(n);
            }
            None => series.malformed += 1,
        }
    }
    series
}

pub fn read_growth_series(path: &Path) -> Result<GrowthSeries, ItemError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ItemError::InputMissing,
        _ => ItemError::Unreadable(format!("failed to open '{}': {e}", path.display())),
    })?;
    Ok(parse_growth_series(file))
}

/// Write `curve` as `distinct:total` lines.
pub fn write_growth_curve(path: &Path, curve: &GrowthCurve) -> Result<(), AppError> {
    let write_err =
        |e: csv::Error| AppError::input(format!("Failed to write growth curve '{}': {e}", path.display()));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b':')
        .has_headers(false)
        .from_path(path)
        .map_err(write_err)?;
    for point in &curve.points {
        writer.serialize(point).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write growth curve '{}': {e}", path.display())))
}
