//! k-mer count tables.
//!
//! Format: `kmer<TAB>count`, one row per k-mer, no header. Lines starting
//! with `#` are ignored, so the header written by [`write_count_table`]
//! round-trips. Rows that do not parse are skipped and counted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::ItemError;
use crate::error::AppError;
use crate::kmer::KmerCounts;

/// Counts read from one table, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTable {
    pub counts: Vec<f64>,
    /// Rows skipped because they could not be parsed.
    pub malformed: usize,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All);
    builder
}

/// Parse a count table from any reader.
pub fn parse_count_table<R: Read>(reader: R) -> CountTable {
    let mut table = CountTable::default();
    for result in reader_builder().from_reader(reader).records() {
        let count = result
            .ok()
            .and_then(|record| record.get(1).and_then(|c| c.parse::<f64>().ok()));
        match count {
            Some(c) if c.is_finite() && c >= 0.0 => table.counts.push(c),
            _ => table.malformed += 1,
        }
    }
    table
}

/// Read the count table at `path`.
pub fn read_count_table(path: &Path) -> Result<CountTable, ItemError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ItemError::InputMissing,
        _ => ItemError::Unreadable(format!("failed to open '{}': {e}", path.display())),
    })?;
    Ok(parse_count_table(file))
}

/// Write `#kmer<TAB>count` followed by rows sorted by count descending.
pub fn write_count_table(path: &Path, counts: &KmerCounts) -> Result<(), AppError> {
    let write_err =
        |e: csv::Error| AppError::input(format!("Failed to write count table '{}': {e}", path.display()));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(write_err)?;
    writer.write_record(["#kmer", "count"]).map_err(write_err)?;
    for (kmer, count) in counts.sorted_desc() {
        writer
            .write_record([kmer, count.to_string()])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write count table '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fasta::MemoryRecords;
    use crate::kmer::count_canonical;

    #[test]
    fn skips_header_and_malformed_rows() {
        let text = "#kmer\tcount\nAAA\t5\nCCC\tnotanumber\nGGG\nTTT\t2\n";
        let table = parse_count_table(text.as_bytes());
        assert_eq!(table.counts, vec![5.0, 2.0]);
        assert_eq!(table.malformed, 2);
    }

    #[test]
    fn negative_counts_are_malformed() {
        let table = parse_count_table("AAA\t-3\nCCC\t1\n".as_bytes());
        assert_eq!(table.counts, vec![1.0]);
        assert_eq!(table.malformed, 1);
    }

    #[test]
    fn written_table_reads_back_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g_kmers_3.txt");
        let source = MemoryRecords::from_pairs([("r", "ATCGATCGATCGAAAA")]);
        let counts = count_canonical(&source, 3).unwrap();
        write_count_table(&path, &counts).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("#kmer\tcount\n"));

        let table = read_count_table(&path).unwrap();
        assert_eq!(table.malformed, 0);
        assert_eq!(table.counts.iter().sum::<f64>(), counts.total as f64);
        assert!(table.counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn missing_table_is_input_missing() {
        let err = read_count_table(Path::new("/no/such/table.txt")).unwrap_err();
        assert_eq!(err, ItemError::InputMissing);
    }
}
