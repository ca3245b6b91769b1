//! Sequence record sources.
//!
//! The sampler needs to read a genome twice (count pass + streaming pass), so
//! sources are *re-readable*: every call to [`RecordSource::for_each_record`]
//! starts from the first record again.
//!
//! - [`FastxFile`] reads FASTA/FASTQ from disk via `needletail` (gzip is
//!   detected and decoded transparently).
//! - [`MemoryRecords`] holds records in memory (tests, small inputs).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use needletail::errors::ParseErrorKind;
use needletail::parse_fastx_file;

use crate::domain::ItemError;

/// A re-readable, record-oriented sequence container.
pub trait RecordSource {
    /// Call `f(id, sequence)` for every record, in file order.
    fn for_each_record<F>(&self, f: F) -> Result<(), ItemError>
    where
        F: FnMut(&[u8], &[u8]);
}

/// FASTA/FASTQ file on disk (plain or gzip).
#[derive(Debug, Clone)]
pub struct FastxFile {
    path: PathBuf,
}

impl FastxFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FastxFile {
    fn for_each_record<F>(&self, mut f: F) -> Result<(), ItemError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        if !self.path.exists() {
            return Err(ItemError::InputMissing);
        }

        let mut reader = match parse_fastx_file(&self.path) {
            Ok(r) => r,
            // An empty file is a genome with no records, not a broken one.
            Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => return Ok(()),
            Err(e) => {
                return Err(ItemError::Unreadable(format!(
                    "failed to open '{}': {e}",
                    self.path.display()
                )));
            }
        };

        while let Some(record) = reader.next() {
            let record = record.map_err(|e| {
                ItemError::Unreadable(format!(
                    "failed to parse record in '{}': {e}",
                    self.path.display()
                ))
            })?;
            let seq = record.seq();
            f(record.id(), &seq);
        }

        Ok(())
    }
}

/// In-memory records `(id, sequence)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecords {
    records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<[u8]>,
        B: AsRef<[u8]>,
    {
        Self {
            records: pairs
                .into_iter()
                .map(|(id, seq)| (id.as_ref().to_vec(), seq.as_ref().to_vec()))
                .collect(),
        }
    }

    pub fn push(&mut self, id: impl AsRef<[u8]>, seq: impl AsRef<[u8]>) {
        self.records
            .push((id.as_ref().to_vec(), seq.as_ref().to_vec()));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mutable access to each record's sequence.
    pub fn sequences_mut(&mut self) -> impl Iterator<Item = &mut Vec<u8>> {
        self.records.iter_mut().map(|(_, seq)| seq)
    }
}

impl RecordSource for MemoryRecords {
    fn for_each_record<F>(&self, mut f: F) -> Result<(), ItemError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        for (id, seq) in &self.records {
            f(id, seq);
        }
        Ok(())
    }
}

/// Write records as FASTA, one sequence line per record.
pub fn write_fasta(path: &Path, records: &MemoryRecords) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (id, seq) in &records.records {
        out.write_all(b">")?;
        out.write_all(id)?;
        out.write_all(b"\n")?;
        out.write_all(seq)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Read every record into memory.
pub fn read_all<S: RecordSource>(source: &S) -> Result<MemoryRecords, ItemError> {
    let mut records = MemoryRecords::new();
    source.for_each_record(|id, seq| records.push(id, seq))?;
    Ok(records)
}
