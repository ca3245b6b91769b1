//! Reporting: per-item text records and the end-of-run tally.

pub mod format;

pub use format::*;

use crate::domain::ItemError;

/// Outcome counts for one subcommand over one work unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: usize,
    pub succeeded: usize,
    /// Output already present; not recomputed.
    pub skipped: usize,
    pub missing: usize,
    pub no_data: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record_ok(&mut self) {
        self.items += 1;
        self.succeeded += 1;
    }

    pub fn record_skipped(&mut self) {
        self.items += 1;
        self.skipped += 1;
    }

    pub fn record_err(&mut self, err: &ItemError) {
        self.items += 1;
        match err {
            ItemError::InputMissing => self.missing += 1,
            ItemError::NoValidData => self.no_data += 1,
            ItemError::FitNonConvergence(_) | ItemError::Unreadable(_) => self.failed += 1,
        }
    }

    /// True when there was work but none of it yielded a result.
    pub fn nothing_produced(&self) -> bool {
        self.items > 0 && self.succeeded == 0 && self.skipped == 0
    }
}

pub fn format_run_summary(command: &str, s: &RunSummary) -> String {
    format!(
        "{command}: {} items, {} ok, {} skipped, {} missing, {} without data, {} failed",
        s.items, s.succeeded, s.skipped, s.missing, s.no_data, s.failed
    )
}
