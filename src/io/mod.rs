//! Input/output helpers.
//!
//! - genome records via needletail (`fasta`)
//! - `kmer<TAB>count` tables (`counts`)
//! - `distinct:total` growth series (`growth`)
//! - work-unit partition + unit id resolution (`schedule`)
//! - result lines and JSON exports (`export`)

pub mod counts;
pub mod export;
pub mod fasta;
pub mod growth;
pub mod schedule;

pub use counts::*;
pub use export::*;
pub use fasta::*;
pub use growth::*;
pub use schedule::*;
