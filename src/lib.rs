//! `kmer-laws` library crate.
//!
//! The binary (`kmer-laws`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the sampler and fitting engine can be driven from other tools
//!
//! Layout, leaf-first: `kmer` (encoding, runs, counting) -> `growth`
//! (two-pass sampler) -> `math` + `models` + `fit` (bounded least squares and
//! the law catalog) -> `io` / `report` -> `app` (batch drivers).

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod growth;
pub mod io;
pub mod kmer;
pub mod math;
pub mod models;
pub mod report;
