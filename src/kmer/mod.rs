//! K-mer primitives: strand-canonical encoding, valid-symbol runs, counting.

pub mod canonical;
pub mod counter;
pub mod runs;

pub use canonical::*;
pub use counter::*;
pub use runs::*;
