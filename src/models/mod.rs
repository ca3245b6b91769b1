pub mod law;

pub use law::*;
