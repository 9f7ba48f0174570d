pub mod ghost;
pub mod scoring;

pub use scoring::{CharClass, CharMark, Stats, WordMismatch, WordResults};
