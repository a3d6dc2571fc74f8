//! Labeled multi-dimensional arrays
//!
//! Parsing of Eurostat TSV text and the reshaping applied to fetched data.

mod parse;
mod reshape;
mod types;

pub use parse::*;
pub use reshape::*;
pub use types::*;
