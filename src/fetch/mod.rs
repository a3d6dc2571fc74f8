//! Remote retrieval of Eurostat datasets
//!
//! Transport, URL construction, gzip decoding and flag cleaning.

mod clean;
mod fetcher;
mod transport;

pub use clean::*;
pub use fetcher::*;
pub use transport::*;
