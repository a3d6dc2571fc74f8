//! estat - Fetch, clean and cache Eurostat indicators
//!
//! Datasets are downloaded as gzip-compressed TSV, stripped of observation
//! flags, parsed into labeled arrays and optionally cached on disk under a
//! freshness policy.
//!
//! # Quick Start
//!
//! ```ignore
//! use estat::{fetch_one, FetchOptions};
//!
//! let gdp = fetch_one("nama_10_gdp", &FetchOptions::default())?;
//! println!("axes: {:?}", gdp.axis_names());
//! println!("BE 2021: {:?}", gdp.get(&["CP_MEUR", "B1GQ", "BE", "2021"])?);
//! ```
//!
//! # Caching
//!
//! ```ignore
//! use estat::{fetch_catalog, fetch_many, FetchOptions, FreshnessPolicy};
//!
//! let opts = FetchOptions {
//!     cache_dir: Some("./cache".into()),
//!     max_age: "12h".parse()?,
//!     ..FetchOptions::default()
//! };
//! let arrays = fetch_many(&["demo_pjan", "nama_10_gdp"], &opts)?;
//!
//! // The catalog defaults to the twice-daily publication schedule
//! let toc = fetch_catalog(Some("./cache".as_ref()), None)?;
//! ```

pub mod api;
pub mod array;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod freshness;

// Public re-exports for library users
pub use api::{fetch_catalog, fetch_indicators, fetch_many, fetch_one, FetchOptions, Indicators};
pub use array::{parse_tsv, ArraySet, Axis, LabeledArray};
pub use cache::DatasetCache;
pub use catalog::{Catalog, CatalogEntry};
pub use error::{EstatError, EstatResult, TransportError};
pub use fetch::{clean_tsv, Fetcher, HttpTransport, MarkerSet, Transport, UrlStyle};
pub use freshness::{last_publication, FreshnessPolicy};
