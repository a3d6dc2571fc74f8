//! Top-level entry points
//!
//! Thin wrappers building a [`DatasetCache`] over HTTP from [`FetchOptions`].

use crate::array::{ArraySet, LabeledArray};
use crate::cache::DatasetCache;
use crate::catalog::Catalog;
use crate::error::EstatResult;
use crate::fetch::{Fetcher, MarkerSet, UrlStyle, CATALOG_URL, SDMX_BASE_URL};
use crate::freshness::FreshnessPolicy;
use std::path::{Path, PathBuf};

/// Options shared by dataset fetches
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Strip observation flags before parsing
    pub drop_markers: bool,
    /// Alphabet stripped when `drop_markers` is set
    pub markers: MarkerSet,
    /// Cache root; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub max_age: FreshnessPolicy,
    pub base_url: String,
    pub url_style: UrlStyle,
    pub catalog_url: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            drop_markers: true,
            markers: MarkerSet::default(),
            cache_dir: None,
            max_age: FreshnessPolicy::default(),
            base_url: SDMX_BASE_URL.to_string(),
            url_style: UrlStyle::default(),
            catalog_url: CATALOG_URL.to_string(),
        }
    }
}

impl FetchOptions {
    /// HTTP-backed cache configured from these options
    pub fn cache(&self) -> EstatResult<DatasetCache> {
        let fetcher = Fetcher::http()?
            .with_base_url(self.base_url.clone(), self.url_style)
            .with_catalog_url(self.catalog_url.clone());
        let markers = self.drop_markers.then_some(self.markers);
        Ok(DatasetCache::new(fetcher, self.cache_dir.clone()).with_markers(markers))
    }
}

/// Result of [`fetch_indicators`]: a bare array for one identifier
#[derive(Debug, Clone, PartialEq)]
pub enum Indicators {
    One(LabeledArray),
    Many(ArraySet),
}

impl Indicators {
    /// View as a keyed collection, whatever the count
    pub fn into_set(self, ids: &[impl AsRef<str>]) -> ArraySet {
        match self {
            Indicators::Many(set) => set,
            Indicators::One(array) => ids
                .first()
                .map(|id| ArraySet::from([(id.as_ref().to_string(), array)]))
                .unwrap_or_default(),
        }
    }
}

/// Fetch one identifier as an array, or several as a keyed collection.
pub fn fetch_indicators<S: AsRef<str>>(ids: &[S], opts: &FetchOptions) -> EstatResult<Indicators> {
    let cache = opts.cache()?;
    match ids {
        [one] => Ok(Indicators::One(cache.get(one.as_ref(), &opts.max_age)?)),
        _ => Ok(Indicators::Many(cache.get_many(ids, &opts.max_age)?)),
    }
}

pub fn fetch_one(id: &str, opts: &FetchOptions) -> EstatResult<LabeledArray> {
    opts.cache()?.get(id, &opts.max_age)
}

pub fn fetch_many<S: AsRef<str>>(ids: &[S], opts: &FetchOptions) -> EstatResult<ArraySet> {
    opts.cache()?.get_many(ids, &opts.max_age)
}

/// Fetch the table of contents; `max_age` defaults to the publication schedule.
pub fn fetch_catalog(
    cache_dir: Option<&Path>,
    max_age: Option<FreshnessPolicy>,
) -> EstatResult<Catalog> {
    let opts = FetchOptions {
        cache_dir: cache_dir.map(Path::to_path_buf),
        ..FetchOptions::default()
    };
    let policy = max_age.unwrap_or(FreshnessPolicy::PublicationSchedule);
    opts.cache()?.get_catalog(&policy)
}
