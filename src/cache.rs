//! On-disk cache of fetched datasets and the catalog
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/eurostat/data/<indicator>.json
//! <root>/eurostat/table_of_contents.json
//! ```
//!
//! An entry's modification time is its fetch time. Entries are overwritten
//! on every refetch and never deleted; see [`FreshnessPolicy`].

use crate::array::{normalize, parse_tsv, ArraySet, LabeledArray};
use crate::catalog::{parse_catalog, Catalog};
use crate::error::{EstatError, EstatResult};
use crate::fetch::{clean_tsv, Fetcher, HttpTransport, MarkerSet, Transport};
use crate::freshness::FreshnessPolicy;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory under the cache root owned by this crate
pub const CACHE_NAMESPACE: &str = "eurostat";

/// Sub-directory for dataset entries
pub const DATA_DIR: &str = "data";

/// File name of the cached catalog
pub const CATALOG_FILE: &str = "table_of_contents.json";

const ENTRY_EXT: &str = "json";

/// Fetches datasets, serving them from disk while they are fresh enough
#[derive(Debug, Clone)]
pub struct DatasetCache<T = HttpTransport> {
    fetcher: Fetcher<T>,
    root: Option<PathBuf>,
    markers: Option<MarkerSet>,
}

impl<T: Transport> DatasetCache<T> {
    /// Cache rooted at `root`; `None` disables caching entirely.
    pub fn new(fetcher: Fetcher<T>, root: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            root,
            markers: Some(MarkerSet::default()),
        }
    }

    /// Flag alphabet stripped before parsing; `None` keeps the raw cells.
    pub fn with_markers(mut self, markers: Option<MarkerSet>) -> Self {
        self.markers = markers;
        self
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Where the entry for `indicator` lives, if caching is enabled
    pub fn dataset_path(&self, indicator: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| {
            root.join(CACHE_NAMESPACE)
                .join(DATA_DIR)
                .join(format!("{}.{}", indicator, ENTRY_EXT))
        })
    }

    /// Where the catalog entry lives, if caching is enabled
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(CACHE_NAMESPACE).join(CATALOG_FILE))
    }

    /// Get one dataset, from disk if `policy` accepts the cached copy.
    pub fn get(&self, indicator: &str, policy: &FreshnessPolicy) -> EstatResult<LabeledArray> {
        let path = self.dataset_path(indicator);
        load_or_fetch(path.as_deref(), policy, || self.download(indicator))
    }

    /// Get several datasets in order; the first failure aborts the batch.
    pub fn get_many<S: AsRef<str>>(
        &self,
        indicators: &[S],
        policy: &FreshnessPolicy,
    ) -> EstatResult<ArraySet> {
        let mut arrays = ArraySet::new();
        for indicator in indicators {
            let indicator = indicator.as_ref();
            let array = self.get(indicator, policy)?;
            arrays.insert(indicator.to_string(), array);
        }
        Ok(arrays)
    }

    /// Get the table of contents.
    pub fn get_catalog(&self, policy: &FreshnessPolicy) -> EstatResult<Catalog> {
        let path = self.catalog_path();
        load_or_fetch(path.as_deref(), policy, || {
            let text = self.fetcher.fetch_catalog()?;
            parse_catalog(&text)
        })
    }

    fn download(&self, indicator: &str) -> EstatResult<LabeledArray> {
        let raw = self.fetcher.fetch_dataset(indicator)?;
        let text = match self.markers {
            Some(markers) => clean_tsv(&raw, markers.chars())?,
            None => raw,
        };
        normalize(parse_tsv(&text)?)
    }
}

/// Serve the entry at `path` if `policy` accepts it, otherwise fetch and persist.
fn load_or_fetch<V, F>(path: Option<&Path>, policy: &FreshnessPolicy, fetch: F) -> EstatResult<V>
where
    V: Serialize + DeserializeOwned,
    F: FnOnce() -> EstatResult<V>,
{
    let Some(path) = path else {
        return fetch();
    };

    if let Some(modified) = modified_at(path)? {
        if policy.accepts(modified, Utc::now()) {
            log::debug!("Cache hit: {}", path.display());
            return read_entry(path);
        }
        log::debug!("Cache entry {} is stale ({})", path.display(), policy);
    } else {
        log::debug!("Cache miss: {}", path.display());
    }

    let value = fetch()?;
    write_entry(path, &value)?;
    log::info!("Cached {}", path.display());
    Ok(value)
}

/// Modification time of a cache file, `None` when it does not exist
pub fn modified_at(path: &Path) -> EstatResult<Option<DateTime<Utc>>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EstatError::IoError(e)),
    }
}

fn read_entry<V: DeserializeOwned>(path: &Path) -> EstatResult<V> {
    let file = fs::File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| EstatError::CacheError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Write through a temp file in the same directory, then rename into place.
fn write_entry<V: Serialize>(path: &Path, value: &V) -> EstatResult<()> {
    let dir = path.parent().ok_or_else(|| EstatError::CacheError {
        path: path.display().to_string(),
        reason: "cache path has no parent directory".to_string(),
    })?;
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| EstatError::IoError(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use chrono::Duration;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::cell::Cell;
    use std::time::SystemTime;
    use tempfile::TempDir;

    const GDP_TSV: &str = "freq,unit,geo\\TIME_PERIOD\t2021 \t2020 \n\
                           A,CP_MEUR,BE\t502311.9 p\t460049.2 \n\
                           A,CP_MEUR,DE\t3601750 \t: \n";

    const CATALOG_TSV: &str = "\"title\"\t\"code\"\t\"type\"\t\"last update of data\"\t\"last table structure change\"\t\"data start\"\t\"data end\"\n\
                               \"GDP\"\t\"nama_10_gdp\"\t\"dataset\"\t\"20.09.2024\"\t\"20.09.2024\"\t\"1975\"\t\"2023\"\n";

    /// Serves a fixed gzip payload and counts requests
    struct StubTransport {
        calls: Cell<usize>,
        payload: Vec<u8>,
        fail: bool,
    }

    impl StubTransport {
        fn serving(text: &str) -> Self {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes()).unwrap();
            Self {
                calls: Cell::new(0),
                payload: encoder.finish().unwrap(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                payload: Vec::new(),
                fail: true,
            }
        }
    }

    impl Transport for StubTransport {
        fn get(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(TransportError::Status {
                    status: 404,
                    reason: "Not Found".to_string(),
                });
            }
            Ok(self.payload.clone())
        }
    }

    fn cache_with(stub: &StubTransport, root: Option<PathBuf>) -> DatasetCache<&StubTransport> {
        DatasetCache::new(Fetcher::new(stub), root)
    }

    fn backdate(path: &Path, age: std::time::Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_paths_follow_layout() {
        let stub = StubTransport::failing();
        let cache = cache_with(&stub, Some(PathBuf::from("/tmp/root")));

        assert_eq!(
            cache.dataset_path("nama_10_gdp").unwrap(),
            PathBuf::from("/tmp/root/eurostat/data/nama_10_gdp.json")
        );
        assert_eq!(
            cache.catalog_path().unwrap(),
            PathBuf::from("/tmp/root/eurostat/table_of_contents.json")
        );
        assert!(cache_with(&stub, None).dataset_path("x").is_none());
    }

    #[test]
    fn test_miss_fetches_and_persists() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let first = cache.get("nama_10_gdp", &FreshnessPolicy::default()).unwrap();
        assert_eq!(stub.calls.get(), 1);
        assert!(cache.dataset_path("nama_10_gdp").unwrap().exists());

        let second = cache.get("nama_10_gdp", &FreshnessPolicy::Unbounded).unwrap();
        assert_eq!(stub.calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fresh_entry_is_served_without_network() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::failing();
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let stored = parse_tsv("geo\\time\t2020\nBE\t1\n").unwrap();
        write_entry(&cache.dataset_path("demo").unwrap(), &stored).unwrap();

        let loaded = cache.get("demo", &FreshnessPolicy::default()).unwrap();
        assert_eq!(stub.calls.get(), 0);
        assert_eq!(loaded, stored);
    }

    #[test]
    fn test_stale_entry_is_refetched_and_overwritten() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let path = cache.dataset_path("nama_10_gdp").unwrap();
        let old = parse_tsv("geo\\time\t2020\nBE\t1\n").unwrap();
        write_entry(&path, &old).unwrap();
        backdate(&path, std::time::Duration::from_secs(2 * 86_400));

        let fresh = cache
            .get("nama_10_gdp", &FreshnessPolicy::MaxAge(Duration::days(1)))
            .unwrap();
        assert_eq!(stub.calls.get(), 1);
        assert_ne!(fresh, old);

        let reread: LabeledArray = read_entry(&path).unwrap();
        assert_eq!(reread, fresh);
    }

    #[test]
    fn test_since_policy_uses_modification_time() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        cache.get("nama_10_gdp", &FreshnessPolicy::Unbounded).unwrap();
        let path = cache.dataset_path("nama_10_gdp").unwrap();
        backdate(&path, std::time::Duration::from_secs(3_600));

        let cutoff = Utc::now() - Duration::minutes(30);
        cache
            .get("nama_10_gdp", &FreshnessPolicy::Since(cutoff))
            .unwrap();
        assert_eq!(stub.calls.get(), 2);
    }

    #[test]
    fn test_no_root_always_fetches() {
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, None);

        cache.get("nama_10_gdp", &FreshnessPolicy::Unbounded).unwrap();
        cache.get("nama_10_gdp", &FreshnessPolicy::Unbounded).unwrap();
        assert_eq!(stub.calls.get(), 2);
    }

    #[test]
    fn test_fetched_array_is_reshaped() {
        let stub = StubTransport::serving(GDP_TSV);
        let array = cache_with(&stub, None)
            .get("nama_10_gdp", &FreshnessPolicy::Unbounded)
            .unwrap();

        assert_eq!(array.axis_names(), vec!["unit", "geo", "time"]);
        assert_eq!(array.axis("time").unwrap().labels, vec!["2020", "2021"]);
        assert_eq!(array.get(&["CP_MEUR", "BE", "2021"]).unwrap(), Some(502311.9));
        assert_eq!(array.get(&["CP_MEUR", "DE", "2020"]).unwrap(), None);
    }

    #[test]
    fn test_keeping_markers_still_parses() {
        let stub = StubTransport::serving(GDP_TSV);
        let array = cache_with(&stub, None)
            .with_markers(None)
            .get("nama_10_gdp", &FreshnessPolicy::Unbounded)
            .unwrap();
        assert_eq!(array.get(&["CP_MEUR", "BE", "2021"]).unwrap(), Some(502311.9));
    }

    #[test]
    fn test_legacy_markers_strip_bulk_flags() {
        // `i` is a legacy flag with no observation-status counterpart
        let text = "unit,geo\\time\t2021 \t2020 \nNR,BE\t12.5 i\t: \n";

        let stub = StubTransport::serving(text);
        let array = cache_with(&stub, None)
            .with_markers(Some(MarkerSet::Legacy))
            .get("demo_legacy", &FreshnessPolicy::Unbounded)
            .unwrap();
        assert_eq!(array.axis("time").unwrap().labels, vec!["2020", "2021"]);
        assert_eq!(array.data(), &[None, Some(12.5)]);

        let stub = StubTransport::serving(text);
        let result = cache_with(&stub, None).get("demo_legacy", &FreshnessPolicy::Unbounded);
        assert!(matches!(result, Err(EstatError::ParseError(_))));
    }

    #[test]
    fn test_get_many_is_keyed_by_identifier() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let arrays = cache
            .get_many(&["a", "b"], &FreshnessPolicy::default())
            .unwrap();
        let keys: Vec<&str> = arrays.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(stub.calls.get(), 2);

        assert_eq!(arrays["a"], cache.get("a", &FreshnessPolicy::Unbounded).unwrap());
        assert_eq!(arrays["b"], cache.get("b", &FreshnessPolicy::Unbounded).unwrap());
        assert_eq!(stub.calls.get(), 2);
    }

    #[test]
    fn test_get_many_aborts_on_failure() {
        let stub = StubTransport::failing();
        let cache = cache_with(&stub, None);

        let result = cache.get_many(&["a", "b"], &FreshnessPolicy::default());
        assert!(matches!(result, Err(EstatError::Fetch { .. })));
        assert_eq!(stub.calls.get(), 1);
    }

    #[test]
    fn test_failed_fetch_leaves_no_entry() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::failing();
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        assert!(cache.get("missing", &FreshnessPolicy::default()).is_err());
        assert!(!cache.dataset_path("missing").unwrap().exists());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let path = cache.dataset_path("broken").unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let result = cache.get("broken", &FreshnessPolicy::Unbounded);
        assert!(matches!(result, Err(EstatError::CacheError { .. })));
        assert_eq!(stub.calls.get(), 0);
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(GDP_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        cache.get("nama_10_gdp", &FreshnessPolicy::default()).unwrap();

        let dir = temp.path().join(CACHE_NAMESPACE).join(DATA_DIR);
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["nama_10_gdp.json"]);
    }

    #[test]
    fn test_catalog_is_cached() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(CATALOG_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        let catalog = cache
            .get_catalog(&FreshnessPolicy::PublicationSchedule)
            .unwrap();
        assert_eq!(catalog.find("nama_10_gdp").unwrap().title, "GDP");
        assert!(cache.catalog_path().unwrap().exists());

        let again = cache.get_catalog(&FreshnessPolicy::Unbounded).unwrap();
        assert_eq!(again, catalog);
        assert_eq!(stub.calls.get(), 1);
    }

    #[test]
    fn test_catalog_older_than_last_publication_is_refetched() {
        let temp = TempDir::new().unwrap();
        let stub = StubTransport::serving(CATALOG_TSV);
        let cache = cache_with(&stub, Some(temp.path().to_path_buf()));

        cache.get_catalog(&FreshnessPolicy::Unbounded).unwrap();
        // publications are never more than 13 hours apart
        backdate(
            &cache.catalog_path().unwrap(),
            std::time::Duration::from_secs(14 * 3_600),
        );

        cache
            .get_catalog(&FreshnessPolicy::PublicationSchedule)
            .unwrap();
        assert_eq!(stub.calls.get(), 2);
    }
}
