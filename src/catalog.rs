//! Eurostat table of contents
//!
//! The listing is tab-separated with a header row. Only the first seven
//! columns are read: title, code, type, last update, last structure change,
//! data start, data end.

use crate::error::{EstatError, EstatResult};
use serde::{Deserialize, Serialize};

const CATALOG_COLUMNS: usize = 7;

/// One dataset, table or folder of the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub code: String,

    /// `folder`, `dataset` or `table`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub last_update: Option<String>,

    #[serde(default)]
    pub last_structure_change: Option<String>,

    #[serde(default)]
    pub data_start: Option<String>,

    #[serde(default)]
    pub data_end: Option<String>,
}

impl CatalogEntry {
    /// Entries that can be passed to a dataset fetch
    pub fn is_dataset(&self) -> bool {
        matches!(self.kind.as_str(), "dataset" | "table")
    }
}

/// Whole table of contents, cached as a single entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.code.eq_ignore_ascii_case(code))
    }

    /// Case-insensitive search on title and code
    pub fn search(&self, text: &str) -> Vec<&CatalogEntry> {
        let needle = text.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle) || e.code.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn datasets(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_dataset())
    }
}

/// Parse the tab-separated listing.
pub fn parse_catalog(text: &str) -> EstatResult<Catalog> {
    let mut lines = text.lines();
    lines
        .next()
        .ok_or_else(|| EstatError::ParseError("empty catalog listing".to_string()))?;

    let mut entries = Vec::new();
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let mut cells: Vec<String> = line
            .split('\t')
            .take(CATALOG_COLUMNS)
            .map(unquote)
            .collect();
        cells.resize(CATALOG_COLUMNS, String::new());

        let mut cells = cells.into_iter();
        let mut next = || cells.next().unwrap_or_default();
        let title = next().trim().to_string();
        let code = next();
        let kind = next();

        if code.is_empty() {
            return Err(EstatError::ParseError(format!(
                "catalog row without a code: '{}'",
                line
            )));
        }

        entries.push(CatalogEntry {
            title,
            code,
            kind,
            last_update: non_empty(next()),
            last_structure_change: non_empty(next()),
            data_start: non_empty(next()),
            data_end: non_empty(next()),
        });
    }

    Ok(Catalog { entries })
}

fn unquote(cell: &str) -> String {
    let cell = cell.trim_end_matches(['\r', '\n']);
    let cell = cell
        .strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell);
    cell.replace("\"\"", "\"")
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
