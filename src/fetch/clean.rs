//! Removal of observation flags from raw TSV text

use crate::error::{EstatError, EstatResult};
use serde::{Deserialize, Serialize};

/// Flag alphabet of the old bulk-download files
pub const LEGACY_MARKERS: &str = " dbefcuipsrzn:";

/// SDMX observation status alphabet, plus the blank and the missing-value colon
pub const OBS_STATUS_MARKERS: &str = " bcdefnprsuz:";

/// Which flag alphabet to strip from data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerSet {
    Legacy,
    #[default]
    ObservationStatus,
}

impl MarkerSet {
    pub fn chars(self) -> &'static str {
        match self {
            MarkerSet::Legacy => LEGACY_MARKERS,
            MarkerSet::ObservationStatus => OBS_STATUS_MARKERS,
        }
    }
}

/// Strip every character of `markers` from all lines but the header.
///
/// The header (everything before the first `\n`) is returned untouched.
/// Fails when the text has no line break at all.
pub fn clean_tsv(tsv: &str, markers: &str) -> EstatResult<String> {
    let header_end = tsv.find('\n').ok_or_else(|| {
        EstatError::MalformedText("no line break found after the header".to_string())
    })?;

    let (header, body) = tsv.split_at(header_end);

    let mut cleaned = String::with_capacity(tsv.len());
    cleaned.push_str(header);
    cleaned.extend(body.chars().filter(|c| !markers.contains(*c)));

    Ok(cleaned)
}
