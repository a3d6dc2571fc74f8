//! Canonical shape for fetched datasets
//!
//! Time labels become compact (`2020Q1`, `2020M01`), the time axis runs
//! ascending, and a `freq` axis with a single value is dropped.

use crate::array::types::LabeledArray;
use crate::error::EstatResult;

/// Time axis name used by SDMX files
pub const SDMX_TIME_AXIS: &str = "TIME_PERIOD";

/// Time axis name after reshaping (and in bulk-download files)
pub const TIME_AXIS: &str = "time";

/// Frequency axis name
pub const FREQ_AXIS: &str = "freq";

/// Apply all reshaping steps.
pub fn normalize(mut array: LabeledArray) -> EstatResult<LabeledArray> {
    if array.axis(SDMX_TIME_AXIS).is_some() {
        array = array.rename(SDMX_TIME_AXIS, TIME_AXIS)?;
    }

    if let Some(time) = array.axis(TIME_AXIS) {
        let is_descending = time.len() > 1
            && canonical_period(&time.labels[0]) > canonical_period(&time.labels[time.len() - 1]);

        array = array.set_labels(TIME_AXIS, canonical_period)?;
        if is_descending {
            array = array.reverse(TIME_AXIS)?;
        }
    }

    let single_freq = array
        .axis(FREQ_AXIS)
        .filter(|axis| axis.len() == 1)
        .map(|axis| axis.labels[0].clone());
    if let Some(freq) = single_freq {
        array = array.select(FREQ_AXIS, &freq)?;
    }

    Ok(array)
}

/// Rewrite an SDMX period label into its compact form.
///
/// `2020-Q1` → `2020Q1`, `2020-S2` → `2020S2`, `2020-03` → `2020M03`.
/// Anything else (years, days, already compact labels) is returned as is.
pub fn canonical_period(label: &str) -> String {
    let label = label.trim();
    let Some((year, rest)) = label.split_once('-') else {
        return label.to_string();
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return label.to_string();
    }

    let mut chars = rest.chars();
    match chars.next() {
        Some(prefix @ ('Q' | 'S' | 'W')) if is_number(chars.as_str()) => {
            format!("{}{}{}", year, prefix, chars.as_str())
        }
        Some(_) if rest.len() == 2 && is_number(rest) => format!("{}M{}", year, rest),
        _ => label.to_string(),
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
