//! Cache freshness rules
//!
//! A policy decides, from a cache file's modification time, whether the
//! cached copy may be served without going to the network. Staleness is only
//! ever checked when an entry is read.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Timezone of the Eurostat publication schedule (CET/CEST)
pub const PUBLICATION_TZ: Tz = chrono_tz::Europe::Luxembourg;

/// Local hours at which Eurostat publishes updates
pub const PUBLICATION_HOURS: [u32; 2] = [11, 23];

/// Default maximum age for dataset entries
pub const DEFAULT_MAX_AGE_SECS: i64 = 86_400;

/// How old a cached entry may be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Any cached copy is good
    Unbounded,
    /// Accept entries at most this old
    MaxAge(Duration),
    /// Accept entries written at or after this instant
    Since(DateTime<Utc>),
    /// Accept entries written after the last scheduled publication
    PublicationSchedule,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy::MaxAge(Duration::seconds(DEFAULT_MAX_AGE_SECS))
    }
}

impl FreshnessPolicy {
    /// Whether an entry last modified at `modified` is still usable at `now`.
    pub fn accepts(&self, modified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            FreshnessPolicy::Unbounded => true,
            FreshnessPolicy::MaxAge(max_age) => now - modified <= *max_age,
            FreshnessPolicy::Since(cutoff) => modified >= *cutoff,
            FreshnessPolicy::PublicationSchedule => modified >= last_publication(now),
        }
    }
}

/// Most recent scheduled publication instant not after `now`.
///
/// Publications happen at 11:00 and 23:00 in [`PUBLICATION_TZ`], so the
/// candidates are yesterday 23:00, today 11:00 and today 23:00 (local).
pub fn last_publication(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = now.with_timezone(&PUBLICATION_TZ);
    let today = local_now.date_naive();
    let yesterday = today - Days::new(1);

    let latest_hour = PUBLICATION_HOURS[PUBLICATION_HOURS.len() - 1];
    let mut last = local_instant(yesterday, latest_hour);
    for hour in PUBLICATION_HOURS {
        let candidate = local_instant(today, hour);
        if candidate <= now {
            last = candidate;
        }
    }
    last
}

fn local_instant(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    // 11:00 and 23:00 never fall in a DST gap or overlap in CET/CEST
    match PUBLICATION_TZ.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

impl fmt::Display for FreshnessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreshnessPolicy::Unbounded => write!(f, "unbounded"),
            FreshnessPolicy::MaxAge(d) => write!(f, "{}s", d.num_seconds()),
            FreshnessPolicy::Since(t) => write!(f, "{}", t.to_rfc3339()),
            FreshnessPolicy::PublicationSchedule => write!(f, "publication-schedule"),
        }
    }
}

impl FromStr for FreshnessPolicy {
    type Err = String;

    /// Accepts `unbounded`, `schedule`, `<n>[s|m|h|d|w]`, RFC 3339 or `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "unbounded" | "forever" => return Ok(FreshnessPolicy::Unbounded),
            "schedule" | "publication-schedule" => {
                return Ok(FreshnessPolicy::PublicationSchedule)
            }
            _ => {}
        }

        if let Some(d) = parse_duration(s) {
            return Ok(FreshnessPolicy::MaxAge(d));
        }

        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok(FreshnessPolicy::Since(t.with_timezone(&Utc)));
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(FreshnessPolicy::Since(
                Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
            ));
        }

        Err(format!("Invalid max age '{}'", s))
    }
}

fn parse_duration(s: &str) -> Option<Duration> {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let n: i64 = number.parse().ok()?;

    let seconds = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return None,
    };
    n.checked_mul(seconds).and_then(Duration::try_seconds)
}
