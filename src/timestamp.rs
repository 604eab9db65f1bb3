//! Capture-time inference from file names.
//!
//! Cameras, phones and screenshot tools embed the capture time in the file
//! name in a handful of recognisable shapes. This module tries each known
//! layout in order and falls back to the file's on-disk time when none fit.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use mediasort::models::MediaFile;
//! use mediasort::timestamp::infer_timestamp;
//!
//! let file = MediaFile::new("Screenshot_20180526_140029_MyFaceSpace", "png", "/tmp", Utc::now());
//! assert_eq!(
//!     infer_timestamp(&file),
//!     Utc.with_ymd_and_hms(2018, 5, 26, 14, 0, 29).unwrap()
//! );
//! ```

use crate::models::MediaFile;
use chrono::format::{Item, Numeric, ParseErrorKind, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::trace;
use std::fmt::Write;

/// Built-in name layouts, most specific first.
pub const TIMESTAMP_LAYOUTS: [&str; 7] = [
    "%Y%m%d%H%M%S",
    "%Y%m%d_%H%M%S",
    "%Y%m%d-%H%M%S",
    "Screenshot_%Y%m%d%H%M%S",
    "Screenshot_%Y%m%d_%H%M%S",
    "Screenshot_%Y%m%d-%H%M%S",
    "Screenshot %Y-%m-%d at %H.%M.%S",
];

const SCREENSHOT_PREFIX: &str = "Screenshot_";

/// Infers capture times from file names using an ordered list of layouts.
#[derive(Debug, Clone)]
pub struct TimestampInferencer {
    layouts: Vec<String>,
}

impl TimestampInferencer {
    /// Creates an inferencer with the built-in layouts.
    pub fn new() -> Self {
        Self {
            layouts: TIMESTAMP_LAYOUTS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Appends a layout after the existing ones.
    ///
    /// Returns `false` and leaves the inferencer unchanged when the layout is
    /// not a valid strftime pattern.
    pub fn add_layout(&mut self, layout: &str) -> bool {
        if !is_valid_layout(layout) {
            return false;
        }
        self.layouts.push(layout.to_string());
        true
    }

    /// Returns the layouts in the order they are tried.
    pub fn layouts(&self) -> &[String] {
        &self.layouts
    }

    /// Parses a timestamp out of a file stem, if any layout matches.
    ///
    /// Every layout is tried against the stem itself and then, for stems
    /// starting with `Screenshot_`, against the part after the prefix with
    /// its trailing `_app-name` segment removed. The first hit wins.
    pub fn parse_name(&self, name: &str) -> Option<DateTime<Utc>> {
        let candidates = name_candidates(name);

        for layout in &self.layouts {
            for candidate in &candidates {
                if let Some(ts) = parse_with_layout(candidate, layout) {
                    trace!("'{}' matched layout '{}' as '{}'", name, layout, candidate);
                    return Some(ts);
                }
            }
        }

        None
    }

    /// Returns the capture time for a file: the timestamp parsed from its
    /// name, or its `created_at` value when the name carries none.
    pub fn infer(&self, file: &MediaFile) -> DateTime<Utc> {
        self.parse_name(&file.name).unwrap_or_else(|| {
            trace!(
                "no layout matched '{}', using file time {}",
                file.name, file.created_at
            );
            file.created_at
        })
    }
}

impl Default for TimestampInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Infers a file's capture time using the built-in layouts.
pub fn infer_timestamp(file: &MediaFile) -> DateTime<Utc> {
    TimestampInferencer::default().infer(file)
}

/// Returns `true` if chrono can parse with `layout` and the layout carries a
/// year, so that a match yields a calendar date.
pub fn is_valid_layout(layout: &str) -> bool {
    let items: Vec<Item> = StrftimeItems::new(layout).collect();
    !items.is_empty()
        && !items.iter().any(|item| matches!(item, Item::Error))
        && items.iter().any(|item| {
            matches!(
                item,
                Item::Numeric(Numeric::Year | Numeric::YearMod100 | Numeric::IsoYear | Numeric::Timestamp, _)
            )
        })
}

/// Builds the strings a stem is matched against, verbatim first.
fn name_candidates(name: &str) -> Vec<&str> {
    let mut candidates = vec![name];

    // "Screenshot_<timestamp>_<app name>" -> "<timestamp>"
    if let Some(suffix) = name.strip_prefix(SCREENSHOT_PREFIX) {
        let without_app = suffix.rfind('_').map_or("", |idx| &suffix[..idx]);
        candidates.push(without_app);
    }

    candidates
}

fn parse_with_layout(candidate: &str, layout: &str) -> Option<DateTime<Utc>> {
    let naive = match NaiveDateTime::parse_from_str(candidate, layout) {
        Ok(naive) => naive,
        // Date-only layouts are read as midnight.
        Err(e) if e.kind() == ParseErrorKind::NotEnough => NaiveDate::parse_from_str(candidate, layout)
            .ok()?
            .and_time(NaiveTime::MIN),
        Err(_) => return None,
    };

    // chrono accepts single-digit fields; names must read back unchanged.
    if !renders_as(&naive, layout, candidate) {
        return None;
    }

    Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Formats `naive` with `layout` and compares the result with `candidate`,
/// ignoring ASCII case so month names match however they are written.
fn renders_as(naive: &NaiveDateTime, layout: &str, candidate: &str) -> bool {
    let mut rendered = String::with_capacity(candidate.len());
    write!(rendered, "{}", naive.format(layout)).is_ok() && rendered.eq_ignore_ascii_case(candidate)
}
