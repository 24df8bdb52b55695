//! Best-effort parsing of the free-text timestamps found in listings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// Tried in order; the first format that consumes the whole input wins.
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const COMPACT_DATE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Sort position of a listing.
///
/// Every parsed instant orders before [`SortInstant::Unparseable`].
pub enum SortInstant {
    /// A successfully parsed instant.
    At(NaiveDateTime),
    /// No timestamp could be parsed; sorts after everything else.
    Unparseable,
}

/// Parse `raw` using the supported listing formats.
///
/// Returns `None` for empty or unrecognised input. Date-only forms map to midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let date_time = |format: &str| NaiveDateTime::parse_from_str(text, format).ok();
    let date = |format: &str| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .map(|day| day.and_time(NaiveTime::MIN))
    };

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| date_time(format))
        .or_else(|| date(DATE_FORMAT))
        .or_else(|| date_time(COMPACT_DATE_TIME_FORMAT))
        .or_else(|| date(COMPACT_DATE_FORMAT))
}
