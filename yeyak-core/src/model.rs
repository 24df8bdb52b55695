//! Domain data structures for reservation listings and listing pages.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamp::{SortInstant, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Known fields of a reservation listing row.
pub enum Field {
    /// Service identifier (`SVCID`).
    ServiceId,
    /// Service name (`SVCNM`).
    ServiceName,
    /// Service status name, e.g. "접수중" (`SVCSTATNM`).
    Status,
    /// District name (`AREANM`).
    Area,
    /// Free-text description of who may use the service (`USETGTINFO`).
    UsageTarget,
    /// Service page URL (`SVCURL`).
    Url,
    /// Reception begin timestamp (`RCPTBGNDT`).
    ReceptionBegin,
    /// Reception end timestamp (`RCPTENDDT`).
    ReceptionEnd,
    /// Operation begin timestamp (`SVCOPNBGNDT`).
    OperationBegin,
    /// Operation end timestamp (`SVCOPNENDDT`).
    OperationEnd,
    /// Place name (`PLACENM`).
    Place,
}

impl Field {
    /// Fields kept by the compact projection, in output order.
    pub const COMPACT: [Field; 11] = [
        Field::ServiceId,
        Field::ServiceName,
        Field::Status,
        Field::Area,
        Field::UsageTarget,
        Field::Url,
        Field::ReceptionBegin,
        Field::ReceptionEnd,
        Field::OperationBegin,
        Field::OperationEnd,
        Field::Place,
    ];

    /// Columns of the CSV summary, in output order.
    pub const SUMMARY: [Field; 8] = [
        Field::ServiceId,
        Field::ServiceName,
        Field::Status,
        Field::Area,
        Field::UsageTarget,
        Field::Url,
        Field::ReceptionBegin,
        Field::ReceptionEnd,
    ];

    /// Key used for this field by the open-data API.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Field::ServiceId => "SVCID",
            Field::ServiceName => "SVCNM",
            Field::Status => "SVCSTATNM",
            Field::Area => "AREANM",
            Field::UsageTarget => "USETGTINFO",
            Field::Url => "SVCURL",
            Field::ReceptionBegin => "RCPTBGNDT",
            Field::ReceptionEnd => "RCPTENDDT",
            Field::OperationBegin => "SVCOPNBGNDT",
            Field::OperationEnd => "SVCOPNENDDT",
            Field::Place => "PLACENM",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

/// Read access to the known fields of a listing, regardless of its shape.
///
/// Missing values always read as the empty string.
pub trait ListingFields {
    /// Value of `field`, or `""` when absent.
    fn field(&self, field: Field) -> Cow<'_, str>;

    /// Ordering key: reception begin, then operation begin, then the sentinel.
    fn sort_key(&self) -> SortInstant {
        parse_timestamp(&self.field(Field::ReceptionBegin))
            .or_else(|| parse_timestamp(&self.field(Field::OperationBegin)))
            .map_or(SortInstant::Unparseable, SortInstant::At)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// A listing row exactly as returned by the API, including unknown fields.
pub struct RawRecord(pub Map<String, Value>);

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        RawRecord(fields)
    }
}

impl ListingFields for RawRecord {
    fn field(&self, field: Field) -> Cow<'_, str> {
        match self.0.get(field.key()) {
            None | Some(Value::Null) => Cow::Borrowed(""),
            Some(Value::String(text)) => Cow::Borrowed(text.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// The 11-field projection persisted in the filtered artifacts.
pub struct CompactRecord {
    /// Service identifier.
    #[serde(rename = "SVCID")]
    pub service_id: String,
    /// Service name.
    #[serde(rename = "SVCNM")]
    pub service_name: String,
    /// Service status name.
    #[serde(rename = "SVCSTATNM")]
    pub status: String,
    /// District name.
    #[serde(rename = "AREANM")]
    pub area: String,
    /// Usage target description.
    #[serde(rename = "USETGTINFO")]
    pub usage_target: String,
    /// Service page URL.
    #[serde(rename = "SVCURL")]
    pub url: String,
    /// Reception begin timestamp.
    #[serde(rename = "RCPTBGNDT")]
    pub reception_begin: String,
    /// Reception end timestamp.
    #[serde(rename = "RCPTENDDT")]
    pub reception_end: String,
    /// Operation begin timestamp.
    #[serde(rename = "SVCOPNBGNDT")]
    pub operation_begin: String,
    /// Operation end timestamp.
    #[serde(rename = "SVCOPNENDDT")]
    pub operation_end: String,
    /// Place name.
    #[serde(rename = "PLACENM")]
    pub place: String,
}

impl CompactRecord {
    /// Project any listing onto the compact fields, coercing missing values to `""`.
    #[must_use]
    pub fn project<R: ListingFields + ?Sized>(record: &R) -> Self {
        let take = |field| record.field(field).into_owned();
        Self {
            service_id: take(Field::ServiceId),
            service_name: take(Field::ServiceName),
            status: take(Field::Status),
            area: take(Field::Area),
            usage_target: take(Field::UsageTarget),
            url: take(Field::Url),
            reception_begin: take(Field::ReceptionBegin),
            reception_end: take(Field::ReceptionEnd),
            operation_begin: take(Field::OperationBegin),
            operation_end: take(Field::OperationEnd),
            place: take(Field::Place),
        }
    }
}

impl ListingFields for CompactRecord {
    fn field(&self, field: Field) -> Cow<'_, str> {
        let value = match field {
            Field::ServiceId => &self.service_id,
            Field::ServiceName => &self.service_name,
            Field::Status => &self.status,
            Field::Area => &self.area,
            Field::UsageTarget => &self.usage_target,
            Field::Url => &self.url,
            Field::ReceptionBegin => &self.reception_begin,
            Field::ReceptionEnd => &self.reception_end,
            Field::OperationBegin => &self.operation_begin,
            Field::OperationEnd => &self.operation_end,
            Field::Place => &self.place,
        };
        Cow::Borrowed(value.as_str())
    }
}

/// Stable ascending sort by [`ListingFields::sort_key`].
pub fn sort_by_schedule<R: ListingFields>(records: &mut [R]) {
    records.sort_by_cached_key(|record| record.sort_key());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Inclusive, 1-indexed row range requested from the listing API.
pub struct PageRange {
    /// First row (inclusive).
    pub start: u64,
    /// Last row (inclusive).
    pub end: u64,
}

impl PageRange {
    /// Range covering page `page` (1-based) for the given page size.
    #[must_use]
    pub fn page(page: u64, size: u64) -> Self {
        Self {
            start: page.saturating_sub(1) * size + 1,
            end: page * size,
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// One page of listing results.
pub struct ListingPage {
    /// Total number of rows the API claims to have; 0 when unknown.
    pub total_count: u64,
    /// Rows contained in this page.
    pub rows: Vec<RawRecord>,
}
