//! Plain-text digest of the filtered listings.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::{CompactRecord, Field, ListingFields, RawRecord, sort_by_schedule};

/// Listings shown per section.
pub const SECTION_LIMIT: usize = 10;
/// Reservation page of a service; the id is appended.
pub const DEEP_LINK_PREFIX: &str =
    "https://yeyak.seoul.go.kr/web/reservation/selectReservView.do?rsv_svc_id=";

const HEADLINE: &str = "서울시 공공서비스예약 - 일일 알림";
const V12_TITLE: &str = "[v12] 조건 (1)&(2)";
const V123_TITLE: &str = "[v123] 조건 (1)&(2)&(3)";
const SEPARATOR: &str = "-----";
const NO_MATCHES: &str = "해당 조건에 맞는 항목이 없습니다.";
const PLACEHOLDER: &str = "-";
const ELLIPSIS: char = '…';

#[derive(thiserror::Error, Debug)]
/// Input artifacts that cannot be used for a digest.
pub enum DigestInputError {
    /// File does not exist.
    #[error("Missing file {}", .path.display())]
    Missing {
        /// Expected location.
        path: PathBuf,
    },
    /// File exists but could not be read.
    #[error("Failed to load {}: {source}", .path.display())]
    Read {
        /// File location.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// File is not valid JSON.
    #[error("Failed to load {}: {source}", .path.display())]
    Parse {
        /// File location.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// JSON root is not an array.
    #[error("Failed to load {}: JSON root is not a list", .path.display())]
    NotArray {
        /// File location.
        path: PathBuf,
    },
}

/// Load a compact listing artifact.
///
/// Array entries that are not objects are dropped.
///
/// # Errors
///
/// Returns a [`DigestInputError`] when the file is missing, unreadable, not
/// JSON, or not a JSON array.
pub fn load_compact_list(path: &Path) -> Result<Vec<CompactRecord>, DigestInputError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            DigestInputError::Missing {
                path: path.to_owned(),
            }
        } else {
            DigestInputError::Read {
                path: path.to_owned(),
                source,
            }
        }
    })?;

    let root: Value = serde_json::from_str(&text).map_err(|source| DigestInputError::Parse {
        path: path.to_owned(),
        source,
    })?;

    let Value::Array(entries) = root else {
        return Err(DigestInputError::NotArray {
            path: path.to_owned(),
        });
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => Some(CompactRecord::project(&RawRecord(fields))),
            _ => None,
        })
        .collect())
}

/// Shorten `text` to at most `max` characters, marking cuts with `…`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push(ELLIPSIS);
    cut
}

/// One digest line for a listing.
#[must_use]
pub fn render_line<R: ListingFields + ?Sized>(record: &R) -> String {
    let shown = |field: Field, max: usize| {
        let value = record.field(field);
        truncate(if value.is_empty() { PLACEHOLDER } else { &*value }, max)
    };

    let service_id = record.field(Field::ServiceId);
    let link = if service_id.is_empty() {
        PLACEHOLDER.to_owned()
    } else {
        format!("{DEEP_LINK_PREFIX}{service_id}")
    };

    format!(
        "- [{area}] {name} ({status}) | 접수: {begin} ~ {end} | 링크: {link}",
        area = shown(Field::Area, 10),
        name = shown(Field::ServiceName, 40),
        status = shown(Field::Status, 10),
        begin = shown(Field::ReceptionBegin, 19),
        end = shown(Field::ReceptionEnd, 19),
    )
}

/// A titled section listing the earliest [`SECTION_LIMIT`] records.
#[must_use]
pub fn render_section(title: &str, records: &[CompactRecord]) -> String {
    let mut lines = vec![
        title.to_owned(),
        String::new(),
        format!("총 {}건", records.len()),
        String::new(),
    ];

    if records.is_empty() {
        lines.push(NO_MATCHES.to_owned());
        return lines.join("\n");
    }

    let mut sorted = records.to_vec();
    sort_by_schedule(&mut sorted);
    lines.extend(sorted.iter().take(SECTION_LIMIT).map(render_line));

    lines.join("\n")
}

/// The full digest body for the v12 and v123 sets.
#[must_use]
pub fn render_digest(v12: &[CompactRecord], v123: &[CompactRecord]) -> String {
    [
        HEADLINE.to_owned(),
        String::new(),
        render_section(V12_TITLE, v12),
        String::new(),
        SEPARATOR.to_owned(),
        String::new(),
        render_section(V123_TITLE, v123),
    ]
    .join("\n")
}
