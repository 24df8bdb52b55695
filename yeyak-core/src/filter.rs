//! Two-stage inclusion filter over listings.
//!
//! Stage one ("v12") keeps listings in one of the watched districts whose
//! status is still open. Stage two ("v123") additionally requires the usage
//! target text to mention one of the eligibility keywords.

use crate::model::{Field, ListingFields};

/// Districts watched by default.
pub const DEFAULT_AREAS: [&str; 3] = ["강남구", "서초구", "송파구"];
/// Statuses that still accept or announce reservations.
pub const DEFAULT_STATUSES: [&str; 2] = ["접수중", "안내중"];
/// Usage-target keywords: infants, "no restriction", families.
pub const DEFAULT_USAGE_KEYWORDS: [&str; 3] = ["유아", "제한없음", "가족"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Conditions applied by both filter stages.
pub struct FilterCriteria {
    /// Allowed district names, matched exactly.
    pub areas: Vec<String>,
    /// Allowed status names, matched exactly.
    pub statuses: Vec<String>,
    /// Substrings of which the usage target must contain at least one.
    pub usage_keywords: Vec<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        let owned = |values: &[&str]| -> Vec<String> {
            values.iter().map(|&value| value.to_owned()).collect()
        };
        Self {
            areas: owned(DEFAULT_AREAS.as_slice()),
            statuses: owned(DEFAULT_STATUSES.as_slice()),
            usage_keywords: owned(DEFAULT_USAGE_KEYWORDS.as_slice()),
        }
    }
}

impl FilterCriteria {
    /// Stage one: district and status both allowed.
    #[must_use]
    pub fn matches_area_and_status<R: ListingFields + ?Sized>(&self, record: &R) -> bool {
        is_listed(&self.areas, &record.field(Field::Area))
            && is_listed(&self.statuses, &record.field(Field::Status))
    }

    /// Stage two condition alone: usage target mentions an eligibility keyword.
    #[must_use]
    pub fn matches_usage_target<R: ListingFields + ?Sized>(&self, record: &R) -> bool {
        let usage = record.field(Field::UsageTarget);
        !usage.is_empty()
            && self
                .usage_keywords
                .iter()
                .any(|keyword| !keyword.is_empty() && usage.contains(keyword.as_str()))
    }

    /// Split `records` into the v12 and v123 sets, keeping input order.
    #[must_use]
    pub fn apply<'rec, R: ListingFields>(&self, records: &'rec [R]) -> FilteredSets<'rec, R> {
        let mut sets = FilteredSets {
            v12: Vec::new(),
            v123: Vec::new(),
        };

        for record in records.iter().filter(|rec| self.matches_area_and_status(*rec)) {
            sets.v12.push(record);
            if self.matches_usage_target(record) {
                sets.v123.push(record);
            }
        }

        sets
    }
}

fn is_listed(allowed: &[String], value: &str) -> bool {
    !value.is_empty() && allowed.iter().any(|candidate| candidate == value)
}

#[derive(Debug)]
/// Records surviving each filter stage, borrowed from the input.
pub struct FilteredSets<'rec, R> {
    /// Area and status match.
    pub v12: Vec<&'rec R>,
    /// Area, status and usage target match; always a subset of `v12`.
    pub v123: Vec<&'rec R>,
}
