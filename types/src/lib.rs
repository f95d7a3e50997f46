use std::fmt;

use serde::{Deserialize, Serialize};

// ── Year interval ────────────────────────────────────────────────────────

/// A `[not_before, not_after]` interval on a proleptic year axis
/// (negative = BCE). Either bound may be missing.
///
/// `not_before <= not_after` is expected but never enforced: catalog data
/// is passed through as-is so upstream errors stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateInterval {
    pub not_before: Option<i32>,
    pub not_after: Option<i32>,
}

impl DateInterval {
    pub const UNKNOWN: Self = Self {
        not_before: None,
        not_after: None,
    };

    pub fn new(not_before: Option<i32>, not_after: Option<i32>) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    pub fn bounded(not_before: i32, not_after: i32) -> Self {
        Self::new(Some(not_before), Some(not_after))
    }

    /// Both bounds, if both are present.
    pub fn bounds(&self) -> Option<(i32, i32)> {
        Some((self.not_before?, self.not_after?))
    }

    /// Number of bounds present (0, 1 or 2).
    pub fn bound_count(&self) -> u8 {
        self.not_before.is_some() as u8 + self.not_after.is_some() as u8
    }

    pub fn is_unknown(&self) -> bool {
        self.not_before.is_none() && self.not_after.is_none()
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((a, b)) => write!(f, "{a}..{b}"),
            None => f.write_str("unknown"),
        }
    }
}

// ── Corpus work ──────────────────────────────────────────────────────────

/// One corpus document, as parsed from its filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// First three characters of the work id, e.g. "KR1".
    pub collection: String,
    /// Stable unique key, e.g. "KR1a0001".
    pub work_id: String,
    pub title: String,
    pub dynasty_label: String,
    pub author_label: String,
    pub filename: String,
    /// Path relative to the data directory. Empty when unresolvable.
    pub path: String,
}

// ── Evidence records ─────────────────────────────────────────────────────

/// One dated person attached to a work in the KR catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonEvidence {
    pub work_id: String,
    pub person_name: String,
    /// Role of the person for this work: 撰, 注, 編, …
    pub function: String,
    pub dynasty_label: String,
    pub raw_dates: String,
    pub interval: DateInterval,
}

/// One row of the CBDB biographical export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiographicalPerson {
    pub person_id: String,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub fl_earliest: Option<i32>,
    pub fl_latest: Option<i32>,
}

// ── Resolution output ────────────────────────────────────────────────────

/// Which evidence tier produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Cbdb,
    KrCatalog,
    FilenameDynasty,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cbdb => "cbdb",
            Self::KrCatalog => "kr_catalog",
            Self::FilenameDynasty => "filename_dynasty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// What kind of bound the interval represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    /// Birth..death of the author
    AuthorLifespanBound,
    /// Earliest..latest floruit year
    FloruitBound,
    /// Coarse range of the dynasty named in the filename
    DynastyBound,
}

impl DateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorLifespanBound => "author_lifespan_bound",
            Self::FloruitBound => "floruit_bound",
            Self::DynastyBound => "dynasty_bound",
        }
    }
}

/// The single date assigned to one work by the resolution cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    pub work_id: String,
    pub source: DateSource,
    pub interval: DateInterval,
    pub date_type: DateType,
    pub confidence: Confidence,
    /// Human-readable provenance, e.g. "dynasty_label=前漢 alias=西漢"
    pub note: String,
    /// Dataset the date was taken from; empty for the dynasty heuristic.
    pub reference: String,
}
