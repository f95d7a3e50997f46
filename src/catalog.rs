use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use kratt_types::{DateInterval, ResolvedDate, Work};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::order;

pub const BOOKS_CSV: &str = "books.csv";
pub const DATE_RANGES_CSV: &str = "publication_date_range.csv";

// ── Filename grammar ─────────────────────────────────────────────────
//
// Real data examples:
//   KR1a0001 周易-周-姬昌.txt
//   KR3j0160 世說新語-劉宋-劉義慶.txt
//   KR1h0004 孟子注疏-東漢-趙岐 (注).txt
//   KR5c0057 太平經-東漢.txt

static RE_BOOK_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<id>KR\d[a-z]\d{4})\s+(?P<rest>.+)\.txt$").unwrap());

/// Parse a corpus filename into a [`Work`] with an empty `path`.
/// Returns None for names outside the grammar.
pub fn parse_filename(name: &str) -> Option<Work> {
    let caps = RE_BOOK_FILE.captures(name)?;
    let work_id = caps.name("id")?.as_str();
    let (title, dynasty_label, author_label) = parse_metadata(caps.name("rest")?.as_str());
    Some(Work {
        collection: work_id.chars().take(3).collect(),
        work_id: work_id.to_string(),
        title,
        dynasty_label,
        author_label,
        filename: name.to_string(),
        path: String::new(),
    })
}

/// Split "title-dynasty-author" from the right into at most three parts.
/// Hyphens inside the title survive.
pub fn parse_metadata(label: &str) -> (String, String, String) {
    let mut parts: Vec<String> = label.rsplitn(3, '-').map(|p| p.trim().to_string()).collect();
    parts.reverse();
    let mut parts = parts.into_iter();
    let title = parts.next().unwrap_or_default();
    let dynasty_label = parts.next().unwrap_or_default();
    let author_label = parts.next().unwrap_or_default();
    (title, dynasty_label, author_label)
}

// ── CSV helpers ──────────────────────────────────────────────────────

/// Look up a column by header name; blank values count as missing.
pub fn get_field<'r>(
    row: &'r csv::StringRecord,
    headers: &csv::StringRecord,
    name: &str,
) -> Option<&'r str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|idx| row.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(csv::Writer::from_path(path)?)
}

// ── Exports ──────────────────────────────────────────────────────────

pub fn write_books_csv(path: &Path, works: &[Work]) -> Result<()> {
    let mut writer = create_writer(path)?;
    for work in works {
        writer.serialize(work)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), rows = works.len(), "wrote work listing");
    Ok(())
}

#[derive(Serialize)]
struct DateRangeRow<'a> {
    work_id: &'a str,
    source: &'static str,
    date_not_before: Option<i32>,
    date_not_after: Option<i32>,
    date_type: &'static str,
    confidence: &'static str,
    note: &'a str,
    #[serde(rename = "ref")]
    reference: &'a str,
}

impl<'a> From<&'a ResolvedDate> for DateRangeRow<'a> {
    fn from(date: &'a ResolvedDate) -> Self {
        Self {
            work_id: &date.work_id,
            source: date.source.as_str(),
            date_not_before: date.interval.not_before,
            date_not_after: date.interval.not_after,
            date_type: date.date_type.as_str(),
            confidence: date.confidence.as_str(),
            note: &date.note,
            reference: &date.reference,
        }
    }
}

pub fn write_date_ranges_csv(path: &Path, dates: &[ResolvedDate]) -> Result<()> {
    let mut writer = create_writer(path)?;
    for date in dates {
        writer.serialize(DateRangeRow::from(date))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), rows = dates.len(), "wrote publication date ranges");
    Ok(())
}

// ── Query-side catalog ───────────────────────────────────────────────

/// Find the directory holding `books.csv`: explicit flag, then the
/// configured directory, then `./data`.
pub fn resolve_data_dir(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        if !dir.join(BOOKS_CSV).exists() {
            return Err(Error::ListingMissing(dir.to_path_buf()));
        }
        return Ok(dir.to_path_buf());
    }
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(PathBuf::from("data")));
    for dir in candidates {
        if dir.join(BOOKS_CSV).exists() {
            return Ok(dir);
        }
    }
    Err(Error::DataDirNotFound)
}

/// Read resolved intervals keyed by work id. Rows without two parseable
/// bounds are treated as unknown; with several rows per work the smallest
/// interval wins. A missing file means every work is undated.
pub fn load_date_ranges(path: &Path) -> Result<HashMap<String, DateInterval>> {
    if !path.exists() {
        warn!(path = %path.display(), "no date-range table, every work is undated");
        return Ok(HashMap::new());
    }
    let mut ranges: HashMap<String, (i32, i32)> = HashMap::new();
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for (idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                debug!(row = idx + 1, error = %e, "skipping unreadable date row");
                continue;
            }
        };
        let Some(work_id) = get_field(&row, &headers, "work_id") else {
            continue;
        };
        let start =
            get_field(&row, &headers, "date_not_before").and_then(|s| s.parse::<i32>().ok());
        let end = get_field(&row, &headers, "date_not_after").and_then(|s| s.parse::<i32>().ok());
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };
        ranges
            .entry(work_id.to_string())
            .and_modify(|current| {
                if (start, end) < *current {
                    *current = (start, end);
                }
            })
            .or_insert((start, end));
    }
    Ok(ranges
        .into_iter()
        .map(|(id, (start, end))| (id, DateInterval::bounded(start, end)))
        .collect())
}

/// A work ready for scanning: its metadata, its ranking interval and the
/// absolute location of its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub work: Work,
    pub interval: DateInterval,
    pub file: PathBuf,
}

/// The ordered work list search runs over.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load `books.csv` and `publication_date_range.csv` from `data_dir`
    /// and sort into scan order. Works without a path are left out.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let books = data_dir.join(BOOKS_CSV);
        if !books.exists() {
            return Err(Error::ListingMissing(data_dir.to_path_buf()));
        }
        let ranges = load_date_ranges(&data_dir.join(DATE_RANGES_CSV))?;

        let mut reader = csv::Reader::from_path(&books)?;
        let headers = reader.headers()?.clone();
        let mut entries = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    debug!(row = idx + 1, error = %e, "skipping unreadable listing row");
                    continue;
                }
            };
            let field = |name: &str| {
                get_field(&row, &headers, name)
                    .unwrap_or_default()
                    .to_string()
            };
            let path = field("path");
            if path.is_empty() {
                continue;
            }
            let work = Work {
                collection: field("collection"),
                work_id: field("work_id"),
                title: field("title"),
                dynasty_label: field("dynasty_label"),
                author_label: field("author_label"),
                filename: field("filename"),
                path,
            };
            entries.push(CatalogEntry {
                interval: ranges.get(&work.work_id).copied().unwrap_or_default(),
                file: data_dir.join(&work.path),
                work,
            });
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Self {
        order::sort_entries(&mut entries);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
