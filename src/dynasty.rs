//! Dynasty-label heuristic: the coarsest date evidence.
//!
//! Filenames carry a dynasty label such as 西漢 or 前漢. Historiographic
//! variants are first mapped to a canonical key through [`DYNASTY_ALIASES`],
//! then looked up in a [`DynastyTable`]. The table comes from a CSV file when
//! one is given, otherwise from [`DEFAULT_DYNASTY_RANGES`].

use std::collections::HashMap;
use std::path::Path;

use kratt_types::DateInterval;
use tracing::{debug, warn};

use crate::catalog::get_field;

// ── Built-in tables ──────────────────────────────────────────────────

/// A dynasty label and its approximate `[start, end]` years.
pub struct DynastyRange {
    pub label: &'static str,
    pub start: i32,
    pub end: i32,
}

const fn range(label: &'static str, start: i32, end: i32) -> DynastyRange {
    DynastyRange { label, start, end }
}

/// Heuristic ranges; override with a `dynasty_label,date_not_before,date_not_after` CSV.
pub static DEFAULT_DYNASTY_RANGES: &[DynastyRange] = &[
    range("西周", -1046, -771),
    range("東周", -770, -256),
    range("周", -1046, -256),
    range("春秋", -770, -476),
    range("戰國", -475, -221),
    range("秦", -221, -206),
    range("西漢", -206, 8),
    range("新", 9, 23),
    range("東漢", 25, 220),
    range("漢", -206, 220),
    range("三國", 220, 280),
    range("魏", 220, 266),
    range("蜀", 221, 263),
    range("吳", 229, 280),
    range("西晉", 266, 316),
    range("東晉", 317, 420),
    range("晉", 266, 420),
    range("北魏", 386, 534),
    range("東魏", 534, 550),
    range("西魏", 535, 557),
    range("北齊", 550, 577),
    range("北周", 557, 581),
    range("劉宋", 420, 479),
    range("南齊", 479, 502),
    range("梁", 502, 557),
    range("陳", 557, 589),
    range("南北朝", 420, 589),
    range("南朝", 420, 589),
    range("北朝", 386, 581),
    range("隋", 581, 618),
    range("唐", 618, 907),
    range("五代", 907, 960),
    range("五代十國", 907, 979),
    range("北宋", 960, 1127),
    range("南宋", 1127, 1279),
    range("宋", 960, 1279),
    range("遼", 907, 1125),
    range("西夏", 1038, 1227),
    range("金", 1115, 1234),
    range("元", 1271, 1368),
    range("明", 1368, 1644),
    range("清", 1644, 1912),
    range("民國", 1912, 1949),
];

/// Variant label → canonical key in the range table.
pub static DYNASTY_ALIASES: &[(&str, &str)] = &[
    ("前漢", "西漢"),
    ("後漢", "東漢"),
    ("蜀漢", "蜀"),
    ("東吳", "吳"),
    ("孫吳", "吳"),
    ("南朝宋", "劉宋"),
    ("宋(南朝)", "劉宋"),
];

/// Map a label to its canonical form. Unknown labels map to themselves.
pub fn canonical_label(label: &str) -> &str {
    DYNASTY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == label)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(label)
}

// ── Lookup table ─────────────────────────────────────────────────────

/// Outcome of the dynasty fallback: always an interval (maybe unknown)
/// plus the note written to the date-range table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynastyResolution {
    pub interval: DateInterval,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct DynastyTable {
    ranges: HashMap<String, (i32, i32)>,
}

impl DynastyTable {
    pub fn builtin() -> Self {
        DEFAULT_DYNASTY_RANGES
            .iter()
            .map(|r| (r.label, r.start, r.end))
            .collect()
    }

    /// Load ranges from CSV. A missing or unreadable file yields the
    /// built-in table; individual bad rows are skipped.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        if !path.exists() {
            warn!(path = %path.display(), "dynasty range file missing, using built-in table");
            return Self::builtin();
        }
        match Self::from_csv_path(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read dynasty ranges, using built-in table"
                );
                Self::builtin()
            }
        }
    }

    fn from_csv_path(path: &Path) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;
        Self::from_csv_reader(&mut reader)
    }

    pub fn from_csv_reader<R: std::io::Read>(
        reader: &mut csv::Reader<R>,
    ) -> Result<Self, csv::Error> {
        let headers = reader.headers()?.clone();
        let mut table = Self::default();
        for (idx, row) in reader.records().enumerate() {
            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    debug!(row = idx + 1, error = %e, "skipping unreadable dynasty row");
                    continue;
                }
            };
            let label = get_field(&row, &headers, "dynasty_label");
            let start = get_field(&row, &headers, "date_not_before").and_then(|s| s.parse().ok());
            let end = get_field(&row, &headers, "date_not_after").and_then(|s| s.parse().ok());
            match (label, start, end) {
                (Some(label), Some(start), Some(end)) => {
                    table.ranges.insert(label.to_string(), (start, end));
                }
                _ => debug!(row = idx + 1, "skipping incomplete dynasty row"),
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn get(&self, label: &str) -> Option<DateInterval> {
        self.ranges
            .get(label)
            .map(|&(start, end)| DateInterval::bounded(start, end))
    }

    /// Alias-normalize `label`, then look it up.
    pub fn resolve(&self, label: &str) -> DynastyResolution {
        if label.is_empty() {
            return DynastyResolution {
                interval: DateInterval::UNKNOWN,
                note: "missing dynasty label".to_string(),
            };
        }
        let canonical = canonical_label(label);
        let Some(interval) = self.get(canonical) else {
            return DynastyResolution {
                interval: DateInterval::UNKNOWN,
                note: format!("unmapped dynasty label={label}"),
            };
        };
        let note = if canonical != label {
            format!("dynasty_label={label} alias={canonical}")
        } else {
            format!("dynasty_label={label}")
        };
        DynastyResolution { interval, note }
    }
}

impl<S: Into<String>> FromIterator<(S, i32, i32)> for DynastyTable {
    fn from_iter<I: IntoIterator<Item = (S, i32, i32)>>(iter: I) -> Self {
        Self {
            ranges: iter
                .into_iter()
                .map(|(label, start, end)| (label.into(), (start, end)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_alias_target() {
        let table = DynastyTable::builtin();
        assert_eq!(table.len(), DEFAULT_DYNASTY_RANGES.len());
        for (alias, canonical) in DYNASTY_ALIASES {
            assert!(table.get(canonical).is_some(), "{alias} → {canonical} unmapped");
        }
    }

    #[test]
    fn test_resolve_alias_names_both_labels() {
        let table = DynastyTable::builtin();
        let aliased = table.resolve("前漢");
        let direct = table.resolve("西漢");
        assert_eq!(aliased.interval, direct.interval);
        assert_eq!(aliased.interval, DateInterval::bounded(-206, 8));
        assert_eq!(aliased.note, "dynasty_label=前漢 alias=西漢");
        assert_eq!(direct.note, "dynasty_label=西漢");
    }

    #[test]
    fn test_resolve_missing_and_unmapped() {
        let table = DynastyTable::builtin();
        let missing = table.resolve("");
        assert!(missing.interval.is_unknown());
        assert_eq!(missing.note, "missing dynasty label");

        let unmapped = table.resolve("大蒙古");
        assert!(unmapped.interval.is_unknown());
        assert_eq!(unmapped.note, "unmapped dynasty label=大蒙古");
    }

    #[test]
    fn test_csv_skips_bad_rows() {
        let data = "dynasty_label,date_not_before,date_not_after\n\
                    秦,-221,-206\n\
                    唐,,907\n\
                    宋,nine,1279\n\
                    ,1,2\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let table = DynastyTable::from_csv_reader(&mut reader).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("秦"), Some(DateInterval::bounded(-221, -206)));
        assert_eq!(table.get("唐"), None);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let table = DynastyTable::load(Some(Path::new("/nonexistent/dynasties.csv")));
        assert_eq!(table.len(), DEFAULT_DYNASTY_RANGES.len());
    }
}
