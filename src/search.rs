use std::fs::File;
use std::io::BufReader;

use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::text::LossyLines;

/// One occurrence of a variant inside one work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'c> {
    pub entry: &'c CatalogEntry,
    /// 1-based
    pub line_no: usize,
    /// 0-based, in characters
    pub offset: usize,
    /// The variant that matched
    pub term: String,
    pub line: String,
}

/// Caps applied while walking the catalog.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Global result cap, at least 1
    pub limit: usize,
    /// Keep only the first hit per work
    pub dedup: bool,
}

/// Every occurrence of every variant in `line`, as `(char offset, variant)`.
///
/// Occurrences of one variant do not overlap; occurrences of different
/// variants may. Sorted by offset, then by variant.
pub fn line_matches<'v>(line: &str, variants: &'v [String]) -> Vec<(usize, &'v str)> {
    let mut hits: Vec<(usize, &'v str)> = Vec::new();
    for term in variants.iter().filter(|t| !t.is_empty()) {
        let mut start = 0;
        while let Some(idx) = line[start..].find(term.as_str()) {
            let byte_idx = start + idx;
            hits.push((byte_idx, term.as_str()));
            start = byte_idx + term.len();
        }
    }
    // byte order and char order agree, so sort before converting
    hits.sort();
    hits.into_iter()
        .map(|(byte_idx, term)| (line[..byte_idx].chars().count(), term))
        .collect()
}

/// Scan one work's text, stopping after `max_matches` hits. A missing or
/// unreadable file yields no matches.
pub fn scan_entry<'c>(
    entry: &'c CatalogEntry,
    variants: &[String],
    max_matches: usize,
) -> Vec<Match<'c>> {
    let mut matches = Vec::new();
    if max_matches == 0 {
        return matches;
    }
    if !entry.file.exists() {
        debug!(work_id = %entry.work.work_id, path = %entry.file.display(), "corpus file missing");
        return matches;
    }
    let file = match File::open(&entry.file) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %entry.file.display(), error = %e, "cannot open corpus file");
            return matches;
        }
    };

    for (idx, line) in LossyLines::new(BufReader::new(file)).enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    path = %entry.file.display(),
                    line = idx + 1,
                    error = %e,
                    "corpus read interrupted"
                );
                break;
            }
        };
        for (offset, term) in line_matches(&line, variants) {
            matches.push(Match {
                entry,
                line_no: idx + 1,
                offset,
                term: term.to_string(),
                line: line.clone(),
            });
            if matches.len() >= max_matches {
                return matches;
            }
        }
    }
    matches
}

/// Walk the catalog in rank order until `limit` matches are collected.
pub fn search<'c>(
    catalog: &'c Catalog,
    variants: &[String],
    opts: SearchOptions,
) -> Vec<Match<'c>> {
    let mut results = Vec::new();
    for entry in &catalog.entries {
        let remaining = opts.limit.saturating_sub(results.len());
        if remaining == 0 {
            break;
        }
        let per_work = if opts.dedup { 1 } else { remaining };
        results.extend(scan_entry(entry, variants, per_work));
    }
    results
}
