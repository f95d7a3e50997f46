use std::fmt::Write as _;

use serde::Serialize;

use crate::search::Match;
use crate::snippet::render_snippet;

/// A finished query, ready for printing as text or JSON.
#[derive(Debug, Serialize)]
pub struct SearchReport<'a> {
    pub query: &'a str,
    pub variants: &'a [String],
    pub limit: usize,
    pub dedup: bool,
    pub result_count: usize,
    pub results: Vec<ReportRow<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub rank: usize,
    /// `a..b` or `unknown`
    pub dates: String,
    pub date_not_before: Option<i32>,
    pub date_not_after: Option<i32>,
    pub work_id: &'a str,
    pub title: &'a str,
    pub dynasty_label: &'a str,
    pub author_label: &'a str,
    pub path: &'a str,
    pub line: usize,
    pub offset: usize,
    pub term: &'a str,
    pub snippet: String,
}

impl<'a> SearchReport<'a> {
    pub fn new(
        query: &'a str,
        variants: &'a [String],
        limit: usize,
        dedup: bool,
        matches: &'a [Match<'a>],
        context: usize,
    ) -> Self {
        let results: Vec<ReportRow<'a>> = matches
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                let work = &m.entry.work;
                let (date_not_before, date_not_after) = match m.entry.interval.bounds() {
                    Some((a, b)) => (Some(a), Some(b)),
                    None => (None, None),
                };
                ReportRow {
                    rank: idx + 1,
                    dates: m.entry.interval.to_string(),
                    date_not_before,
                    date_not_after,
                    work_id: &work.work_id,
                    title: &work.title,
                    dynasty_label: &work.dynasty_label,
                    author_label: &work.author_label,
                    path: &work.path,
                    line: m.line_no,
                    offset: m.offset,
                    term: &m.term,
                    snippet: render_snippet(&m.line, m.offset, &m.term, context),
                }
            })
            .collect();
        Self {
            query,
            variants,
            limit,
            dedup,
            result_count: results.len(),
            results,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "query: {}", self.query);
        let _ = writeln!(out, "variants: {}", self.variants.join(", "));
        let _ = writeln!(out, "limit: {}", self.limit);
        let _ = writeln!(out, "dedup: {}", if self.dedup { "on" } else { "off" });
        let _ = writeln!(out, "results: {}", self.result_count);
        out.push('\n');
        for row in &self.results {
            let _ = writeln!(
                out,
                "{}) {} | {} | {} | {} | {} | {}:{}",
                row.rank,
                row.dates,
                row.work_id,
                row.title,
                or_dash(row.dynasty_label),
                or_dash(row.author_label),
                row.path,
                row.line,
            );
            let _ = writeln!(out, "    {}", row.snippet);
        }
        out
    }
}

fn or_dash(label: &str) -> &str {
    if label.is_empty() { "-" } else { label }
}
