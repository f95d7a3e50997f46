//! Person evidence from the KR catalog snapshot.
//!
//! Catalog files are org-style outlines:
//!
//! ```text
//! *** KR1h0004 孟子注疏
//! **** 人物
//! ***** 趙岐
//!  :FUNCTION: 注
//!  :DYNASTY: 東漢
//!  :DATES: 108-201
//! **** 版本
//! ```
//!
//! Parsing is a small automaton ([`ParserState`]). Every transition that
//! leaves a person behind flushes it; a flushed person becomes a
//! [`PersonEvidence`] only when it has a work, a `DATES` value, and at
//! least one parseable year.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

use kratt_types::{DateInterval, PersonEvidence};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::text::LossyLines;

static RE_WORK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\*\s+(KR\d[a-z]\d{4})\b").unwrap());
static RE_PEOPLE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\*\*\s+人物\b").unwrap());
static RE_HEADING4: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*\*\*\*\s+").unwrap());
static RE_PERSON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*\*\*\*\*\s+(.+)$").unwrap());
static RE_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([A-Z_]+):\s*(.*)$").unwrap());

// Unicode `\d`: catalog transcriptions sometimes use full-width digits.
static RE_DATE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d{1,4}").unwrap());

// ── Date text ────────────────────────────────────────────────────────

/// Parse a catalog `DATES` value.
///
/// - two or more numbers: first two are the bounds ("-145 -86")
/// - `d. 1200`: upper bound only
/// - `b. 1200`: lower bound only
/// - `fl. 1200` or a bare number: the same year on both bounds
///
/// Every hyphen directly before a number is read as a sign, so "108-201"
/// yields the inverted pair (108, -201). Such pairs are kept as they are.
pub fn parse_dates(raw: &str) -> DateInterval {
    let numbers: Vec<i32> = RE_DATE_NUMBER
        .find_iter(raw)
        .filter_map(|m| ascii_digits(m.as_str()).parse().ok())
        .collect();

    match numbers.as_slice() {
        [] => DateInterval::UNKNOWN,
        [first, second, ..] => DateInterval::bounded(*first, *second),
        [value] => {
            let normalized = raw.trim().to_lowercase();
            if normalized.starts_with("d.") || normalized.starts_with("d ") {
                DateInterval::new(None, Some(*value))
            } else if normalized.starts_with("b.") || normalized.starts_with("b ") {
                DateInterval::new(Some(*value), None)
            } else {
                DateInterval::bounded(*value, *value)
            }
        }
    }
}

/// Fold full-width digits (０-９) to ASCII. Other scripts are left alone
/// and fail to parse.
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            other => other,
        })
        .collect()
}

// ── Line classification ──────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    /// `*** KR1a0001 …`
    Work(&'a str),
    /// `**** 人物`
    PeopleSection,
    /// any other `**** …` heading
    Heading4,
    /// `***** name`
    Person(&'a str),
    /// `:KEY: value`
    Property(&'a str, &'a str),
    Other,
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(caps) = RE_WORK.captures(line) {
        if let Some(id) = caps.get(1) {
            return LineKind::Work(id.as_str());
        }
    }
    if RE_PEOPLE_SECTION.is_match(line) {
        return LineKind::PeopleSection;
    }
    if RE_HEADING4.is_match(line) {
        return LineKind::Heading4;
    }
    if let Some(caps) = RE_PERSON.captures(line) {
        if let Some(name) = caps.get(1) {
            return LineKind::Person(name.as_str().trim());
        }
    }
    if let Some(caps) = RE_PROPERTY.captures(line) {
        if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
            return LineKind::Property(key.as_str(), value.as_str().trim());
        }
    }
    LineKind::Other
}

// ── Automaton ────────────────────────────────────────────────────────

/// A person whose properties are still being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPerson {
    pub name: String,
    pub props: HashMap<String, String>,
}

impl PendingPerson {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            props: HashMap::new(),
        }
    }

    fn prop(&self, key: &str) -> &str {
        self.props.get(key).map(|v| v.trim()).unwrap_or_default()
    }

    /// Turn the pending person into evidence for `work_id`, if it carries dates.
    fn into_evidence(self, work_id: &str) -> Option<PersonEvidence> {
        let raw_dates = self.prop("DATES");
        if raw_dates.is_empty() {
            return None;
        }
        let interval = parse_dates(raw_dates);
        if interval.is_unknown() {
            debug!(work_id, person = %self.name, raw_dates, "unparseable person dates");
            return None;
        }
        Some(PersonEvidence {
            work_id: work_id.to_string(),
            person_name: self.name.clone(),
            function: self.prop("FUNCTION").to_string(),
            dynasty_label: self.prop("DYNASTY").to_string(),
            raw_dates: raw_dates.to_string(),
            interval,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    OutsideWork,
    InWork {
        work_id: String,
    },
    InPeople {
        work_id: String,
    },
    InPerson {
        work_id: String,
        person: PendingPerson,
    },
}

impl ParserState {
    /// Leave the current state: the enclosing work id, and the pending
    /// person (if any) flushed into evidence.
    fn exit(self) -> (Option<String>, Option<PersonEvidence>) {
        match self {
            Self::OutsideWork => (None, None),
            Self::InWork { work_id } | Self::InPeople { work_id } => (Some(work_id), None),
            Self::InPerson { work_id, person } => {
                let evidence = person.into_evidence(&work_id);
                (Some(work_id), evidence)
            }
        }
    }

    fn transition(self, line: LineKind<'_>) -> (Self, Option<PersonEvidence>) {
        match line {
            LineKind::Work(id) => {
                let (_, flushed) = self.exit();
                (
                    Self::InWork {
                        work_id: id.to_string(),
                    },
                    flushed,
                )
            }
            LineKind::PeopleSection => {
                let (work_id, flushed) = self.exit();
                let next = match work_id {
                    Some(work_id) => Self::InPeople { work_id },
                    // people listed before any work marker can never be attributed
                    None => Self::OutsideWork,
                };
                (next, flushed)
            }
            LineKind::Heading4 => match self {
                Self::InPeople { .. } | Self::InPerson { .. } => {
                    let (work_id, flushed) = self.exit();
                    let next = work_id
                        .map(|work_id| Self::InWork { work_id })
                        .unwrap_or_default();
                    (next, flushed)
                }
                other => (other, None),
            },
            LineKind::Person(name) => match self {
                Self::InPeople { .. } | Self::InPerson { .. } => {
                    let (work_id, flushed) = self.exit();
                    let next = match work_id {
                        Some(work_id) => Self::InPerson {
                            work_id,
                            person: PendingPerson::new(name),
                        },
                        None => Self::OutsideWork,
                    };
                    (next, flushed)
                }
                other => (other, None),
            },
            LineKind::Property(key, value) => match self {
                Self::InPerson {
                    work_id,
                    mut person,
                } => {
                    person.props.insert(key.to_string(), value.to_string());
                    (Self::InPerson { work_id, person }, None)
                }
                other => (other, None),
            },
            LineKind::Other => (self, None),
        }
    }
}

/// Feeds catalog lines through [`ParserState`].
#[derive(Debug, Default)]
pub struct CatalogParser {
    state: ParserState,
}

impl CatalogParser {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Consume one line; returns the evidence flushed by this transition.
    pub fn feed(&mut self, line: &str) -> Option<PersonEvidence> {
        let state = std::mem::take(&mut self.state);
        let (next, flushed) = state.transition(classify(line));
        self.state = next;
        flushed
    }

    /// End of input flushes whatever person is pending.
    pub fn finish(self) -> Option<PersonEvidence> {
        self.state.exit().1
    }
}

/// Parse a whole catalog text, grouping evidence by work id in file order.
pub fn parse_catalog_lines<I, S>(
    lines: I,
    evidence_by_work: &mut HashMap<String, Vec<PersonEvidence>>,
) where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = CatalogParser::new();
    let mut push = |ev: PersonEvidence| {
        evidence_by_work.entry(ev.work_id.clone()).or_default().push(ev);
    };
    for line in lines {
        if let Some(ev) = parser.feed(line.as_ref()) {
            push(ev);
        }
    }
    if let Some(ev) = parser.finish() {
        push(ev);
    }
}

/// Read every `KR/KR*.txt` file under the catalog checkout. A missing
/// checkout yields no evidence; unreadable files are skipped.
pub fn load_kr_catalog(kr_catalog_dir: &Path) -> HashMap<String, Vec<PersonEvidence>> {
    let mut evidence_by_work = HashMap::new();
    let kr_dir = kr_catalog_dir.join("KR");
    let entries = match std::fs::read_dir(&kr_dir) {
        Ok(entries) => entries,
        Err(_) => {
            info!(path = %kr_dir.display(), "no KR catalog, skipping catalog evidence");
            return evidence_by_work;
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("KR") && n.ends_with(".txt"))
        })
        .collect();
    files.sort();

    for path in &files {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open catalog file");
                continue;
            }
        };
        let lines = LossyLines::new(BufReader::new(file)).map_while(|line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog read interrupted");
                None
            }
        });
        parse_catalog_lines(lines, &mut evidence_by_work);
    }

    let total: usize = evidence_by_work.values().map(Vec::len).sum();
    info!(
        files = files.len(),
        works = evidence_by_work.len(),
        persons = total,
        "parsed KR catalog"
    );
    evidence_by_work
}
