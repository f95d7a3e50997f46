//! Publication-date resolution cascade.
//!
//! Three sources, consulted strictly in order; the first that applies wins
//! and sources are never blended:
//!
//! 1. CBDB: lifespan or floruit of the author, if the name is unambiguous
//! 2. KR catalog: the best-scored dated person attached to the work
//! 3. the dynasty label in the filename
//!
//! [`DateResolver::resolve`] is a pure function of the work, its catalog
//! evidence and the two lookup tables.

use std::sync::LazyLock;

use kratt_types::{
    BiographicalPerson, Confidence, DateInterval, DateSource, DateType, PersonEvidence,
    ResolvedDate, Work,
};
use regex::Regex;

use crate::cbdb::BiographicalIndex;
use crate::dynasty::DynastyTable;

pub const CBDB_REF: &str = "CBDB_20240208_DATA2";
pub const KR_CATALOG_REF: &str = "KR-Catalog";

/// Roles that make a person responsible for the text itself.
pub const AUTHORIAL_FUNCTIONS: &[&str] = &[
    "撰", "著", "編", "纂", "輯", "譯", "注", "註", "疏", "述", "校", "校訂", "考", "考補", "解",
    "傳", "音義",
];

/// Author labels meaning "unknown author".
pub const UNKNOWN_AUTHOR_MARKERS: &[&str] = &[
    "佚名",
    "闕名",
    "不詳",
    "未知",
    "失名",
    "不著撰人",
    "作者不詳",
    "不知撰人",
];

// Half- and full-width parentheses: "趙岐 (注)", "鄭玄（注）"
static RE_PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[（(][^）)]*[）)]").unwrap());

/// Strip parenthetical annotations from an author label. Returns None for
/// blank labels and for unknown-author markers.
pub fn normalize_author_name(author_label: &str) -> Option<String> {
    let name = author_label.trim();
    if name.is_empty() {
        return None;
    }
    let name = RE_PAREN.replace_all(name, "");
    let name = name.trim();
    if name.is_empty() || UNKNOWN_AUTHOR_MARKERS.iter().any(|m| name.contains(m)) {
        return None;
    }
    Some(name.to_string())
}

// ── Tier 1: CBDB ─────────────────────────────────────────────────────

/// Exactly one candidate is used; zero or several means abstain.
pub fn choose_cbdb_person(candidates: &[BiographicalPerson]) -> Option<&BiographicalPerson> {
    match candidates {
        [only] => Some(only),
        _ => None,
    }
}

/// Lifespan if complete, else floruit if complete.
pub fn cbdb_date_range(person: &BiographicalPerson) -> Option<(DateInterval, DateType)> {
    if let (Some(birth), Some(death)) = (person.birth_year, person.death_year) {
        return Some((DateInterval::bounded(birth, death), DateType::AuthorLifespanBound));
    }
    if let (Some(earliest), Some(latest)) = (person.fl_earliest, person.fl_latest) {
        return Some((DateInterval::bounded(earliest, latest), DateType::FloruitBound));
    }
    None
}

// ── Tier 2: KR catalog ───────────────────────────────────────────────

/// +2 for both bounds, +1 for one bound, +1 for an authorial role.
pub fn evidence_score(evidence: &PersonEvidence) -> u8 {
    let bounds = match evidence.interval.bound_count() {
        2 => 2,
        1 => 1,
        _ => 0,
    };
    let role = AUTHORIAL_FUNCTIONS.contains(&evidence.function.as_str()) as u8;
    bounds + role
}

/// Highest score wins; the first of equal scores is kept.
pub fn choose_best_evidence(evidence: &[PersonEvidence]) -> Option<&PersonEvidence> {
    let mut best: Option<(&PersonEvidence, u8)> = None;
    for item in evidence {
        let score = evidence_score(item);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((item, score));
        }
    }
    best.map(|(item, _)| item)
}

// ── Cascade ──────────────────────────────────────────────────────────

pub struct DateResolver<'a> {
    people: &'a BiographicalIndex,
    dynasties: &'a DynastyTable,
}

impl<'a> DateResolver<'a> {
    pub fn new(people: &'a BiographicalIndex, dynasties: &'a DynastyTable) -> Self {
        Self { people, dynasties }
    }

    pub fn resolve(&self, work: &Work, evidence: &[PersonEvidence]) -> ResolvedDate {
        self.from_cbdb(work)
            .or_else(|| from_catalog(work, evidence))
            .unwrap_or_else(|| self.from_dynasty(work))
    }

    fn from_cbdb(&self, work: &Work) -> Option<ResolvedDate> {
        let name = normalize_author_name(&work.author_label)?;
        let person = choose_cbdb_person(self.people.candidates(&name))?;
        let (interval, date_type) = cbdb_date_range(person)?;
        Some(ResolvedDate {
            work_id: work.work_id.clone(),
            source: DateSource::Cbdb,
            interval,
            date_type,
            confidence: Confidence::Medium,
            note: format!("name={} id={}", person.name, person.person_id),
            reference: CBDB_REF.to_string(),
        })
    }

    fn from_dynasty(&self, work: &Work) -> ResolvedDate {
        let resolution = self.dynasties.resolve(&work.dynasty_label);
        ResolvedDate {
            work_id: work.work_id.clone(),
            source: DateSource::FilenameDynasty,
            interval: resolution.interval,
            date_type: DateType::DynastyBound,
            confidence: Confidence::Low,
            note: resolution.note,
            reference: String::new(),
        }
    }
}

fn from_catalog(work: &Work, evidence: &[PersonEvidence]) -> Option<ResolvedDate> {
    let best = choose_best_evidence(evidence)?;
    if best.interval.is_unknown() {
        return None;
    }
    let confidence = if best.interval.bounds().is_some() {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    Some(ResolvedDate {
        work_id: work.work_id.clone(),
        source: DateSource::KrCatalog,
        interval: best.interval,
        date_type: DateType::AuthorLifespanBound,
        confidence,
        note: format!(
            "person={} function={} dates={}",
            best.person_name, best.function, best.raw_dates
        ),
        reference: KR_CATALOG_REF.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: &str, dynasty: &str, author: &str) -> Work {
        Work {
            collection: id.chars().take(3).collect(),
            work_id: id.to_string(),
            title: "書".to_string(),
            dynasty_label: dynasty.to_string(),
            author_label: author.to_string(),
            filename: format!("{id} 書-{dynasty}-{author}.txt"),
            path: String::new(),
        }
    }

    fn person(id: &str, name: &str, years: [Option<i32>; 4]) -> BiographicalPerson {
        BiographicalPerson {
            person_id: id.to_string(),
            name: name.to_string(),
            birth_year: years[0],
            death_year: years[1],
            fl_earliest: years[2],
            fl_latest: years[3],
        }
    }

    fn evidence(name: &str, function: &str, interval: DateInterval) -> PersonEvidence {
        PersonEvidence {
            work_id: "KR1a0001".to_string(),
            person_name: name.to_string(),
            function: function.to_string(),
            dynasty_label: String::new(),
            raw_dates: "raw".to_string(),
            interval,
        }
    }

    fn index(people: Vec<BiographicalPerson>) -> BiographicalIndex {
        let mut index = BiographicalIndex::default();
        for p in people {
            index.insert(p);
        }
        index
    }

    // ── normalize_author_name ────────────────────────────────────────

    #[test]
    fn test_normalize_author_name() {
        assert_eq!(normalize_author_name(" 趙岐 (注) ").as_deref(), Some("趙岐"));
        assert_eq!(normalize_author_name("鄭玄（注）").as_deref(), Some("鄭玄"));
        assert_eq!(normalize_author_name(""), None);
        assert_eq!(normalize_author_name("（注）"), None);
        assert_eq!(normalize_author_name("佚名"), None);
        assert_eq!(normalize_author_name("不著撰人"), None);
        assert_eq!(normalize_author_name("某氏 不詳"), None);
    }

    // ── tier 1 ───────────────────────────────────────────────────────

    #[test]
    fn test_choose_cbdb_person_abstains_unless_unique() {
        let a = person("1", "王安", [Some(1), Some(2), None, None]);
        let b = person("2", "王安", [Some(3), Some(4), None, None]);
        assert!(choose_cbdb_person(&[]).is_none());
        assert_eq!(choose_cbdb_person(std::slice::from_ref(&a)), Some(&a));
        assert!(choose_cbdb_person(&[a, b]).is_none());
    }

    #[test]
    fn test_cbdb_date_range_preference() {
        let lifespan = person("1", "甲", [Some(1037), Some(1101), Some(1050), Some(1090)]);
        assert_eq!(
            cbdb_date_range(&lifespan),
            Some((DateInterval::bounded(1037, 1101), DateType::AuthorLifespanBound))
        );
        let floruit = person("2", "乙", [Some(1037), None, Some(1050), Some(1090)]);
        assert_eq!(
            cbdb_date_range(&floruit),
            Some((DateInterval::bounded(1050, 1090), DateType::FloruitBound))
        );
        let partial = person("3", "丙", [Some(1037), None, Some(1050), None]);
        assert_eq!(cbdb_date_range(&partial), None);
    }

    // ── tier 2 ───────────────────────────────────────────────────────

    #[test]
    fn test_evidence_scoring() {
        let strong = evidence("甲", "撰", DateInterval::bounded(1, 2));
        let weak = evidence("乙", "題", DateInterval::new(Some(1), None));
        assert_eq!(evidence_score(&strong), 3);
        assert_eq!(evidence_score(&weak), 1);
        let items = [weak.clone(), strong.clone()];
        assert_eq!(choose_best_evidence(&items), Some(&strong));
    }

    #[test]
    fn test_evidence_ties_keep_first() {
        let first = evidence("甲", "題", DateInterval::bounded(500, 600));
        let second = evidence("乙", "贈", DateInterval::bounded(100, 200));
        let third = evidence("丙", "注", DateInterval::new(None, Some(50)));
        let items = [first.clone(), second, third];
        assert_eq!(choose_best_evidence(&items), Some(&first));
        assert_eq!(choose_best_evidence(&[]), None);
    }

    // ── cascade ──────────────────────────────────────────────────────

    #[test]
    fn test_cbdb_wins_over_catalog() {
        let people = index(vec![person("3767", "蘇軾", [Some(1037), Some(1101), None, None])]);
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let w = work("KR4d0001", "北宋", "蘇軾");
        let ev = [evidence("蘇軾", "撰", DateInterval::bounded(1000, 1100))];

        let date = resolver.resolve(&w, &ev);
        assert_eq!(date.source, DateSource::Cbdb);
        assert_eq!(date.interval, DateInterval::bounded(1037, 1101));
        assert_eq!(date.date_type, DateType::AuthorLifespanBound);
        assert_eq!(date.confidence, Confidence::Medium);
        assert_eq!(date.note, "name=蘇軾 id=3767");
        assert_eq!(date.reference, CBDB_REF);
    }

    #[test]
    fn test_ambiguous_cbdb_falls_to_catalog() {
        let people = index(vec![
            person("1", "王安", [Some(1021), Some(1086), None, None]),
            person("2", "王安", [Some(1200), Some(1260), None, None]),
        ]);
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let w = work("KR4d0002", "北宋", "王安");
        let ev = [evidence("王安", "撰", DateInterval::new(Some(1021), None))];

        let date = resolver.resolve(&w, &ev);
        assert_eq!(date.source, DateSource::KrCatalog);
        assert_eq!(date.interval, DateInterval::new(Some(1021), None));
        assert_eq!(date.confidence, Confidence::Low);
        assert_eq!(date.note, "person=王安 function=撰 dates=raw");
        assert_eq!(date.reference, KR_CATALOG_REF);
    }

    #[test]
    fn test_incomplete_cbdb_person_falls_through() {
        let people = index(vec![person("1", "甲", [Some(100), None, None, Some(150)])]);
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let date = resolver.resolve(&work("KR1a0001", "東漢", "甲"), &[]);
        assert_eq!(date.source, DateSource::FilenameDynasty);
        assert_eq!(date.interval, DateInterval::bounded(25, 220));
    }

    #[test]
    fn test_unknown_author_skips_cbdb() {
        let people = index(vec![person("1", "佚名", [Some(1), Some(2), None, None])]);
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let date = resolver.resolve(&work("KR1a0001", "唐", "佚名"), &[]);
        assert_eq!(date.source, DateSource::FilenameDynasty);
        assert_eq!(date.note, "dynasty_label=唐");
    }

    #[test]
    fn test_alias_fallback_end_to_end() {
        let people = BiographicalIndex::default();
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let aliased = resolver.resolve(&work("KR2a0001", "前漢", ""), &[]);
        let direct = resolver.resolve(&work("KR2a0002", "西漢", ""), &[]);
        assert_eq!(aliased.interval, direct.interval);
        assert_eq!(aliased.source, DateSource::FilenameDynasty);
        assert_eq!(aliased.confidence, Confidence::Low);
        assert_eq!(aliased.date_type, DateType::DynastyBound);
        assert!(aliased.note.contains("前漢") && aliased.note.contains("西漢"));
        assert!(aliased.reference.is_empty());
    }

    #[test]
    fn test_everything_fails() {
        let people = BiographicalIndex::default();
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let missing = resolver.resolve(&work("KR9a0001", "", ""), &[]);
        assert_eq!(missing.source, DateSource::FilenameDynasty);
        assert!(missing.interval.is_unknown());
        assert_eq!(missing.note, "missing dynasty label");

        let unmapped = resolver.resolve(&work("KR9a0002", "大和", ""), &[]);
        assert_eq!(unmapped.note, "unmapped dynasty label=大和");
    }

    #[test]
    fn test_inverted_catalog_interval_passes_through() {
        let people = BiographicalIndex::default();
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let ev = [evidence("甲", "撰", DateInterval::bounded(1200, 1100))];
        let date = resolver.resolve(&work("KR1a0001", "宋", "甲"), &ev);
        assert_eq!(date.interval, DateInterval::bounded(1200, 1100));
        assert_eq!(date.confidence, Confidence::Medium);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let people = index(vec![person("1", "甲", [None, None, Some(700), Some(750)])]);
        let dynasties = DynastyTable::builtin();
        let resolver = DateResolver::new(&people, &dynasties);
        let w = work("KR1a0001", "唐", "甲 (撰)");
        let ev = [evidence("乙", "注", DateInterval::bounded(800, 850))];
        let first = resolver.resolve(&w, &ev);
        let second = resolver.resolve(&w, &ev);
        assert_eq!(first, second);
        assert_eq!(first.date_type, DateType::FloruitBound);
    }
}
