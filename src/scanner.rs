use std::collections::HashSet;
use std::path::Path;

use kratt_types::Work;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::catalog::parse_filename;
use crate::error::{Error, Result};

/// Scan the data directory and discover every corpus text.
///
/// Expected layout (any depth):
///   {root}/…/{KRxxNNNN} {title}-{dynasty}-{author}.txt
///
/// Files outside the filename grammar (catalog sources, notes, exports)
/// are skipped. Works come back sorted by work id, then relative path;
/// when a work id occurs twice the first path wins.
pub fn scan_corpus(root: &Path) -> Result<Vec<Work>> {
    if !root.is_dir() {
        return Err(Error::CorpusMissing(root.to_path_buf()));
    }

    let mut works = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(mut work) = parse_filename(&name) else {
            debug!(file = %name, "not a corpus file");
            continue;
        };
        let rel = path.strip_prefix(root).unwrap_or(path);
        work.path = rel.to_string_lossy().into_owned();
        works.push(work);
    }

    works.sort_by(|a, b| a.work_id.cmp(&b.work_id).then_with(|| a.path.cmp(&b.path)));

    let mut seen = HashSet::new();
    works.retain(|w| {
        let first = seen.insert(w.work_id.clone());
        if !first {
            warn!(
                work_id = %w.work_id,
                path = %w.path,
                "duplicate work id, keeping the first file"
            );
        }
        first
    });

    Ok(works)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_corpus_finds_nested_and_skips_others() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("KR3/KR3j")).unwrap();
        fs::create_dir_all(root.join("sources/KR-Catalog/KR")).unwrap();
        fs::write(root.join("KR3/KR3j/KR3j0160 世說新語-劉宋-劉義慶.txt"), "").unwrap();
        fs::write(root.join("KR1a0001 周易-周-姬昌.txt"), "").unwrap();
        fs::write(root.join("sources/KR-Catalog/KR/KR1.txt"), "").unwrap();
        fs::write(root.join("books.csv"), "").unwrap();
        fs::write(root.join("README.txt"), "").unwrap();

        let works = scan_corpus(root).unwrap();
        let ids: Vec<&str> = works.iter().map(|w| w.work_id.as_str()).collect();
        assert_eq!(ids, ["KR1a0001", "KR3j0160"]);
        let nested = Path::new("KR3").join("KR3j").join("KR3j0160 世說新語-劉宋-劉義慶.txt");
        assert_eq!(works[1].path, nested.to_string_lossy());
        assert_eq!(works[1].author_label, "劉義慶");
    }

    #[test]
    fn test_scan_corpus_duplicate_ids_keep_first_path() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/KR1a0001 周易.txt"), "").unwrap();
        fs::write(root.join("a/KR1a0001 周易.txt"), "").unwrap();
        let works = scan_corpus(root).unwrap();
        assert_eq!(works.len(), 1);
        assert!(works[0].path.starts_with('a'));
    }

    #[test]
    fn test_scan_corpus_missing_root() {
        let err = scan_corpus(Path::new("/nonexistent/corpus")).unwrap_err();
        assert!(matches!(err, Error::CorpusMissing(_)));
    }
}
