//! Biographical lookup against a CBDB export.
//!
//! The database ships as an Access `.mdb` file. `mdb-export` dumps the
//! `ZZZ_BIOG_MAIN` table as CSV; the rows are read once, filtered down to
//! the author names that occur in the corpus, and kept in memory.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use kratt_types::BiographicalPerson;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub const BIOG_TABLE: &str = "ZZZ_BIOG_MAIN";
pub const DEFAULT_EXPORTER: &str = "mdb-export";
const FALLBACK_EXPORTER: &str = "/usr/local/bin/mdb-export";

const COL_NAME: &str = "c_name_chn";
const COL_PERSON_ID: &str = "c_personid";
const COL_BIRTH: &str = "c_birthyear";
const COL_DEATH: &str = "c_deathyear";
const COL_FL_EARLIEST: &str = "c_fl_earliest_year";
const COL_FL_LATEST: &str = "c_fl_latest_year";

/// Year columns use 0 and blank for "not recorded".
pub fn parse_year(value: &str) -> Option<i32> {
    match value.trim().parse::<i32>() {
        Ok(0) | Err(_) => None,
        Ok(year) => Some(year),
    }
}

/// All biographical rows for one name. Names are not identifiers, so a
/// name may map to several people.
#[derive(Debug, Clone, Default)]
pub struct BiographicalIndex {
    by_name: HashMap<String, Vec<BiographicalPerson>>,
}

impl BiographicalIndex {
    pub fn candidates(&self, name: &str) -> &[BiographicalPerson] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn insert(&mut self, person: BiographicalPerson) {
        self.by_name.entry(person.name.clone()).or_default().push(person);
    }

    pub fn people(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Read CSV export rows, keeping only `wanted` names with at least one year.
    /// Undecodable bytes are replaced; short or unreadable rows are skipped.
    pub fn from_csv<R: Read>(reader: R, wanted: &HashSet<String>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.byte_headers()?.clone();
        if headers.is_empty() {
            return Ok(Self::default());
        }
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| String::from_utf8_lossy(h).trim() == name)
                .ok_or(Error::MissingColumn(name))
        };
        let idx_name = column(COL_NAME)?;
        let idx_person = column(COL_PERSON_ID)?;
        let idx_birth = column(COL_BIRTH)?;
        let idx_death = column(COL_DEATH)?;
        let idx_fl_earliest = column(COL_FL_EARLIEST)?;
        let idx_fl_latest = column(COL_FL_LATEST)?;

        let mut index = Self::default();
        let mut record = csv::ByteRecord::new();
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => {
                    warn!(error = %e, "biographical export interrupted");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "skipping unreadable export row");
                    continue;
                }
            }
            let field = |idx: usize| {
                record
                    .get(idx)
                    .map(|b| String::from_utf8_lossy(b).trim().to_string())
                    .unwrap_or_default()
            };
            let name = field(idx_name);
            if name.is_empty() || !wanted.contains(&name) {
                continue;
            }
            let person = BiographicalPerson {
                person_id: field(idx_person),
                birth_year: parse_year(&field(idx_birth)),
                death_year: parse_year(&field(idx_death)),
                fl_earliest: parse_year(&field(idx_fl_earliest)),
                fl_latest: parse_year(&field(idx_fl_latest)),
                name,
            };
            let has_any_year = person.birth_year.is_some()
                || person.death_year.is_some()
                || person.fl_earliest.is_some()
                || person.fl_latest.is_some();
            if has_any_year {
                index.insert(person);
            }
        }
        Ok(index)
    }

    /// Run the exporter against `mdb_path`. A missing database or an empty
    /// name set yields an empty index without spawning anything.
    pub fn export(
        mdb_path: &Path,
        wanted: &HashSet<String>,
        exporter: Option<&Path>,
    ) -> Result<Self> {
        if !mdb_path.exists() {
            warn!(
                path = %mdb_path.display(),
                "CBDB database missing, skipping biographical lookup"
            );
            return Ok(Self::default());
        }
        if wanted.is_empty() {
            return Ok(Self::default());
        }
        let exporter = exporter.map(Path::to_path_buf).unwrap_or_else(default_exporter);
        let command = exporter.display().to_string();
        info!(
            exporter = %command,
            db = %mdb_path.display(),
            table = BIOG_TABLE,
            "exporting biographical table"
        );

        let mut child = Command::new(&exporter)
            .arg(mdb_path)
            .arg(BIOG_TABLE)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Exporter {
                command: command.clone(),
                source,
            })?;
        let Some(stdout) = child.stdout.take() else {
            return Err(Error::Exporter {
                command,
                source: std::io::Error::other("no stdout"),
            });
        };
        let parsed = Self::from_csv(stdout, wanted);
        let status = child.wait().map_err(|source| Error::Exporter {
            command: command.clone(),
            source,
        })?;
        if !status.success() {
            warn!(exporter = %command, %status, "exporter exited unsuccessfully");
        }
        let index = parsed?;
        info!(names = index.by_name.len(), people = index.people(), "loaded CBDB people");
        Ok(index)
    }
}

/// `mdb-export` from PATH, else the usual install location.
fn default_exporter() -> PathBuf {
    let on_path = std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(DEFAULT_EXPORTER))
            .find(|candidate| candidate.is_file())
    });
    on_path.unwrap_or_else(|| PathBuf::from(FALLBACK_EXPORTER))
}
