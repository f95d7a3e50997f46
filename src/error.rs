use std::path::PathBuf;

/// Setup-phase failures. Per-record and per-file problems never surface
/// here; they are skipped where they occur.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("books.csv not found in {}", .0.display())]
    ListingMissing(PathBuf),

    #[error("could not locate data directory (expected data/books.csv)")]
    DataDirNotFound,

    #[error("corpus directory {} does not exist", .0.display())]
    CorpusMissing(PathBuf),

    #[error("cannot run biographical exporter `{command}`: {source}")]
    Exporter {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("biographical export has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
