use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kratt.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub variants: VariantsConfig,
}

/// Data locations. Unset entries fall back to the layout under `data_dir`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PathsConfig {
    pub data_dir: Option<PathBuf>,
    pub books_csv: Option<PathBuf>,
    pub date_ranges_csv: Option<PathBuf>,
    pub dynasty_ranges: Option<PathBuf>,
    pub kr_catalog_dir: Option<PathBuf>,
    pub cbdb_mdb: Option<PathBuf>,
    pub mdb_export: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_context")]
    pub context: usize,
    #[serde(default = "default_dedup")]
    pub dedup: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            context: default_context(),
            dedup: default_dedup(),
        }
    }
}

fn default_limit() -> usize {
    10
}
fn default_context() -> usize {
    30
}
fn default_dedup() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VariantsConfig {
    /// Tab-separated `simplified<TAB>traditional` pairs added to the built-in table
    pub table: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }

    Ok(config)
}

/// An explicit path must exist; otherwise `kratt.toml` is read if present.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                load_config(path)
            } else {
                Ok(Config::default())
            }
        }
    }
}
