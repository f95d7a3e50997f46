mod catalog;
mod cbdb;
mod config;
mod dynasty;
mod error;
mod evidence;
mod order;
mod report;
mod resolver;
mod scanner;
mod search;
mod snippet;
mod text;
mod variants;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog::{BOOKS_CSV, Catalog, DATE_RANGES_CSV};
use cbdb::BiographicalIndex;
use config::Config;
use dynasty::DynastyTable;
use report::SearchReport;
use resolver::{DateResolver, normalize_author_name};
use search::SearchOptions;
use variants::{CharTable, expand_variants};

const DEFAULT_DATA_DIR: &str = "data";
const KR_CATALOG_SUBDIR: &str = "sources/KR-Catalog";

#[derive(Parser)]
#[command(
    name = "kratt",
    version,
    about = "Earliest attestations in a dated classical-text corpus"
)]
struct Cli {
    /// TOML config file (default: ./kratt.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index the corpus → books.csv + publication_date_range.csv
    Scan(ScanArgs),
    /// Find the earliest occurrences of a term
    Search(SearchArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Root data directory holding the corpus
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Output work listing (default: <data-dir>/books.csv)
    #[arg(long)]
    books_csv: Option<PathBuf>,
    /// Output date table (default: <data-dir>/publication_date_range.csv)
    #[arg(long)]
    date_ranges_csv: Option<PathBuf>,
    /// CSV overriding the built-in dynasty ranges
    #[arg(long)]
    dynasty_ranges: Option<PathBuf>,
    /// KR-Catalog checkout (default: <data-dir>/sources/KR-Catalog)
    #[arg(long)]
    kr_catalog_dir: Option<PathBuf>,
    /// CBDB .mdb for author lifespans
    #[arg(long)]
    cbdb_mdb: Option<PathBuf>,
    /// mdb-export binary
    #[arg(long)]
    mdb_export: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    /// Query term
    #[arg(value_parser = parse_term)]
    term: String,
    /// Maximum number of results [default: 10]
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,
    /// Characters of context around each match [default: 30]
    #[arg(long)]
    context: Option<usize>,
    /// Data directory (default: auto-detect)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Show only the first hit per work (default)
    #[arg(long, overrides_with = "no_dedup")]
    dedup: bool,
    /// Show every hit per work
    #[arg(long, overrides_with = "dedup")]
    no_dedup: bool,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn parse_term(raw: &str) -> Result<String, String> {
    let term = raw.trim();
    if term.is_empty() {
        return Err("term must be non-empty".to_string());
    }
    Ok(term.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let outcome =
        config::load_or_default(cli.config.as_deref()).and_then(|config| match &cli.command {
            Command::Scan(args) => run_scan(args, &config).map(|()| ExitCode::SUCCESS),
            Command::Search(args) => run_search(args, &config),
        });

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

// ── Scan ─────────────────────────────────────────────────────────────

fn run_scan(args: &ScanArgs, config: &Config) -> Result<()> {
    let paths = &config.paths;
    let data_dir =
        pick(&args.data_dir, &paths.data_dir).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let books_csv =
        pick(&args.books_csv, &paths.books_csv).unwrap_or_else(|| data_dir.join(BOOKS_CSV));
    let date_ranges_csv = pick(&args.date_ranges_csv, &paths.date_ranges_csv)
        .unwrap_or_else(|| data_dir.join(DATE_RANGES_CSV));
    let kr_catalog_dir = pick(&args.kr_catalog_dir, &paths.kr_catalog_dir)
        .unwrap_or_else(|| data_dir.join(KR_CATALOG_SUBDIR));
    let dynasty_ranges = pick(&args.dynasty_ranges, &paths.dynasty_ranges);
    let cbdb_mdb = pick(&args.cbdb_mdb, &paths.cbdb_mdb);
    let mdb_export = pick(&args.mdb_export, &paths.mdb_export);

    let works = scanner::scan_corpus(&data_dir)?;
    info!(works = works.len(), root = %data_dir.display(), "discovered corpus");

    let dynasties = DynastyTable::load(dynasty_ranges.as_deref());
    info!(labels = dynasties.len(), "dynasty table ready");
    let evidence = evidence::load_kr_catalog(&kr_catalog_dir);

    let people = match &cbdb_mdb {
        Some(mdb) => {
            let wanted: HashSet<String> = works
                .iter()
                .filter_map(|w| normalize_author_name(&w.author_label))
                .collect();
            BiographicalIndex::export(mdb, &wanted, mdb_export.as_deref())
                .with_context(|| format!("loading biographical data from {}", mdb.display()))?
        }
        None => BiographicalIndex::default(),
    };

    // every input is loaded before the first file is written
    catalog::write_books_csv(&books_csv, &works)?;
    let resolver = DateResolver::new(&people, &dynasties);
    let resolved: Vec<_> = works
        .iter()
        .map(|work| {
            let work_evidence = evidence
                .get(&work.work_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            resolver.resolve(work, work_evidence)
        })
        .collect();
    catalog::write_date_ranges_csv(&date_ranges_csv, &resolved)?;
    Ok(())
}

/// Command-line value, else config value.
fn pick(flag: &Option<PathBuf>, configured: &Option<PathBuf>) -> Option<PathBuf> {
    flag.clone().or_else(|| configured.clone())
}

// ── Search ───────────────────────────────────────────────────────────

fn run_search(args: &SearchArgs, config: &Config) -> Result<ExitCode> {
    let limit = args
        .limit
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(config.search.limit);
    let context = args.context.unwrap_or(config.search.context);
    let dedup = if args.no_dedup {
        false
    } else if args.dedup {
        true
    } else {
        config.search.dedup
    };

    let data_dir =
        catalog::resolve_data_dir(args.data_dir.as_deref(), config.paths.data_dir.as_deref())?;
    let catalog = Catalog::load(&data_dir)?;
    info!(works = catalog.len(), data_dir = %data_dir.display(), "loaded catalog");

    let converter = load_converter(config.variants.table.as_deref())?;
    let variants = expand_variants(&args.term, &converter);
    let matches = search::search(&catalog, &variants, SearchOptions { limit, dedup });

    let report = SearchReport::new(&args.term, &variants, limit, dedup, &matches, context);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(if matches.is_empty() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn load_converter(extra: Option<&Path>) -> Result<CharTable> {
    let mut table = CharTable::builtin();
    if let Some(path) = extra {
        table
            .extend_from_file(path)
            .with_context(|| format!("loading variant table {}", path.display()))?;
    }
    debug!(pairs = table.len(), "variant table ready");
    Ok(table)
}
