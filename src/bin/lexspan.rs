//! Lexspan CLI: annotate text, migrate stored logs, export records.
//!
//! Usage:
//!   lexspan annotate <text-file> --patterns <json> [--sentiment s] [--save] [--db path]
//!   lexspan migrate <dir> [--dry-run]
//!   lexspan export <log.json> --format text|csv|json [--batch-dir dir] [--batch-size n]

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use lexspan::export::{render, write_batches, BatchOptions, ExportFormat, LexicalLog};
use lexspan::migrate::{migrate_directory, MigrationError, MigrationOptions};
use lexspan::span::filter_by_sentiment;
use lexspan::{AnnotationSession, EngineConfig, FlatDocument, LexicalPattern, OpenStore, Segment, SqliteStore};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "lexspan", version, about = "Lexical span annotation engine")]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark pattern matches in a text file
    Annotate {
        /// Plain text; paragraphs separated by blank lines
        file: PathBuf,
        /// JSON array of patterns (objects or bare phrases)
        #[arg(long)]
        patterns: PathBuf,
        /// Only use patterns with this sentiment
        #[arg(long)]
        sentiment: Option<String>,
        /// Store a record for every match
        #[arg(long)]
        save: bool,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Rewrite every stored log under a directory in canonical shape
    Migrate {
        dir: PathBuf,
        /// Report without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Export the records of a log file
    Export {
        log: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Also write batched log files into this directory
        #[arg(long)]
        batch_dir: Option<PathBuf>,
        /// Records per batch file (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ExportFormat::Text,
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

/// Get the default database path (~/.local/share/lexspan/records.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("lexspan").join("records.db")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Patterns file: an array of pattern objects, or of bare phrases.
fn read_patterns(path: &Path) -> Result<Vec<LexicalPattern>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e))?;
    let Value::Array(items) = value else {
        return Err(format!("'{}' must hold a JSON array", path.display()));
    };

    let mut patterns = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let pattern = match item {
            Value::String(phrase) => LexicalPattern::new(format!("pattern-{index}"), phrase),
            other => serde_json::from_value(other).map_err(|e| format!("pattern {}: {}", index, e))?,
        };
        patterns.push(pattern);
    }
    Ok(patterns)
}

fn render_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment.as_match() {
            Some(span) => format!("[[{}]]", span.text),
            None => segment.text().to_string(),
        })
        .collect()
}

fn cmd_annotate(
    config: EngineConfig,
    file: &Path,
    patterns: &Path,
    sentiment: Option<&str>,
    save: bool,
    db: Option<PathBuf>,
) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let patterns = match read_patterns(patterns) {
        Ok(patterns) => filter_by_sentiment(&patterns, sentiment),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let document = FlatDocument::from_plain_text(&text);
    let now = Utc::now();
    let session = if save {
        let db_path = db.unwrap_or_else(default_db_path);
        let store = match SqliteStore::open(&db_path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Error: failed to open database: {}", e);
                return 1;
            }
        };
        AnnotationSession::open(document, config, Arc::new(store), now)
    } else {
        Ok(AnnotationSession::new(document, config))
    };
    let mut session = match session {
        Ok(session) => session.with_patterns(&patterns),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rendered: Vec<String> = (0..session.document().paragraph_count())
        .map(|index| render_segments(&session.annotate_paragraph(index)))
        .collect();
    println!("{}", rendered.join("\n\n"));

    if save {
        match session.auto_annotate(now) {
            Ok(created) => eprintln!("Saved {} new records ({} total)", created.len(), session.records().len()),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    0
}

fn cmd_migrate(dir: &Path, dry_run: bool) -> i32 {
    let options = MigrationOptions::new(Utc::now()).dry_run(dry_run);
    match migrate_directory(dir, &options) {
        Ok(report) => {
            for outcome in &report.migrated {
                println!(
                    "{}  {:?}  {} -> {}",
                    outcome.path.display(),
                    outcome.migration_type,
                    outcome.original_count,
                    outcome.migrated_count
                );
            }
            for failure in &report.failures {
                eprintln!("Failed: {}: {}", failure.path.display(), failure.error);
            }
            println!("{}", report.summary());
            0
        }
        Err(e @ MigrationError::RootMissing(_)) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(
    config: &EngineConfig,
    log: &Path,
    format: Format,
    batch_dir: Option<&Path>,
    batch_size: Option<usize>,
) -> i32 {
    let log_doc = match LexicalLog::read(log, 0) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match render(format.into(), &log_doc.lexical_items) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if let Some(dir) = batch_dir {
        let stem = log
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        let mut options = BatchOptions::new(stem)
            .with_batch_size(batch_size.unwrap_or(config.batch_size))
            .with_master(config.include_master);
        if !log_doc.log_title.is_empty() {
            options.log_title = log_doc.log_title.clone();
        }
        if !log_doc.source_id.is_empty() {
            options.source_id = log_doc.source_id.clone();
        }
        match write_batches(dir, &log_doc.lexical_items, &options) {
            Ok(paths) => eprintln!("Wrote {} files to {}", paths.len(), dir.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match EngineConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Annotate {
            file,
            patterns,
            sentiment,
            save,
            db,
        } => cmd_annotate(config, &file, &patterns, sentiment.as_deref(), save, db),
        Commands::Migrate { dir, dry_run } => cmd_migrate(&dir, dry_run),
        Commands::Export {
            log,
            format,
            batch_dir,
            batch_size,
        } => cmd_export(&config, &log, format, batch_dir.as_deref(), batch_size),
    };
    std::process::exit(code);
}
