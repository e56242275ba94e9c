//! # Choir Songbook CLI (`songbook`)
//!
//! The `songbook` binary loads the configured song exports and answers
//! lookups against them, the same way a chat handler would.
//!
//! ## Usage
//!
//! ```bash
//! songbook --config ./config/songbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `songbook sources` | List the configured export files and whether they exist |
//! | `songbook stats` | Load the catalog and print counts per category |
//! | `songbook check <code>` | Catalog and vocabulary status of one exact code |
//! | `songbook resolve <text>` | Find the first code in free text and describe it |
//! | `songbook last <code>` | Every date a song was sung, most recent first |
//! | `songbook date <date>` | Songs sung on one date |
//! | `songbook tune <code>` | Tune mapped to a hymn |
//! | `songbook by-tune <name>` | Songs sung to a tune |
//! | `songbook vocabulary` | Current repertoire by category |
//! | `songbook search <text>` | Search titles and first lines |
//! | `songbook unused` | Repertoire songs not sung recently |
//!
//! Add `--json` to any lookup for machine-readable output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use choir_songbook::catalog::Catalog;
use choir_songbook::config::{self, Config};
use choir_songbook::connector_fs::JsonDirSource;
use choir_songbook::ingest::{parse_date, IngestOptions};
use choir_songbook::models::SongCategory;
use choir_songbook::query::{SongQuery, UnusedPeriod, DEFAULT_SEARCH_LIMIT};
use choir_songbook::{reply, sources, stats};

/// Choir Songbook CLI: song-code lookup over the choir's song exports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/songbook.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "songbook",
    about = "Choir Songbook: resolve song codes like H-27 against the choir's song lists",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/songbook.toml")]
    config: PathBuf,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List the configured export files and whether they exist.
    Sources,

    /// Load the catalog and print a summary.
    Stats,

    /// Check one exact song code against the catalog and the vocabulary.
    Check {
        /// Song code, e.g. `H-27`, `l5` or `C 12`.
        code: String,
    },

    /// Find the first song code in free text and describe the song.
    Resolve {
        /// Free text; words are joined with spaces.
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show every date a song was sung.
    Last { code: String },

    /// Show the songs sung on a date (`YYYY-MM-DD`, `DD-MM-YYYY` or `MM/DD/YYYY`).
    Date { date: String },

    /// Show the tune mapped to a song.
    Tune { code: String },

    /// List songs sung to a tune (case-insensitive).
    ByTune { name: String },

    /// Show the current repertoire.
    Vocabulary,

    /// Search song titles and first lines.
    Search {
        /// Search text; words are joined with spaces.
        #[arg(required = true)]
        query: Vec<String>,

        /// Restrict to one category (`hymn`, `lyric` or `convention`).
        #[arg(long)]
        category: Option<SongCategory>,

        /// Maximum number of results.
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// List repertoire songs not sung within a period.
    Unused {
        /// Restrict to one category (`hymn`, `lyric` or `convention`).
        #[arg(long)]
        category: Option<SongCategory>,

        /// `3months`, `6months`, `thisyear` or `1year`.
        #[arg(long, default_value = "3months")]
        period: UnusedPeriod,
    },
}

fn init_logging(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

/// JSON shape for a rejected code.
#[derive(Serialize)]
struct InvalidCode {
    outcome: &'static str,
    error: String,
}

fn invalid(err: impl ToString) -> InvalidCode {
    InvalidCode {
        outcome: "invalid",
        error: err.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_logging(&cfg);

    // Commands that don't load the catalog
    if let Commands::Sources = cli.command {
        return sources::list_sources(&cfg);
    }

    let source = JsonDirSource::from_config(&cfg);
    let today = Utc::now().date_naive();
    let options = IngestOptions {
        cutoff: cfg.vocabulary.window().cutoff(today),
    };
    debug!(cutoff = ?options.cutoff, "loading catalog");

    let catalog = Arc::new(Catalog::new());
    let generation = catalog.reload(&source, &options).await;
    let query = SongQuery::new(catalog);
    let json = cli.json;

    match cli.command {
        Commands::Sources => {}
        Commands::Stats => {
            stats::run_stats(&generation, json)?;
        }
        Commands::Check { code } => {
            let result = query.check_exact(&code);
            match &result {
                Ok(resolution) => emit(json, resolution, || reply::render_check(&result))?,
                Err(err) => emit(json, &invalid(err), || reply::render_check(&result))?,
            }
        }
        Commands::Resolve { text } => {
            let resolution = query.resolve(&text.join(" "));
            emit(json, &resolution, || reply::render_resolution(&resolution))?;
        }
        Commands::Last { code } => {
            let result = query.last_sung(&code);
            match &result {
                Ok(history) => emit(json, history, || reply::render_history(&result))?,
                Err(err) => emit(json, &invalid(err), || reply::render_history(&result))?,
            }
        }
        Commands::Date { date } => {
            let day = parse_date(&date)?;
            let entries = query.sung_on(day);
            emit(json, &entries, || reply::render_sung_on(day, &entries))?;
        }
        Commands::Tune { code } => {
            let result = query.tune_of(&code);
            match &result {
                Ok(info) => emit(json, info, || reply::render_tune(&result))?,
                Err(err) => emit(json, &invalid(err), || reply::render_tune(&result))?,
            }
        }
        Commands::ByTune { name } => {
            let songs = query.by_tune(&name);
            emit(json, &songs, || reply::render_by_tune(&name, &songs))?;
        }
        Commands::Vocabulary => {
            let summary = query.vocabulary_summary();
            emit(json, &summary, || {
                reply::render_vocabulary(&summary, cfg.vocabulary.retention_years)
            })?;
        }
        Commands::Search {
            query: words,
            category,
            limit,
        } => {
            let text = words.join(" ");
            let results = query.search(&text, category, limit);
            emit(json, &results, || reply::render_search(&text, &results))?;
        }
        Commands::Unused { category, period } => {
            let report = query.unused(category, period.cutoff(today));
            emit(json, &report, || reply::render_unused(&report, period.label()))?;
        }
    }

    Ok(())
}
