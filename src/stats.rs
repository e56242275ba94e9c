//! Catalog statistics and health overview.
//!
//! Summarizes what the current generation holds: songs per category, the
//! vocabulary size, tune mappings and sung records, plus any batch that failed
//! during the load. Used by `songbook stats` to confirm an export was picked
//! up as expected.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Generation;
use crate::ingest::BatchFailure;
use crate::models::SongCategory;

/// Per-category breakdown of catalog and vocabulary counts.
#[derive(Debug, Serialize)]
pub struct CategoryStats {
    pub category: SongCategory,
    pub songs: usize,
    pub in_vocabulary: usize,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub generation: u64,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub songs: usize,
    pub vocabulary: usize,
    pub tunes: usize,
    pub sung_records: usize,
    pub expired_sung_records: usize,
    pub skipped_rows: usize,
    pub categories: Vec<CategoryStats>,
    pub failures: Vec<BatchFailure>,
}

impl CatalogStats {
    pub fn collect(gen: &Generation) -> Self {
        let report = &gen.report;
        Self {
            generation: gen.id,
            source: report.source.clone(),
            loaded_at: gen.loaded_at,
            songs: gen.store.song_count(),
            vocabulary: gen.vocabulary.len(),
            tunes: gen.store.tune_count(),
            sung_records: gen.store.sung_record_count(),
            expired_sung_records: report.expired_sung_records,
            skipped_rows: report.skipped_song_rows
                + report.skipped_sung_records
                + report.skipped_tune_rows,
            categories: SongCategory::ALL
                .iter()
                .map(|&category| CategoryStats {
                    category,
                    songs: gen.store.count_by_category(category),
                    in_vocabulary: gen.vocabulary.count(category),
                })
                .collect(),
            failures: report.failures.clone(),
        }
    }
}

/// Run the stats command: summarize the generation and print it.
pub fn run_stats(gen: &Arc<Generation>, json: bool) -> Result<()> {
    let stats = CatalogStats::collect(gen);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Choir Songbook - Catalog Stats");
    println!("==============================");
    println!();
    println!("  Source:      {}", stats.source);
    println!(
        "  Generation:  {} (loaded {})",
        stats.generation,
        format_relative(stats.loaded_at, Utc::now())
    );
    println!();
    println!("  Songs:       {}", stats.songs);
    println!(
        "  Vocabulary:  {} / {} ({}%)",
        stats.vocabulary,
        stats.songs,
        if stats.songs > 0 {
            (stats.vocabulary * 100) / stats.songs
        } else {
            0
        }
    );
    println!("  Tunes:       {}", stats.tunes);
    println!("  Sung:        {}", stats.sung_records);
    if stats.expired_sung_records > 0 {
        println!("  Expired:     {}", stats.expired_sung_records);
    }
    if stats.skipped_rows > 0 {
        println!("  Skipped:     {}", stats.skipped_rows);
    }

    println!();
    println!("  By category:");
    println!("  {:<14} {:>6} {:>12}", "CATEGORY", "SONGS", "VOCABULARY");
    println!("  {}", "-".repeat(34));
    for c in &stats.categories {
        println!(
            "  {:<14} {:>6} {:>12}",
            c.category.plural(),
            c.songs,
            c.in_vocabulary
        );
    }

    if !stats.failures.is_empty() {
        println!();
        println!("  Failed batches (loaded as empty):");
        for f in &stats.failures {
            println!("  {:<14} {}", f.batch.to_string(), f.reason);
        }
    }

    println!();
    Ok(())
}

/// Format a timestamp relative to `now` (e.g. "3 hours ago").
fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - ts).num_seconds();

    if delta < 0 {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}
