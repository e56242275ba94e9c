//! Song data sources.
//!
//! A [`SongSource`] hands the ingestion adapter already-decoded rows. How the
//! rows were obtained (spreadsheet export, HTTP API, local files) is the
//! source's business; the adapter only sees strings.
//!
//! Built-in implementations:
//!
//! | Source | Purpose |
//! |--------|---------|
//! | [`MemorySource`] | Rows held in memory (tests, embedding callers) |
//! | [`JsonDirSource`](crate::connector_fs::JsonDirSource) | JSON exports in a local directory |

use std::collections::{HashMap, HashSet};
use std::fmt;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{SongCategory, SongRow, SungRow, TuneRow};

/// One independently fetched unit of source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    Songs(SongCategory),
    Sung,
    Tunes,
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Batch::Songs(category) => write!(f, "{} list", category.to_string().to_lowercase()),
            Batch::Sung => f.write_str("sung dates"),
            Batch::Tunes => f.write_str("tunes"),
        }
    }
}

/// Provider of raw song-list, sung-date and tune rows.
///
/// Each method fetches one batch. An error fails only that batch; the
/// generation being built treats it as empty.
#[async_trait]
pub trait SongSource: Send + Sync {
    /// Label used in logs and ingest reports.
    fn name(&self) -> &str;

    /// Rows of one category's song sheet.
    async fn song_rows(&self, category: SongCategory) -> Result<Vec<SongRow>>;

    /// Service records: a date and the codes sung that day.
    async fn sung_rows(&self) -> Result<Vec<SungRow>>;

    /// Hymn number to tune name rows.
    async fn tune_rows(&self) -> Result<Vec<TuneRow>>;
}

/// In-memory source. Any batch can be marked as failing.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    songs: HashMap<SongCategory, Vec<SongRow>>,
    sung: Vec<SungRow>,
    tunes: Vec<TuneRow>,
    failing: HashSet<Batch>,
}

impl MemorySource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_songs(mut self, category: SongCategory, rows: Vec<SongRow>) -> Self {
        self.songs.insert(category, rows);
        self
    }

    pub fn with_sung(mut self, rows: Vec<SungRow>) -> Self {
        self.sung = rows;
        self
    }

    pub fn with_tunes(mut self, rows: Vec<TuneRow>) -> Self {
        self.tunes = rows;
        self
    }

    /// Make fetching `batch` return an error.
    pub fn failing(mut self, batch: Batch) -> Self {
        self.failing.insert(batch);
        self
    }

    fn check(&self, batch: Batch) -> Result<()> {
        if self.failing.contains(&batch) {
            bail!("{} unavailable from {}", batch, self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl SongSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn song_rows(&self, category: SongCategory) -> Result<Vec<SongRow>> {
        self.check(Batch::Songs(category))?;
        Ok(self.songs.get(&category).cloned().unwrap_or_default())
    }

    async fn sung_rows(&self) -> Result<Vec<SungRow>> {
        self.check(Batch::Sung)?;
        Ok(self.sung.clone())
    }

    async fn tune_rows(&self) -> Result<Vec<TuneRow>> {
        self.check(Batch::Tunes)?;
        Ok(self.tunes.clone())
    }
}
