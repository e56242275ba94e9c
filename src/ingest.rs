//! Ingestion adapter.
//!
//! Converts raw rows from a [`SongSource`] into a finished [`SongStore`]:
//!
//! ```text
//! song sheets ─┐
//! sung dates ──┼─▶ normalize cells ─▶ load / ingest ─▶ normalize() ─▶ build_index()
//! tune sheet ──┘
//! ```
//!
//! A batch that fails to fetch is treated as empty for this generation and
//! recorded in the [`IngestReport`]; it never aborts the build.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::code::{self, extract_first};
use crate::models::{SongCategory, SungRow, TuneRow};
use crate::source::{Batch, SongSource};
use crate::store::SongStore;

/// Cell values spreadsheet exports use for "nothing here".
const EMPTY_SENTINELS: [&str; 4] = ["nan", "nat", "none", "null"];

/// Date layouts accepted from sung-date sheets, tried in order.
const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty or placeholder date")]
    Sentinel,
    #[error("unrecognized date: '{0}'")]
    Unrecognized(String),
}

/// Parse a sung-date cell.
///
/// Accepts `DD-MM-YYYY`, `YYYY-MM-DD` and `MM/DD/YYYY`. A trailing time of
/// day (`2024-01-07 00:00:00`) is ignored.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateError> {
    let trimmed = text.trim();
    if is_empty_cell(trimmed) {
        return Err(DateError::Sentinel);
    }
    let day_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day_part, fmt).ok())
        .ok_or_else(|| DateError::Unrecognized(trimmed.to_string()))
}

/// Parse a positive whole number from a cell. `"27.0"` counts as 27.
pub fn parse_number(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    let number = match cell.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            let float: f64 = cell.parse().ok()?;
            if float.fract() != 0.0 || float < 1.0 || float > f64::from(u32::MAX) {
                return None;
            }
            float as u32
        }
    };
    (number > 0).then_some(number)
}

/// Trimmed cell contents, or `None` for blanks and `nan`-style placeholders.
pub fn parse_optional_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!is_empty_cell(cell)).then(|| cell.to_string())
}

fn is_empty_cell(cell: &str) -> bool {
    cell.is_empty() || EMPTY_SENTINELS.iter().any(|s| cell.eq_ignore_ascii_case(s))
}

/// Canonical code for a sung-date cell such as `h27`, `H-27` or `h 27`.
pub fn normalize_code_cell(cell: &str) -> Option<String> {
    let compact: String = cell.chars().filter(|c| !c.is_whitespace()).collect();
    extract_first(&compact).map(|code| code.canonical())
}

/// How far back sung dates count towards the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    years: u32,
}

impl RetentionWindow {
    pub fn years(years: u32) -> Self {
        Self { years }
    }

    /// Earliest date kept, relative to `today`. `None` keeps everything.
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.years == 0 {
            return None;
        }
        today.checked_sub_months(Months::new(self.years.saturating_mul(12)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Sung dates strictly before this are dropped.
    pub cutoff: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub batch: Batch,
    pub reason: String,
}

/// Outcome of building one store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub failures: Vec<BatchFailure>,
    pub skipped_song_rows: usize,
    pub sung_records: usize,
    pub skipped_sung_records: usize,
    pub expired_sung_records: usize,
    pub tune_rows: usize,
    pub skipped_tune_rows: usize,
}

impl IngestReport {
    /// True when at least one batch failed to fetch.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    fn fail(&mut self, batch: Batch, err: &anyhow::Error) {
        error!(source = %self.source, %batch, "batch failed, treating it as empty: {:#}", err);
        self.failures.push(BatchFailure {
            batch,
            reason: format!("{:#}", err),
        });
    }
}

/// Fetch every batch from `source` and build a normalized, indexed store.
pub async fn build_store(source: &dyn SongSource, options: &IngestOptions) -> (SongStore, IngestReport) {
    let mut report = IngestReport {
        source: source.name().to_string(),
        ..Default::default()
    };

    let mut batches = Vec::with_capacity(SongCategory::ALL.len());
    for category in SongCategory::ALL {
        match source.song_rows(category).await {
            Ok(rows) => batches.push((category, rows)),
            Err(err) => {
                report.fail(Batch::Songs(category), &err);
                batches.push((category, Vec::new()));
            }
        }
    }

    let mut store = SongStore::new();
    report.skipped_song_rows = store.load(&batches);
    if report.skipped_song_rows > 0 {
        warn!(rows = report.skipped_song_rows, "skipped song rows without a valid number");
    }

    match source.sung_rows().await {
        Ok(rows) => ingest_sung_rows(&mut store, &rows, options, &mut report),
        Err(err) => report.fail(Batch::Sung, &err),
    }

    match source.tune_rows().await {
        Ok(rows) => ingest_tune_rows(&mut store, &rows, &mut report),
        Err(err) => report.fail(Batch::Tunes, &err),
    }

    store.normalize();
    store.build_index();

    info!(
        source = %report.source,
        songs = store.song_count(),
        sung_records = store.sung_record_count(),
        tunes = store.tune_count(),
        partial = report.is_partial(),
        "store built"
    );
    (store, report)
}

fn ingest_sung_rows(
    store: &mut SongStore,
    rows: &[SungRow],
    options: &IngestOptions,
    report: &mut IngestReport,
) {
    for row in rows {
        let date = match parse_date(&row.date) {
            Ok(date) => date,
            Err(err) => {
                debug!(date = %row.date, "skipping service record: {}", err);
                report.skipped_sung_records += 1;
                continue;
            }
        };
        if options.cutoff.is_some_and(|cutoff| date < cutoff) {
            report.expired_sung_records += row.songs.len();
            continue;
        }
        for cell in &row.songs {
            if parse_optional_cell(cell).is_none() {
                continue;
            }
            match normalize_code_cell(cell) {
                Some(code) => {
                    store.ingest_sung_date(&code, date);
                    report.sung_records += 1;
                }
                None => {
                    debug!(%date, cell = %cell, "skipping unrecognized song cell");
                    report.skipped_sung_records += 1;
                }
            }
        }
    }
    if report.skipped_sung_records > 0 {
        warn!(records = report.skipped_sung_records, "skipped unreadable sung-date records");
    }
}

fn ingest_tune_rows(store: &mut SongStore, rows: &[TuneRow], report: &mut IngestReport) {
    for row in rows {
        let (Some(number), Some(tune)) = (parse_number(&row.hymn), parse_optional_cell(&row.tune))
        else {
            report.skipped_tune_rows += 1;
            continue;
        };
        store.set_tune(&code::format(SongCategory::Hymn, number), &tune);
        report.tune_rows += 1;
    }
}
