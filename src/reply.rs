//! Plain-text rendering of query results.
//!
//! These strings are what a chat handler (or the CLI) shows the user. They
//! carry no transport markup.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::code::CodeError;
use crate::models::{Song, SongCategory};
use crate::query::{
    History, Resolution, SearchResult, SongReport, SungEntry, TuneInfo, UnusedReport,
    VocabularySummary,
};

/// Shown when free text contains no song code.
pub const HELP_PROMPT: &str = "I didn't understand that. Try:\n\
    • A song code like H-27 or L-5\n\
    • help to see all commands";

/// Shown when the check flow receives something that is not a code.
pub const FORMAT_HELP: &str = "Invalid song code format.\n\
    Please enter a valid code like H-27, L-5, or C-12";

const NOT_IN_VOCABULARY_NOTE: &str =
    "Note: a known song may not be in the vocabulary if it hasn't been sung recently.";

/// Numbers listed per category before eliding the rest.
const VOCABULARY_PREVIEW: usize = 10;

fn date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

/// Reply to free text that may mention a song.
pub fn render_resolution(resolution: &Resolution) -> String {
    match resolution {
        Resolution::NoCode => HELP_PROMPT.to_string(),
        Resolution::NotFound { code } => format!(
            "Song {} not found in the database.\nUse check to verify if a song exists.",
            code
        ),
        Resolution::Found(report) => render_song(report),
    }
}

fn render_song(report: &SongReport) -> String {
    let mut out = String::new();
    let song = &report.song;
    let _ = writeln!(out, "{} - {}", report.code, song.title);
    out.push('\n');
    if let Some(line) = &song.first_line {
        let _ = writeln!(out, "First line: {}", line);
    }
    if let Some(tune) = &report.tune {
        let _ = writeln!(out, "Tune: {}", tune);
    }
    match report.last_sung {
        Some(last) => {
            let _ = writeln!(out, "Last sung: {}", date(last));
            if report.times_sung > 1 {
                let _ = write!(out, "\nThis song has been sung {} times.", report.times_sung);
            }
        }
        None => out.push_str("Last sung: Not recorded"),
    }
    out.trim_end().to_string()
}

/// Reply for the explicit check flow.
pub fn render_check(result: &Result<Resolution, CodeError>) -> String {
    let report = match result {
        Err(_) => return FORMAT_HELP.to_string(),
        Ok(Resolution::NoCode) => return FORMAT_HELP.to_string(),
        Ok(Resolution::NotFound { code }) => {
            return format!("Song {} does not exist in the database.", code)
        }
        Ok(Resolution::Found(report)) => report,
    };

    let mut out = String::new();
    if report.in_vocabulary {
        let _ = writeln!(out, "Song {} is in the choir vocabulary!\n", report.code);
    } else {
        let _ = writeln!(out, "Song {} exists but is NOT in the vocabulary\n", report.code);
        let _ = writeln!(out, "{}\n", NOT_IN_VOCABULARY_NOTE);
    }
    let _ = writeln!(out, "Index: {}", report.song.title);
    if let Some(line) = &report.song.first_line {
        let _ = writeln!(out, "First line: {}", line);
    }
    if let Some(tune) = &report.tune {
        let _ = writeln!(out, "Tune: {}", tune);
    }
    out.trim_end().to_string()
}

pub fn render_history(result: &Result<History, CodeError>) -> String {
    let history = match result {
        Ok(history) => history,
        Err(_) => return FORMAT_HELP.to_string(),
    };
    let Some(song) = &history.song else {
        return format!("Song {} does not exist in the database.", history.code);
    };
    if history.dates.is_empty() {
        return format!("{} - {}\nNo sung dates recorded.", history.code, song.title);
    }
    let mut out = format!("{} - {}\n", history.code, song.title);
    for (i, d) in history.dates.iter().enumerate() {
        let marker = if i == 0 { " (last)" } else { "" };
        let _ = write!(out, "\n  {}{}", date(*d), marker);
    }
    out
}

pub fn render_tune(result: &Result<TuneInfo, CodeError>) -> String {
    match result {
        Err(_) => FORMAT_HELP.to_string(),
        Ok(TuneInfo { code, tune: None, .. }) => format!("No tune recorded for {}.", code),
        Ok(TuneInfo {
            code,
            tune: Some(tune),
            page,
        }) => {
            let mut out = format!("{}: {}", code, tune);
            if let Some(page) = page {
                let _ = write!(out, " (page {})", page);
            }
            out
        }
    }
}

pub fn render_sung_on(day: NaiveDate, entries: &[SungEntry]) -> String {
    if entries.is_empty() {
        return format!("No songs recorded on {}.", date(day));
    }
    let mut out = format!("Songs sung on {}:\n", date(day));
    for entry in entries {
        let title = entry.title.as_deref().unwrap_or("(not in catalog)");
        let _ = write!(out, "\n  {} - {}", entry.code, title);
    }
    out
}

pub fn render_by_tune(name: &str, songs: &[Song]) -> String {
    if songs.is_empty() {
        return format!("No songs use the tune '{}'.", name);
    }
    let mut out = format!("Songs sung to '{}':\n", name);
    for song in songs {
        let _ = write!(out, "\n  {} - {}", song.code, song.title);
    }
    out
}

pub fn render_search(query: &str, results: &[SearchResult]) -> String {
    if query.trim().is_empty() {
        return "Query is empty. Please provide search text.".to_string();
    }
    if results.is_empty() {
        return "No match found. Try a different query.".to_string();
    }
    let mut out = format!("Best matches for '{}':\n", query.trim());
    for result in results {
        let song = &result.song;
        let _ = write!(out, "\n  {} - {}", song.code, song.title);
        if let Some(line) = &song.first_line {
            let _ = write!(out, " ({})", line);
        }
    }
    out
}

/// Repertoire songs that have gone quiet since a cutoff.
pub fn render_unused(report: &UnusedReport, period: &str) -> String {
    let scope: Vec<&str> = report.categories.iter().map(|c| c.plural()).collect();
    let scope = scope.join(", ");
    if report.songs.is_empty() {
        return format!("All {} in the vocabulary were sung in the last {}.", scope, period);
    }
    let mut out = format!(
        "{} not sung in the last {} (since {}): {}\n",
        scope,
        period,
        date(report.since),
        report.songs.len()
    );
    for song in &report.songs {
        let title = song.title.as_deref().unwrap_or("(not in catalog)");
        let _ = write!(out, "\n  {} - {}", song.code, title);
        if let Some(last) = song.last_sung {
            let _ = write!(out, " (last {})", date(last));
        }
    }
    out
}

/// Repertoire overview: count per category and the first few numbers.
pub fn render_vocabulary(summary: &VocabularySummary, retention_years: u32) -> String {
    let mut out = String::from("Choir Vocabulary\n\n");
    if retention_years > 0 {
        let _ = writeln!(out, "Songs sung in the past {} years:\n", retention_years);
    }
    for category in SongCategory::ALL {
        let numbers = summary.numbers(category);
        let _ = writeln!(out, "{}: {} total", category.plural(), numbers.len());
        if numbers.is_empty() {
            continue;
        }
        let shown: Vec<String> = numbers
            .iter()
            .take(VOCABULARY_PREVIEW)
            .map(|n| format!("{}-{}", category.prefix(), n))
            .collect();
        out.push_str(&shown.join(", "));
        if numbers.len() > VOCABULARY_PREVIEW {
            let _ = write!(out, "... (+{} more)", numbers.len() - VOCABULARY_PREVIEW);
        }
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}
