//! In-memory song store for one load generation.
//!
//! The store owns the three category lists, the sung-date history and the
//! tune map. It is built in phases by the ingestion adapter:
//!
//! ```text
//! load(batches) → ingest_sung_date(..)* → normalize() → build_index()
//! ```
//!
//! and is read-only afterwards. Building happens off to the side; readers
//! only ever see a finished store through a published
//! [`Generation`](crate::catalog::Generation).
//!
//! Two lookup families coexist with different duplicate semantics:
//! list scans ([`get_by_code`](SongStore::get_by_code),
//! [`find_by_number`](SongStore::find_by_number)) return the *first* row in
//! ingestion order, while map lookups ([`lookup`](SongStore::lookup), tunes,
//! dates) keep the *last* write.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::code::{self, SongCode};
use crate::ingest::{parse_number, parse_optional_cell};
use crate::models::{Song, SongCategory, SongRow};

/// Returned by [`SongStore::tune_name`] when a code has no tune mapping.
///
/// Callers must not confuse this with a real tune called "Unknown"; use
/// [`SongStore::tune`] when the distinction matters.
pub const UNKNOWN_TUNE: &str = "Unknown";

/// Where a code lives inside the category lists.
#[derive(Debug, Clone, Copy)]
struct Slot {
    list: usize,
    pos: usize,
}

#[derive(Debug, Default, Clone)]
pub struct SongStore {
    /// Hymns, lyrics, conventions; indexed by [`SongCategory::slot`].
    lists: [Vec<Song>; 3],
    sung: HashMap<String, Vec<NaiveDate>>,
    tunes: HashMap<String, String>,
    index: HashMap<String, Slot>,
    by_date: BTreeMap<NaiveDate, Vec<SongCode>>,
}

impl SongStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every song list from category-tagged batches of raw rows.
    ///
    /// Clears all state first, including dates and tunes. Rows whose first
    /// cell is not a positive number are skipped; duplicates are kept.
    /// Returns the number of skipped rows.
    pub fn load(&mut self, batches: &[(SongCategory, Vec<SongRow>)]) -> usize {
        *self = Self::default();
        let mut skipped = 0;
        for (category, rows) in batches {
            let Some(slot) = category.slot() else {
                debug!(rows = rows.len(), "ignoring batch with unknown category");
                skipped += rows.len();
                continue;
            };
            for row in rows {
                match song_from_row(*category, row) {
                    Some(song) => self.lists[slot].push(song),
                    None => {
                        debug!(category = %category, ?row, "skipping song row without a valid number");
                        skipped += 1;
                    }
                }
            }
        }
        skipped
    }

    /// Append one sung date for a canonical code.
    ///
    /// No sorting or deduplication happens here; call [`normalize`](Self::normalize)
    /// once ingestion is finished.
    pub fn ingest_sung_date(&mut self, code: &str, date: NaiveDate) {
        self.sung.entry(code.to_string()).or_default().push(date);
    }

    /// Map a hymn's canonical code to its tune name. Later calls overwrite.
    pub fn set_tune(&mut self, code: &str, tune: &str) {
        self.tunes.insert(code.to_string(), tune.to_string());
    }

    /// Sort every date history ascending, then drop adjacent duplicates.
    pub fn normalize(&mut self) {
        for dates in self.sung.values_mut() {
            dates.sort_unstable();
            dates.dedup();
        }
    }

    /// Build the code index (hymns, then lyrics, then conventions) and the
    /// date → songs reverse index. Must run after [`normalize`](Self::normalize).
    pub fn build_index(&mut self) {
        self.index.clear();
        for (list, songs) in self.lists.iter().enumerate() {
            for (pos, song) in songs.iter().enumerate() {
                self.index.insert(song.code.clone(), Slot { list, pos });
            }
        }

        self.by_date.clear();
        for (code_str, dates) in &self.sung {
            let Ok(code) = SongCode::parse(code_str) else {
                continue;
            };
            for date in dates {
                self.by_date.entry(*date).or_default().push(code);
            }
        }
        for codes in self.by_date.values_mut() {
            codes.sort_unstable();
        }
    }

    /// The list backing a category.
    ///
    /// `Unknown` falls back to the hymn list. This mirrors long-standing
    /// behavior that callers relied on; it looks like a latent defect rather
    /// than a deliberate default, so don't lean on it in new code.
    fn list(&self, category: SongCategory) -> &[Song] {
        &self.lists[category.slot().unwrap_or(0)]
    }

    /// Find a song by code text, scanning the category list in order.
    pub fn get_by_code(&self, code_text: &str) -> Option<&Song> {
        let code = SongCode::parse(code_text).ok()?;
        let canonical = code.canonical();
        self.list(code.category())
            .iter()
            .find(|s| s.code == canonical)
    }

    /// First song in ingestion order with this number in the given category.
    pub fn find_by_number(&self, number: u32, category: SongCategory) -> Option<&Song> {
        self.list(category).iter().find(|s| s.number == number)
    }

    /// Index lookup by canonical code string. Last row wins on duplicates.
    pub fn lookup(&self, code: &str) -> Option<&Song> {
        let slot = self.index.get(code)?;
        self.lists[slot.list].get(slot.pos)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Latest recorded date for a code. Correct before `normalize()` too.
    pub fn last_sung_date(&self, code: &str) -> Option<NaiveDate> {
        self.sung.get(code).and_then(|dates| dates.iter().max().copied())
    }

    /// Every recorded date for a code, most recent first.
    pub fn all_dates(&self, code: &str) -> Vec<NaiveDate> {
        self.sung
            .get(code)
            .map(|dates| dates.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// Number of distinct dates a code was sung on.
    pub fn times_sung(&self, code: &str) -> usize {
        self.sung.get(code).map_or(0, Vec::len)
    }

    /// Tune name for a code, or [`UNKNOWN_TUNE`] when unmapped.
    pub fn tune_name(&self, code: &str) -> &str {
        self.tune(code).unwrap_or(UNKNOWN_TUNE)
    }

    /// Tune name for a code, `None` when unmapped.
    pub fn tune(&self, code: &str) -> Option<&str> {
        self.tunes.get(code).map(String::as_str)
    }

    /// Songs whose mapped tune matches `name` (case-insensitive), by code order.
    pub fn songs_by_tune(&self, name: &str) -> Vec<&Song> {
        let wanted = name.trim().to_lowercase();
        let mut codes: Vec<SongCode> = self
            .tunes
            .iter()
            .filter(|(_, tune)| tune.to_lowercase() == wanted)
            .filter_map(|(code, _)| SongCode::parse(code).ok())
            .collect();
        codes.sort_unstable();
        codes
            .iter()
            .filter_map(|code| self.lookup(&code.canonical()))
            .collect()
    }

    /// Codes sung on a given date, ordered by category then number.
    pub fn songs_on(&self, date: NaiveDate) -> &[SongCode] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Codes with at least one recorded date, paired with their history.
    pub fn sung_history(&self) -> impl Iterator<Item = (&str, &[NaiveDate])> {
        self.sung
            .iter()
            .map(|(code, dates)| (code.as_str(), dates.as_slice()))
    }

    /// Rank songs by how well `query` matches their title and first line.
    ///
    /// Every query word found at the start of a word in the title or first
    /// line adds to the score; finding the whole query as a phrase adds one
    /// more. Songs matching no word are left out. `None` searches every
    /// category. Equal scores keep catalog order.
    pub fn search(
        &self,
        query: &str,
        category: Option<SongCategory>,
        limit: usize,
    ) -> Vec<SearchHit<'_>> {
        let words = search_words(query);
        if words.is_empty() || limit == 0 {
            return Vec::new();
        }
        let phrase = words.join(" ");

        let candidates: Box<dyn Iterator<Item = &Song> + '_> = match category {
            Some(category) => Box::new(self.songs(category).iter()),
            None => Box::new(self.all_songs()),
        };

        let mut hits: Vec<SearchHit<'_>> = candidates
            .filter_map(|song| {
                let mut text = song.title.clone();
                if let Some(line) = &song.first_line {
                    text.push(' ');
                    text.push_str(line);
                }
                let tokens = search_words(&text);
                let matched = words
                    .iter()
                    .filter(|w| tokens.iter().any(|t| t.starts_with(w.as_str())))
                    .count();
                if matched == 0 {
                    return None;
                }
                let mut score = matched as f32 / words.len() as f32;
                if tokens.join(" ").contains(&phrase) {
                    score += 1.0;
                }
                Some(SearchHit { song, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    pub fn songs(&self, category: SongCategory) -> &[Song] {
        match category.slot() {
            Some(slot) => &self.lists[slot],
            None => &[],
        }
    }

    pub fn all_songs(&self) -> impl Iterator<Item = &Song> {
        self.lists.iter().flatten()
    }

    pub fn song_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn count_by_category(&self, category: SongCategory) -> usize {
        self.songs(category).len()
    }

    pub fn tune_count(&self) -> usize {
        self.tunes.len()
    }

    /// Total distinct (code, date) records after normalization.
    pub fn sung_record_count(&self) -> usize {
        self.sung.values().map(Vec::len).sum()
    }
}

/// A song matched by [`SongStore::search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub song: &'a Song,
    /// Fraction of query words matched, plus 1.0 for a phrase match.
    pub score: f32,
}

/// Lowercased alphanumeric words of `text`.
fn search_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Build a song from `[number, title, first line, tune?, page?]`.
fn song_from_row(category: SongCategory, row: &SongRow) -> Option<Song> {
    let number = parse_number(row.first()?)?;
    let cell = |i: usize| row.get(i).and_then(|c| parse_optional_cell(c));
    Some(Song {
        code: code::format(category, number),
        category,
        number,
        title: row.get(1).map(|c| c.trim().to_string()).unwrap_or_default(),
        first_line: cell(2),
        tune: cell(3),
        page: cell(4).and_then(|p| parse_number(&p)),
    })
}
