//! Query façade used by conversational handlers and the CLI.
//!
//! Every method takes one [`Generation`] snapshot and answers entirely from
//! it, so a reload published mid-request never produces a mixed answer.
//!
//! Free text goes through [`SongQuery::resolve`]; the explicit "check a song"
//! flow, where the user is expected to type only a code, goes through
//! [`SongQuery::check_exact`]. Both report three distinguishable outcomes:
//! no code at all, a well-formed code missing from the catalog, and a found
//! song with its repertoire status.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::catalog::{Catalog, Generation};
use crate::code::{extract_first, CodeError, SongCode};
use crate::models::{Song, SongCategory};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// Nothing in the text looked like a song code.
    NoCode,
    /// A well-formed code that is not in the catalog.
    NotFound { code: SongCode },
    Found(SongReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct SongReport {
    pub code: SongCode,
    pub song: Song,
    pub in_vocabulary: bool,
    /// Mapped tune, `None` when the tune sheet has no entry.
    pub tune: Option<String>,
    pub last_sung: Option<NaiveDate>,
    pub times_sung: usize,
    pub generation: u64,
}

/// Sung history for one code, most recent first.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub code: SongCode,
    pub song: Option<Song>,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TuneInfo {
    pub code: SongCode,
    /// Mapped tune, `None` when the tune sheet has no entry. A tune that is
    /// really called "Unknown" comes through as `Some("Unknown")`.
    pub tune: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SungEntry {
    pub code: SongCode,
    pub title: Option<String>,
}

/// Number of search results when the caller doesn't ask for more.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub song: Song,
    pub score: f32,
}

/// How far back [`SongQuery::unused`] looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusedPeriod {
    ThreeMonths,
    SixMonths,
    ThisYear,
    OneYear,
}

impl UnusedPeriod {
    /// First day that counts as "recently sung".
    pub fn cutoff(self, today: NaiveDate) -> NaiveDate {
        match self {
            UnusedPeriod::ThreeMonths => today - Duration::days(90),
            UnusedPeriod::SixMonths => today - Duration::days(180),
            UnusedPeriod::ThisYear => today.with_ordinal(1).unwrap_or(today),
            UnusedPeriod::OneYear => today - Duration::days(365),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UnusedPeriod::ThreeMonths => "3 months",
            UnusedPeriod::SixMonths => "6 months",
            UnusedPeriod::ThisYear => "this year",
            UnusedPeriod::OneYear => "1 year",
        }
    }
}

impl FromStr for UnusedPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3months" => Ok(UnusedPeriod::ThreeMonths),
            "6months" => Ok(UnusedPeriod::SixMonths),
            "thisyear" => Ok(UnusedPeriod::ThisYear),
            "1year" => Ok(UnusedPeriod::OneYear),
            other => Err(format!(
                "unknown period '{}' (expected 3months, 6months, thisyear or 1year)",
                other
            )),
        }
    }
}

/// A repertoire song with no sung date on or after the cutoff.
#[derive(Debug, Clone, Serialize)]
pub struct UnusedSong {
    pub code: SongCode,
    pub title: Option<String>,
    pub last_sung: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnusedReport {
    pub since: NaiveDate,
    pub categories: Vec<SongCategory>,
    pub songs: Vec<UnusedSong>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VocabularySummary {
    pub total: usize,
    pub hymns: Vec<u32>,
    pub lyrics: Vec<u32>,
    pub conventions: Vec<u32>,
}

impl VocabularySummary {
    pub fn numbers(&self, category: SongCategory) -> &[u32] {
        match category {
            SongCategory::Hymn => &self.hymns,
            SongCategory::Lyric => &self.lyrics,
            SongCategory::Convention => &self.conventions,
            SongCategory::Unknown => &[],
        }
    }
}

#[derive(Clone)]
pub struct SongQuery {
    catalog: Arc<Catalog>,
}

impl SongQuery {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolve the first code found anywhere in free text.
    pub fn resolve(&self, text: &str) -> Resolution {
        match extract_first(text) {
            Some(code) => report(&self.catalog.snapshot(), code),
            None => Resolution::NoCode,
        }
    }

    /// Resolve text that must be exactly one code.
    pub fn check_exact(&self, text: &str) -> Result<Resolution, CodeError> {
        let code = SongCode::parse(text)?;
        Ok(report(&self.catalog.snapshot(), code))
    }

    /// All dates a code was sung on, most recent first.
    pub fn last_sung(&self, text: &str) -> Result<History, CodeError> {
        let code = SongCode::parse(text)?;
        let gen = self.catalog.snapshot();
        let canonical = code.canonical();
        Ok(History {
            code,
            song: gen
                .store
                .find_by_number(code.number(), code.category())
                .cloned(),
            dates: gen.store.all_dates(&canonical),
        })
    }

    pub fn tune_of(&self, text: &str) -> Result<TuneInfo, CodeError> {
        let code = SongCode::parse(text)?;
        let gen = self.catalog.snapshot();
        let canonical = code.canonical();
        let song = gen.store.find_by_number(code.number(), code.category());
        Ok(TuneInfo {
            code,
            tune: gen.store.tune(&canonical).map(str::to_string),
            page: song.and_then(|s| s.page),
        })
    }

    /// Songs sung on one date, by category then number.
    pub fn sung_on(&self, date: NaiveDate) -> Vec<SungEntry> {
        let gen = self.catalog.snapshot();
        gen.store
            .songs_on(date)
            .iter()
            .map(|code| SungEntry {
                code: *code,
                title: gen.store.lookup(&code.canonical()).map(|s| s.title.clone()),
            })
            .collect()
    }

    pub fn by_tune(&self, name: &str) -> Vec<Song> {
        self.catalog
            .snapshot()
            .store
            .songs_by_tune(name)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Title and first-line search, best match first.
    pub fn search(
        &self,
        text: &str,
        category: Option<SongCategory>,
        limit: usize,
    ) -> Vec<SearchResult> {
        let gen = self.catalog.snapshot();
        gen.store
            .search(text, category, limit)
            .into_iter()
            .map(|hit| SearchResult {
                song: hit.song.clone(),
                score: hit.score,
            })
            .collect()
    }

    /// Repertoire songs not sung on or after `since`, by category then number.
    ///
    /// Only songs in the vocabulary are considered: a catalogued song that
    /// was never sung in the tracked window is not "unused", it was never in
    /// use. `None` covers every category.
    pub fn unused(&self, category: Option<SongCategory>, since: NaiveDate) -> UnusedReport {
        let gen = self.catalog.snapshot();
        let categories: Vec<SongCategory> = match category {
            Some(category) => vec![category],
            None => SongCategory::ALL.to_vec(),
        };

        let mut songs = Vec::new();
        for &category in &categories {
            for number in gen.vocabulary.numbers(category) {
                let Some(code) = SongCode::new(category, number) else {
                    continue;
                };
                let canonical = code.canonical();
                let last_sung = gen.store.last_sung_date(&canonical);
                if last_sung.is_some_and(|last| last >= since) {
                    continue;
                }
                songs.push(UnusedSong {
                    code,
                    title: gen.store.lookup(&canonical).map(|s| s.title.clone()),
                    last_sung,
                });
            }
        }

        UnusedReport {
            since,
            categories,
            songs,
        }
    }

    pub fn vocabulary_summary(&self) -> VocabularySummary {
        let gen = self.catalog.snapshot();
        let vocab = &gen.vocabulary;
        VocabularySummary {
            total: vocab.len(),
            hymns: vocab.numbers(SongCategory::Hymn),
            lyrics: vocab.numbers(SongCategory::Lyric),
            conventions: vocab.numbers(SongCategory::Convention),
        }
    }
}

/// Look a parsed code up against one generation.
///
/// The song is found by (number, category); vocabulary membership, tune and
/// dates are keyed by the canonical code string.
fn report(gen: &Generation, code: SongCode) -> Resolution {
    let Some(song) = gen.store.find_by_number(code.number(), code.category()) else {
        return Resolution::NotFound { code };
    };
    let canonical = code.canonical();
    Resolution::Found(SongReport {
        code,
        song: song.clone(),
        in_vocabulary: gen.vocabulary.is_valid(&canonical),
        tune: gen.store.tune(&canonical).map(str::to_string),
        last_sung: gen.store.last_sung_date(&canonical),
        times_sung: gen.store.times_sung(&canonical),
        generation: gen.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestOptions;
    use crate::models::{SungRow, TuneRow};
    use crate::source::MemorySource;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn query() -> SongQuery {
        let source = MemorySource::new("mem")
            .with_songs(
                SongCategory::Hymn,
                vec![
                    vec!["27".into(), "Amazing Grace".into(), "Amazing grace how sweet".into()],
                    vec!["5".into(), "Rock of Ages".into(), "".into(), "".into(), "12".into()],
                ],
            )
            .with_songs(SongCategory::Lyric, vec![vec!["3".into(), "Lyric Three".into()]])
            .with_sung(vec![
                SungRow::new("2024-01-07", &["H27", "L-3"]),
                SungRow::new("2024-03-10", &["H-27"]),
            ])
            .with_tunes(vec![TuneRow::new("27", "New Britain")]);
        let catalog = Arc::new(Catalog::new());
        catalog.reload(&source, &IngestOptions::default()).await;
        SongQuery::new(catalog)
    }

    #[tokio::test]
    async fn test_resolve_found_in_vocabulary() {
        let q = query().await;
        let Resolution::Found(r) = q.resolve("please sing H-27 today") else {
            panic!("expected a found song");
        };
        assert_eq!(r.code.to_string(), "H-27");
        assert_eq!(r.song.title, "Amazing Grace");
        assert!(r.in_vocabulary);
        assert_eq!(r.tune.as_deref(), Some("New Britain"));
        assert_eq!(r.last_sung, Some(d("2024-03-10")));
        assert_eq!(r.times_sung, 2);
    }

    #[tokio::test]
    async fn test_resolve_found_not_in_vocabulary() {
        let q = query().await;
        let Resolution::Found(r) = q.resolve("what about h5?") else {
            panic!("expected a found song");
        };
        assert!(!r.in_vocabulary);
        assert_eq!(r.tune, None);
        assert_eq!(r.last_sung, None);
        assert_eq!(r.times_sung, 0);
    }

    #[tokio::test]
    async fn test_resolve_outcomes() {
        let q = query().await;
        assert!(matches!(q.resolve("good morning"), Resolution::NoCode));
        assert!(matches!(q.resolve("sing C-40"), Resolution::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_check_exact() {
        let q = query().await;
        assert!(matches!(q.check_exact("l 3"), Ok(Resolution::Found(_))));
        assert!(matches!(q.check_exact("H-99"), Ok(Resolution::NotFound { .. })));
        assert_eq!(
            q.check_exact("please sing H-27").unwrap_err(),
            CodeError::UnknownPrefix('P')
        );
    }

    #[tokio::test]
    async fn test_history_and_tune() {
        let q = query().await;
        let history = q.last_sung("H-27").unwrap();
        assert_eq!(history.dates, vec![d("2024-03-10"), d("2024-01-07")]);
        assert!(history.song.is_some());

        let tune = q.tune_of("H-5").unwrap();
        assert_eq!(tune.tune, None);
        assert_eq!(tune.page, Some(12));
        assert_eq!(q.tune_of("H27").unwrap().tune.as_deref(), Some("New Britain"));
    }

    #[tokio::test]
    async fn test_sung_on_and_by_tune() {
        let q = query().await;
        let entries = q.sung_on(d("2024-01-07"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Amazing Grace"));
        assert_eq!(entries[1].code.to_string(), "L-3");
        assert_eq!(q.by_tune("New Britain").len(), 1);
    }

    #[tokio::test]
    async fn test_tune_literally_named_unknown() {
        let source = MemorySource::new("mem")
            .with_songs(SongCategory::Hymn, vec![vec!["27".into(), "Amazing Grace".into()]])
            .with_tunes(vec![TuneRow::new("27", "Unknown")]);
        let catalog = Arc::new(Catalog::new());
        catalog.reload(&source, &IngestOptions::default()).await;
        let q = SongQuery::new(catalog);

        assert_eq!(q.tune_of("H-27").unwrap().tune.as_deref(), Some("Unknown"));
        assert_eq!(q.tune_of("H-5").unwrap().tune, None);
    }

    #[tokio::test]
    async fn test_search() {
        let q = query().await;
        let results = q.search("rock", None, DEFAULT_SEARCH_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].song.code, "H-5");
        assert!(q.search("rock", Some(SongCategory::Lyric), 5).is_empty());
        assert!(q.search("", None, 5).is_empty());
    }

    #[tokio::test]
    async fn test_unused_lists_repertoire_songs_gone_quiet() {
        let q = query().await;

        // H-27 was last sung on 2024-03-10 and L-3 on 2024-01-07.
        let report = q.unused(None, d("2024-02-01"));
        let codes: Vec<String> = report.songs.iter().map(|s| s.code.to_string()).collect();
        assert_eq!(codes, vec!["L-3"]);
        assert_eq!(report.songs[0].title.as_deref(), Some("Lyric Three"));
        assert_eq!(report.songs[0].last_sung, Some(d("2024-01-07")));

        let hymns = q.unused(Some(SongCategory::Hymn), d("2024-06-01"));
        assert_eq!(hymns.categories, vec![SongCategory::Hymn]);
        let codes: Vec<String> = hymns.songs.iter().map(|s| s.code.to_string()).collect();
        // H-5 is catalogued but never sung, so it is not part of the repertoire.
        assert_eq!(codes, vec!["H-27"]);

        assert!(q.unused(None, d("2024-01-01")).songs.is_empty());
    }

    #[test]
    fn test_unused_period() {
        let today = d("2024-10-19");
        assert_eq!("3months".parse::<UnusedPeriod>(), Ok(UnusedPeriod::ThreeMonths));
        assert!("fortnight".parse::<UnusedPeriod>().is_err());
        assert_eq!(UnusedPeriod::ThreeMonths.cutoff(today), d("2024-07-21"));
        assert_eq!(UnusedPeriod::ThisYear.cutoff(today), d("2024-01-01"));
        assert_eq!(UnusedPeriod::OneYear.cutoff(today), d("2023-10-20"));
    }

    #[tokio::test]
    async fn test_vocabulary_summary() {
        let q = query().await;
        let summary = q.vocabulary_summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.numbers(SongCategory::Hymn), &[27]);
        assert_eq!(summary.numbers(SongCategory::Lyric), &[3]);
        assert!(summary.conventions.is_empty());
    }

    #[tokio::test]
    async fn test_found_serializes_with_outcome_tag() {
        let q = query().await;
        let json = serde_json::to_value(q.resolve("H-27")).unwrap();
        assert_eq!(json["outcome"], "found");
        assert_eq!(json["code"], "H-27");
        assert_eq!(json["last_sung"], "2024-03-10");
    }
}
