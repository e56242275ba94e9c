//! The choir's active repertoire.
//!
//! A song is *in vocabulary* when it has at least one sung date inside the
//! tracked window, which is stricter than merely existing in the catalog. The
//! sets here are derived from the store's date history and rebuilt whenever a
//! new generation is built; they never own song data.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::code::{self, SongCode};
use crate::models::SongCategory;
use crate::store::SongStore;

#[derive(Debug, Default, Clone)]
pub struct Vocabulary {
    all: BTreeSet<String>,
    /// Sorted unique numbers per category, indexed by [`SongCategory::slot`].
    numbers: [BTreeSet<u32>; 3],
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the vocabulary from a store's sung-date history.
    pub fn from_store(store: &SongStore) -> Self {
        let mut vocab = Self::new();
        vocab.rebuild(store);
        vocab
    }

    /// Recompute every set from `store`.
    ///
    /// Codes that were sung but are missing from the catalog are left out so
    /// that vocabulary membership always implies catalog membership.
    pub fn rebuild(&mut self, store: &SongStore) {
        self.all.clear();
        for set in &mut self.numbers {
            set.clear();
        }

        for (code_str, dates) in store.sung_history() {
            if dates.is_empty() {
                continue;
            }
            let Ok(code) = SongCode::parse(code_str) else {
                debug!(code = code_str, "sung history key is not a song code");
                continue;
            };
            let canonical = code.canonical();
            if !store.contains(&canonical) {
                debug!(code = %canonical, "sung code missing from catalog");
                continue;
            }
            if let Some(slot) = code.category().slot() {
                self.numbers[slot].insert(code.number());
            }
            self.all.insert(canonical);
        }

        info!(
            total = self.all.len(),
            hymns = self.count(SongCategory::Hymn),
            lyrics = self.count(SongCategory::Lyric),
            conventions = self.count(SongCategory::Convention),
            "vocabulary built"
        );
    }

    /// Whether `text` names a code in the active repertoire.
    ///
    /// Uses the strict song-code rules; malformed text is never valid.
    pub fn is_valid(&self, text: &str) -> bool {
        SongCode::parse(text).is_ok_and(|code| self.all.contains(&code.canonical()))
    }

    /// Like [`is_valid`](Self::is_valid) but restricted to one category.
    pub fn is_valid_in(&self, text: &str, category: SongCategory) -> bool {
        let Ok(code) = SongCode::parse(text) else {
            return false;
        };
        if code.category() != category {
            return false;
        }
        category
            .slot()
            .is_some_and(|slot| self.numbers[slot].contains(&code.number()))
    }

    /// Membership test after [`standardize_code`], for admin-typed input.
    pub fn contains_loose(&self, text: &str) -> bool {
        standardize_code(text).is_some_and(|key| self.all.contains(&key))
    }

    pub fn codes(&self) -> &BTreeSet<String> {
        &self.all
    }

    /// Sorted numbers in the repertoire for one category.
    pub fn numbers(&self, category: SongCategory) -> Vec<u32> {
        match category.slot() {
            Some(slot) => self.numbers[slot].iter().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn count(&self, category: SongCategory) -> usize {
        category.slot().map_or(0, |slot| self.numbers[slot].len())
    }
}

/// Forgiving normalizer: the first `H`/`L`/`C` anywhere in the text plus every
/// digit anywhere, joined as `<letter>-<digits>`. Returns an empty string when
/// either part is missing.
///
/// This intentionally accepts text the strict parser rejects (`"hymn no. 27"`
/// becomes `H-27`, and so does `"27h"`). Keep it separate from
/// [`SongCode::parse`]; whether the looser rule is wanted everywhere is still
/// an open question.
pub fn standardize(text: &str) -> String {
    let upper = text.to_uppercase();
    let letter = upper
        .chars()
        .find(|c| matches!(c, 'H' | 'L' | 'C'))
        .and_then(SongCategory::from_prefix);
    let digits: String = upper.chars().filter(|c| c.is_ascii_digit()).collect();

    match letter {
        Some(category) if !digits.is_empty() => format!("{}-{}", category.prefix(), digits),
        _ => String::new(),
    }
}

/// Canonical code for `text` under the forgiving rules, if it names a real code.
pub fn standardize_code(text: &str) -> Option<String> {
    let key = standardize(text);
    let code = SongCode::parse(&key).ok()?;
    Some(code::format(code.category(), code.number()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn store() -> SongStore {
        let rows = |n: &[&str]| -> Vec<Vec<String>> {
            n.iter().map(|x| vec![x.to_string(), format!("Song {}", x)]).collect()
        };
        let mut store = SongStore::new();
        store.load(&[
            (SongCategory::Hymn, rows(&["5", "27"])),
            (SongCategory::Lyric, rows(&["3"])),
            (SongCategory::Convention, rows(&["12"])),
        ]);
        store.ingest_sung_date("H-27", d("2024-01-07"));
        store.ingest_sung_date("L-3", d("2024-02-04"));
        store.ingest_sung_date("C-12", d("2024-02-04"));
        store.ingest_sung_date("H-999", d("2024-02-04"));
        store.normalize();
        store.build_index();
        store
    }

    #[test]
    fn test_rebuild_counts() {
        let vocab = Vocabulary::from_store(&store());
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.count(SongCategory::Hymn), 1);
        assert_eq!(vocab.count(SongCategory::Lyric), 1);
        assert_eq!(vocab.count(SongCategory::Convention), 1);
        assert_eq!(vocab.numbers(SongCategory::Hymn), vec![27]);
    }

    #[test]
    fn test_is_valid() {
        let vocab = Vocabulary::from_store(&store());
        assert!(vocab.is_valid("H-27"));
        assert!(vocab.is_valid("h 27"));
        assert!(!vocab.is_valid("H-5"));
        assert!(!vocab.is_valid("hymn 27"));
    }

    #[test]
    fn test_is_valid_in_category() {
        let vocab = Vocabulary::from_store(&store());
        assert!(vocab.is_valid_in("L-3", SongCategory::Lyric));
        assert!(!vocab.is_valid_in("L-3", SongCategory::Hymn));
        assert!(!vocab.is_valid_in("H-3", SongCategory::Hymn));
        assert!(!vocab.is_valid_in("L-3", SongCategory::Unknown));
    }

    #[test]
    fn test_uncatalogued_codes_are_excluded() {
        let vocab = Vocabulary::from_store(&store());
        assert!(!vocab.is_valid("H-999"));
    }

    #[test]
    fn test_vocabulary_implies_catalog() {
        let store = store();
        let vocab = Vocabulary::from_store(&store);
        for code in vocab.codes() {
            assert!(store.get_by_code(code).is_some(), "{} not in catalog", code);
        }
    }

    #[test]
    fn test_standardize() {
        assert_eq!(standardize("h 27"), "H-27");
        assert_eq!(standardize("hymn no. 27"), "H-27");
        assert_eq!(standardize("27h"), "H-27");
        assert_eq!(standardize("L-05"), "L-05");
        assert_eq!(standardize("no digits"), "");
        assert_eq!(standardize("42"), "");
        assert_eq!(standardize(""), "");
    }

    #[test]
    fn test_standardize_is_looser_than_parse() {
        assert!(SongCode::parse("27h").is_err());
        assert_eq!(standardize_code("27h").as_deref(), Some("H-27"));
        assert_eq!(standardize_code("h0"), None);
    }

    #[test]
    fn test_contains_loose() {
        let vocab = Vocabulary::from_store(&store());
        assert!(vocab.contains_loose("hymn 27"));
        assert!(vocab.contains_loose("H-027"));
        assert!(!vocab.contains_loose("hymn"));
    }
}
