//! Core data models used throughout the songbook.
//!
//! These types represent the song catalog entries and the raw rows that flow
//! from a [`SongSource`](crate::source::SongSource) into the ingestion adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three partitions of the song catalog.
///
/// The derived ordering (`Hymn < Lyric < Convention`) is the sort order used
/// wherever songs from several categories are listed together. `Unknown`
/// sorts last and never appears in a valid [`SongCode`](crate::code::SongCode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongCategory {
    Hymn,
    Lyric,
    Convention,
    Unknown,
}

impl SongCategory {
    /// The three real categories, in catalog order.
    pub const ALL: [SongCategory; 3] = [
        SongCategory::Hymn,
        SongCategory::Lyric,
        SongCategory::Convention,
    ];

    /// Map a code prefix letter (either case) to its category.
    pub fn from_prefix(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'H' => Some(SongCategory::Hymn),
            'L' => Some(SongCategory::Lyric),
            'C' => Some(SongCategory::Convention),
            _ => None,
        }
    }

    /// Canonical prefix letter. `Unknown` renders as `?`.
    pub fn prefix(self) -> char {
        match self {
            SongCategory::Hymn => 'H',
            SongCategory::Lyric => 'L',
            SongCategory::Convention => 'C',
            SongCategory::Unknown => '?',
        }
    }

    /// Position of this category in per-category tables.
    pub fn slot(self) -> Option<usize> {
        match self {
            SongCategory::Hymn => Some(0),
            SongCategory::Lyric => Some(1),
            SongCategory::Convention => Some(2),
            SongCategory::Unknown => None,
        }
    }

    /// Plural label used in listings and stats output.
    pub fn plural(self) -> &'static str {
        match self {
            SongCategory::Hymn => "Hymns",
            SongCategory::Lyric => "Lyrics",
            SongCategory::Convention => "Conventions",
            SongCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SongCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SongCategory::Hymn => "Hymn",
            SongCategory::Lyric => "Lyric",
            SongCategory::Convention => "Convention",
            SongCategory::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Accepts a prefix letter or a category name, singular or plural, any case:
/// `h`, `Hymn`, `lyrics`, `C`.
impl FromStr for SongCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hymn" | "hymns" => Ok(SongCategory::Hymn),
            "l" | "lyric" | "lyrics" => Ok(SongCategory::Lyric),
            "c" | "convention" | "conventions" => Ok(SongCategory::Convention),
            other => Err(format!(
                "unknown category '{}' (expected hymn, lyric or convention)",
                other
            )),
        }
    }
}

/// A catalogued song.
///
/// Songs are created in bulk during ingestion and never mutated afterwards;
/// sung dates and tune mappings live in the store, keyed by [`Song::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    /// Canonical code string (`H-27`), primary key within a category list.
    pub code: String,
    pub category: SongCategory,
    pub number: u32,
    /// Display title ("index" in the choir's sheets).
    pub title: String,
    pub first_line: Option<String>,
    /// Tune column carried by the song sheet itself, if any.
    pub tune: Option<String>,
    pub page: Option<u32>,
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.title)?;
        if let Some(line) = &self.first_line {
            write!(f, " ({})", line)?;
        }
        if let Some(tune) = &self.tune {
            write!(f, " [{}]", tune)?;
        }
        Ok(())
    }
}

/// A raw row from a song sheet: `[number, title, first line, tune?, page?]`.
pub type SongRow = Vec<String>;

/// A raw service record: the date string and the song-code cells sung that day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SungRow {
    pub date: String,
    #[serde(default)]
    pub songs: Vec<String>,
}

impl SungRow {
    pub fn new(date: &str, songs: &[&str]) -> Self {
        Self {
            date: date.to_string(),
            songs: songs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A raw tune-sheet row: hymn number and tune name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuneRow {
    pub hymn: String,
    pub tune: String,
}

impl TuneRow {
    pub fn new(hymn: &str, tune: &str) -> Self {
        Self {
            hymn: hymn.to_string(),
            tune: tune.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order() {
        assert!(SongCategory::Hymn < SongCategory::Lyric);
        assert!(SongCategory::Lyric < SongCategory::Convention);
        assert!(SongCategory::Convention < SongCategory::Unknown);
    }

    #[test]
    fn test_prefix_roundtrip() {
        for cat in SongCategory::ALL {
            assert_eq!(SongCategory::from_prefix(cat.prefix()), Some(cat));
        }
        assert_eq!(SongCategory::from_prefix('h'), Some(SongCategory::Hymn));
        assert_eq!(SongCategory::from_prefix('X'), None);
        assert_eq!(SongCategory::Unknown.slot(), None);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("H".parse::<SongCategory>(), Ok(SongCategory::Hymn));
        assert_eq!("lyrics".parse::<SongCategory>(), Ok(SongCategory::Lyric));
        assert_eq!(" Convention ".parse::<SongCategory>(), Ok(SongCategory::Convention));
        assert!("psalm".parse::<SongCategory>().is_err());
        assert!("unknown".parse::<SongCategory>().is_err());
    }

    #[test]
    fn test_song_display() {
        let song = Song {
            code: "H-27".to_string(),
            category: SongCategory::Hymn,
            number: 27,
            title: "Amazing Grace".to_string(),
            first_line: Some("Amazing grace how sweet".to_string()),
            tune: None,
            page: None,
        };
        assert_eq!(
            song.to_string(),
            "H-27 - Amazing Grace (Amazing grace how sweet)"
        );
    }
}
