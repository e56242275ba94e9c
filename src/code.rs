//! Song-code recognition.
//!
//! A song code names one song within one category: `H-27`, `L-5`, `C-12`.
//! Users type them in many shapes (`h27`, `H 27`, `h - 27`), and they turn up
//! embedded in arbitrary chat text, so parsing here is speculative: failure
//! means "not a code", never a hard error for the caller.
//!
//! Two entry points exist:
//!
//! - [`SongCode::parse`] is the strict parser for text that should be *only*
//!   a code (the explicit check flow).
//! - [`extract_first`] scans free text, takes the first substring shaped like
//!   a code and hands exactly that substring to the strict parser. There is no
//!   fallback to later candidates.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::SongCategory;

/// Loose shape of a code inside free text.
///
/// Digits are ASCII only; Unicode `\d` would admit numerals the strict parser
/// rejects and shadow a valid code later in the text.
static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[HLC]-?[0-9]+").expect("valid song code pattern"));

/// Why a piece of text is not a song code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("empty input")]
    Empty,
    #[error("'{0}' is not a song category prefix (expected H, L or C)")]
    UnknownPrefix(char),
    #[error("no song number after the category letter")]
    MissingNumber,
    #[error("unexpected characters in song number: '{0}'")]
    NonDigit(String),
    #[error("song numbers start at 1")]
    Zero,
    #[error("song number '{0}' is too large")]
    TooLarge(String),
}

/// A validated song code: a real category and a number ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SongCode {
    category: SongCategory,
    number: u32,
}

impl SongCode {
    /// Build a code from parts. Returns `None` for `Unknown` or zero.
    pub fn new(category: SongCategory, number: u32) -> Option<Self> {
        if category == SongCategory::Unknown || number == 0 {
            return None;
        }
        Some(Self { category, number })
    }

    pub fn category(&self) -> SongCategory {
        self.category
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Strictly parse text that should contain nothing but a code.
    ///
    /// Case is folded and spaces are dropped anywhere; then the text must be a
    /// category letter, at most one hyphen, and digits only. Leading zeros are
    /// accepted (`H-007` is hymn 7).
    ///
    /// Hyphens are not stripped wholesale: only one, directly after the
    /// letter, is allowed. `-H27`, `H27-` and `H--5` are rejected even though
    /// stripping every hyphen would accept them; [`standardize`] is the
    /// forgiving path for such input.
    ///
    /// [`standardize`]: crate::vocabulary::standardize
    pub fn parse(text: &str) -> Result<Self, CodeError> {
        let cleaned: String = text
            .chars()
            .filter(|c| *c != ' ')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let mut chars = cleaned.chars();
        let first = chars.next().ok_or(CodeError::Empty)?;
        let category = SongCategory::from_prefix(first).ok_or(CodeError::UnknownPrefix(first))?;

        let rest = chars.as_str();
        let digits = rest.strip_prefix('-').unwrap_or(rest);
        if digits.is_empty() {
            return Err(CodeError::MissingNumber);
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CodeError::NonDigit(digits.to_string()));
        }

        let number: u32 = digits
            .parse()
            .map_err(|_| CodeError::TooLarge(digits.to_string()))?;
        if number == 0 {
            return Err(CodeError::Zero);
        }

        Ok(Self { category, number })
    }

    /// Canonical string form, e.g. `H-27`.
    pub fn canonical(&self) -> String {
        format(self.category, self.number)
    }
}

impl fmt::Display for SongCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category.prefix(), self.number)
    }
}

impl FromStr for SongCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SongCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Canonical `<prefix>-<number>` form. No leading zeros.
pub fn format(category: SongCategory, number: u32) -> String {
    format!("{}-{}", category.prefix(), number)
}

/// Whether anything shaped like a code appears anywhere in `text`.
pub fn contains_code(text: &str) -> bool {
    CODE_PATTERN.is_match(text)
}

/// Find the first code-shaped substring and strictly parse exactly that.
///
/// If the first candidate fails strict parsing (e.g. `H-0`), the result is
/// `None` even when a valid code appears later in the text.
pub fn extract_first(text: &str) -> Option<SongCode> {
    let candidate = CODE_PATTERN.find(text)?;
    SongCode::parse(candidate.as_str()).ok()
}
