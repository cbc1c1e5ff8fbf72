use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{AudioMarker, BOOK_MARKER_PREFIX, CHAPTER_MARKER_PREFIX};
use crate::error::{Result, WavMarkError};
use crate::riff::verse::VERSE_MARKER_PREFIX;

static BOOK_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9]{3}) 0$").expect("valid book title regex"));

static CHAPTER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3} ([0-9]+):0$").expect("valid chapter title regex"));

static CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3} ([0-9]+)$").expect("valid chapter regex"));

static VERSE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3} [0-9]+:([0-9]+)$").expect("valid verse regex"));

static VERSE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3} [0-9]+:([0-9]+)-([0-9]+)$").expect("valid verse range regex"));

type Rule = fn(&Captures<'_>) -> Option<String>;

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn book_label(caps: &Captures<'_>) -> Option<String> {
    Some(format!("{}{}", BOOK_MARKER_PREFIX, caps[1].to_lowercase()))
}

fn chapter_label(caps: &Captures<'_>) -> Option<String> {
    Some(format!("{}{}", CHAPTER_MARKER_PREFIX, number(caps, 1)?))
}

fn verse_label(caps: &Captures<'_>) -> Option<String> {
    Some(format!("{}{}", VERSE_MARKER_PREFIX, number(caps, 1)?))
}

fn verse_range_label(caps: &Captures<'_>) -> Option<String> {
    Some(format!(
        "{}{}-{}",
        VERSE_MARKER_PREFIX,
        number(caps, 1)?,
        number(caps, 2)?
    ))
}

/// Normalize a reference into a cue label; anything unrecognized comes back unchanged.
///
/// ```
/// use wavmark::markers::parse_biblical_reference;
///
/// assert_eq!(parse_biblical_reference("MAT 0"), "orature-book-mat");
/// assert_eq!(parse_biblical_reference("MAT 1:0"), "orature-chapter-1");
/// assert_eq!(parse_biblical_reference("MAT 1:3-5"), "orature-vm-3-5");
/// ```
pub fn parse_biblical_reference(text: &str) -> String {
    let rules: [(&Lazy<Regex>, Rule); 5] = [
        (&BOOK_TITLE, book_label),
        (&CHAPTER_TITLE, chapter_label),
        (&CHAPTER, chapter_label),
        (&VERSE_TITLE, verse_label),
        (&VERSE_RANGE, verse_range_label),
    ];

    rules
        .iter()
        .find_map(|(pattern, rule)| pattern.captures(text).map(|caps| rule(&caps)))
        .flatten()
        .unwrap_or_else(|| text.to_string())
}

/// Render `marker` as a reference like "MAT 1:3".
///
/// Everything but book and unknown markers needs the book slug and chapter.
pub fn to_biblical_reference(
    marker: &AudioMarker,
    book_slug: Option<&str>,
    chapter_number: Option<u32>,
) -> Result<String> {
    let context = || -> Result<(String, u32)> {
        match (book_slug, chapter_number) {
            (Some(slug), Some(chapter)) => Ok((slug.to_uppercase(), chapter)),
            _ => Err(WavMarkError::MissingReference(format!(
                "{} needs a book slug and chapter number",
                marker.formatted_label()
            ))),
        }
    };

    match marker {
        AudioMarker::Book { book_slug, .. } => Ok(format!("{} 0", book_slug.to_uppercase())),
        AudioMarker::Chapter { chapter_number, .. } => {
            let (book, _) = context()?;
            Ok(format!("{} {}:0", book, chapter_number))
        }
        AudioMarker::Chunk { chunk, .. } => {
            let (book, chapter) = context()?;
            Ok(format!("{} {}:{}", book, chapter, chunk))
        }
        AudioMarker::Verse { .. } => {
            let (book, chapter) = context()?;
            Ok(format!("{} {}:{}", book, chapter, marker.label()))
        }
        AudioMarker::Unknown { label, .. } => Ok(label.clone()),
    }
}
