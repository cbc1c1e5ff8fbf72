use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{AudioMarker, OratureCueType, OratureMarkers};
use crate::audio::AudioCue;
use crate::riff::verse::classify_verse_cues;

static ORATURE_NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-.*$").expect("valid namespace regex"));

static VERSE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-vm-([0-9]+)(?:-([0-9]+))?$").expect("valid verse marker regex"));

static VERSE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:-([0-9]+))?$").expect("valid verse range regex"));

static CHUNK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-chunk-([0-9]+)$").expect("valid chunk marker regex"));

static CHAPTER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-chapter-([0-9]+)$").expect("valid chapter marker regex"));

static BOOK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-book-(.+)$").expect("valid book marker regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerParseResult {
    pub accepted: Vec<AudioMarker>,
    pub rejected: Vec<AudioCue>,
}

/// Recognizes one kind of marker among raw cues.
pub trait MarkerParser {
    fn cue_type(&self) -> OratureCueType;

    fn match_cue(&self, cue: &AudioCue) -> Option<AudioMarker>;

    /// Split `cues` into markers of this kind and everything else.
    fn parse(&self, cues: Vec<AudioCue>) -> MarkerParseResult {
        let mut result = MarkerParseResult::default();
        for cue in cues {
            match self.match_cue(&cue) {
                Some(marker) => result.accepted.push(marker),
                None => result.rejected.push(cue),
            }
        }
        result
    }
}

/// Parse "3" or "3-5" into a start and end verse.
pub(crate) fn parse_verse_range(text: &str) -> Option<(u32, u32)> {
    let caps = VERSE_RANGE.captures(text)?;
    range_from_captures(&caps)
}

fn range_from_captures(caps: &regex::Captures<'_>) -> Option<(u32, u32)> {
    let start = caps.get(1)?.as_str().parse().ok()?;
    let end = match caps.get(2) {
        Some(end) => end.as_str().parse().ok()?,
        None => start,
    };
    Some((start, end))
}

fn single_number(pattern: &Regex, label: &str) -> Option<u32> {
    pattern.captures(label)?.get(1)?.as_str().parse().ok()
}

/// Verse markers, including legacy labels in files without `orature-` cues.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerseMarkerParser;

impl MarkerParser for VerseMarkerParser {
    fn cue_type(&self) -> OratureCueType {
        OratureCueType::Verse
    }

    fn match_cue(&self, cue: &AudioCue) -> Option<AudioMarker> {
        let caps = VERSE_MARKER.captures(&cue.label)?;
        let (start, end) = range_from_captures(&caps)?;
        Some(AudioMarker::verse(start, end, cue.location))
    }

    /// Namespaced files only yield `orature-vm-` markers. Files with no
    /// `orature-` labels at all fall back to lone digits, then to the first
    /// number in each label; those cues are still passed on as rejected.
    fn parse(&self, cues: Vec<AudioCue>) -> MarkerParseResult {
        if cues.iter().any(|cue| ORATURE_NAMESPACE.is_match(&cue.label)) {
            let mut result = MarkerParseResult::default();
            for cue in cues {
                match self.match_cue(&cue) {
                    Some(marker) => result.accepted.push(marker),
                    None => result.rejected.push(cue),
                }
            }
            return result;
        }

        let classified = classify_verse_cues(cues);
        if !classified.verses.is_empty() {
            debug!(
                "Recognized {} legacy verse labels among {} cues",
                classified.verses.len(),
                classified.extra.len()
            );
        }

        MarkerParseResult {
            accepted: classified
                .verses
                .iter()
                .filter_map(|cue| {
                    parse_verse_range(&cue.label)
                        .map(|(start, end)| AudioMarker::verse(start, end, cue.location))
                })
                .collect(),
            rejected: classified.extra,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkMarkerParser;

impl MarkerParser for ChunkMarkerParser {
    fn cue_type(&self) -> OratureCueType {
        OratureCueType::Chunk
    }

    fn match_cue(&self, cue: &AudioCue) -> Option<AudioMarker> {
        single_number(&CHUNK_MARKER, &cue.label).map(|n| AudioMarker::chunk(n, cue.location))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterMarkerParser;

impl MarkerParser for ChapterMarkerParser {
    fn cue_type(&self) -> OratureCueType {
        OratureCueType::ChapterTitle
    }

    fn match_cue(&self, cue: &AudioCue) -> Option<AudioMarker> {
        single_number(&CHAPTER_MARKER, &cue.label).map(|n| AudioMarker::chapter(n, cue.location))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BookMarkerParser;

impl MarkerParser for BookMarkerParser {
    fn cue_type(&self) -> OratureCueType {
        OratureCueType::BookTitle
    }

    fn match_cue(&self, cue: &AudioCue) -> Option<AudioMarker> {
        let caps = BOOK_MARKER.captures(&cue.label)?;
        Some(AudioMarker::book(&caps[1], cue.location))
    }
}

/// Runs the marker parsers in order, each one seeing the previous one's rejects.
///
/// Cues nobody accepts become unknown markers, so no cue is lost.
pub struct OratureCueParser;

impl OratureCueParser {
    pub fn parse(cues: Vec<AudioCue>) -> OratureMarkers {
        let parsers: [&dyn MarkerParser; 4] = [
            &VerseMarkerParser,
            &ChunkMarkerParser,
            &ChapterMarkerParser,
            &BookMarkerParser,
        ];

        let markers = OratureMarkers::new();
        let mut remaining = cues;
        for parser in parsers {
            let result = parser.parse(remaining);
            markers.add_markers(parser.cue_type(), result.accepted);
            remaining = result.rejected;
        }
        markers.add_markers(
            OratureCueType::Unknown,
            remaining.into_iter().map(AudioMarker::from).collect(),
        );
        markers
    }
}
