mod collection;
mod file;
mod parser;
mod reference;

pub use collection::OratureMarkers;
pub use file::OratureAudioFile;
pub use parser::{
    BookMarkerParser, ChapterMarkerParser, ChunkMarkerParser, MarkerParseResult, MarkerParser,
    OratureCueParser, VerseMarkerParser,
};
pub use reference::{parse_biblical_reference, to_biblical_reference};

use serde::{Deserialize, Serialize};

use crate::audio::AudioCue;
use crate::riff::verse::VERSE_MARKER_PREFIX;

pub const CHUNK_MARKER_PREFIX: &str = "orature-chunk-";
pub const CHAPTER_MARKER_PREFIX: &str = "orature-chapter-";
pub const BOOK_MARKER_PREFIX: &str = "orature-book-";

// Sort starts spaced so every marker in a file orders book, chapter, verse.
pub const BOOK_SORT_START: u64 = 0;
pub const CHAPTER_SORT_START: u64 = 1_000;
pub const VERSE_SORT_START: u64 = 10_000;
pub const CHUNK_SORT_START: u64 = 100_000;
pub const UNKNOWN_SORT_START: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Title,
    Content,
    Metadata,
    Unknown,
}

/// Bucket a marker is stored under in [`OratureMarkers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OratureCueType {
    Verse,
    Chunk,
    ChapterTitle,
    BookTitle,
    Unknown,
}

impl OratureCueType {
    pub const ALL: [OratureCueType; 5] = [
        OratureCueType::BookTitle,
        OratureCueType::ChapterTitle,
        OratureCueType::Verse,
        OratureCueType::Chunk,
        OratureCueType::Unknown,
    ];
}

impl std::fmt::Display for OratureCueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OratureCueType::Verse => write!(f, "verse"),
            OratureCueType::Chunk => write!(f, "chunk"),
            OratureCueType::ChapterTitle => write!(f, "chapter"),
            OratureCueType::BookTitle => write!(f, "book"),
            OratureCueType::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for OratureCueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verse" => Ok(OratureCueType::Verse),
            "chunk" => Ok(OratureCueType::Chunk),
            "chapter" | "chapter_title" => Ok(OratureCueType::ChapterTitle),
            "book" | "book_title" => Ok(OratureCueType::BookTitle),
            "unknown" => Ok(OratureCueType::Unknown),
            _ => Err(format!(
                "Unknown marker kind: {}. Use 'verse', 'chunk', 'chapter', 'book' or 'unknown'",
                s
            )),
        }
    }
}

/// A cue whose label has been given meaning.
///
/// `location` is a frame offset, like [`AudioCue::location`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioMarker {
    #[serde(rename = "book_marker")]
    Book { book_slug: String, location: u32 },
    #[serde(rename = "chapter_marker")]
    Chapter { chapter_number: u32, location: u32 },
    #[serde(rename = "chunk_marker")]
    Chunk { chunk: u32, location: u32 },
    /// `end == start` for a single verse.
    #[serde(rename = "verse_marker")]
    Verse { start: u32, end: u32, location: u32 },
    #[serde(rename = "unknown_marker")]
    Unknown { label: String, location: u32 },
}

impl AudioMarker {
    pub fn book(book_slug: impl Into<String>, location: u32) -> Self {
        AudioMarker::Book {
            book_slug: book_slug.into(),
            location,
        }
    }

    pub fn chapter(chapter_number: u32, location: u32) -> Self {
        AudioMarker::Chapter {
            chapter_number,
            location,
        }
    }

    pub fn chunk(chunk: u32, location: u32) -> Self {
        AudioMarker::Chunk { chunk, location }
    }

    pub fn verse(start: u32, end: u32, location: u32) -> Self {
        AudioMarker::Verse {
            start,
            end,
            location,
        }
    }

    pub fn unknown(label: impl Into<String>, location: u32) -> Self {
        AudioMarker::Unknown {
            label: label.into(),
            location,
        }
    }

    pub fn location(&self) -> u32 {
        match self {
            AudioMarker::Book { location, .. }
            | AudioMarker::Chapter { location, .. }
            | AudioMarker::Chunk { location, .. }
            | AudioMarker::Verse { location, .. }
            | AudioMarker::Unknown { location, .. } => *location,
        }
    }

    /// The label without namespacing, most often a verse number or range.
    pub fn label(&self) -> String {
        match self {
            AudioMarker::Book { book_slug, .. } => book_slug.clone(),
            AudioMarker::Chapter { chapter_number, .. } => chapter_number.to_string(),
            AudioMarker::Chunk { chunk, .. } => chunk.to_string(),
            AudioMarker::Verse { start, end, .. } if start != end => format!("{}-{}", start, end),
            AudioMarker::Verse { start, .. } => start.to_string(),
            AudioMarker::Unknown { label, .. } => label.clone(),
        }
    }

    /// The label as stored in a cue, e.g. `orature-vm-3`.
    pub fn formatted_label(&self) -> String {
        let prefix = match self {
            AudioMarker::Book { .. } => BOOK_MARKER_PREFIX,
            AudioMarker::Chapter { .. } => CHAPTER_MARKER_PREFIX,
            AudioMarker::Chunk { .. } => CHUNK_MARKER_PREFIX,
            AudioMarker::Verse { .. } => VERSE_MARKER_PREFIX,
            AudioMarker::Unknown { .. } => "",
        };
        format!("{}{}", prefix, self.label())
    }

    pub fn marker_type(&self) -> MarkerType {
        match self {
            AudioMarker::Book { .. } | AudioMarker::Chapter { .. } => MarkerType::Title,
            AudioMarker::Chunk { .. } | AudioMarker::Verse { .. } => MarkerType::Content,
            AudioMarker::Unknown { .. } => MarkerType::Unknown,
        }
    }

    pub fn cue_type(&self) -> OratureCueType {
        match self {
            AudioMarker::Book { .. } => OratureCueType::BookTitle,
            AudioMarker::Chapter { .. } => OratureCueType::ChapterTitle,
            AudioMarker::Chunk { .. } => OratureCueType::Chunk,
            AudioMarker::Verse { .. } => OratureCueType::Verse,
            AudioMarker::Unknown { .. } => OratureCueType::Unknown,
        }
    }

    /// Key that orders markers book, chapter, verse, chunk, then unknown by position.
    pub fn sort_key(&self) -> u64 {
        match self {
            AudioMarker::Book { .. } => BOOK_SORT_START,
            AudioMarker::Chapter { chapter_number, .. } => {
                CHAPTER_SORT_START + *chapter_number as u64
            }
            AudioMarker::Verse { start, .. } => VERSE_SORT_START + *start as u64,
            AudioMarker::Chunk { chunk, .. } => CHUNK_SORT_START + *chunk as u64,
            AudioMarker::Unknown { location, .. } => UNKNOWN_SORT_START + *location as u64,
        }
    }

    pub fn to_cue(&self) -> AudioCue {
        AudioCue::new(self.location(), self.formatted_label())
    }

    /// The same marker moved to `location`.
    pub fn with_location(&self, location: u32) -> Self {
        let mut marker = self.clone();
        match &mut marker {
            AudioMarker::Book { location: l, .. }
            | AudioMarker::Chapter { location: l, .. }
            | AudioMarker::Chunk { location: l, .. }
            | AudioMarker::Verse { location: l, .. }
            | AudioMarker::Unknown { location: l, .. } => *l = location,
        }
        marker
    }
}

impl From<AudioCue> for AudioMarker {
    fn from(cue: AudioCue) -> Self {
        AudioMarker::Unknown {
            label: cue.label,
            location: cue.location,
        }
    }
}

impl std::fmt::Display for AudioMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted_label())
    }
}

/// A marker and the frames it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerSpan {
    pub marker: AudioMarker,
    pub start: u32,
    pub end: u32,
}

/// Order markers by location and give each one an end: the next marker's start,
/// or `total_frames` for the last.
pub fn marker_spans(markers: &[AudioMarker], total_frames: u32) -> Vec<MarkerSpan> {
    let mut sorted: Vec<&AudioMarker> = markers.iter().collect();
    sorted.sort_by_key(|m| m.location());

    sorted
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let start = marker.location();
            let end = sorted
                .get(i + 1)
                .map(|next| next.location())
                .unwrap_or_else(|| total_frames.max(start));
            MarkerSpan {
                marker: (*marker).clone(),
                start,
                end,
            }
        })
        .collect()
}
