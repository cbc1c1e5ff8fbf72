use once_cell::sync::Lazy;
use regex::Regex;

use super::cue::{decode_cues, encode_cues, encoded_size};
use super::RiffChunk;
use crate::audio::AudioCue;
use crate::error::Result;

pub const VERSE_MARKER_PREFIX: &str = "orature-vm-";

pub(crate) static ORATURE_VERSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^orature-vm-([0-9]+(?:-[0-9]+)?)$").expect("valid verse marker regex"));

pub(crate) static LONE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:-[0-9]+)?$").expect("valid lone digit regex"));

pub(crate) static EMBEDDED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:-[0-9]+)?").expect("valid embedded number regex"));

/// Result of sorting a cue set into verse markers and everything else.
///
/// Verse marker labels carry no namespace: "3" or "3-5".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerseClassification {
    pub verses: Vec<AudioCue>,
    pub extra: Vec<AudioCue>,
}

/// Classify cues by the first verse labeling convention present in the set:
/// `orature-vm-N` labels, then lone digits after trimming, then the first run
/// of digits inside any label. Cues matched by the legacy conventions are also
/// kept verbatim as extra cues.
pub fn classify_verse_cues(cues: Vec<AudioCue>) -> VerseClassification {
    let mut oratures = Vec::new();
    let mut leftover = Vec::new();

    for cue in cues {
        match ORATURE_VERSE.captures(&cue.label) {
            Some(caps) => oratures.push(AudioCue::new(cue.location, &caps[1])),
            None => leftover.push(cue),
        }
    }

    if !oratures.is_empty() {
        return VerseClassification {
            verses: oratures,
            extra: leftover,
        };
    }

    let lone_digits: Vec<AudioCue> = leftover
        .iter()
        .filter(|cue| LONE_DIGITS.is_match(cue.label.trim()))
        .map(|cue| AudioCue::new(cue.location, cue.label.trim()))
        .collect();

    let verses = if !lone_digits.is_empty() {
        lone_digits
    } else {
        leftover
            .iter()
            .filter_map(|cue| {
                EMBEDDED_NUMBER
                    .find(&cue.label)
                    .map(|m| AudioCue::new(cue.location, m.as_str()))
            })
            .collect()
    };

    VerseClassification {
        verses,
        extra: leftover,
    }
}

/// Cue chunk that tracks normalized verse markers separately from other cues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerseMarkerChunk {
    verses: Vec<AudioCue>,
    extra_cues: Vec<AudioCue>,
}

impl VerseMarkerChunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cue; `orature-vm-` labels become verse markers, anything else is kept as is.
    pub fn add_cue(&mut self, cue: AudioCue) {
        match ORATURE_VERSE.captures(&cue.label) {
            Some(caps) => self.verses.push(AudioCue::new(cue.location, &caps[1])),
            None => self.extra_cues.push(cue),
        }
    }

    /// Add a verse marker from its un-namespaced label, e.g. "4" or "4-6".
    pub fn add_verse_marker(&mut self, location: u32, label: impl Into<String>) {
        self.verses.push(AudioCue::new(location, label));
    }

    /// Verse markers with un-namespaced labels.
    pub fn verse_markers(&self) -> &[AudioCue] {
        &self.verses
    }

    pub fn extra_cues(&self) -> &[AudioCue] {
        &self.extra_cues
    }

    /// Every cue as it will be written, sorted by location.
    pub fn cues(&self) -> Vec<AudioCue> {
        let mut cues: Vec<AudioCue> = self
            .verses
            .iter()
            .map(|cue| AudioCue::new(cue.location, format!("{}{}", VERSE_MARKER_PREFIX, cue.label)))
            .chain(self.extra_cues.iter().cloned())
            .collect();
        cues.sort_by_key(|cue| cue.location);
        cues
    }

    pub fn clear(&mut self) {
        self.verses.clear();
        self.extra_cues.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty() && self.extra_cues.is_empty()
    }
}

impl RiffChunk for VerseMarkerChunk {
    fn total_size(&self) -> usize {
        encoded_size(&self.cues())
    }

    fn parse(&mut self, chunk: &[u8]) -> Result<()> {
        let classified = classify_verse_cues(decode_cues(chunk)?);
        self.verses = classified.verses;
        self.extra_cues = classified.extra;
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        encode_cues(&self.cues())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::CueChunk;

    fn cue(location: u32, label: &str) -> AudioCue {
        AudioCue::new(location, label)
    }

    fn labels(cues: &[AudioCue]) -> Vec<&str> {
        cues.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_orature_markers_win_exclusively() {
        let result = classify_verse_cues(vec![cue(0, "orature-vm-1"), cue(100, "2")]);
        assert_eq!(result.verses, vec![cue(0, "1")]);
        assert_eq!(result.extra, vec![cue(100, "2")]);
    }

    #[test]
    fn test_lone_digits_become_verses() {
        let result = classify_verse_cues(vec![cue(0, "1"), cue(100, "2")]);
        assert_eq!(result.verses, vec![cue(0, "1"), cue(100, "2")]);
    }

    #[test]
    fn test_lone_digits_are_trimmed() {
        let result = classify_verse_cues(vec![
            cue(0, " 3"),
            cue(1, "4\n"),
            cue(2, "\t5 "),
            cue(3, "Verse 6"),
        ]);
        assert_eq!(labels(&result.verses), vec!["3", "4", "5"]);
        assert_eq!(result.extra.len(), 4);
    }

    #[test]
    fn test_non_ascii_digits_are_not_verses() {
        let result = classify_verse_cues(vec![cue(0, "٣"), cue(10, "Verse ٤")]);
        assert!(result.verses.is_empty());
        assert_eq!(labels(&result.extra), vec!["٣", "Verse ٤"]);
    }

    #[test]
    fn test_embedded_numbers_are_a_fallback() {
        let result = classify_verse_cues(vec![
            cue(0, "    "),
            cue(2, "Verse 2"),
            cue(3, "Marker 3   "),
            cue(u32::MAX, " stuff5 "),
        ]);
        assert_eq!(
            result.verses,
            vec![cue(2, "2"), cue(3, "3"), cue(u32::MAX, "5")]
        );
        assert_eq!(result.extra.len(), 4);
    }

    #[test]
    fn test_ranges_are_preserved() {
        let result = classify_verse_cues(vec![cue(0, "orature-vm-3-5"), cue(10, "orature-vm-6")]);
        assert_eq!(labels(&result.verses), vec!["3-5", "6"]);
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_no_convention_leaves_everything_extra() {
        let result = classify_verse_cues(vec![cue(0, "intro"), cue(5, "outro")]);
        assert!(result.verses.is_empty());
        assert_eq!(result.extra.len(), 2);
    }

    #[test]
    fn test_legacy_labels_are_rewritten_with_prefix() {
        let legacy = CueChunk::with_cues(vec![cue(2, "2"), cue(1, "1"), cue(3, "3")]).to_bytes();

        let mut chunk = VerseMarkerChunk::new();
        chunk.parse(&legacy).unwrap();

        let mut reread = CueChunk::new();
        reread.parse(&chunk.to_bytes()).unwrap();
        let mut found = labels(reread.cues())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(
            found,
            vec!["1", "2", "3", "orature-vm-1", "orature-vm-2", "orature-vm-3"]
        );
    }

    #[test]
    fn test_reparse_is_stable() {
        let mut chunk = VerseMarkerChunk::new();
        chunk.parse(&CueChunk::with_cues(vec![cue(0, "123"), cue(9, "Verse 2")]).to_bytes())
            .unwrap();
        let first = chunk.to_bytes();

        let mut again = VerseMarkerChunk::new();
        again.parse(&first).unwrap();
        assert_eq!(again.to_bytes(), first);
        assert_eq!(again.verse_markers(), &[cue(0, "123")]);
    }

    #[test]
    fn test_add_cue_splits_by_prefix() {
        let mut chunk = VerseMarkerChunk::new();
        chunk.add_cue(cue(10, "orature-vm-2"));
        chunk.add_cue(cue(5, "orature-chapter-1"));
        chunk.add_verse_marker(20, "3-4");

        assert_eq!(chunk.verse_markers(), &[cue(10, "2"), cue(20, "3-4")]);
        assert_eq!(chunk.extra_cues(), &[cue(5, "orature-chapter-1")]);
        assert_eq!(
            labels(&chunk.cues()),
            vec!["orature-chapter-1", "orature-vm-2", "orature-vm-3-4"]
        );
        assert_eq!(chunk.total_size(), chunk.to_bytes().len());
    }
}
