use std::path::Path;

use tracing::info;

use super::parser::{parse_verse_range, OratureCueParser};
use super::{marker_spans, AudioMarker, MarkerSpan, OratureCueType, OratureMarkers};
use crate::audio::AudioCue;
use crate::error::Result;
use crate::wav::{WavFile, WavMetadata, WavStreamWriter};

/// A WAV file viewed as typed markers.
///
/// Markers are parsed once on open and only reach the file on
/// [`update`](Self::update) or when a [`writer`](Self::writer) closes.
#[derive(Debug, Clone)]
pub struct OratureAudioFile {
    wav: WavFile,
    markers: OratureMarkers,
}

impl OratureAudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_wav(WavFile::open(path)?))
    }

    pub fn open_with_metadata(path: impl AsRef<Path>, metadata: WavMetadata) -> Result<Self> {
        Ok(Self::from_wav(WavFile::open_with_metadata(path, metadata)?))
    }

    /// Create an empty file with the given format.
    pub fn create(
        path: impl AsRef<Path>,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> Result<Self> {
        let wav = WavFile::create(
            path,
            channels,
            sample_rate,
            bits_per_sample,
            WavMetadata::default(),
        )?;
        Ok(Self::from_wav(wav))
    }

    pub fn from_wav(wav: WavFile) -> Self {
        let markers = OratureCueParser::parse(wav.cues());
        Self { wav, markers }
    }

    pub fn wav(&self) -> &WavFile {
        &self.wav
    }

    pub fn markers(&self, cue_type: OratureCueType) -> Vec<AudioMarker> {
        self.markers.markers(cue_type)
    }

    pub fn all_markers(&self) -> Vec<AudioMarker> {
        self.markers.all_markers()
    }

    pub fn add_marker(&self, marker: AudioMarker) {
        self.markers.add_marker(marker.cue_type(), marker);
    }

    /// Add a raw cue, typed by the same rules used when opening a file.
    pub fn add_cue(&self, location: u32, label: impl Into<String>) {
        self.import_cues(vec![AudioCue::new(location, label)]);
    }

    pub fn import_cues(&self, cues: Vec<AudioCue>) {
        self.markers.import(&OratureCueParser::parse(cues));
    }

    /// Add a verse marker from "3" or "3-5". Returns false if `label` is neither.
    pub fn add_verse_marker(&self, location: u32, label: &str) -> bool {
        match parse_verse_range(label.trim()) {
            Some((start, end)) => {
                self.add_marker(AudioMarker::verse(start, end, location));
                true
            }
            None => false,
        }
    }

    pub fn clear_markers_of_type(&self, cue_type: OratureCueType) {
        self.markers.clear_markers_of_type(cue_type);
    }

    /// All markers as namespaced cues.
    pub fn cues(&self) -> Vec<AudioCue> {
        self.markers.cues()
    }

    /// Book, chapter and verse markers, in that order.
    pub fn verse_and_title_markers(&self) -> Vec<AudioMarker> {
        [
            OratureCueType::BookTitle,
            OratureCueType::ChapterTitle,
            OratureCueType::Verse,
        ]
        .into_iter()
        .flat_map(|cue_type| self.markers.markers(cue_type))
        .collect()
    }

    /// Every marker with the frames it covers.
    pub fn spans(&self) -> Vec<MarkerSpan> {
        marker_spans(&self.all_markers(), self.total_frames())
    }

    pub fn total_frames(&self) -> u32 {
        self.wav.total_frames()
    }

    fn sync_metadata(&mut self) {
        let cues = self.markers.cues();
        let metadata = self.wav.metadata_mut();
        metadata.clear_markers();
        for cue in cues {
            metadata.add_cue(cue.location, cue.label);
        }
    }

    /// Write the current markers back into the file.
    pub fn update(&mut self) -> Result<()> {
        self.sync_metadata();
        self.wav.update()?;
        info!(
            "Updated {} markers in {:?}",
            self.markers.len(),
            self.wav.path()
        );
        Ok(())
    }

    /// Stream audio into the file; the current markers are written when it closes.
    pub fn writer(&mut self, append: bool) -> Result<WavStreamWriter<'_>> {
        self.sync_metadata();
        WavStreamWriter::new(&mut self.wav, append)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_markers_survive_update() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("markers.wav");

        let mut audio = OratureAudioFile::create(&path, 1, 44100, 16).unwrap();
        {
            let mut writer = audio.writer(false).unwrap();
            writer.write_pcm(&[0u8; 400]).unwrap();
            writer.close().unwrap();
        }
        audio.add_marker(AudioMarker::chapter(1, 0));
        assert!(audio.add_verse_marker(0, "1"));
        assert!(audio.add_verse_marker(100, " 2-3 "));
        assert!(!audio.add_verse_marker(150, "two"));
        audio.update().unwrap();

        let reopened = OratureAudioFile::open(&path).unwrap();
        assert_eq!(reopened.total_frames(), 200);
        assert_eq!(
            reopened.markers(OratureCueType::Verse),
            vec![AudioMarker::verse(1, 1, 0), AudioMarker::verse(2, 3, 100)]
        );
        assert_eq!(
            reopened.markers(OratureCueType::ChapterTitle),
            vec![AudioMarker::chapter(1, 0)]
        );
        assert!(reopened.markers(OratureCueType::Unknown).is_empty());
    }

    #[test]
    fn test_clear_markers_of_type_then_update() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clear.wav");

        let mut audio = OratureAudioFile::create(&path, 1, 44100, 16).unwrap();
        audio.add_cue(0, "orature-vm-1");
        audio.add_cue(10, "orature-chunk-1");
        audio.update().unwrap();

        audio.clear_markers_of_type(OratureCueType::Verse);
        audio.update().unwrap();

        let reopened = OratureAudioFile::open(&path).unwrap();
        assert!(reopened.markers(OratureCueType::Verse).is_empty());
        assert_eq!(
            reopened.markers(OratureCueType::Chunk),
            vec![AudioMarker::chunk(1, 10)]
        );
    }

    #[test]
    fn test_verse_and_title_markers_order() {
        let dir = tempdir().unwrap();
        let audio = OratureAudioFile::create(dir.path().join("o.wav"), 1, 44100, 16).unwrap();
        audio.add_marker(AudioMarker::verse(1, 1, 10));
        audio.add_marker(AudioMarker::chunk(1, 10));
        audio.add_marker(AudioMarker::book("rut", 0));
        audio.add_marker(AudioMarker::chapter(1, 5));

        assert_eq!(
            audio.verse_and_title_markers(),
            vec![
                AudioMarker::book("rut", 0),
                AudioMarker::chapter(1, 5),
                AudioMarker::verse(1, 1, 10)
            ]
        );
    }
}
