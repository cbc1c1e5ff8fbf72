use std::io::Write;

use crate::audio::AudioCue;
use crate::error::Result;
use crate::riff::{CueChunk, RiffChunk, VerseMarkerChunk};

/// A chunk codec that can live in the metadata trailing the audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataChunk {
    Cue(CueChunk),
    VerseMarker(VerseMarkerChunk),
}

impl MetadataChunk {
    fn codec(&self) -> &dyn RiffChunk {
        match self {
            MetadataChunk::Cue(chunk) => chunk,
            MetadataChunk::VerseMarker(chunk) => chunk,
        }
    }

    fn codec_mut(&mut self) -> &mut dyn RiffChunk {
        match self {
            MetadataChunk::Cue(chunk) => chunk,
            MetadataChunk::VerseMarker(chunk) => chunk,
        }
    }

    pub fn add_cue(&mut self, cue: AudioCue) {
        match self {
            MetadataChunk::Cue(chunk) => chunk.add_cue(cue),
            MetadataChunk::VerseMarker(chunk) => chunk.add_cue(cue),
        }
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        match self {
            MetadataChunk::Cue(chunk) => chunk.cues().to_vec(),
            MetadataChunk::VerseMarker(chunk) => chunk.cues(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            MetadataChunk::Cue(chunk) => chunk.clear(),
            MetadataChunk::VerseMarker(chunk) => chunk.clear(),
        }
    }
}

/// The set of chunk codecs used to read and write a file's trailing metadata.
///
/// Cues added through this type go to the first chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavMetadata {
    chunks: Vec<MetadataChunk>,
}

impl Default for WavMetadata {
    fn default() -> Self {
        Self::verse_markers()
    }
}

impl WavMetadata {
    pub fn with_chunks(chunks: Vec<MetadataChunk>) -> Self {
        Self { chunks }
    }

    /// Metadata that normalizes verse labels to `orature-vm-N`.
    pub fn verse_markers() -> Self {
        Self::with_chunks(vec![MetadataChunk::VerseMarker(VerseMarkerChunk::new())])
    }

    /// Metadata that keeps cue labels exactly as stored.
    pub fn cues() -> Self {
        Self::with_chunks(vec![MetadataChunk::Cue(CueChunk::new())])
    }

    pub fn chunks(&self) -> &[MetadataChunk] {
        &self.chunks
    }

    /// Hand the metadata bytes to every chunk codec.
    pub fn parse_metadata(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in &mut self.chunks {
            chunk.codec_mut().parse(bytes)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.total_size());
        for chunk in &self.chunks {
            bytes.extend(chunk.codec().to_bytes());
        }
        bytes
    }

    pub fn write_metadata<W: Write>(&self, out: &mut W) -> Result<()> {
        for chunk in &self.chunks {
            let bytes = chunk.codec().to_bytes();
            if !bytes.is_empty() {
                out.write_all(&bytes)?;
            }
        }
        Ok(())
    }

    pub fn total_size(&self) -> usize {
        self.chunks.iter().map(|c| c.codec().total_size()).sum()
    }

    pub fn add_cue(&mut self, location: u32, label: impl Into<String>) {
        if let Some(chunk) = self.chunks.first_mut() {
            chunk.add_cue(AudioCue::new(location, label));
        }
    }

    pub fn get_cues(&self) -> Vec<AudioCue> {
        self.chunks.first().map(|c| c.cues()).unwrap_or_default()
    }

    pub fn clear_markers(&mut self) {
        for chunk in &mut self.chunks {
            chunk.clear();
        }
    }
}
