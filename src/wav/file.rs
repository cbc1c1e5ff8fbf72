use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use super::header::{WavHeader, WavType};
use super::metadata::WavMetadata;
use super::writer::WavStreamWriter;
use crate::audio::AudioCue;
use crate::error::{Result, WavMarkError};
use crate::riff::{CHUNK_HEADER_SIZE, CHUNK_LABEL_SIZE, CUE_LABEL, LIST_LABEL};

/// A WAV file on disk plus its parsed header and marker metadata.
///
/// The file is only touched inside individual calls; no handle is held open.
#[derive(Debug, Clone)]
pub struct WavFile {
    path: PathBuf,
    header: WavHeader,
    metadata: WavMetadata,
}

impl WavFile {
    /// Open an existing file, normalizing verse markers in its metadata.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_metadata(path, WavMetadata::default())
    }

    /// Open an existing file, parsing its trailing metadata with `metadata`'s codecs.
    pub fn open_with_metadata(path: impl AsRef<Path>, metadata: WavMetadata) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = WavHeader::parse(&path)?;
        let mut wav = Self {
            path,
            header,
            metadata,
        };
        wav.parse_metadata()?;
        Ok(wav)
    }

    /// Create (or overwrite) `path` as an empty WAV file with the given format.
    pub fn create(
        path: impl AsRef<Path>,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        metadata: WavMetadata,
    ) -> Result<Self> {
        let mut wav = Self {
            path: path.as_ref().to_path_buf(),
            header: WavHeader::new(sample_rate, channels, bits_per_sample),
            metadata,
        };
        wav.initialize_empty()?;
        Ok(wav)
    }

    fn parse_metadata(&mut self) -> Result<()> {
        let mut file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let Some((start, end)) = self.header.metadata_range(file_len) else {
            return Ok(());
        };

        let mut bytes = vec![0u8; (end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut bytes)?;
        debug!("Reading {} bytes of metadata from {:?}", bytes.len(), self.path);

        let pad = data_pad_length(self.header.total_audio_length, &bytes);
        self.metadata.parse_metadata(&bytes[pad..]).map_err(|e| {
            error!("Error parsing metadata for file {:?}: {}", self.path, e);
            e
        })
    }

    /// Write a fresh header with no audio, truncating anything already in the file.
    pub fn initialize_empty(&mut self) -> Result<()> {
        self.header = WavHeader::new(
            self.header.sample_rate,
            self.header.channels,
            self.header.bits_per_sample,
        );

        let mut file = File::create(&self.path)?;
        file.write_all(&self.header.to_bytes())?;
        file.flush()?;
        info!(
            "Initialized wav header for {:?} ({} Hz, {} ch, {} bit)",
            self.path, self.header.sample_rate, self.header.channels, self.header.bits_per_sample
        );
        Ok(())
    }

    /// Record a new audio length and recompute the RIFF size.
    pub(crate) fn finish_write(&mut self, total_audio_length: u32) -> Result<()> {
        let riff_size = self.header.header_size - CHUNK_HEADER_SIZE as u64
            + total_audio_length as u64
            + self.metadata.total_size() as u64;
        let total_data_length = u32::try_from(riff_size).map_err(|_| {
            WavMarkError::invalid_wav(format!("riff size {} does not fit a wav header", riff_size))
        })?;

        self.header.total_audio_length = total_audio_length;
        self.header.total_data_length = total_data_length;
        Ok(())
    }

    /// Set the audio length and patch both size fields of the header on disk.
    pub fn finalize(&mut self, total_audio_length: u32) -> Result<()> {
        self.finish_write(total_audio_length)?;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        self.header.write_sizes(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Rewrite the trailing metadata and header from the current in-memory state.
    pub fn update(&mut self) -> Result<()> {
        WavStreamWriter::new(self, true)?.close()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.header.bits_per_sample
    }

    pub fn total_audio_length(&self) -> u32 {
        self.header.total_audio_length
    }

    pub fn total_data_length(&self) -> u32 {
        self.header.total_data_length
    }

    pub fn header_size(&self) -> u64 {
        self.header.header_size
    }

    pub fn wav_type(&self) -> WavType {
        self.header.wav_type
    }

    pub fn frame_size(&self) -> u32 {
        self.header.frame_size()
    }

    pub fn total_frames(&self) -> u32 {
        match self.frame_size() {
            0 => 0,
            size => self.header.total_audio_length / size,
        }
    }

    pub fn frame_index_to_byte_offset(&self, frame: u32) -> u64 {
        frame as u64 * self.frame_size() as u64
    }

    pub fn metadata(&self) -> &WavMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut WavMetadata {
        &mut self.metadata
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.total_size() > 0
    }

    pub fn add_cue(&mut self, location: u32, label: impl Into<String>) {
        self.metadata.add_cue(location, label);
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.metadata.get_cues()
    }
}

/// Other encoders word-align odd-sized audio with a zero byte before the next chunk.
fn data_pad_length(total_audio_length: u32, metadata: &[u8]) -> usize {
    let padded = total_audio_length % 2 == 1
        && metadata.len() > CHUNK_LABEL_SIZE
        && metadata[0] == 0
        && (metadata[1..=CHUNK_LABEL_SIZE] == CUE_LABEL
            || metadata[1..=CHUNK_LABEL_SIZE] == LIST_LABEL);
    usize::from(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::WAV_HEADER_SIZE;
    use tempfile::tempdir;

    #[test]
    fn test_initialize_then_finalize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::default()).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), WAV_HEADER_SIZE as u64);
        assert_eq!(wav.total_data_length(), 36);

        wav.finalize(1000).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE);
        assert_eq!(&bytes[40..44], &1000u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1036u32.to_le_bytes());
    }

    #[test]
    fn test_frame_math() {
        let dir = tempdir().unwrap();
        let mut wav =
            WavFile::create(dir.path().join("a.wav"), 2, 48000, 24, WavMetadata::default()).unwrap();
        assert_eq!(wav.frame_size(), 6);
        assert_eq!(wav.frame_index_to_byte_offset(10), 60);

        wav.finish_write(600).unwrap();
        assert_eq!(wav.total_frames(), 100);
    }

    #[test]
    fn test_riff_size_overflow_is_rejected() {
        let dir = tempdir().unwrap();
        let mut wav =
            WavFile::create(dir.path().join("big.wav"), 1, 44100, 16, WavMetadata::default()).unwrap();
        assert!(matches!(
            wav.finish_write(u32::MAX),
            Err(WavMarkError::InvalidWavFile(_))
        ));
        assert_eq!(wav.total_audio_length(), 0);
    }

    #[test]
    fn test_data_pad_length() {
        let mut padded = vec![0u8];
        padded.extend_from_slice(b"cue ");
        assert_eq!(data_pad_length(3, &padded), 1);
        assert_eq!(data_pad_length(4, &padded), 0);
        assert_eq!(data_pad_length(3, b"cue \0\0\0\0"), 0);
        assert_eq!(data_pad_length(3, &[0u8, 0, 0, 0, 0]), 0);
    }

    #[test]
    fn test_open_rejects_short_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        assert!(matches!(
            WavFile::open(&path),
            Err(crate::WavMarkError::InvalidWavFile(_))
        ));
    }

    #[test]
    fn test_update_writes_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cues.wav");
        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::cues()).unwrap();
        wav.add_cue(0, "intro");
        wav.update().unwrap();

        let expected = WAV_HEADER_SIZE + wav.metadata().total_size();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected as u64);

        let reopened = WavFile::open_with_metadata(&path, WavMetadata::cues()).unwrap();
        assert_eq!(reopened.cues(), vec![AudioCue::new(0, "intro")]);
        assert_eq!(reopened.total_audio_length(), 0);
    }
}
