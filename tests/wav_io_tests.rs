//! Integration tests for the WAV container
//!
//! These tests write real files to a scratch directory and read them back,
//! both through this crate and through a conventional WAV decoder.

use wavmark::audio::AudioCue;
use wavmark::riff::{CueChunk, RiffChunk};
use wavmark::wav::{
    WavFile, WavHeader, WavMetadata, WavReader, WavStreamWriter, WavType, WAV_HEADER_SIZE,
};
use wavmark::WavMarkError;

use std::path::Path;
use tempfile::tempdir;

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// A file whose header carries extra chunks around `fmt `, as some recorders write.
fn write_extended_wav(path: &Path, audio: &[u8], cues: &[AudioCue]) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"JUNK");
    bytes.extend_from_slice(&6u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 6]);

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&44100u32.to_le_bytes());
    bytes.extend_from_slice(&88200u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"LIST");
    bytes.extend_from_slice(&5u32.to_le_bytes());
    bytes.extend_from_slice(b"INFOx");
    bytes.push(0);

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(audio.len() as u32).to_le_bytes());
    bytes.extend_from_slice(audio);
    bytes.extend(CueChunk::with_cues(cues.to_vec()).to_bytes());

    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
    std::fs::write(path, bytes).unwrap();
}

// ============================================================================
// Header Tests
// ============================================================================

mod header_tests {
    use super::*;

    #[test]
    fn test_initialize_then_finalize_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("header.wav");

        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::default()).unwrap();
        wav.finalize(1000).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE);
        assert_eq!(u32_at(&bytes, 40), 1000);
        assert_eq!(u32_at(&bytes, 4), 44 - 8 + 1000);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let err = WavHeader::from_bytes(&[0u8; 43]).unwrap_err();
        assert!(matches!(err, WavMarkError::InvalidWavFile(_)));
    }

    #[test]
    fn test_non_wav_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.wav");
        std::fs::write(&path, vec![b'x'; 100]).unwrap();

        let err = WavFile::open(&path).unwrap_err();
        assert!(matches!(err, WavMarkError::InvalidWavFile(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = WavFile::open(dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, WavMarkError::Io(_)));
    }
}

// ============================================================================
// Round Trip Tests
// ============================================================================

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_two_seconds_with_verse_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verses.wav");

        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::default()).unwrap();
        wav.add_cue(0, "orature-vm-1");
        wav.add_cue(44100, "orature-vm-2");

        let mut writer = WavStreamWriter::new(&mut wav, false).unwrap();
        writer.write_pcm(&vec![0u8; 88200]).unwrap();
        writer.close().unwrap();

        let reopened = WavFile::open(&path).unwrap();
        assert_eq!(reopened.total_audio_length(), 88200);
        assert_eq!(reopened.total_frames(), 44100);

        let mut cues = reopened.cues();
        cues.sort_by_key(|c| c.location);
        assert_eq!(
            cues,
            vec![
                AudioCue::new(0, "orature-vm-1"),
                AudioCue::new(44100, "orature-vm-2")
            ]
        );

        let file_len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(file_len, WAV_HEADER_SIZE + 88200 + reopened.metadata().total_size());
        assert_eq!(reopened.total_data_length() as usize, file_len - 8);
    }

    #[test]
    fn test_metadata_size_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sizes.wav");

        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::cues()).unwrap();
        wav.add_cue(0, "orature-vm-1");
        wav.add_cue(44100, "orature-vm-2");
        wav.update().unwrap();

        // cue: 8 + 4 + 2 * 24, LIST: 8 + 4 + 2 * (8 + 4 + 12)
        assert_eq!(wav.metadata().total_size(), 60 + 60);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 120);
        assert_eq!(&bytes[44..48], b"cue ");
        assert_eq!(&bytes[104..108], b"LIST");
        assert_eq!(&bytes[112..116], b"adtl");
    }

    #[test]
    fn test_legacy_cues_are_normalized_on_update() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.wav");

        let mut raw = WavFile::create(&path, 1, 44100, 16, WavMetadata::cues()).unwrap();
        raw.add_cue(0, "1");
        raw.add_cue(500, "2");
        raw.update().unwrap();

        let mut verses = WavFile::open(&path).unwrap();
        verses.update().unwrap();

        let plain = WavFile::open_with_metadata(&path, WavMetadata::cues()).unwrap();
        let mut labels: Vec<String> = plain.cues().into_iter().map(|c| c.label).collect();
        labels.sort();
        assert_eq!(labels, vec!["1", "2", "orature-vm-1", "orature-vm-2"]);
    }

    #[test]
    fn test_pad_byte_after_odd_audio_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("padded.wav");

        let mut bytes = WavHeader::new(8000, 1, 8).to_bytes();
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend(CueChunk::with_cues(vec![AudioCue::new(1, "orature-vm-1")]).to_bytes());
        bytes[40..44].copy_from_slice(&3u32.to_le_bytes());
        let riff_size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let mut wav = WavFile::open_with_metadata(&path, WavMetadata::cues()).unwrap();
        assert_eq!(wav.total_audio_length(), 3);
        assert_eq!(wav.cues(), vec![AudioCue::new(1, "orature-vm-1")]);

        // rewritten without the pad byte
        wav.add_cue(2, "orature-vm-2");
        wav.update().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[44..47], &[1, 2, 3]);
        assert_eq!(&bytes[47..51], b"cue ");

        let reopened = WavFile::open(&path).unwrap();
        assert_eq!(reopened.cues().len(), 2);
    }

    #[test]
    fn test_oversized_metadata_chunk_fails_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");

        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::cues()).unwrap();
        wav.add_cue(0, "intro");
        wav.update().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[48..52].copy_from_slice(&10_000u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let err = WavFile::open(&path).unwrap_err();
        assert!(matches!(err, WavMarkError::InvalidContainer(_)));
    }
}

// ============================================================================
// Extended Header Tests
// ============================================================================

mod extended_header_tests {
    use super::*;

    #[test]
    fn test_extended_header_audio_and_cues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foreign.wav");
        let audio: Vec<u8> = (0..40u8).collect();
        write_extended_wav(&path, &audio, &[AudioCue::new(3, "orature-vm-1")]);

        let wav = WavFile::open(&path).unwrap();
        assert_eq!(wav.wav_type(), WavType::ExtendedHeader);
        assert_eq!(wav.total_audio_length(), 40);
        assert_eq!(wav.header_size(), 12 + 14 + 24 + 14 + 8);
        assert_eq!(wav.cues(), vec![AudioCue::new(3, "orature-vm-1")]);

        let mut reader = WavReader::open(&wav).unwrap();
        let mut buf = vec![0u8; 100];
        let read = reader.read_pcm(&mut buf).unwrap();
        assert_eq!(&buf[..read], audio.as_slice());
    }

    #[test]
    fn test_extended_header_update_keeps_chunks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foreign.wav");
        let audio = vec![7u8; 20];
        write_extended_wav(&path, &audio, &[AudioCue::new(0, "orature-vm-1")]);

        let mut wav = WavFile::open(&path).unwrap();
        let header_size = wav.header_size() as usize;
        wav.add_cue(5, "orature-vm-2");
        wav.update().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(u32_at(&bytes, header_size - 4), 20);
        assert_eq!(&bytes[header_size..header_size + 20], audio.as_slice());

        let reopened = WavFile::open(&path).unwrap();
        let labels: Vec<String> = reopened
            .header()
            .chunks
            .iter()
            .map(|c| c.label_text())
            .collect();
        assert_eq!(labels, vec!["JUNK", "fmt ", "LIST", "data"]);
        assert_eq!(reopened.cues().len(), 2);
    }
}

// ============================================================================
// Interop Tests
// ============================================================================

mod interop_tests {
    use super::*;

    fn spec() -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_written_file_decodes_with_hound() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interop.wav");

        let samples: Vec<i16> = (0..200).map(|i| (i * 100 - 10_000) as i16).collect();
        let mut wav = WavFile::create(&path, 1, 44100, 16, WavMetadata::default()).unwrap();
        wav.add_cue(50, "orature-vm-1");
        let mut writer = WavStreamWriter::new(&mut wav, false).unwrap();
        for sample in &samples {
            writer.write_pcm(&sample.to_le_bytes()).unwrap();
        }
        writer.close().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec(), spec());
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_hound_file_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hound.wav");

        let mut writer = hound::WavWriter::create(&path, spec()).unwrap();
        for i in 0..100i16 {
            writer.write_sample(i).unwrap();
        }
        writer.finalize().unwrap();

        let wav = WavFile::open(&path).unwrap();
        assert_eq!(wav.sample_rate(), 44100);
        assert_eq!(wav.channels(), 1);
        assert_eq!(wav.total_frames(), 100);
        assert!(wav.cues().is_empty());

        let mut reader = WavReader::open_range(&wav, Some(10), Some(12)).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(reader.read_pcm(&mut buf).unwrap(), 4);
        assert_eq!(buf, [10, 0, 11, 0]);
    }
}
