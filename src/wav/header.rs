use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, warn};

use crate::audio::{DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{Result, WavMarkError};
use crate::riff::{label_text, ChunkWriter, CHUNK_HEADER_SIZE, DATA_LABEL};

pub const WAV_HEADER_SIZE: usize = 44;

const RIFF_LABEL: [u8; 4] = *b"RIFF";
const WAVE_LABEL: [u8; 4] = *b"WAVE";
const FMT_LABEL: [u8; 4] = *b"fmt ";
const PCM: u16 = 1;
const BITS_IN_BYTE: u16 = 8;

const RIFF_SIZE_LOCATION: u64 = 4;
const FMT_LOCATION: usize = 12;
const DATA_LOCATION: usize = 36;
const AUDIO_LENGTH_LOCATION: u64 = 40;
const FMT_BODY_SIZE: usize = 16;

/// How the header was laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavType {
    /// `fmt ` at offset 12 and `data` at offset 36.
    Normal,
    /// Extra chunks before `data`; only `fmt ` and `data` are interpreted.
    ExtendedHeader,
}

/// A top-level chunk seen while reading the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub label: [u8; 4],
    pub offset: u64,
    pub size: u32,
}

impl ChunkInfo {
    pub fn label_text(&self) -> String {
        label_text(&self.label)
    }
}

/// RIFF/WAVE header fields and where the audio sits in the file.
///
/// Written headers are always the 44-byte canonical layout, with bits per
/// sample stored at offset 16. Headers from other encoders may carry extra
/// chunks before `data`; the real audio offset is kept in `header_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Bytes of PCM audio.
    pub total_audio_length: u32,
    /// The RIFF size field: file length minus 8.
    pub total_data_length: u32,
    /// Offset of the first audio byte.
    pub header_size: u64,
    /// Offset of the `data` chunk's size field.
    pub data_size_position: u64,
    pub wav_type: WavType,
    pub chunks: Vec<ChunkInfo>,
}

impl Default for WavHeader {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS, DEFAULT_BITS_PER_SAMPLE)
    }
}

#[derive(Debug, Clone, Copy)]
struct FmtFields {
    format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

impl FmtFields {
    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let format = r.read_u16::<LittleEndian>()?;
        let channels = r.read_u16::<LittleEndian>()?;
        let sample_rate = r.read_u32::<LittleEndian>()?;
        let _byte_rate = r.read_u32::<LittleEndian>()?;
        let _block_align = r.read_u16::<LittleEndian>()?;
        let bits_per_sample = r.read_u16::<LittleEndian>()?;
        Ok(Self {
            format,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }
}

impl WavHeader {
    /// Header for a new, empty file.
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            total_audio_length: 0,
            total_data_length: (WAV_HEADER_SIZE - CHUNK_HEADER_SIZE) as u32,
            header_size: WAV_HEADER_SIZE as u64,
            data_size_position: AUDIO_LENGTH_LOCATION,
            wav_type: WavType::Normal,
            chunks: Vec::new(),
        }
    }

    /// Read the header of the file at `path`.
    pub fn parse(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Self::read(&mut BufReader::new(file), len)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut Cursor::new(bytes), bytes.len() as u64)
    }

    /// Read a header from `r`, a stream of `len` bytes positioned anywhere.
    pub fn read<R: Read + Seek>(r: &mut R, len: u64) -> Result<Self> {
        if len < WAV_HEADER_SIZE as u64 {
            return Err(WavMarkError::invalid_wav(format!(
                "file is {} bytes, shorter than a {} byte header",
                len, WAV_HEADER_SIZE
            )));
        }

        let mut head = [0u8; WAV_HEADER_SIZE];
        r.seek(SeekFrom::Start(0))?;
        r.read_exact(&mut head)?;

        if head[0..4] != RIFF_LABEL || head[8..12] != WAVE_LABEL {
            return Err(WavMarkError::invalid_wav("missing RIFF/WAVE signature"));
        }
        let total_data_length = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);

        let canonical = head[FMT_LOCATION..FMT_LOCATION + 4] == FMT_LABEL
            && head[DATA_LOCATION..DATA_LOCATION + 4] == DATA_LABEL;

        let header = if canonical {
            Self::read_canonical(&head, total_data_length)?
        } else {
            Self::scan_chunks(r, len, total_data_length)?
        };

        if header.wav_type == WavType::ExtendedHeader {
            warn!(
                "Extended wav header detected, audio starts at byte {} (chunks: {})",
                header.header_size,
                header
                    .chunks
                    .iter()
                    .map(ChunkInfo::label_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(header)
    }

    fn read_canonical(head: &[u8; WAV_HEADER_SIZE], total_data_length: u32) -> Result<Self> {
        let mut cursor = Cursor::new(&head[..]);
        cursor.set_position(20);
        let fmt = FmtFields::read(&mut cursor)?;
        cursor.set_position(AUDIO_LENGTH_LOCATION);
        let total_audio_length = cursor.read_u32::<LittleEndian>()?;

        let header = Self {
            total_audio_length,
            total_data_length,
            chunks: vec![
                ChunkInfo {
                    label: FMT_LABEL,
                    offset: FMT_LOCATION as u64,
                    size: FMT_BODY_SIZE as u32,
                },
                ChunkInfo {
                    label: DATA_LABEL,
                    offset: DATA_LOCATION as u64,
                    size: total_audio_length,
                },
            ],
            ..Self::new(fmt.sample_rate, fmt.channels, fmt.bits_per_sample)
        };
        Self::validate_format(&fmt)?;
        Ok(header)
    }

    /// Walk top-level chunks from offset 12 up to and including `data`.
    fn scan_chunks<R: Read + Seek>(r: &mut R, len: u64, total_data_length: u32) -> Result<Self> {
        let mut chunks = Vec::new();
        let mut fmt = None;
        let mut pos = FMT_LOCATION as u64;

        while pos + CHUNK_HEADER_SIZE as u64 <= len {
            r.seek(SeekFrom::Start(pos))?;
            let mut label = [0u8; 4];
            r.read_exact(&mut label)?;
            let size = r.read_u32::<LittleEndian>()?;
            debug!("Header chunk {} at {} ({} bytes)", label_text(&label), pos, size);
            chunks.push(ChunkInfo {
                label,
                offset: pos,
                size,
            });

            if label == FMT_LABEL {
                if (size as usize) < FMT_BODY_SIZE {
                    return Err(WavMarkError::invalid_wav(format!(
                        "fmt chunk is {} bytes, expected at least {}",
                        size, FMT_BODY_SIZE
                    )));
                }
                fmt = Some(FmtFields::read(r)?);
            } else if label == DATA_LABEL {
                let fmt = fmt.ok_or_else(|| {
                    WavMarkError::invalid_wav("data chunk found before fmt chunk")
                })?;
                Self::validate_format(&fmt)?;
                return Ok(Self {
                    total_audio_length: size,
                    total_data_length,
                    header_size: pos + CHUNK_HEADER_SIZE as u64,
                    data_size_position: pos + 4,
                    wav_type: WavType::ExtendedHeader,
                    chunks,
                    ..Self::new(fmt.sample_rate, fmt.channels, fmt.bits_per_sample)
                });
            }

            pos += CHUNK_HEADER_SIZE as u64 + size as u64 + (size as u64 & 1);
        }

        Err(WavMarkError::invalid_wav(if fmt.is_some() {
            "no data chunk found"
        } else {
            "no fmt chunk found"
        }))
    }

    fn validate_format(fmt: &FmtFields) -> Result<()> {
        if fmt.format != PCM {
            return Err(WavMarkError::invalid_wav(format!(
                "unsupported audio format {}, only PCM is supported",
                fmt.format
            )));
        }
        Ok(())
    }

    /// The canonical 44-byte header for the current field values.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ChunkWriter::with_capacity(WAV_HEADER_SIZE);
        out.put_label(&RIFF_LABEL);
        out.put_u32(self.total_data_length);
        out.put_label(&WAVE_LABEL);
        out.put_label(&FMT_LABEL);
        out.put_u32(self.bits_per_sample as u32);
        out.put_u16(PCM);
        out.put_u16(self.channels);
        out.put_u32(self.sample_rate);
        out.put_u32(self.byte_rate());
        out.put_u16(self.block_align());
        out.put_u16(self.bits_per_sample);
        out.put_label(&DATA_LABEL);
        out.put_u32(self.total_audio_length);
        out.into_inner()
    }

    // http://soundfile.sapp.org/doc/WaveFormat/
    pub fn byte_rate(&self) -> u32 {
        (self.bits_per_sample as u32 * self.sample_rate * self.channels as u32)
            / BITS_IN_BYTE as u32
    }

    pub fn block_align(&self) -> u16 {
        (self.channels * self.bits_per_sample) / BITS_IN_BYTE
    }

    /// Bytes per frame: one sample for every channel.
    pub fn frame_size(&self) -> u32 {
        self.channels as u32 * (self.bits_per_sample / BITS_IN_BYTE) as u32
    }

    /// Byte range of the metadata trailing the audio, clamped to `file_len`.
    pub fn metadata_range(&self, file_len: u64) -> Option<(u64, u64)> {
        let start = self.header_size + self.total_audio_length as u64;
        let end = (self.total_data_length as u64 + CHUNK_HEADER_SIZE as u64).min(file_len);
        (end > start).then_some((start, end))
    }

    /// Patch the RIFF and data size fields in place.
    pub fn write_sizes<W: Write + Seek>(&self, w: &mut W) -> Result<()> {
        w.seek(SeekFrom::Start(RIFF_SIZE_LOCATION))?;
        w.write_u32::<LittleEndian>(self.total_data_length)?;
        w.seek(SeekFrom::Start(self.data_size_position))?;
        w.write_u32::<LittleEndian>(self.total_audio_length)?;
        Ok(())
    }
}
