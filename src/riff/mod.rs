pub mod cue;
pub mod verse;

pub use cue::CueChunk;
pub use verse::VerseMarkerChunk;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{Result, WavMarkError};

pub const CHUNK_HEADER_SIZE: usize = 8;
pub const CHUNK_LABEL_SIZE: usize = 4;
pub const DWORD_SIZE: usize = 4;

pub const CUE_LABEL: [u8; 4] = *b"cue ";
pub const LIST_LABEL: [u8; 4] = *b"LIST";
pub const ADTL_LABEL: [u8; 4] = *b"adtl";
pub const LABEL_LABEL: [u8; 4] = *b"labl";
pub const DATA_LABEL: [u8; 4] = *b"data";

/// Encode/decode contract for a chunk stored in the metadata trailing the audio.
pub trait RiffChunk {
    /// Byte length `to_bytes` will produce, including sub-chunk headers.
    fn total_size(&self) -> usize;

    /// Replace this chunk's state with what is decoded from `chunk`.
    fn parse(&mut self, chunk: &[u8]) -> Result<()>;

    /// Serialized chunk(s), or an empty vector when there is nothing to store.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Sub-chunk kinds the cue codec knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Cue,
    List,
    Label,
    Unknown([u8; 4]),
}

const CHUNK_REGISTRY: &[([u8; 4], ChunkKind)] = &[
    (CUE_LABEL, ChunkKind::Cue),
    (LIST_LABEL, ChunkKind::List),
    (LABEL_LABEL, ChunkKind::Label),
];

impl ChunkKind {
    pub fn from_label(label: [u8; 4]) -> Self {
        CHUNK_REGISTRY
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, kind)| *kind)
            .unwrap_or(ChunkKind::Unknown(label))
    }
}

/// Render a 4-byte tag for log and error messages.
pub fn label_text(label: &[u8]) -> String {
    String::from_utf8_lossy(label).into_owned()
}

/// Round `length` up to the next multiple of 4.
pub fn word_aligned_length(length: usize) -> usize {
    if length % DWORD_SIZE != 0 {
        length + DWORD_SIZE - (length % DWORD_SIZE)
    } else {
        length
    }
}

/// A sub-chunk sliced out of its parent, payload bounded by its declared size.
#[derive(Debug, Clone, Copy)]
pub struct SubChunk<'a> {
    pub label: [u8; 4],
    pub kind: ChunkKind,
    pub data: &'a [u8],
}

/// Bounds-checked little-endian reader over a chunk payload.
///
/// A malformed size can never read past the slice it was declared in.
#[derive(Debug, Clone)]
pub struct ChunkCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(WavMarkError::invalid_container(format!(
                "needed {} bytes at offset {} but only {} remain",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_label(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(CHUNK_LABEL_SIZE)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Read the next sub-chunk header and slice off exactly its declared payload.
    ///
    /// Returns `Ok(None)` once fewer than a chunk header's worth of bytes remain.
    /// With `pad_odd`, an odd declared size also consumes the RIFF pad byte when
    /// one is present.
    pub fn next_subchunk(&mut self, pad_odd: bool) -> Result<Option<SubChunk<'a>>> {
        if self.remaining() < CHUNK_HEADER_SIZE {
            return Ok(None);
        }

        let label = self.read_label()?;
        let size = self.read_u32()? as usize;

        if size > self.remaining() {
            return Err(WavMarkError::invalid_container(format!(
                "chunk {} is of size {} but remaining chunk size is {}",
                label_text(&label),
                size,
                self.remaining()
            )));
        }

        let data = self.take(size)?;
        if pad_odd && size % 2 == 1 && self.remaining() > 0 {
            self.skip(1)?;
        }

        let kind = ChunkKind::from_label(label);
        if let ChunkKind::Unknown(_) = kind {
            debug!("Skipping unrecognized chunk {} ({} bytes)", label_text(&label), size);
        }

        Ok(Some(SubChunk { label, kind, data }))
    }
}

/// Little-endian append-only buffer used to serialize chunks.
#[derive(Debug, Default)]
pub(crate) struct ChunkWriter {
    buf: Vec<u8>,
}

impl ChunkWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_label(&mut self, label: &[u8; 4]) {
        self.buf.extend_from_slice(label);
    }

    pub fn put_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn put_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    /// Write `text` zero-padded (or truncated) to exactly `len` bytes.
    pub fn put_padded(&mut self, text: &[u8], len: usize) {
        let written = text.len().min(len);
        self.buf.extend_from_slice(&text[..written]);
        self.buf.resize(self.buf.len() + (len - written), 0);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
