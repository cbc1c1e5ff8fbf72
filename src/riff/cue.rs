use std::collections::HashMap;

use tracing::{debug, warn};

use super::{
    label_text, word_aligned_length, ChunkCursor, ChunkKind, ChunkWriter, RiffChunk,
    ADTL_LABEL, CHUNK_HEADER_SIZE, CHUNK_LABEL_SIZE, CUE_LABEL, DATA_LABEL, LABEL_LABEL,
    LIST_LABEL,
};
use crate::audio::AudioCue;
use crate::error::{Result, WavMarkError};

const CUE_COUNT_SIZE: usize = 4;
const CUE_ID_SIZE: usize = 4;
const CUE_DATA_SIZE: usize = 24;

// Only the id and position are read; chunk start, block start and sample offset are skipped.
const DONT_CARE_CUE_DATA_SIZE: usize = 16;

/// Free-form cues, read and written exactly as labeled.
///
/// Stored as a `cue ` chunk followed by a `LIST` chunk of type `adtl`:
///
/// ```text
/// "cue " | size | count | per cue: id, position, "data", 0, 0, position
/// "LIST" | size | "adtl" | per cue: "labl", 4 + padded length, id, label
/// ```
///
/// Labels are zero padded to a multiple of 4. The cue point id joins a
/// position to its label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueChunk {
    cues: Vec<AudioCue>,
}

impl CueChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cues(cues: Vec<AudioCue>) -> Self {
        Self { cues }
    }

    pub fn add_cue(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }

    pub fn add_cues(&mut self, cues: impl IntoIterator<Item = AudioCue>) {
        self.cues.extend(cues);
    }

    pub fn cues(&self) -> &[AudioCue] {
        &self.cues
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

impl RiffChunk for CueChunk {
    fn total_size(&self) -> usize {
        encoded_size(&self.cues)
    }

    fn parse(&mut self, chunk: &[u8]) -> Result<()> {
        self.cues = decode_cues(chunk)?;
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        encode_cues(&self.cues)
    }
}

fn cue_chunk_size(count: usize) -> usize {
    CUE_COUNT_SIZE + CUE_DATA_SIZE * count
}

fn text_size(cues: &[AudioCue]) -> usize {
    cues.iter()
        .map(|cue| word_aligned_length(cue.label.len()))
        .sum()
}

/// Size of the `labl` entries, excluding the LIST header and "adtl" tag.
fn label_entries_size(cues: &[AudioCue]) -> usize {
    (CHUNK_HEADER_SIZE + CUE_ID_SIZE) * cues.len() + text_size(cues)
}

/// Bytes `encode_cues` produces for this cue set.
pub(crate) fn encoded_size(cues: &[AudioCue]) -> usize {
    if cues.is_empty() {
        return 0;
    }
    let cue_chunk = CHUNK_HEADER_SIZE + cue_chunk_size(cues.len());
    let list_chunk = CHUNK_HEADER_SIZE + CHUNK_LABEL_SIZE + label_entries_size(cues);
    cue_chunk + list_chunk
}

/// Serialize cues into a `cue ` chunk followed by a `LIST/adtl` chunk.
///
/// Cues are sorted by location and cue point ids are assigned by that order.
pub(crate) fn encode_cues(cues: &[AudioCue]) -> Vec<u8> {
    if cues.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&AudioCue> = cues.iter().collect();
    sorted.sort_by_key(|cue| cue.location);

    let mut out = ChunkWriter::with_capacity(encoded_size(cues));

    out.put_label(&CUE_LABEL);
    out.put_u32(cue_chunk_size(sorted.len()) as u32);
    out.put_u32(sorted.len() as u32);
    for (id, cue) in sorted.iter().enumerate() {
        out.put_u32(id as u32);
        out.put_u32(cue.location);
        out.put_label(&DATA_LABEL);
        out.put_u32(0);
        out.put_u32(0);
        out.put_u32(cue.location);
    }

    out.put_label(&LIST_LABEL);
    out.put_u32((CHUNK_LABEL_SIZE + label_entries_size(cues)) as u32);
    out.put_label(&ADTL_LABEL);
    for (id, cue) in sorted.iter().enumerate() {
        let aligned = word_aligned_length(cue.label.len());
        out.put_label(&LABEL_LABEL);
        out.put_u32((CUE_ID_SIZE + aligned) as u32);
        out.put_u32(id as u32);
        out.put_padded(cue.label.as_bytes(), aligned);
    }

    out.into_inner()
}

/// Decode every cue whose location and label are both present.
pub(crate) fn decode_cues(chunk: &[u8]) -> Result<Vec<AudioCue>> {
    let mut builder = CueListBuilder::default();
    let mut cursor = ChunkCursor::new(chunk);

    while let Some(subchunk) = cursor.next_subchunk(false)? {
        match subchunk.kind {
            ChunkKind::Cue => parse_cue(subchunk.data, &mut builder)?,
            ChunkKind::List => parse_labels(subchunk.data, &mut builder)?,
            ChunkKind::Label | ChunkKind::Unknown(_) => {}
        }
    }

    Ok(builder.build())
}

fn parse_cue(chunk: &[u8], builder: &mut CueListBuilder) -> Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }

    let mut cursor = ChunkCursor::new(chunk);
    let count = cursor.read_u32()? as usize;

    let expected = count.checked_mul(CUE_DATA_SIZE);
    if expected != Some(cursor.remaining()) {
        return Err(WavMarkError::invalid_container(format!(
            "cue chunk declares {} cues but holds {} bytes of cue data",
            count,
            cursor.remaining()
        )));
    }

    for _ in 0..count {
        let id = cursor.read_u32()?;
        let location = cursor.read_u32()?;
        builder.add_location(id, location);
        cursor.skip(DONT_CARE_CUE_DATA_SIZE)?;
    }

    Ok(())
}

fn parse_labels(chunk: &[u8], builder: &mut CueListBuilder) -> Result<()> {
    let mut cursor = ChunkCursor::new(chunk);

    if cursor.remaining() < CHUNK_LABEL_SIZE {
        return Ok(());
    }
    let list_type = cursor.read_label()?;
    if list_type != ADTL_LABEL {
        debug!("Skipping LIST chunk of type {}", label_text(&list_type));
        return Ok(());
    }

    // labl data should be word aligned, but the declared size may leave out the pad byte
    while let Some(subchunk) = cursor.next_subchunk(true)? {
        if subchunk.kind != ChunkKind::Label {
            continue;
        }

        if subchunk.data.len() < CUE_ID_SIZE {
            debug!("Skipping labl chunk of size {}", subchunk.data.len());
            continue;
        }

        let mut entry = ChunkCursor::new(subchunk.data);
        let id = entry.read_u32()?;
        let text = entry.take(entry.remaining())?;
        let label = String::from_utf8_lossy(text)
            .trim_matches('\0')
            .to_string();
        builder.add_label(id, label);
    }

    Ok(())
}

#[derive(Debug, Default)]
struct PartialCue {
    id: u32,
    location: Option<u32>,
    label: Option<String>,
}

/// Joins locations and labels by cue point id, keeping first-seen order.
#[derive(Debug, Default)]
struct CueListBuilder {
    slots: Vec<PartialCue>,
    index: HashMap<u32, usize>,
}

impl CueListBuilder {
    fn slot(&mut self, id: u32) -> &mut PartialCue {
        let next = self.slots.len();
        let idx = *self.index.entry(id).or_insert(next);
        if idx == next {
            self.slots.push(PartialCue {
                id,
                ..Default::default()
            });
        }
        &mut self.slots[idx]
    }

    fn add_location(&mut self, id: u32, location: u32) {
        self.slot(id).location = Some(location);
    }

    fn add_label(&mut self, id: u32, label: String) {
        self.slot(id).label = Some(label);
    }

    fn build(self) -> Vec<AudioCue> {
        self.slots
            .into_iter()
            .filter_map(|cue| match (cue.location, cue.label) {
                (Some(location), Some(label)) => Some(AudioCue { location, label }),
                (location, label) => {
                    warn!(
                        "Dropping cue {}: location {:?}, label {:?}",
                        cue.id, location, label
                    );
                    None
                }
            })
            .collect()
    }
}
