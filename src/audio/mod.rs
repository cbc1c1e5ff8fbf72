use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// A labeled position in the audio, addressed in PCM frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioCue {
    pub location: u32,
    pub label: String,
}

impl AudioCue {
    pub fn new(location: u32, label: impl Into<String>) -> Self {
        Self {
            location,
            label: label.into(),
        }
    }
}

impl std::fmt::Display for AudioCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.label, self.location)
    }
}

/// Convert a frame offset into microseconds at the given sample rate.
pub fn frames_to_us(frames: u32, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u64 * 1_000_000) / sample_rate as u64
}
