pub mod audio;
pub mod config;
pub mod error;
pub mod markers;
pub mod riff;
pub mod wav;

pub use audio::AudioCue;
pub use config::{Config, MetadataMode};
pub use error::{Result, WavMarkError};
pub use markers::{
    parse_biblical_reference, to_biblical_reference, AudioMarker, OratureAudioFile,
    OratureCueParser, OratureCueType, OratureMarkers,
};
pub use riff::{CueChunk, RiffChunk, VerseMarkerChunk};
pub use wav::{WavFile, WavHeader, WavMetadata, WavReader, WavStreamWriter};
