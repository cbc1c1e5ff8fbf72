mod file;
mod header;
mod metadata;
mod reader;
mod writer;

pub use file::WavFile;
pub use header::{ChunkInfo, WavHeader, WavType, WAV_HEADER_SIZE};
pub use metadata::{MetadataChunk, WavMetadata};
pub use reader::WavReader;
pub use writer::WavStreamWriter;
