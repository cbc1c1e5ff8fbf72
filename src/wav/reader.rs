use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use tracing::{error, info};

use super::file::WavFile;
use crate::error::Result;

/// Reads PCM from a frame window of a WAV file.
///
/// The window is clamped to the audio actually present, so a header that
/// claims more audio than the file holds reads short instead of failing.
pub struct WavReader {
    input: BufReader<File>,
    /// Absolute byte offsets of the window.
    begin: u64,
    end: u64,
    position: u64,
    frame_size: u32,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
}

impl WavReader {
    pub fn open(wav: &WavFile) -> Result<Self> {
        Self::open_range(wav, None, None)
    }

    /// Open the frames `[start, end)`; `None` means the start or end of the audio.
    pub fn open_range(wav: &WavFile, start: Option<u32>, end: Option<u32>) -> Result<Self> {
        let mut input = BufReader::new(File::open(wav.path())?);
        let file_len = input.get_ref().metadata()?.len();
        let (begin, end) = compute_bounds(wav, file_len, start, end);
        input.seek(SeekFrom::Start(begin))?;

        Ok(Self {
            input,
            begin,
            end,
            position: begin,
            frame_size: wav.frame_size(),
            sample_rate: wav.sample_rate(),
            channels: wav.channels(),
            bits_per_sample: wav.bits_per_sample(),
        })
    }

    /// Fill as much of `buf` as the window allows; returns the byte count.
    pub fn read_pcm(&mut self, buf: &mut [u8]) -> Result<usize> {
        let wanted = buf.len().min(self.remaining() as usize);
        self.input.read_exact(&mut buf[..wanted])?;
        self.position += wanted as u64;
        Ok(wanted)
    }

    /// Move to `frame` relative to the window start, stopping at the window end.
    pub fn seek(&mut self, frame: u32) -> Result<()> {
        let offset = (frame as u64 * self.frame_size as u64).min(self.end - self.begin);
        self.position = self.begin + offset;
        self.input.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.end
    }

    pub fn remaining(&self) -> u64 {
        self.end - self.position
    }

    pub fn frame_position(&self) -> u32 {
        match self.frame_size {
            0 => 0,
            size => ((self.position - self.begin) / size as u64) as u32,
        }
    }

    /// Frames in the window.
    pub fn total_frames(&self) -> u32 {
        match self.frame_size {
            0 => 0,
            size => ((self.end - self.begin) / size as u64) as u32,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }
}

impl Read for WavReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let wanted = buf.len().min(self.remaining() as usize);
        let read = self.input.read(&mut buf[..wanted])?;
        self.position += read as u64;
        Ok(read)
    }
}

fn compute_bounds(wav: &WavFile, file_len: u64, start: Option<u32>, end: Option<u32>) -> (u64, u64) {
    let header_size = wav.header_size();
    if file_len <= header_size {
        info!(
            "Wav file {:?} is just a header or empty, size is {}",
            wav.path(),
            file_len
        );
        return (header_size, header_size);
    }

    let total_frames = wav.total_frames();
    let first = start.map_or(0, |s| s.min(total_frames));
    let last = end.map_or(total_frames, |e| e.max(first).min(total_frames));

    let begin = header_size + wav.frame_index_to_byte_offset(first);
    let end = header_size + wav.frame_index_to_byte_offset(last);

    let clamped_begin = begin.clamp(header_size, file_len);
    let clamped_end = end.clamp(clamped_begin, file_len);

    if clamped_begin != begin || clamped_end != end {
        error!(
            "Wanted to open {:?} for bytes {} to {} but file length is {}; clamped to {} to {}",
            wav.path(),
            begin,
            end,
            file_len,
            clamped_begin,
            clamped_end
        );
    }

    (clamped_begin, clamped_end)
}
