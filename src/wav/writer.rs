use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use tracing::{debug, error, info};

use super::file::WavFile;
use crate::error::{Result, WavMarkError};

/// Streams PCM into a WAV file and rewrites its metadata and header on close.
///
/// Opening truncates the file at the end of the audio (or at the end of the
/// header when not appending), which drops the old trailing metadata. Closing
/// appends the current metadata and patches the two size fields. Close runs
/// exactly once: explicitly through [`close`](Self::close) or on drop.
pub struct WavStreamWriter<'a> {
    wav: &'a mut WavFile,
    output: Option<BufWriter<File>>,
    audio_length: u64,
}

impl<'a> WavStreamWriter<'a> {
    pub fn new(wav: &'a mut WavFile, append: bool) -> Result<Self> {
        let is_empty = fs::metadata(wav.path()).map(|m| m.len() == 0).unwrap_or(true);
        if is_empty {
            wav.initialize_empty()?;
        }

        let audio_length = if append {
            wav.total_audio_length() as u64
        } else {
            0
        };

        let mut file = OpenOptions::new().write(true).open(wav.path())?;
        file.set_len(wav.header_size() + audio_length)?;
        file.seek(SeekFrom::End(0))?;
        debug!(
            "Opened {:?} for writing at byte {} (append: {})",
            wav.path(),
            wav.header_size() + audio_length,
            append
        );

        Ok(Self {
            wav,
            output: Some(BufWriter::new(file)),
            audio_length,
        })
    }

    /// Append raw PCM bytes. Nothing is validated or converted.
    pub fn write_pcm(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    /// Bytes of audio in the file so far, including appended-to audio.
    pub fn audio_length(&self) -> u64 {
        self.audio_length
    }

    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut output) = self.output.take() else {
            return Ok(());
        };

        if self.wav.has_metadata() {
            self.wav.metadata().write_metadata(&mut output)?;
        }
        output.flush()?;
        drop(output);

        let audio_length = u32::try_from(self.audio_length).map_err(|_| {
            WavMarkError::invalid_wav(format!(
                "audio length {} does not fit a wav header",
                self.audio_length
            ))
        })?;
        self.wav.finalize(audio_length)?;

        info!(
            "Wrote {:?}: {} bytes of audio, {} bytes of metadata",
            self.wav.path(),
            audio_length,
            self.wav.metadata().total_size()
        );
        Ok(())
    }
}

impl Write for WavStreamWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "wav writer is closed"))?;
        let written = output.write(buf)?;
        self.audio_length += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.output.as_mut() {
            Some(output) => output.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for WavStreamWriter<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!("Failed to close wav writer for {:?}: {}", self.wav.path(), e);
        }
    }
}
