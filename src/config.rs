use crate::audio::{DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{Result, WavMarkError};
use crate::wav::WavMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which chunk codec interprets the metadata trailing the audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataMode {
    /// Normalize legacy verse labels into `orature-vm-N`.
    #[default]
    Verse,
    /// Read and write cues exactly as stored.
    Cue,
}

impl std::fmt::Display for MetadataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataMode::Verse => write!(f, "verse"),
            MetadataMode::Cue => write!(f, "cue"),
        }
    }
}

impl std::str::FromStr for MetadataMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verse" => Ok(MetadataMode::Verse),
            "cue" => Ok(MetadataMode::Cue),
            _ => Err(format!("Unknown metadata mode: {}. Use 'verse' or 'cue'", s)),
        }
    }
}

impl MetadataMode {
    /// Build an empty metadata set using this mode's chunk codec.
    pub fn metadata(&self) -> WavMetadata {
        match self {
            MetadataMode::Verse => WavMetadata::verse_markers(),
            MetadataMode::Cue => WavMetadata::cues(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub metadata_mode: MetadataMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            metadata_mode: MetadataMode::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Parse a config from TOML text, falling back to defaults for missing keys.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(rate) = std::env::var("WAVMARK_SAMPLE_RATE") {
            if let Ok(r) = rate.parse() {
                self.sample_rate = r;
            }
        }
        if let Ok(channels) = std::env::var("WAVMARK_CHANNELS") {
            if let Ok(c) = channels.parse() {
                self.channels = c;
            }
        }
        if let Ok(bits) = std::env::var("WAVMARK_BITS_PER_SAMPLE") {
            if let Ok(b) = bits.parse() {
                self.bits_per_sample = b;
            }
        }
        if let Ok(mode) = std::env::var("WAVMARK_METADATA_MODE") {
            if let Ok(m) = mode.parse() {
                self.metadata_mode = m;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(WavMarkError::Config(
                "Sample rate must be greater than 0".to_string(),
            ));
        }

        if self.channels == 0 {
            return Err(WavMarkError::Config(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(WavMarkError::Config(format!(
                "Bits per sample must be a positive multiple of 8, got {}",
                self.bits_per_sample
            )));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wavmark").join("config.toml"))
    }
}
