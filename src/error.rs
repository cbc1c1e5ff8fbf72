use thiserror::Error;

#[derive(Error, Debug)]
pub enum WavMarkError {
    #[error("Invalid wav file: {0}")]
    InvalidWavFile(String),

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Missing reference context: {0}")]
    MissingReference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WavMarkError {
    pub fn invalid_wav(msg: impl Into<String>) -> Self {
        WavMarkError::InvalidWavFile(msg.into())
    }

    pub fn invalid_container(msg: impl Into<String>) -> Self {
        WavMarkError::InvalidContainer(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, WavMarkError>;
