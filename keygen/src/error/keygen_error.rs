use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeygenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Secure random source failed: {0}")]
    Entropy(String),

    #[error("Key generation failed: {0}")]
    Generation(String),

    #[error("Key encoding failed: {0}")]
    Encoding(String),

    #[error("{context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure classes, each with its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Environment,
    Entropy,
    Io,
    Serialization,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Environment => 3,
            ErrorKind::Entropy => 4,
            ErrorKind::Io => 5,
            ErrorKind::Serialization => 6,
        }
    }
}

impl KeygenError {
    pub fn io(context: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        KeygenError::Io {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KeygenError::Config(_) | KeygenError::ConfigParse(_) => ErrorKind::Config,
            KeygenError::Environment(_) => ErrorKind::Environment,
            KeygenError::Entropy(_) | KeygenError::Generation(_) => ErrorKind::Entropy,
            KeygenError::Io { .. } => ErrorKind::Io,
            KeygenError::Encoding(_) | KeygenError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}
