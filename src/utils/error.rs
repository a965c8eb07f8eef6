use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StowageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// 스토리지 백엔드가 필수 기능을 제공하지 않음
    #[error("Storage backend does not implement `{capability}`")]
    Unsupported { capability: &'static str },

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// 손상된 tar/gzip 스트림 (디코더 메시지 포함)
    #[error("An exception occurred while extracting: {reason}")]
    ArchiveFormat { reason: String },

    #[error("Unsafe storage path: {name}")]
    UnsafePath { name: String },

    #[error("Path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("An exception occurred while loading data: {0}")]
    Serialization(String),
}

impl StowageError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        StowageError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StowageError>;
