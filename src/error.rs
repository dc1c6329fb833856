use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("keys required ({keys_required}) exceeds chest count ({chest_count})")]
    KeysExceedChests {
        keys_required: u32,
        chest_count: usize,
    },
    #[error("pointer damping must be in (0, 1] (got {0})")]
    PointerDamping(f32),
    #[error("minimum separation {min_separation} does not fit an arena of size {arena_size}")]
    SeparationTooLarge { min_separation: f32, arena_size: f32 },
    #[error("player damage bonus must not be negative (got {0})")]
    NegativeDamageBonus(f32),
}

#[derive(Debug, Error)]
pub enum QuestionBankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported question bank version {0}")]
    UnsupportedVersion(u8),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize result store: {0}")]
    Serialize(#[from] serde_json::Error),
}
