//! Error types for hcom-repo

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse repo index '{path}': {message}")]
    IndexParse { path: String, message: String },

    #[error("failed to parse repositories.yaml: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("could not determine helm cache directory")]
    NoCacheDir,
}

pub type Result<T> = std::result::Result<T, RepoError>;
