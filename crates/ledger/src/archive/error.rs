//! Error types raised by the archive manager.

use std::path::PathBuf;

use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode archive: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("archive {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("archive {} is corrupt: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("no archive found in {}", display_dirs(searched))]
    NoArchiveFound { searched: Vec<PathBuf> },

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
