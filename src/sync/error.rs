use thiserror::Error;

use crate::{lastfm::error::LastfmError, storage::error::StorageError};

/// Failures that abort a whole sync. Per-track problems never end up here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("loved tracks request failed: {0}")]
    Upstream(#[from] LastfmError),

    #[error("content root unavailable: {0}")]
    Storage(#[from] StorageError),
}
