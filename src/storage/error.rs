use thiserror::Error;

use crate::lastfm::error::LastfmError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("cover download failed: {0}")]
    CoverDownload(#[from] LastfmError),

    #[error("cover download answered with status {0}")]
    CoverStatus(u16),

    #[error("cover download returned no data")]
    EmptyCover,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
