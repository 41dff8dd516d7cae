//! Telling the host that cached renderings of jam collections are stale

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum InvalidationError {
    #[error("failed to flush cache at {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to scan cache dir {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Called once after a sync that imported at least one record
pub trait CacheInvalidator: Send {
    fn invalidate(&self) -> Result<(), InvalidationError>;
}

/// For hosts without a cache: only notes that records changed
pub struct LogInvalidator;

impl CacheInvalidator for LogInvalidator {
    fn invalidate(&self) -> Result<(), InvalidationError> {
        info!("Jam records changed, no host cache configured");
        Ok(())
    }
}

/// Empties host cache directories, keeping the directories themselves
pub struct FlushDirsInvalidator {
    dirs: Vec<PathBuf>,
}

impl FlushDirsInvalidator {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn flush_dir(dir: &Path) -> Result<usize, InvalidationError> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| InvalidationError::Scan {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut removed = 0;
        for entry in entries {
            let path = entry.path();
            let result = if entry.file_type().is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            result.map_err(|source| InvalidationError::Flush {
                path: path.to_path_buf(),
                source,
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}

impl CacheInvalidator for FlushDirsInvalidator {
    /// Flushes every directory even if one fails; reports the first failure
    fn invalidate(&self) -> Result<(), InvalidationError> {
        let mut first_error = None;

        for dir in &self.dirs {
            match Self::flush_dir(dir) {
                Ok(removed) => info!(
                    "Flushed cache {} ({removed} entries)",
                    dir.to_string_lossy()
                ),
                Err(err) => {
                    log::warn!("{err}");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
