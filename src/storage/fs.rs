//! Module to look up existing jam records in the content root

use walkdir::WalkDir;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    domain::track::LovedAt,
    storage::{document::Document, error::StorageError},
};

/// Metadata document of a jam record, inside the record directory
pub const RECORD_FILE: &str = "jam.txt";
/// Field holding the raw loved-at timestamp, the only dedupe key
pub const TIMESTAMP_FIELD: &str = "Uts";

/// Record directories start with their `YYYYMMDDHHmm` prefix
pub fn is_record_dir_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Lists numeric-prefixed directories directly under the content root
pub fn record_dirs(content_root: &Path) -> Vec<PathBuf> {
    let root_str = content_root.to_string_lossy();

    WalkDir::new(content_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning dir {root_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.file_name().to_str().is_some_and(is_record_dir_name))
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Reads the record document of a directory, `None` when there is none (yet)
pub fn read_record(dir: &Path) -> Result<Option<Document>, StorageError> {
    match std::fs::read_to_string(dir.join(RECORD_FILE)) {
        Ok(text) => Ok(Some(Document::parse(&text))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StorageError::Fs(err)),
    }
}

/// True when `doc` is the record of the track loved at `loved_at`
pub fn is_record_of(doc: &Document, loved_at: LovedAt) -> bool {
    doc.get(TIMESTAMP_FIELD) == Some(loved_at.to_string().as_str())
}

/// Finds the record directory holding `loved_at`, scanning every record.
///
/// Linear in the number of records. Directories without a complete record
/// document are never a match.
pub fn find_record(
    content_root: &Path,
    loved_at: LovedAt,
) -> Result<Option<PathBuf>, StorageError> {
    for dir in record_dirs(content_root) {
        if let Some(doc) = read_record(&dir)? {
            if is_record_of(&doc, loved_at) {
                return Ok(Some(dir));
            }
        }
    }
    Ok(None)
}

pub fn record_exists(content_root: &Path, loved_at: LovedAt) -> Result<bool, StorageError> {
    Ok(find_record(content_root, loved_at)?.is_some())
}
