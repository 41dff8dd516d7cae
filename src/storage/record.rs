//! Creates jam records: one directory per loved track with its metadata document
//! and, when artwork is available, a cover image plus its own small document.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use uuid::Uuid;

use crate::{
    domain::track::{LovedTrack, TrackDetails},
    lastfm::client::RemoteClient,
    storage::{
        document::Document,
        error::StorageError,
        fs::{RECORD_FILE, TIMESTAMP_FIELD, is_record_of, read_record},
        slug::slugify,
    },
};

pub const COVER_STEM: &str = "cover";
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
pub const JAM_TEMPLATE: &str = "jam";
pub const IMAGE_TEMPLATE: &str = "image";
/// Cover references point at the asset id, not at a path
pub const FILE_REFERENCE_SCHEME: &str = "file://";

/// The record document is written here first and renamed into place
const PARTIAL_RECORD_FILE: &str = ".jam.txt.partial";

/// Fresh identifier for a record or an asset
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `{YYYYMMDDHHmm}_{artist-slug}-{title-slug}`, in UTC
pub fn directory_name(track: &LovedTrack) -> Result<String, StorageError> {
    let prefix = track.loved_at_utc()?.format("%Y%m%d%H%M");
    Ok(format!(
        "{prefix}_{}-{}",
        slugify(&track.artist),
        slugify(&track.name)
    ))
}

/// Extension for a cover stored from `url`, restricted to known image types
pub fn cover_extension(url: &str) -> &'static str {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => without_query,
    };

    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .and_then(|ext| IMAGE_EXTENSIONS.iter().find(|known| **known == ext).copied())
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

/// The record document, fields in their fixed order
pub fn jam_document(
    track: &LovedTrack,
    details: &TrackDetails,
    cover_reference: &str,
    id: &str,
) -> Result<Document, StorageError> {
    let date = track.loved_at_utc()?.format("%Y-%m-%d %H:%M").to_string();

    Ok(Document::new()
        .with("Title", track.name.as_str())
        .with("Date", date)
        .with("Artist", track.artist.as_str())
        .with("Track", track.name.as_str())
        .with("Album", details.album.as_str())
        .with("Url", track.url.as_str())
        .with("Cover", cover_reference)
        .with("Template", JAM_TEMPLATE)
        .with(TIMESTAMP_FIELD, track.loved_at.to_string())
        .with("Uuid", id)
        .with("Text", ""))
}

pub fn asset_document(id: &str) -> Document {
    Document::new()
        .with("Sort", "1")
        .with("Template", IMAGE_TEMPLATE)
        .with("Uuid", id)
}

/// Writes jam records below one content root
pub struct RecordWriter {
    content_root: PathBuf,
}

impl RecordWriter {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Creates (or reuses) the directory for `track`.
    ///
    /// A directory left behind by an interrupted import of any track is reused.
    /// If the name is already taken by the complete record of another track,
    /// `-2`, `-3`, ... is appended until a free name is found.
    pub fn allocate_directory(&self, track: &LovedTrack) -> Result<PathBuf, StorageError> {
        let base = directory_name(track)?;
        let mut attempt = 1;

        loop {
            let name = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            let dir = self.content_root.join(&name);

            match read_record(&dir)? {
                Some(doc) if !is_record_of(&doc, track.loved_at) => {
                    debug!("{name} holds another track, trying the next name");
                    attempt += 1;
                }
                _ => {
                    fs::create_dir_all(&dir)?;
                    return Ok(dir);
                }
            }
        }
    }

    /// Downloads the cover into `dir` and returns the reference to store in the record.
    ///
    /// Errors are meant to be logged and replaced by an empty reference,
    /// a missing cover never fails an import.
    pub fn download_cover(
        &self,
        client: &dyn RemoteClient,
        url: &str,
        dir: &Path,
    ) -> Result<String, StorageError> {
        let response = client.get(url)?;
        if !response.is_ok() {
            return Err(StorageError::CoverStatus(response.status));
        }
        if response.body.is_empty() {
            return Err(StorageError::EmptyCover);
        }

        let file_name = format!("{COVER_STEM}.{}", cover_extension(url));
        let file_path = dir.join(&file_name);
        fs::write(&file_path, &response.body)?;

        let id = new_id();
        fs::write(
            dir.join(format!("{file_name}.txt")),
            asset_document(&id).render(),
        )?;

        debug!("Stored cover {} ({} bytes)", file_path.to_string_lossy(), response.body.len());
        Ok(format!("{FILE_REFERENCE_SCHEME}{id}"))
    }

    /// Writes the record document of `track` into `dir`, atomically
    pub fn write_metadata(
        &self,
        track: &LovedTrack,
        details: &TrackDetails,
        cover_reference: &str,
        dir: &Path,
    ) -> Result<PathBuf, StorageError> {
        let doc = jam_document(track, details, cover_reference, &new_id())?;

        let partial = dir.join(PARTIAL_RECORD_FILE);
        let target = dir.join(RECORD_FILE);
        fs::write(&partial, doc.render())?;
        fs::rename(&partial, &target)?;

        Ok(target)
    }
}
