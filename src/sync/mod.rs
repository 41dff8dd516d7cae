//! Pulls loved tracks and turns the new ones into jam records

use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    domain::track::LovedTrack,
    lastfm::{
        api::{FetchedTrack, LastfmApi},
        client::RemoteClient,
    },
    storage::{error::StorageError, fs::record_exists, record::RecordWriter},
};

pub mod error;
pub mod invalidate;

use error::SyncError;
use invalidate::CacheInvalidator;

pub const DEFAULT_LIMIT: u32 = 20;

/// Everything a sync needs to know, passed in explicitly
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub api_key: Option<String>,
    pub user: Option<String>,
    pub base_url: String,
    /// directory holding one subdirectory per jam record
    pub content_root: PathBuf,
    pub webhook_limit: u32,
    pub webhook_secret: Option<String>,
    pub webhook_allow_unauthenticated: bool,
}

impl SyncSettings {
    /// api key and user, both required and non-empty
    fn credentials(&self) -> Result<(&str, &str), SyncError> {
        let api_key = self.api_key.as_deref().filter(|key| !key.is_empty());
        let user = self.user.as_deref().filter(|user| !user.is_empty());

        match (api_key, user) {
            (Some(api_key), Some(user)) => Ok((api_key, user)),
            _ => Err(SyncError::Configuration(
                "Last.fm configuration missing, set lastfm.api_key and lastfm.user".into(),
            )),
        }
    }
}

/// What happened to one loved track
#[derive(Debug)]
pub enum TrackOutcome {
    Imported(PathBuf),
    Skipped,
    Failed(String),
}

/// Counts for one batch; `total == imported + skipped + errors`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: &TrackOutcome) {
        self.total += 1;
        match outcome {
            TrackOutcome::Imported(_) => self.imported += 1,
            TrackOutcome::Skipped => self.skipped += 1,
            TrackOutcome::Failed(_) => self.errors += 1,
        }
    }
}

/// Main structure that drives fetch, dedupe, enrichment and record creation
pub struct Syncer {
    settings: SyncSettings,
    client: Box<dyn RemoteClient>,
    invalidator: Box<dyn CacheInvalidator>,
}

impl Syncer {
    pub fn new(
        settings: SyncSettings,
        client: Box<dyn RemoteClient>,
        invalidator: Box<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            settings,
            client,
            invalidator,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Imports the `limit` most recent loved tracks that have no record yet.
    ///
    /// Missing credentials, an unreachable content root or a failed loved-tracks
    /// request abort the sync. Anything going wrong with a single track only
    /// counts as an error in the summary.
    pub fn sync(&self, limit: u32) -> Result<SyncSummary, SyncError> {
        let (api_key, user) = self.settings.credentials()?;
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        let writer = RecordWriter::new(&self.settings.content_root);
        std::fs::create_dir_all(writer.content_root()).map_err(StorageError::Fs)?;

        let api = LastfmApi::new(&self.settings.base_url, api_key);
        let tracks = api.fetch_loved_tracks(self.client.as_ref(), user, limit)?;

        let mut summary = SyncSummary::default();
        for fetched in tracks {
            let outcome = self.process_track(&api, &writer, fetched);
            match &outcome {
                TrackOutcome::Imported(dir) => info!("Imported {}", dir.to_string_lossy()),
                TrackOutcome::Skipped => {}
                TrackOutcome::Failed(reason) => warn!("Error importing track: {reason}"),
            }
            summary.record(&outcome);
        }

        info!(
            "Sync finished: {} tracks, {} imported, {} skipped, {} errors",
            summary.total, summary.imported, summary.skipped, summary.errors
        );

        if summary.imported > 0 {
            if let Err(err) = self.invalidator.invalidate() {
                warn!("Cache invalidation failed: {err}");
            }
        }

        Ok(summary)
    }

    fn process_track(
        &self,
        api: &LastfmApi,
        writer: &RecordWriter,
        fetched: FetchedTrack,
    ) -> TrackOutcome {
        let track = match fetched {
            Ok(track) => track,
            Err(err) => return TrackOutcome::Failed(err.to_string()),
        };

        match self.import_track(api, writer, &track) {
            Ok(outcome) => outcome,
            Err(err) => TrackOutcome::Failed(format!("{} - {}: {err}", track.artist, track.name)),
        }
    }

    fn import_track(
        &self,
        api: &LastfmApi,
        writer: &RecordWriter,
        track: &LovedTrack,
    ) -> Result<TrackOutcome, StorageError> {
        if record_exists(writer.content_root(), track.loved_at)? {
            debug!("Skipping {} - {}, already recorded", track.artist, track.name);
            return Ok(TrackOutcome::Skipped);
        }

        debug!(
            "Looking up {} - {}{}",
            track.artist,
            track.name,
            track.mbid.as_deref().map(|mbid| format!(" [{mbid}]")).unwrap_or_default()
        );
        let details = api.fetch_track_details(self.client.as_ref(), &track.artist, &track.name);
        let dir = writer.allocate_directory(track)?;

        let cover_reference = if details.cover_url.is_empty() {
            String::new()
        } else {
            writer
                .download_cover(self.client.as_ref(), &details.cover_url, &dir)
                .unwrap_or_else(|err| {
                    warn!("Cover for {} - {} not stored: {err}", track.artist, track.name);
                    String::new()
                })
        };

        writer.write_metadata(track, &details, &cover_reference, &dir)?;

        Ok(TrackOutcome::Imported(dir))
    }
}
