use anyhow::anyhow;
use chrono::{DateTime, Datelike, Utc};

/// Seconds since unix epoch at which a track was loved.
/// This is the only identity a loved track has.
pub type LovedAt = i64;

/// A track the user marked as loved, as returned by the scrobbling service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LovedTrack {
    pub artist: String,
    pub name: String,
    pub url: String,
    pub loved_at: LovedAt,
    pub mbid: Option<String>,
}

impl LovedTrack {
    /// Only years 0 to 9999 are accepted, the ones `%Y` renders as four digits
    pub fn loved_at_utc(&self) -> anyhow::Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.loved_at, 0)
            .filter(|time| (0..=9999).contains(&time.year()))
            .ok_or(anyhow!(
                "failed to convert {} s timestamp to a four-digit-year datetime",
                self.loved_at
            ))
    }
}

/// Album and artwork looked up per track. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDetails {
    pub album: String,
    pub cover_url: String,
}
