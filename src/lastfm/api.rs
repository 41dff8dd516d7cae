use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    domain::track::{LovedTrack, TrackDetails},
    lastfm::{client::RemoteClient, error::LastfmError},
};

/// Size tag of the only artwork variant used for covers
pub const LARGE_IMAGE_SIZE: &str = "large";

/// One entry of the loved-tracks list. Entries are decoded one by one,
/// so a malformed entry does not spoil the rest of the page.
pub type FetchedTrack = Result<LovedTrack, LastfmError>;

/// The two scrobbling-service methods the sync needs
pub struct LastfmApi {
    base_url: String,
    api_key: String,
}

impl LastfmApi {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request_url(&self, params: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        if params.is_empty() {
            return url;
        }

        url.push('?');
        for (index, (key, value)) in params.iter().enumerate() {
            if index > 0 {
                url.push('&');
            }
            url.push_str(key);
            url.push('=');
            url.push_str(urlencoding::encode(value).as_ref());
        }
        url
    }

    pub fn loved_tracks_url(&self, user: &str, limit: u32) -> String {
        let limit = limit.to_string();
        self.request_url(&[
            ("method", "user.getlovedtracks"),
            ("user", user),
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
            ("limit", limit.as_str()),
        ])
    }

    pub fn track_info_url(&self, artist: &str, track: &str) -> String {
        self.request_url(&[
            ("method", "track.getInfo"),
            ("api_key", self.api_key.as_str()),
            ("artist", artist),
            ("track", track),
            ("format", "json"),
        ])
    }

    /// Most recent loved tracks, newest first.
    ///
    /// Anything but a 200 with a JSON body is an error; the caller aborts the sync on it.
    pub fn fetch_loved_tracks(
        &self,
        client: &dyn RemoteClient,
        user: &str,
        limit: u32,
    ) -> Result<Vec<FetchedTrack>, LastfmError> {
        let response = client.get(&self.loved_tracks_url(user, limit))?;
        if !response.is_ok() {
            return Err(LastfmError::Status {
                code: response.status,
            });
        }

        let page: LovedTracksResponse = response.json()?;
        let entries = page
            .lovedtracks
            .and_then(|loved| loved.track)
            .map(OneOrMany::into_vec)
            .unwrap_or_default();

        debug!("Last.fm returned {} loved tracks for {user}", entries.len());

        Ok(entries.into_iter().map(decode_loved_track).collect())
    }

    /// Album name and large cover URL of a track. Never fails: any problem yields empty details.
    pub fn fetch_track_details(
        &self,
        client: &dyn RemoteClient,
        artist: &str,
        track: &str,
    ) -> TrackDetails {
        match self.try_fetch_track_details(client, artist, track) {
            Ok(details) => details,
            Err(err) => {
                warn!("Track details for {artist} - {track} unavailable: {err}");
                TrackDetails::default()
            }
        }
    }

    fn try_fetch_track_details(
        &self,
        client: &dyn RemoteClient,
        artist: &str,
        track: &str,
    ) -> Result<TrackDetails, LastfmError> {
        let response = client.get(&self.track_info_url(artist, track))?;
        if !response.is_ok() {
            return Err(LastfmError::Status {
                code: response.status,
            });
        }

        let info: TrackInfoResponse = response.json()?;
        let Some(album) = info.track.and_then(|track| track.album) else {
            return Ok(TrackDetails::default());
        };

        let cover_url = album
            .image
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .find(|image| {
                image.size.as_deref() == Some(LARGE_IMAGE_SIZE)
                    && image.url.as_deref().is_some_and(|url| !url.is_empty())
            })
            .and_then(|image| image.url)
            .unwrap_or_default();

        Ok(TrackDetails {
            album: album.title.unwrap_or_default(),
            cover_url,
        })
    }
}

/// The API collapses one-element lists into a bare object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct LovedTracksResponse {
    lovedtracks: Option<LovedTracksPage>,
}

#[derive(Debug, Deserialize)]
struct LovedTracksPage {
    track: Option<OneOrMany<Value>>,
}

#[derive(Debug, Deserialize)]
struct WireLovedTrack {
    name: Option<String>,
    url: Option<String>,
    mbid: Option<String>,
    artist: Option<WireArtist>,
    date: Option<WireDate>,
}

#[derive(Debug, Deserialize)]
struct WireArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDate {
    uts: Option<Uts>,
}

/// `uts` arrives as a string, but tolerate a plain number too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Uts {
    Number(i64),
    Text(String),
}

fn decode_loved_track(entry: Value) -> FetchedTrack {
    let wire: WireLovedTrack = serde_json::from_value(entry)?;

    let loved_at = match wire.date.and_then(|date| date.uts) {
        Some(Uts::Number(uts)) => uts,
        Some(Uts::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| LastfmError::MalformedTrack(format!("invalid timestamp '{text}'")))?,
        None => {
            return Err(LastfmError::MalformedTrack(format!(
                "missing loved-at timestamp for '{}'",
                wire.name.unwrap_or_default()
            )));
        }
    };

    Ok(LovedTrack {
        artist: wire.artist.and_then(|artist| artist.name).unwrap_or_default(),
        name: wire.name.unwrap_or_default(),
        url: wire.url.unwrap_or_default(),
        loved_at,
        mbid: wire.mbid.filter(|mbid| !mbid.is_empty()),
    })
}

#[derive(Debug, Deserialize)]
struct TrackInfoResponse {
    track: Option<WireTrackInfo>,
}

#[derive(Debug, Deserialize)]
struct WireTrackInfo {
    album: Option<WireAlbum>,
}

#[derive(Debug, Deserialize)]
struct WireAlbum {
    title: Option<String>,
    image: Option<OneOrMany<WireImage>>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    size: Option<String>,
    #[serde(rename = "#text")]
    url: Option<String>,
}
