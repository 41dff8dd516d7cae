use thiserror::Error;

#[derive(Debug, Error)]
pub enum LastfmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed with status {code}")]
    Status { code: u16 },

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed loved track: {0}")]
    MalformedTrack(String),
}
