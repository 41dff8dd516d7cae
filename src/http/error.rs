use rouille::Response;
use serde::{Deserialize, Serialize};

use crate::sync::{SyncSummary, error::SyncError};

#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    Internal(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// JSON body of every webhook answer
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SyncSummary>,
}

impl Envelope {
    pub fn synced(message: &str, summary: SyncSummary) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
            data: Some(summary),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            data: None,
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Forbidden(_) => 403,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = match self {
            ApiError::Forbidden(msg) | ApiError::Internal(msg) => msg,
        };
        Response::json(&Envelope::failed(msg)).with_status_code(status)
    }
}
