use std::io::Read;

use serde::de::DeserializeOwned;

use crate::lastfm::error::LastfmError;

/// Status code and raw body of a finished request, whatever the status
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RemoteResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, LastfmError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Blocking GET. Only transport failures are errors, any status is returned to the caller.
pub trait RemoteClient: Send {
    fn get(&self, url: &str) -> Result<RemoteResponse, LastfmError>;
}

/// `RemoteClient` backed by `ureq`, with the platform default timeouts
pub struct UreqClient {
    http_client: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        Self {
            http_client: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteClient for UreqClient {
    fn get(&self, url: &str) -> Result<RemoteResponse, LastfmError> {
        let response = match self.http_client.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(LastfmError::Transport(err.to_string()));
            }
        };

        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| LastfmError::Transport(format!("failed to read response: {err}")))?;

        Ok(RemoteResponse { status, body })
    }
}
