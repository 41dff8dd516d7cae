use log::{info, warn};
use rouille::{Request, Response};
use std::sync::{Arc, Mutex};

use crate::{
    config::HttpConfig,
    http::error::{ApiError, Envelope},
    sync::{SyncSummary, Syncer},
};

pub const WEBHOOK_PATH: &str = "/webhook/sync-jams";
const SYNC_MESSAGE: &str = "Jams synchronization completed via Last.fm plugin";

/// Who may trigger a sync through the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
enum WebhookAccess {
    Secret(String),
    Open,
    /// no secret configured and no explicit opt-out
    Closed,
}

impl WebhookAccess {
    fn allows(&self, provided: impl FnOnce() -> String) -> bool {
        match self {
            WebhookAccess::Secret(secret) => provided() == *secret,
            WebhookAccess::Open => true,
            WebhookAccess::Closed => false,
        }
    }
}

/// Webhook endpoint triggering a sync.
///
/// The syncer sits behind a mutex, so overlapping requests run one sync after the other.
pub struct HttpServer {
    syncer: Arc<Mutex<Syncer>>,
    access: WebhookAccess,
    webhook_limit: u32,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(syncer: Syncer, config: HttpConfig) -> Self {
        let settings = syncer.settings();
        let access = match settings.webhook_secret.as_deref() {
            Some(secret) if !secret.is_empty() => WebhookAccess::Secret(secret.to_string()),
            _ if settings.webhook_allow_unauthenticated => WebhookAccess::Open,
            _ => WebhookAccess::Closed,
        };
        match access {
            WebhookAccess::Open => warn!("Webhook accepts requests without a secret"),
            WebhookAccess::Closed => warn!(
                "No webhook secret configured, every webhook request will be refused \
                 (set webhook.secret, or webhook.allow_unauthenticated = true)"
            ),
            WebhookAccess::Secret(_) => {}
        }
        let webhook_limit = settings.webhook_limit;

        Self {
            syncer: Arc::new(Mutex::new(syncer)),
            access,
            webhook_limit,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (POST) [WEBHOOK_PATH] => {
                self.handle_sync_jams(request)
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    /// secret from the urlencoded body, else from the query string
    fn provided_secret(request: &Request) -> String {
        let from_body = rouille::input::post::raw_urlencoded_post_input(request)
            .ok()
            .and_then(|fields| {
                fields
                    .into_iter()
                    .find(|(key, _)| key == "secret")
                    .map(|(_, value)| value)
            });

        from_body
            .or_else(|| request.get_param("secret"))
            .unwrap_or_default()
    }

    /// returns the sync summary, or ApiError
    fn sync_jams(&self, request: &Request) -> Result<SyncSummary, ApiError> {
        if !self.access.allows(|| Self::provided_secret(request)) {
            return Err(ApiError::Forbidden("Invalid secret".into()));
        }

        let syncer = self.syncer.lock().map_err(|e| {
            ApiError::Internal(format!("Could not access syncer under lock: {e}"))
        })?;

        Ok(syncer.sync(self.webhook_limit)?)
    }

    fn handle_sync_jams(&self, request: &Request) -> Response {
        match self.sync_jams(request) {
            Ok(summary) => Response::json(&Envelope::synced(SYNC_MESSAGE, summary)),
            Err(e) => {
                log::warn!("Webhook sync failed: {e:?}");
                e.into_response()
            }
        }
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lastfm::client::testing::FakeRemote,
        sync::{SyncSettings, invalidate::testing::CountingInvalidator},
    };

    use rouille::Request;
    use serde_json::json;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn loved_body() -> String {
        json!({
            "lovedtracks": { "track": {
                "artist": { "name": "Boards of Canada" },
                "date": { "uts": "1700000000" },
                "name": "Roygbiv",
                "url": "https://www.last.fm/music/Boards+of+Canada/_/Roygbiv"
            }}
        })
        .to_string()
    }

    fn test_settings(root: &Path, secret: Option<&str>) -> SyncSettings {
        SyncSettings {
            api_key: Some("key123".into()),
            user: Some("alienlebarge".into()),
            base_url: "http://lastfm.test/2.0/".into(),
            content_root: root.join("jams"),
            webhook_limit: 5,
            webhook_secret: secret.map(String::from),
            webhook_allow_unauthenticated: false,
        }
    }

    fn test_http_config() -> HttpConfig {
        HttpConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
        }
    }

    fn create_server(remote: FakeRemote, secret: Option<&str>) -> (HttpServer, TempDir) {
        let root = tempdir().unwrap();
        let syncer = Syncer::new(
            test_settings(root.path(), secret),
            Box::new(remote),
            Box::new(CountingInvalidator::new()),
        );
        (HttpServer::new(syncer, test_http_config()), root)
    }

    fn working_remote() -> FakeRemote {
        FakeRemote::new()
            .route("method=user.getlovedtracks", 200, loved_body())
            .route("method=track.getInfo", 404, "")
    }

    fn form_post(url: &str, body: &str) -> Request {
        Request::fake_http(
            "POST",
            url,
            vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_sync_with_secret_in_body() -> anyhow::Result<()> {
        let remote = working_remote();
        let calls = remote.calls();
        let (server, _root) = create_server(remote, Some("s3cret"));

        let response = server.handle_request(&form_post("/webhook/sync-jams", "secret=s3cret"));

        assert_eq!(response.status_code, 200);
        let body: Envelope = parse_json_response(response)?;
        assert!(body.success);
        assert_eq!(
            body.message.as_deref(),
            Some("Jams synchronization completed via Last.fm plugin")
        );
        assert_eq!(
            body.data,
            Some(SyncSummary {
                total: 1,
                imported: 1,
                skipped: 0,
                errors: 0
            })
        );
        assert!(calls.lock().unwrap()[0].contains("limit=5"));
        Ok(())
    }

    #[test]
    fn test_sync_with_secret_in_query() -> anyhow::Result<()> {
        let (server, _root) = create_server(working_remote(), Some("s3cret"));

        let request = Request::fake_http("POST", "/webhook/sync-jams?secret=s3cret", vec![], vec![]);
        let response = server.handle_request(&request);

        assert_eq!(response.status_code, 200);
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_forbidden_and_syncs_nothing() -> anyhow::Result<()> {
        let remote = working_remote();
        let calls = remote.calls();
        let (server, _root) = create_server(remote, Some("s3cret"));

        for request in [
            form_post("/webhook/sync-jams", "secret=guess"),
            Request::fake_http("POST", "/webhook/sync-jams?secret=S3CRET", vec![], vec![]),
            Request::fake_http("POST", "/webhook/sync-jams", vec![], vec![]),
        ] {
            let response = server.handle_request(&request);
            assert_eq!(response.status_code, 403);
            let body: Envelope = parse_json_response(response)?;
            assert!(!body.success);
            assert_eq!(body.error.as_deref(), Some("Invalid secret"));
        }

        assert!(calls.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_secret_refuses_every_request() -> anyhow::Result<()> {
        for secret in [None, Some("")] {
            let remote = working_remote();
            let calls = remote.calls();
            let (server, _root) = create_server(remote, secret);

            for request in [
                Request::fake_http("POST", "/webhook/sync-jams", vec![], vec![]),
                form_post("/webhook/sync-jams", "secret="),
            ] {
                let response = server.handle_request(&request);
                assert_eq!(response.status_code, 403);
                let body: Envelope = parse_json_response(response)?;
                assert_eq!(body.error.as_deref(), Some("Invalid secret"));
            }

            assert!(calls.lock().unwrap().is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_explicitly_open_webhook_accepts_any_request() {
        let root = tempdir().unwrap();
        let settings = SyncSettings {
            webhook_allow_unauthenticated: true,
            ..test_settings(root.path(), None)
        };
        let syncer = Syncer::new(
            settings,
            Box::new(working_remote()),
            Box::new(CountingInvalidator::new()),
        );
        let server = HttpServer::new(syncer, test_http_config());

        let request = Request::fake_http("POST", "/webhook/sync-jams", vec![], vec![]);
        let response = server.handle_request(&request);

        assert_eq!(response.status_code, 200);
    }

    #[test]
    fn test_configured_secret_wins_over_open_flag() {
        let root = tempdir().unwrap();
        let settings = SyncSettings {
            webhook_allow_unauthenticated: true,
            ..test_settings(root.path(), Some("s3cret"))
        };
        let syncer = Syncer::new(
            settings,
            Box::new(working_remote()),
            Box::new(CountingInvalidator::new()),
        );
        let server = HttpServer::new(syncer, test_http_config());

        let request = Request::fake_http("POST", "/webhook/sync-jams", vec![], vec![]);

        assert_eq!(server.handle_request(&request).status_code, 403);
    }

    #[test]
    fn test_upstream_failure_is_500() -> anyhow::Result<()> {
        let remote = FakeRemote::new().route("method=user.getlovedtracks", 503, "");
        let (server, _root) = create_server(remote, Some("s3cret"));

        let response = server.handle_request(&form_post("/webhook/sync-jams", "secret=s3cret"));

        assert_eq!(response.status_code, 500);
        let body: Envelope = parse_json_response(response)?;
        assert!(!body.success);
        assert!(body.error.unwrap().contains("503"));
        assert!(body.data.is_none());
        Ok(())
    }

    #[test]
    fn test_get_and_unknown_routes_are_404() {
        let (server, _root) = create_server(working_remote(), Some("s3cret"));

        for request in [
            Request::fake_http("GET", "/webhook/sync-jams?secret=s3cret", vec![], vec![]),
            Request::fake_http("POST", "/webhook/other?secret=s3cret", vec![], vec![]),
            Request::fake_http("POST", "/webhook/sync-jams/extra", vec![], vec![]),
        ] {
            assert_eq!(server.handle_request(&request).status_code, 404);
        }
    }
}
