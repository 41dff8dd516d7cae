use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::sync::{DEFAULT_LIMIT, SyncSettings};

pub const DEFAULT_BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_CONTENT_DIR: &str = "jams";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub lastfm: LastfmConfig,
    pub content: ContentConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Everything the sync engine needs, resolved once so the core never reads config itself
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            api_key: self.lastfm.api_key.clone(),
            user: self.lastfm.user.clone(),
            base_url: self.lastfm.base_url.clone(),
            content_root: self.content.root.join(&self.content.dir_name),
            webhook_limit: self.webhook.limit,
            webhook_secret: self.webhook.secret.clone(),
            webhook_allow_unauthenticated: self.webhook.allow_unauthenticated,
        }
    }
}

/// Credentials may be missing here; sync refuses to run without them
#[derive(Debug, Deserialize, Clone)]
pub struct LastfmConfig {
    pub api_key: Option<String>,
    pub user: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    pub root: PathBuf,
    #[serde(default = "default_content_dir")]
    pub dir_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub secret: Option<String>,
    /// Without a secret the webhook refuses every request unless this is set
    #[serde(default)]
    pub allow_unauthenticated: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            secret: None,
            allow_unauthenticated: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

/// Host cache directories emptied after a batch imported something
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub flush_dirs: Vec<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_content_dir() -> String {
    DEFAULT_CONTENT_DIR.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}
