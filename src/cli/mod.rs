use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    config::{self, Config},
    http::server::HttpServer,
    lastfm::client::UreqClient,
    sync::{
        Syncer,
        invalidate::{CacheInvalidator, FlushDirsInvalidator, LogInvalidator},
    },
};

#[derive(Parser)]
#[command(name = "jamsync")]
#[command(version = "0.1")]
#[command(about = "Turns Last.fm loved tracks into jam records")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import new loved tracks once
    Sync {
        /// Number of most recent loved tracks to look at (defaults to webhook.limit)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Run the http server exposing the sync webhook
    Serve,
}

fn build_syncer(cfg: &Config) -> Syncer {
    let invalidator: Box<dyn CacheInvalidator> = if cfg.cache.flush_dirs.is_empty() {
        Box::new(LogInvalidator)
    } else {
        Box::new(FlushDirsInvalidator::new(cfg.cache.flush_dirs.clone()))
    };

    Syncer::new(
        cfg.sync_settings(),
        Box::new(UreqClient::new()),
        invalidator,
    )
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let path = cli.config.to_string_lossy();
    let cfg = config::Config::load(&path)?;
    let syncer = build_syncer(&cfg);

    match &cli.command {
        Commands::Sync { limit } => {
            let limit = limit.unwrap_or(cfg.webhook.limit);
            let summary = syncer.sync(limit).context("Sync failed")?;

            println!(
                "Synced {} loved tracks: {} imported, {} skipped, {} errors",
                summary.total, summary.imported, summary.skipped, summary.errors
            );
        }

        Commands::Serve => {
            let http_server = HttpServer::new(syncer, cfg.http.clone());

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }

    Ok(())
}
