//! brainz-album - MusicBrainz album lookup tool
//!
//! Command-line host for the album provider: searches releases or resolves
//! release / release-group ids for an album and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use brainz_album::logging::init_logging;
use brainz_album::{AlbumCriteria, MbError, MusicBrainzAlbumProvider, ProviderKey};
use brainz_common::config::{default_config_path, resolve_config, write_toml_config};
use brainz_common::TomlConfig;
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments for brainz-album
#[derive(Parser, Debug)]
#[command(name = "brainz-album")]
#[command(about = "Resolve album metadata from a MusicBrainz server")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/brainz/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// MusicBrainz server, overrides config and environment
    #[arg(long, global = true)]
    server: Option<String>,

    /// Minimum milliseconds between requests (clamped for the public server)
    #[arg(long, global = true)]
    rate_limit_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List matching releases
    Search(AlbumArgs),
    /// Resolve release and release-group ids for an album
    Resolve(AlbumArgs),
    /// Write a config file with default settings
    InitConfig {
        /// Destination (defaults to <config dir>/brainz/config.toml)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AlbumArgs {
    /// Album title
    #[arg(long, default_value = "")]
    album: String,

    /// Album artist name
    #[arg(long)]
    artist: Option<String>,

    /// MusicBrainz album artist id
    #[arg(long)]
    artist_id: Option<String>,

    /// MusicBrainz release id
    #[arg(long)]
    release_id: Option<String>,

    /// MusicBrainz release group id
    #[arg(long)]
    release_group_id: Option<String>,
}

enum Lookup {
    Search,
    Resolve,
}

impl AlbumArgs {
    fn into_criteria(self) -> AlbumCriteria {
        let mut criteria = AlbumCriteria::new(self.album);

        if let Some(artist) = self.artist {
            criteria = criteria.with_album_artist(artist);
        }
        if let Some(id) = self.artist_id {
            criteria = criteria.with_provider_id(ProviderKey::AlbumArtist, id);
        }
        if let Some(id) = self.release_id {
            criteria = criteria.with_provider_id(ProviderKey::Album, id);
        }
        if let Some(id) = self.release_group_id {
            criteria = criteria.with_provider_id(ProviderKey::ReleaseGroup, id);
        }

        criteria
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (lookup, args) = match cli.command {
        Command::InitConfig { path } => return init_config(path),
        Command::Search(args) => (Lookup::Search, args),
        Command::Resolve(args) => (Lookup::Resolve, args),
    };

    let log_level = init_logging();

    let mut config = resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.musicbrainz.server = server;
    }
    if let Some(rate_limit_ms) = cli.rate_limit_ms {
        config.musicbrainz.rate_limit_ms = rate_limit_ms;
    }

    log_level
        .apply_configured(&config.logging.level)
        .context("Failed to apply configured log level")?;

    info!(
        server = %config.musicbrainz.server_url(),
        interval_ms = config.musicbrainz.effective_rate_limit(),
        "Starting brainz-album v{}",
        env!("CARGO_PKG_VERSION")
    );

    let provider = MusicBrainzAlbumProvider::new(config.musicbrainz)
        .context("Failed to create MusicBrainz provider")?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let criteria = args.into_criteria();
    let output = match lookup {
        Lookup::Search => {
            let results = provider.search(&criteria, &cancel).await;
            serde_json::to_string_pretty(&results.map_err(report)?)?
        }
        Lookup::Resolve => {
            let metadata = provider.resolve(&criteria, &cancel).await;
            serde_json::to_string_pretty(&metadata.map_err(report)?)?
        }
    };

    println!("{}", output);
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path
        .or_else(default_config_path)
        .context("Could not determine config directory")?;
    write_toml_config(&TomlConfig::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn report(e: MbError) -> anyhow::Error {
    anyhow::Error::new(e).context("MusicBrainz lookup aborted")
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        warn!("Received Ctrl+C, cancelling lookup");
        cancel.cancel();
    }
}
