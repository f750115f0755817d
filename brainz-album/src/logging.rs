//! Tracing setup for the CLI
//!
//! The subscriber is installed before configuration is read so that config
//! warnings reach stderr. `RUST_LOG` wins when set; otherwise logging starts at
//! [`DEFAULT_LEVEL`] and switches to the configured level once it is known.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Level used until the config file has been read
pub const DEFAULT_LEVEL: &str = "info";

/// Handle to the installed level filter
pub struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevel {
    /// Reloadable filter layer, starting at `RUST_LOG` if set
    pub fn layer() -> (reload::Layer<EnvFilter, Registry>, Self) {
        Self::layer_from(EnvFilter::try_from_default_env().ok())
    }

    fn layer_from(env_filter: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let from_env = env_filter.is_some();
        let (layer, handle) =
            reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL)));
        (layer, Self { handle, from_env })
    }

    /// Switch to the configured level; a `RUST_LOG` filter is left alone.
    /// Returns whether the filter changed.
    pub fn apply_configured(&self, level: &str) -> Result<bool, reload::Error> {
        if self.from_env {
            return Ok(false);
        }

        self.handle.reload(EnvFilter::new(level))?;
        Ok(true)
    }
}

/// Install the global subscriber; output goes to stderr so stdout stays JSON
pub fn init_logging() -> LogLevel {
    let (filter, level) = LogLevel::layer();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    level
}
