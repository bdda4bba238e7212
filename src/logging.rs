//! Logging configuration and initialization
//!
//! Logs go to stderr through `env_logger`, keeping stdout free for results.

use env_logger::{Builder, Env};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SIGNING_LOG";

/// Environment variable controlling colored output
pub const LOG_STYLE_ENV: &str = "SIGNING_LOG_STYLE";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level filter (default: "info")
    pub default_level: String,
    /// Prefix records with a timestamp (default: true)
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            timestamps: true,
        }
    }
}

/// Name of the variable the filter is read from
///
/// `SIGNING_LOG` wins over `RUST_LOG`.
fn filter_env() -> &'static str {
    if std::env::var_os(LOG_ENV).is_some() {
        LOG_ENV
    } else {
        "RUST_LOG"
    }
}

/// Initialize the global logger
///
/// Fails if a logger was already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), log::SetLoggerError> {
    let env = Env::new()
        .filter_or(filter_env(), config.default_level.as_str())
        .write_style(LOG_STYLE_ENV);

    let mut builder = Builder::from_env(env);
    if !config.timestamps {
        builder.format_timestamp(None);
    }
    builder.try_init()?;

    log::debug!(
        "Logging initialized (version {}, filter from {})",
        env!("CARGO_PKG_VERSION"),
        filter_env()
    );
    Ok(())
}
