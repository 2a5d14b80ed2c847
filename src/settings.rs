//! Connection settings for the configuration server client.

use crate::error::Result;
use config::Environment;
use serde::Deserialize;
use std::time::Duration;

/// Default configuration server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default configuration server port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default environment variable prefix for [`ClientSettings::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "CONFIG_SERVER";

/// Where the configuration server lives and how to talk to it.
///
/// # Examples
///
/// ```rust
/// use config_server_client::settings::ClientSettings;
/// use std::time::Duration;
///
/// let settings = ClientSettings::default();
/// assert_eq!(settings.host, "localhost");
/// assert_eq!(settings.port, 8888);
/// assert_eq!(settings.timeout(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Log the raw document and the merged store after each fetch
    pub debug: bool,
}

impl ClientSettings {
    /// Load settings from `CONFIG_SERVER_*` environment variables.
    ///
    /// Recognized variables: `CONFIG_SERVER_HOST`, `CONFIG_SERVER_PORT`,
    /// `CONFIG_SERVER_TIMEOUT_MS` and `CONFIG_SERVER_DEBUG`. Unset variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load settings from environment variables with a custom prefix.
    ///
    /// `APP_CFG` reads `APP_CFG_HOST`, `APP_CFG_PORT`, and so on.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS as i64)?
            .set_default("debug", false)?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
        }
    }
}
