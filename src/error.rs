//! Error types for config-server-client.

/// Result type alias for config-server-client operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while fetching or reading remote configuration.
///
/// Every variant except [`ConfigError::Deserialization`] is raised before the
/// property store is touched, so a failed fetch never leaves a partial merge
/// behind.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The HTTP request could not be sent or the body could not be read.
    ///
    /// Covers DNS failures, refused connections and timeouts.
    #[error("Failed to reach configuration server at {url}: {message}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Underlying transport error
        message: String,
    },

    /// The configuration server answered with a non-success status.
    #[error("Configuration server returned {status} for {url}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body is not a valid configuration document.
    #[error("Failed to decode configuration document: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client settings are unusable (bad host, port, or environment values).
    #[error("Invalid client settings: {0}")]
    InvalidSettings(String),

    /// Stored properties could not be mapped onto the requested type.
    #[error("Failed to deserialize properties: {0}")]
    Deserialization(String),

    /// The blocking entry point could not drive the fetch.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::InvalidSettings(err.to_string())
    }
}
