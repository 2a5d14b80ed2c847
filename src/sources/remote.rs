//! Remote configuration server client.

use super::ConfigDocument;
use crate::core::{MergeReport, PropertyStore, merger};
use crate::error::{ConfigError, Result};
use crate::settings::{ClientSettings, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Client for a configuration server serving `/<application>/<environment>`.
///
/// Each fetch issues a single GET with a fixed timeout. There is no retry and
/// no caching: a failed fetch returns an error and leaves the store untouched.
///
/// # Examples
///
/// ```rust,no_run
/// use config_server_client::prelude::*;
///
/// # async fn example() -> config_server_client::error::Result<()> {
/// let client = ConfigServerClient::builder()
///     .with_host("config.internal")
///     .with_port(8888)
///     .build()?;
///
/// let store = PropertyStore::new();
/// let report = client.fetch_properties("myapp", "prod", &store).await?;
///
/// if !report.is_complete() {
///     eprintln!("missing property sources: {:?}", report.missing);
/// }
/// println!("db url: {:?}", store.get("db.url"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigServerClient {
    base_url: Url,
    client: Client,
    debug: Arc<AtomicBool>,
}

impl ConfigServerClient {
    /// Create a new builder for constructing a client.
    pub fn builder() -> ConfigServerClientBuilder {
        ConfigServerClientBuilder::new()
    }

    /// Create a client from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid URL or the
    /// HTTP client cannot be constructed.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::builder()
            .with_host(settings.host.clone())
            .with_port(settings.port)
            .with_timeout(settings.timeout())
            .with_debug(settings.debug)
            .build()
    }

    /// Enable or disable diagnostic dumps of fetched documents and the store.
    ///
    /// Has no effect on what is stored.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    /// Whether diagnostic dumps are enabled.
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// URL for an application and environment: `http://<host>:<port>/<application>/<environment>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address cannot carry a path.
    pub fn url_for(&self, application: &str, environment: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ConfigError::InvalidSettings(format!(
                    "server address cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(application)
            .push(environment);
        Ok(url)
    }

    /// Fetch the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Transport`] on connection failures and timeouts
    /// and [`ConfigError::Status`] on a non-success response.
    pub async fn fetch_raw(&self, application: &str, environment: &str) -> Result<Vec<u8>> {
        let url = self.url_for(application, environment)?;
        let transport_error = |e: reqwest::Error| ConfigError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        debug!(url = %url, bytes = body.len(), "Fetched configuration document");
        Ok(body.to_vec())
    }

    /// Fetch and decode the configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the body is not a valid document.
    pub async fn fetch_document(
        &self,
        application: &str,
        environment: &str,
    ) -> Result<ConfigDocument> {
        let body = self.fetch_raw(application, environment).await?;
        let document = ConfigDocument::from_slice(&body)?;

        if self.is_debug() {
            info!("Configuration document:\n{}", document.to_pretty_json());
        }
        Ok(document)
    }

    /// Fetch configuration for `application` in `environment` and merge it
    /// into `store`.
    ///
    /// Sources are applied base first, then environment, then application,
    /// so the most specific value wins for each key. The application and
    /// environment names are recorded under the `app_name` and `app_env`
    /// keys. Repeated fetches accumulate into the same store.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or decode failures, in which case the
    /// store is left exactly as it was.
    pub async fn fetch_properties(
        &self,
        application: &str,
        environment: &str,
        store: &PropertyStore,
    ) -> Result<MergeReport> {
        info!(application, environment, "Fetching configuration");

        let document = self.fetch_document(application, environment).await?;
        let report = merger::apply(store, &document, application, environment);

        info!(
            application,
            environment,
            sources = report.applied.len(),
            entries = store.len(),
            "Configuration loaded"
        );

        if self.is_debug() {
            let snapshot = store.snapshot();
            let mut keys: Vec<_> = snapshot.keys().collect();
            keys.sort();
            for key in keys {
                info!("Key: {} Value: {}", key, snapshot[key]);
            }
        }

        Ok(report)
    }

    /// Blocking variant of [`fetch_properties`](Self::fetch_properties).
    ///
    /// Drives the fetch on a private single-threaded runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Runtime`] when called from inside an async
    /// runtime, plus every error of the async variant.
    #[cfg(feature = "blocking")]
    pub fn fetch_properties_blocking(
        &self,
        application: &str,
        environment: &str,
        store: &PropertyStore,
    ) -> Result<MergeReport> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ConfigError::Runtime(
                "fetch_properties_blocking cannot run inside an async runtime; use fetch_properties"
                    .to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConfigError::Runtime(format!("Failed to create runtime: {}", e)))?;

        runtime.block_on(self.fetch_properties(application, environment, store))
    }
}

/// Builder for constructing a [`ConfigServerClient`].
///
/// Defaults to `localhost:8888` with a two second timeout.
pub struct ConfigServerClientBuilder {
    host: String,
    port: u16,
    timeout: Duration,
    debug: bool,
}

impl ConfigServerClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            debug: false,
        }
    }

    /// Set the server host.
    ///
    /// IPv6 addresses may be given bare (`::1`) or bracketed (`[::1]`).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request timeout.
    ///
    /// Default is 2 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start with diagnostic dumps enabled.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The host and port do not form a valid URL
    /// - The HTTP client cannot be constructed
    pub fn build(self) -> Result<ConfigServerClient> {
        // Bare IPv6 literals need brackets in a URL authority
        let authority_host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let base_url =
            Url::parse(&format!("http://{}:{}/", authority_host, self.port)).map_err(|e| {
                ConfigError::InvalidSettings(format!(
                    "invalid server address {}:{}: {}",
                    self.host, self.port, e
                ))
            })?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                ConfigError::InvalidSettings(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(ConfigServerClient {
            base_url,
            client,
            debug: Arc::new(AtomicBool::new(self.debug)),
        })
    }
}

impl Default for ConfigServerClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
