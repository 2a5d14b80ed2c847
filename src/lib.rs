//! # config-server-client
//!
//! Fetch layered application properties from a remote configuration server.
//!
//! ## Overview
//!
//! `config-server-client` asks a configuration server for
//! `/<application>/<environment>`, picks three property sources out of the
//! response by name, and merges them into a shared [`PropertyStore`]:
//!
//! 1. `file:config/application.yml`: base properties for every application
//! 2. `file:config/application.yml#<environment>`: environment overrides
//! 3. `file:config/<application>.yml`: application overrides (optional)
//!
//! Later sources win, so application settings override environment settings,
//! which override base settings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use config_server_client::prelude::*;
//!
//! # async fn example() -> config_server_client::error::Result<()> {
//! let client = ConfigServerClient::from_settings(&ClientSettings::from_env()?)?;
//! let store = PropertyStore::new();
//!
//! let report = client.fetch_properties("myapp", "prod", &store).await?;
//! println!("applied {} sources", report.applied.len());
//!
//! let port: Option<u16> = store.get_as("server.port")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! - Transport and decode failures are returned as [`ConfigError`]; the store
//!   is not modified.
//! - A missing base or environment source is not an error. It is logged at
//!   `warn` and listed in [`MergeReport::missing`].
//! - A missing application source is skipped silently.
//!
//! ## Feature Flags
//!
//! - `blocking` (default): `ConfigServerClient::fetch_properties_blocking`
//!   for callers without an async runtime.
//!
//! [`PropertyStore`]: core::PropertyStore
//! [`ConfigError`]: error::ConfigError
//! [`MergeReport::missing`]: core::MergeReport::missing

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod settings;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{MergeReport, PropertyStore};
    pub use crate::error::{ConfigError, Result};
    pub use crate::settings::ClientSettings;
    pub use crate::sources::{ConfigServerClient, SourceCategory};
}
