//! Shared property store with lock-free reads.

use crate::error::{ConfigError, Result};
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved key holding the application name of the last fetch.
pub const APP_NAME_KEY: &str = "app_name";

/// Reserved key holding the environment name of the last fetch.
pub const APP_ENV_KEY: &str = "app_env";

/// The merged key/value properties consumed by the application.
///
/// The store starts empty and only grows: each merge publishes a new snapshot
/// atomically, so readers see either the previous or the next state, never a
/// partially applied merge. Cloning the store yields another handle to the
/// same properties.
///
/// # Examples
///
/// ```rust
/// use config_server_client::prelude::*;
/// use serde_json::json;
///
/// let store = PropertyStore::new();
/// store.set("server.port", json!(8080));
///
/// assert_eq!(store.get("server.port"), Some(json!(8080)));
/// assert_eq!(store.get_as::<u16>("server.port").unwrap(), Some(8080));
/// ```
#[derive(Clone, Default)]
pub struct PropertyStore {
    current: Arc<ArcSwap<HashMap<String, JsonValue>>>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.current.load().get(key).cloned()
    }

    /// Get the value under `key` deserialized as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    ConfigError::Deserialization(format!("property '{}': {}", key, e))
                })
            })
            .transpose()
    }

    /// Whether `key` has been stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.current.load().contains_key(key)
    }

    /// Store a single value, replacing any previous one.
    pub fn set(&self, key: impl Into<String>, value: JsonValue) {
        self.merge([(key.into(), value)]);
    }

    /// Write every entry in order, later entries overwriting earlier ones.
    ///
    /// All entries become visible to readers at once. Returns the number of
    /// entries written.
    pub fn merge<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, JsonValue)>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        if entries.is_empty() {
            return 0;
        }

        self.current.rcu(|current| {
            let mut next = (**current).clone();
            next.extend(entries.iter().cloned());
            next
        });
        entries.len()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.current.load().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A consistent view of every stored property.
    pub fn snapshot(&self) -> Arc<HashMap<String, JsonValue>> {
        self.current.load_full()
    }

    /// Application name recorded by the last fetch.
    pub fn application_name(&self) -> Option<String> {
        self.get_string(APP_NAME_KEY)
    }

    /// Environment name recorded by the last fetch.
    pub fn environment(&self) -> Option<String> {
        self.get_string(APP_ENV_KEY)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Deserialize the whole store into a typed configuration.
    ///
    /// Dotted keys such as `server.port` are folded into nested tables first,
    /// so flat properties from the configuration server map onto nested
    /// structs.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a valid path or if the folded
    /// properties do not fit `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_server_client::prelude::*;
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Debug, Deserialize)]
    /// struct Server {
    ///     port: u16,
    /// }
    ///
    /// #[derive(Debug, Deserialize)]
    /// struct AppConfig {
    ///     server: Server,
    /// }
    ///
    /// let store = PropertyStore::new();
    /// store.set("server.port", json!(8080));
    ///
    /// let config: AppConfig = store.try_deserialize().unwrap();
    /// assert_eq!(config.server.port, 8080);
    /// ```
    pub fn try_deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let snapshot = self.snapshot();
        let mut keys: Vec<_> = snapshot.keys().collect();
        // Parents before children so nested keys refine, not replace, a table
        keys.sort();

        let mut builder = config::Config::builder();
        for key in keys {
            let value = json_value_to_config_value(&snapshot[key])?;
            builder = builder.set_override(key.as_str(), value).map_err(|e| {
                ConfigError::Deserialization(format!("invalid property key '{}': {}", key, e))
            })?;
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::Deserialization(e.to_string()))?;

        config
            .try_deserialize::<T>()
            .map_err(|e| ConfigError::Deserialization(e.to_string()))
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("properties", &*self.current.load())
            .finish()
    }
}

/// Convert a serde_json::Value to a config::Value.
fn json_value_to_config_value(value: &JsonValue) -> Result<config::Value> {
    let kind = match value {
        JsonValue::Null => config::ValueKind::Nil,
        JsonValue::Bool(b) => config::ValueKind::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                config::ValueKind::I64(i)
            } else if let Some(u) = n.as_u64() {
                config::ValueKind::U64(u)
            } else if let Some(f) = n.as_f64() {
                config::ValueKind::Float(f)
            } else {
                return Err(ConfigError::Deserialization(format!(
                    "Unsupported number type: {}",
                    n
                )));
            }
        }
        JsonValue::String(s) => config::ValueKind::String(s.clone()),
        JsonValue::Array(arr) => {
            let values: Result<Vec<config::Value>> =
                arr.iter().map(json_value_to_config_value).collect();
            config::ValueKind::Array(values?)
        }
        JsonValue::Object(map) => {
            let mut table = HashMap::new();
            for (key, val) in map {
                table.insert(key.clone(), json_value_to_config_value(val)?);
            }
            config::ValueKind::Table(table)
        }
    };
    Ok(config::Value::new(None, kind))
}
