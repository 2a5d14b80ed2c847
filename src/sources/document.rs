//! Configuration server response document.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A parsed response from the configuration server.
///
/// The server lists property sources highest-precedence first, but that order
/// is not trusted: precedence is re-derived from source names by the
/// [selector](crate::sources::SourceSelection).
///
/// # Examples
///
/// ```rust
/// use config_server_client::sources::ConfigDocument;
///
/// let body = br#"{
///     "name": "myapp",
///     "profiles": ["prod"],
///     "propertySources": [
///         { "name": "file:config/application.yml", "source": { "x": 1 } }
///     ]
/// }"#;
///
/// let doc = ConfigDocument::from_slice(body).unwrap();
/// assert_eq!(doc.property_sources.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Application name echoed by the server
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Active profiles echoed by the server
    #[serde(deserialize_with = "null_as_default")]
    pub profiles: Vec<String>,
    /// Named property bundles, in server order
    #[serde(rename = "propertySources", deserialize_with = "null_as_default")]
    pub property_sources: Vec<PropertySource>,
}

/// One named bundle of properties, e.g. `file:config/application.yml#prod`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySource {
    /// Source name following the `file:config/<base>.yml[#<profile>]` convention
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Flat key/value properties
    #[serde(rename = "source", deserialize_with = "null_as_default")]
    pub values: Map<String, Value>,
}

impl ConfigDocument {
    /// Decode a raw response body.
    ///
    /// Unknown fields are ignored and missing fields decode as empty values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`](crate::error::ConfigError::Decode) on
    /// malformed JSON or on values of the wrong shape.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Render the document as indented JSON for diagnostics.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unprintable: {}>", e))
    }
}

impl PropertySource {
    /// Create a property source from a name and its values.
    pub fn new(name: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Decode an explicit `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
