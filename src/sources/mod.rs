//! Configuration server transport, response document, and source selection.

mod document;
mod remote;
mod selector;

pub use document::{ConfigDocument, PropertySource};
pub use remote::{ConfigServerClient, ConfigServerClientBuilder};
pub use selector::{BASE_SOURCE_NAME, SourceCategory, SourceSelection, classify};
