//! Property store and the precedence merge that populates it.

pub mod merger;
pub mod store;

pub use merger::{AppliedSource, MergeReport};
pub use store::{APP_ENV_KEY, APP_NAME_KEY, PropertyStore};
