//! Precedence merge of selected property sources.

use crate::core::store::{APP_ENV_KEY, APP_NAME_KEY};
use crate::core::PropertyStore;
use crate::sources::{ConfigDocument, SourceCategory, SourceSelection};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// A property source that contributed to a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSource {
    /// Category the source was selected for
    pub category: SourceCategory,
    /// Position of the source in the server response
    pub index: usize,
    /// Source name
    pub name: String,
    /// Number of keys the source contributed
    pub keys: usize,
}

/// Outcome of a merge: what was applied and what was missing.
///
/// A missing base or environment source does not fail the merge; it is
/// surfaced here and logged at `warn` so the gap stays visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Sources applied, lowest precedence first
    pub applied: Vec<AppliedSource>,
    /// Required categories for which no source was found
    pub missing: Vec<SourceCategory>,
}

impl MergeReport {
    /// Whether every required category was found.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Total key/value pairs written from property sources.
    pub fn keys_applied(&self) -> usize {
        self.applied.iter().map(|source| source.keys).sum()
    }

    /// The source applied for `category`, if any.
    pub fn source(&self, category: SourceCategory) -> Option<&AppliedSource> {
        self.applied.iter().find(|source| source.category == category)
    }
}

/// Flatten the selected sources into one ordered list of entries.
///
/// Entries are emitted base first, then base+environment, then application,
/// so writing them in order leaves the highest-precedence value for each key.
/// Nothing is written to any store here.
pub fn plan(
    document: &ConfigDocument,
    selection: SourceSelection,
) -> (Vec<(String, JsonValue)>, MergeReport) {
    let mut entries = Vec::new();
    let mut report = MergeReport {
        applied: Vec::new(),
        missing: selection.missing(),
    };

    for (category, source) in selection.resolve(document) {
        let Some((index, source)) = source else {
            if category.is_required() {
                warn!(
                    category = %category,
                    "No property source matched; its properties will be missing"
                );
            } else {
                debug!(category = %category, "No property source matched; skipping");
            }
            continue;
        };

        debug!(
            category = %category,
            index,
            source = %source.name,
            keys = source.values.len(),
            "Applying property source"
        );

        entries.extend(
            source
                .values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        report.applied.push(AppliedSource {
            category,
            index,
            name: source.name.clone(),
            keys: source.values.len(),
        });
    }

    (entries, report)
}

/// Select and merge the document's sources into `store` in precedence order.
///
/// The requested application and environment are recorded under the reserved
/// bookkeeping keys ahead of the source entries. Everything is published to
/// the store in a single merge.
pub fn apply(
    store: &PropertyStore,
    document: &ConfigDocument,
    application: &str,
    environment: &str,
) -> MergeReport {
    let selection = SourceSelection::select(document, application, environment);
    debug!(
        base = ?selection.base,
        base_environment = ?selection.base_environment,
        application_source = ?selection.application,
        "Selected property sources"
    );

    let (entries, report) = plan(document, selection);
    let bookkeeping = [
        (APP_NAME_KEY.to_string(), JsonValue::from(application)),
        (APP_ENV_KEY.to_string(), JsonValue::from(environment)),
    ];
    store.merge(bookkeeping.into_iter().chain(entries));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::PropertySource;
    use serde_json::{Map, json};

    fn source(name: &str, values: JsonValue) -> PropertySource {
        let values: Map<String, JsonValue> = serde_json::from_value(values).unwrap();
        PropertySource::new(name, values)
    }

    fn document(sources: Vec<PropertySource>) -> ConfigDocument {
        ConfigDocument {
            name: "myapp".to_string(),
            profiles: vec!["prod".to_string()],
            property_sources: sources,
        }
    }

    fn merge(
        doc: &ConfigDocument,
        application: &str,
        environment: &str,
    ) -> (PropertyStore, MergeReport) {
        let store = PropertyStore::new();
        let report = apply(&store, doc, application, environment);
        (store, report)
    }

    #[test]
    fn test_layered_override() {
        let doc = document(vec![
            source("file:config/application.yml", json!({"x": 1, "y": 2})),
            source("file:config/application.yml#prod", json!({"y": 3, "z": 4})),
            source("file:config/myapp.yml", json!({"z": 5})),
        ]);

        let (store, report) = merge(&doc, "myapp", "prod");
        assert_eq!(store.get("x"), Some(json!(1)));
        assert_eq!(store.get("y"), Some(json!(3)));
        assert_eq!(store.get("z"), Some(json!(5)));
        assert_eq!(store.application_name().as_deref(), Some("myapp"));
        assert_eq!(store.environment().as_deref(), Some("prod"));
        assert_eq!(store.len(), 5);
        assert!(report.is_complete());
        assert_eq!(report.keys_applied(), 5);
    }

    #[test]
    fn test_precedence_ignores_server_order() {
        let doc = document(vec![
            source("file:config/myapp.yml", json!({"z": 5})),
            source("file:config/application.yml#prod", json!({"y": 3, "z": 4})),
            source("file:config/application.yml", json!({"x": 1, "y": 2, "z": 0})),
        ]);

        let (store, report) = merge(&doc, "myapp", "prod");
        assert_eq!(store.get("y"), Some(json!(3)));
        assert_eq!(store.get("z"), Some(json!(5)));

        let order: Vec<_> = report.applied.iter().map(|s| s.category).collect();
        assert_eq!(order, SourceCategory::MERGE_ORDER.to_vec());
        assert_eq!(report.source(SourceCategory::Base).map(|s| s.index), Some(2));
    }

    #[test]
    fn test_disjoint_keys_union() {
        let doc = document(vec![
            source("file:config/application.yml", json!({"a": "base"})),
            source("file:config/application.yml#prod", json!({"b": "env"})),
        ]);

        let (store, report) = merge(&doc, "myapp", "prod");
        assert_eq!(store.keys(), vec!["a", "app_env", "app_name", "b"]);
        assert!(report.source(SourceCategory::Application).is_none());
        assert!(report.is_complete());
    }

    #[test]
    fn test_missing_base_degrades() {
        let doc = document(vec![
            source("file:config/application.yml#prod", json!({"y": 3})),
            source("file:config/myapp.yml", json!({"z": 5})),
        ]);

        let (store, report) = merge(&doc, "myapp", "prod");
        assert_eq!(store.keys(), vec!["app_env", "app_name", "y", "z"]);
        assert_eq!(report.missing, vec![SourceCategory::Base]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_nothing_matches() {
        let doc = document(vec![source("file:config/other.yml", json!({"q": 1}))]);

        let (store, report) = merge(&doc, "myapp", "prod");
        assert_eq!(store.keys(), vec!["app_env", "app_name"]);
        assert!(report.applied.is_empty());
        assert_eq!(
            report.missing,
            vec![SourceCategory::Base, SourceCategory::BaseEnvironment]
        );
    }

    #[test]
    fn test_duplicate_environment_source_ignored() {
        let doc = document(vec![
            source("file:config/application.yml", json!({"y": 1})),
            source("file:config/application.yml#prod", json!({"y": 2})),
            source("file:config/application.yml#prod", json!({"y": 99, "extra": true})),
        ]);

        let (store, _) = merge(&doc, "myapp", "prod");
        assert_eq!(store.get("y"), Some(json!(2)));
        assert!(!store.contains_key("extra"));
    }

    #[test]
    fn test_source_may_override_bookkeeping() {
        let doc = document(vec![
            source("file:config/application.yml", json!({"app_env": "shadowed"})),
            source("file:config/application.yml#prod", json!({})),
        ]);

        let (store, _) = merge(&doc, "myapp", "prod");
        assert_eq!(store.environment().as_deref(), Some("shadowed"));
        assert_eq!(store.application_name().as_deref(), Some("myapp"));
    }

    #[test]
    fn test_report_missing_matches_selection() {
        let doc = document(vec![source("file:config/myapp.yml", json!({"z": 5}))]);
        let selection = SourceSelection::select(&doc, "myapp", "prod");

        let (_, report) = plan(&doc, selection);
        assert_eq!(report.missing, selection.missing());
        assert_eq!(
            report.missing,
            vec![SourceCategory::Base, SourceCategory::BaseEnvironment]
        );
    }

    #[test]
    fn test_plan_does_not_touch_store() {
        let doc = document(vec![source("file:config/application.yml", json!({"x": 1}))]);
        let selection = SourceSelection::select(&doc, "myapp", "prod");

        let (entries, report) = plan(&doc, selection);
        assert_eq!(entries, vec![("x".to_string(), json!(1))]);
        assert_eq!(report.missing, vec![SourceCategory::BaseEnvironment]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        fn layer() -> impl Strategy<Value = HashMap<String, i64>> {
            prop::collection::hash_map("[a-e]", any::<i64>(), 0..5)
        }

        proptest! {
            #[test]
            fn highest_precedence_value_wins(base in layer(), env in layer(), app in layer()) {
                let doc = document(vec![
                    source("file:config/myapp.yml", json!(app)),
                    source("file:config/application.yml", json!(base)),
                    source("file:config/application.yml#prod", json!(env)),
                ]);

                let (store, _) = merge(&doc, "myapp", "prod");

                let mut expected = base.clone();
                expected.extend(env.clone());
                expected.extend(app.clone());

                prop_assert_eq!(store.len(), expected.len() + 2);
                for (key, value) in expected {
                    prop_assert_eq!(store.get(&key), Some(json!(value)));
                }
            }
        }
    }
}
