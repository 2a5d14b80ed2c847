//! Property source selection by name pattern.

use super::{ConfigDocument, PropertySource};
use std::fmt;

/// Name of the base property source shared by every application.
pub const BASE_SOURCE_NAME: &str = "file:config/application.yml";

/// The three property source categories recognized by the merger.
///
/// Variants are declared in merge order, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceCategory {
    /// `file:config/application.yml`
    Base,
    /// `file:config/application.yml#<environment>`
    BaseEnvironment,
    /// `file:config/<application>.yml`
    Application,
}

impl SourceCategory {
    /// All categories in merge order.
    pub const MERGE_ORDER: [SourceCategory; 3] = [
        SourceCategory::Base,
        SourceCategory::BaseEnvironment,
        SourceCategory::Application,
    ];

    /// Whether a missing source of this category degrades the merge.
    pub fn is_required(self) -> bool {
        !matches!(self, SourceCategory::Application)
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Base => "base",
            Self::BaseEnvironment => "base+environment",
            Self::Application => "application",
        };
        f.pad(label)
    }
}

/// Classify a property source name.
///
/// Patterns are tried in merge order and the first one that matches decides
/// the category, so an exact base name is never treated as an environment or
/// application source.
///
/// # Examples
///
/// ```rust
/// use config_server_client::sources::{classify, SourceCategory};
///
/// assert_eq!(
///     classify("file:config/application.yml#prod", "myapp", "prod"),
///     Some(SourceCategory::BaseEnvironment)
/// );
/// assert_eq!(classify("file:config/other.yml", "myapp", "prod"), None);
/// ```
pub fn classify(name: &str, application: &str, environment: &str) -> Option<SourceCategory> {
    if name == BASE_SOURCE_NAME {
        Some(SourceCategory::Base)
    } else if name.contains(&format!("{}#{}", BASE_SOURCE_NAME, environment)) {
        Some(SourceCategory::BaseEnvironment)
    } else if name.contains(&format!("file:config/{}.yml", application)) {
        Some(SourceCategory::Application)
    } else {
        None
    }
}

/// Indices of the selected property sources within a [`ConfigDocument`].
///
/// `None` means no source matched the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSelection {
    /// Index of the base source
    pub base: Option<usize>,
    /// Index of the environment-specific base source
    pub base_environment: Option<usize>,
    /// Index of the application-specific source
    pub application: Option<usize>,
}

impl SourceSelection {
    /// Scan the document's sources once and keep the first match per category.
    pub fn select(document: &ConfigDocument, application: &str, environment: &str) -> Self {
        let mut selection = Self::default();

        for (index, source) in document.property_sources.iter().enumerate() {
            let slot = match classify(&source.name, application, environment) {
                Some(SourceCategory::Base) => &mut selection.base,
                Some(SourceCategory::BaseEnvironment) => &mut selection.base_environment,
                Some(SourceCategory::Application) => &mut selection.application,
                None => continue,
            };
            slot.get_or_insert(index);
        }

        selection
    }

    /// Index selected for a category, if any.
    pub fn index(&self, category: SourceCategory) -> Option<usize> {
        match category {
            SourceCategory::Base => self.base,
            SourceCategory::BaseEnvironment => self.base_environment,
            SourceCategory::Application => self.application,
        }
    }

    /// Resolve every category, in merge order, to its source in `document`.
    pub fn resolve<'a>(
        self,
        document: &'a ConfigDocument,
    ) -> impl Iterator<Item = (SourceCategory, Option<(usize, &'a PropertySource)>)> + 'a {
        SourceCategory::MERGE_ORDER.into_iter().map(move |category| {
            let source = self.index(category).and_then(|index| {
                document
                    .property_sources
                    .get(index)
                    .map(|source| (index, source))
            });
            (category, source)
        })
    }

    /// Required categories that found no source.
    pub fn missing(&self) -> Vec<SourceCategory> {
        SourceCategory::MERGE_ORDER
            .into_iter()
            .filter(|category| category.is_required() && self.index(*category).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn document(names: &[&str]) -> ConfigDocument {
        ConfigDocument {
            property_sources: names
                .iter()
                .map(|name| PropertySource::new(*name, Map::new()))
                .collect(),
            ..ConfigDocument::default()
        }
    }

    #[test]
    fn test_classify_base_requires_exact_name() {
        assert_eq!(
            classify("file:config/application.yml", "myapp", "prod"),
            Some(SourceCategory::Base)
        );
        assert_eq!(
            classify("classpath:file:config/application.yml", "myapp", "prod"),
            None
        );
    }

    #[test]
    fn test_classify_environment_is_substring_match() {
        assert_eq!(
            classify("git:file:config/application.yml#prod", "myapp", "prod"),
            Some(SourceCategory::BaseEnvironment)
        );
        assert_eq!(classify("file:config/application.yml#dev", "myapp", "prod"), None);
    }

    #[test]
    fn test_classify_application() {
        assert_eq!(
            classify("file:config/myapp.yml", "myapp", "prod"),
            Some(SourceCategory::Application)
        );
        assert_eq!(
            classify("file:config/myapp.yml#prod", "myapp", "prod"),
            Some(SourceCategory::Application)
        );
        assert_eq!(classify("file:config/otherapp.yml", "myapp", "prod"), None);
    }

    #[test]
    fn test_classify_prefers_earlier_category() {
        // An application literally named "application" still resolves its
        // environment file as the environment source.
        assert_eq!(
            classify("file:config/application.yml#prod", "application", "prod"),
            Some(SourceCategory::BaseEnvironment)
        );
        assert_eq!(
            classify("file:config/application.yml", "application", "prod"),
            Some(SourceCategory::Base)
        );
    }

    #[test]
    fn test_display_pads() {
        assert_eq!(format!("{:<6}|", SourceCategory::Base), "base  |");
        assert_eq!(SourceCategory::BaseEnvironment.to_string(), "base+environment");
    }

    #[test]
    fn test_select_all_categories() {
        let doc = document(&[
            "file:config/myapp.yml",
            "file:config/application.yml#prod",
            "file:config/application.yml",
        ]);

        let selection = SourceSelection::select(&doc, "myapp", "prod");
        assert_eq!(selection.base, Some(2));
        assert_eq!(selection.base_environment, Some(1));
        assert_eq!(selection.application, Some(0));
        assert!(selection.missing().is_empty());
    }

    #[test]
    fn test_select_first_match_wins() {
        let doc = document(&[
            "file:config/application.yml#prod",
            "file:config/application.yml",
            "override:file:config/application.yml#prod",
            "file:config/application.yml",
        ]);

        let selection = SourceSelection::select(&doc, "myapp", "prod");
        assert_eq!(selection.base_environment, Some(0));
        assert_eq!(selection.base, Some(1));
    }

    #[test]
    fn test_select_reports_missing_required() {
        let doc = document(&["file:config/myapp.yml"]);

        let selection = SourceSelection::select(&doc, "myapp", "prod");
        assert_eq!(selection.application, Some(0));
        assert_eq!(
            selection.missing(),
            vec![SourceCategory::Base, SourceCategory::BaseEnvironment]
        );
    }

    #[test]
    fn test_missing_application_is_not_reported() {
        let doc = document(&["file:config/application.yml", "file:config/application.yml#prod"]);

        let selection = SourceSelection::select(&doc, "myapp", "prod");
        assert_eq!(selection.application, None);
        assert!(selection.missing().is_empty());
    }

    #[test]
    fn test_resolve_in_merge_order() {
        let doc = document(&["file:config/myapp.yml", "file:config/application.yml"]);
        let selection = SourceSelection::select(&doc, "myapp", "prod");

        let resolved: Vec<_> = selection
            .resolve(&doc)
            .map(|(category, source)| (category, source.map(|(_, s)| s.name.as_str())))
            .collect();

        assert_eq!(
            resolved,
            vec![
                (SourceCategory::Base, Some("file:config/application.yml")),
                (SourceCategory::BaseEnvironment, None),
                (SourceCategory::Application, Some("file:config/myapp.yml")),
            ]
        );
    }
}
