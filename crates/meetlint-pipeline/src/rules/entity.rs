//! Entity references: bare names or `[name](url)` links, resolved against a
//! whitelist of known entities.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use meetlint_types::{Entity, MeetlintError, Result};

lazy_static! {
    static ref LINK_RE: Regex = Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link regex");
}

/// Names referenced by a comma-separated list, link syntax stripped.
///
/// Empty names are kept so callers can report them.
pub fn extract_entity_names(text: &str) -> Vec<String> {
    LINK_RE
        .replace_all(text, "$1")
        .split(',')
        .map(|name| name.trim().to_string())
        .collect()
}

/// Name referenced by `text`, link syntax stripped.
pub fn extract_entity_name(text: &str) -> String {
    LINK_RE.replace_all(text, "$1").into_owned()
}

pub fn has_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

/// Ordered whitelist of entities, looked up by exact name.
#[derive(Debug, Clone)]
pub struct EntityCatalog {
    entities: Vec<Entity>,
    by_name: HashMap<String, usize>,
}

impl EntityCatalog {
    /// Build a catalog. `kind` names the list in errors (`"hosters"`).
    pub fn new(kind: &str, entities: Vec<Entity>) -> Result<Self> {
        if entities.is_empty() {
            return Err(MeetlintError::InvalidInput(format!(
                "{kind} must be a non-empty list"
            )));
        }
        if let Some(bad) = entities
            .iter()
            .find(|e| e.name.trim().is_empty() || e.url.trim().is_empty())
        {
            return Err(MeetlintError::InvalidInput(format!(
                "{kind} entries must have a name and a url, got {bad:?}"
            )));
        }

        let mut by_name = HashMap::new();
        for (i, entity) in entities.iter().enumerate() {
            by_name.entry(entity.name.clone()).or_insert(i);
        }
        Ok(Self { entities, by_name })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Option<&Entity> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }

    /// `[name](url)` for known names, the bare name otherwise.
    pub fn format_with_link(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(entity) => format!("[{}]({})", entity.name, entity.url),
            None => name.to_string(),
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EntityCatalog {
        EntityCatalog::new(
            "speakers",
            vec![
                Entity::new("Alice", "https://alice.example"),
                Entity::new("Bob", "https://bob.example"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn extracts_names_from_mixed_text() {
        assert_eq!(
            extract_entity_names("[Alice](https://alice.example), Bob"),
            vec!["Alice", "Bob"]
        );
        assert_eq!(extract_entity_names("Alice,  , Bob"), vec!["Alice", "", "Bob"]);
    }

    #[test]
    fn extracts_single_name() {
        assert_eq!(extract_entity_name("[Acme](https://acme.example)"), "Acme");
        assert_eq!(extract_entity_name("Acme"), "Acme");
    }

    #[test]
    fn detects_links() {
        assert!(has_link("[Acme](https://acme.example)"));
        assert!(!has_link("Acme"));
        assert!(!has_link("[Acme]"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = catalog();
        assert!(catalog.contains("Alice"));
        assert!(!catalog.contains("alice"));
        assert_eq!(
            catalog.resolve("Bob").map(|e| e.url.as_str()),
            Some("https://bob.example")
        );
    }

    #[test]
    fn formats_links_for_known_names_only() {
        let catalog = catalog();
        assert_eq!(catalog.format_with_link("Alice"), "[Alice](https://alice.example)");
        assert_eq!(catalog.format_with_link("Carol"), "Carol");
    }

    #[test]
    fn rejects_empty_list() {
        let err = EntityCatalog::new("hosters", Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: hosters must be a non-empty list");
    }

    #[test]
    fn rejects_entries_without_url() {
        let err = EntityCatalog::new("hosters", vec![Entity::new("Acme", " ")]).unwrap_err();
        assert!(matches!(err, MeetlintError::InvalidInput(_)));
    }
}
