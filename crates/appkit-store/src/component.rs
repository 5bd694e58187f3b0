//! Component records and the references used to look them up.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a component within its app, assigned by the store.
pub type ComponentId = u64;

/// An app's components, ordered by id.
///
/// Serialized as a JSON object keyed by the decimal id.
pub type Components = BTreeMap<ComponentId, Component>;

/// A configurable unit of app functionality.
///
/// The store only reads `slug` (and `kind` when reporting dangling
/// components). The rest of the record belongs to the component type that
/// created it and is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Short name addressing the component within its app.
    pub slug: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Name of the component type that owns this record.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Type-specific settings.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Component {
    pub fn new(slug: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: String::new(),
            kind: kind.into(),
            options: serde_json::Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Addresses a component either by slug or by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentRef {
    Slug(String),
    Id(ComponentId),
}

impl ComponentRef {
    /// Whether the component stored under `id` is the one referenced.
    pub fn matches(&self, id: ComponentId, component: &Component) -> bool {
        match self {
            Self::Slug(slug) => component.slug == *slug,
            Self::Id(wanted) => *wanted == id,
        }
    }
}

impl From<ComponentId> for ComponentRef {
    fn from(id: ComponentId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ComponentRef {
    fn from(slug: &str) -> Self {
        Self::Slug(slug.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(slug: String) -> Self {
        Self::Slug(slug)
    }
}

/// Parses user input: anything that reads as an unsigned integer is an
/// id, everything else is a slug. A purely numeric slug therefore cannot
/// be addressed from text; use [`ComponentRef::Slug`] directly.
impl FromStr for ComponentRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<ComponentId>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Slug(trimmed.to_string()),
        })
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slug(slug) => write!(f, "slug '{slug}'"),
            Self::Id(id) => write!(f, "id {id}"),
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_numeric_is_id() {
        assert_eq!("12".parse::<ComponentRef>().unwrap(), ComponentRef::Id(12));
        assert_eq!(" 3 ".parse::<ComponentRef>().unwrap(), ComponentRef::Id(3));
    }

    #[test]
    fn parse_text_is_slug() {
        assert_eq!(
            "news".parse::<ComponentRef>().unwrap(),
            ComponentRef::Slug("news".into())
        );
        // Negative and fractional numbers are not ids.
        assert_eq!(
            "-1".parse::<ComponentRef>().unwrap(),
            ComponentRef::Slug("-1".into())
        );
        assert_eq!(
            "1.5".parse::<ComponentRef>().unwrap(),
            ComponentRef::Slug("1.5".into())
        );
    }

    #[test]
    fn matches_by_slug_or_id() {
        let home = Component::new("home", "page");
        assert!(ComponentRef::from("home").matches(9, &home));
        assert!(!ComponentRef::from("news").matches(9, &home));
        assert!(ComponentRef::Id(9).matches(9, &home));
        assert!(!ComponentRef::Id(1).matches(9, &home));
    }

    #[test]
    fn deserializes_host_shape() {
        let value = json!({
            "slug": "news",
            "label": "News",
            "type": "posts-list",
            "options": {"taxonomy": "category", "term": "news"}
        });
        let component: Component = serde_json::from_value(value).unwrap();
        assert_eq!(component.kind, "posts-list");
        assert_eq!(component.options["term"], json!("news"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let component: Component = serde_json::from_value(json!({"slug": "bare"})).unwrap();
        assert_eq!(component, Component::new("bare", ""));
    }

    #[test]
    fn collection_serializes_with_string_keys() {
        let mut components = Components::new();
        components.insert(2, Component::new("news", "posts-list"));
        let value = serde_json::to_value(&components).unwrap();
        assert!(value.get("2").is_some());
        let back: Components = serde_json::from_value(value).unwrap();
        assert_eq!(back, components);
    }
}
