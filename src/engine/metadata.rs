//! Tag and language extraction from content metadata.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::store::ContentStore;
use crate::types::{Content, IndexConfig};

/// Classification of one content item: its tag set and language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ContentMetadata {
    /// Never empty after extraction; holds `""` when the content has no tags.
    pub tags: BTreeSet<String>,
    /// Empty when the content declares no language.
    pub language: String,
}

/// Trim and lower-case a name; `None` if nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let value = name.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_lowercase())
    }
}

/// Extract metadata for a content item with a known category.
///
/// `json_metadata` may hold `tags` as an array of strings or as one
/// whitespace/comma separated string. Malformed JSON yields no tags.
pub fn extract_metadata(content: &Content, category: &str, config: &IndexConfig) -> ContentMetadata {
    let parsed: Option<Value> = if content.json_metadata.trim().is_empty() {
        None
    } else {
        serde_json::from_str(&content.json_metadata).ok()
    };

    let mut tags = BTreeSet::new();
    let mut language = String::new();
    if let Some(Value::Object(meta)) = parsed {
        let raw: Vec<String> = match meta.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => s
                .split(|c: char| c.is_whitespace() || c == ',')
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        for name in raw.iter().filter_map(|n| normalize_name(n)) {
            if tags.len() >= config.max_tags {
                break;
            }
            tags.insert(name);
        }
        if let Some(lang) = meta.get("language").and_then(Value::as_str) {
            language = normalize_name(lang).unwrap_or_default();
        }
    }

    if config.include_category {
        if let Some(category) = normalize_name(category) {
            tags.insert(category);
        }
    }

    if tags.is_empty() {
        tags.insert(String::new());
    }

    ContentMetadata { tags, language }
}

/// Extract metadata, resolving the category through the content store.
pub fn metadata_for(
    store: &dyn ContentStore,
    content: &Content,
    config: &IndexConfig,
) -> ContentMetadata {
    let category = if config.include_category {
        store.category_of(content, config.max_reply_depth)
    } else {
        String::new()
    };
    extract_metadata(content, &category, config)
}
