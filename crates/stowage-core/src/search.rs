//! Search results and QR lookups

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::Item;
use crate::location::LocationView;

/// What a search hit refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchHitKind {
    Item,
    Location,
}

/// A single search hit with a readable path ("Home → Bedroom → Dresser")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SearchHitKind,
    pub description: Option<String>,
    pub location_path: Option<String>,
}

/// Search hits grouped by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub total_count: usize,
    pub items: Vec<SearchResult>,
    pub locations: Vec<SearchResult>,
}

/// What a scanned QR label resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum QrTarget {
    Location(Box<LocationView>),
    Item(Box<Item>),
}

/// `%term%` pattern for a case-insensitive `LIKE ... ESCAPE '\'`
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Fresh label id such as `psms-loc-1a2b3c4d`
pub fn new_qr_code_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Box"), "%box%");
        assert_eq!(like_pattern(" 100%_cotton "), "%100\\%\\_cotton%");
    }

    #[test]
    fn qr_ids_use_prefix() {
        let id = new_qr_code_id("psms-loc-");
        assert!(id.starts_with("psms-loc-"));
        assert_eq!(id.len(), "psms-loc-".len() + 8);
        assert_ne!(id, new_qr_code_id("psms-loc-"));
    }

    #[test]
    fn hit_kind_serializes_as_type() {
        let hit = SearchResult {
            id: Uuid::nil(),
            name: "Passport".into(),
            kind: SearchHitKind::Item,
            description: None,
            location_path: Some("Study → Desk".into()),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["type"], "item");
    }
}
