//! Resolution of canonical Fusion field names to export header labels
//!
//! Fusion 360 labels its columns as `Human Name (field_id)`, e.g.
//! `Number (tool_number)`. Mapping logic refers to fields by the id alone;
//! explicit aliases cover exports that use different labels.

use crate::table::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const TOOL_INDEX: &str = "tool_index";
pub const TOOL_DESCRIPTION: &str = "tool_description";
pub const TOOL_NUMBER: &str = "tool_number";
pub const TOOL_TYPE: &str = "tool_type";
pub const TOOL_COMMENT: &str = "tool_comment";
pub const TOOL_PRODUCT_ID: &str = "tool_productId";
pub const TOOL_VENDOR: &str = "tool_vendor";
pub const TOOL_PRODUCT_LINK: &str = "tool_productLink";

/// Canonical fields read by the default mapping
pub const CANONICAL_FIELDS: [&str; 8] = [
    TOOL_INDEX,
    TOOL_DESCRIPTION,
    TOOL_NUMBER,
    TOOL_TYPE,
    TOOL_COMMENT,
    TOOL_PRODUCT_ID,
    TOOL_VENDOR,
    TOOL_PRODUCT_LINK,
];

/// Configured aliases from canonical field name to header label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMap {
    aliases: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a canonical field to an explicit header label
    pub fn with_alias(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.aliases.insert(field.into(), label.into());
        self
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Resolve canonical names against the headers of one table
    ///
    /// Headers of the form `Label (field)` resolve automatically; aliases take
    /// precedence over that.
    pub fn resolve(&self, headers: &[String]) -> ResolvedHeaders {
        let mut labels = HashMap::new();

        for header in headers {
            if let Some(field) = embedded_field(header) {
                labels
                    .entry(field.to_string())
                    .or_insert_with(|| header.clone());
            }
        }

        for (field, label) in &self.aliases {
            if !headers.iter().any(|h| h == label) {
                warn!(field = %field, label = %label, "aliased header not present in input");
            }
            labels.insert(field.clone(), label.clone());
        }

        ResolvedHeaders { labels }
    }
}

/// Extract `field` from a header shaped like `Label (field)`
fn embedded_field(header: &str) -> Option<&str> {
    let inner = header.trim().strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let field = inner[open + 1..].trim();
    (!field.is_empty()).then_some(field)
}

/// Canonical-name lookup table for a single parsed table
#[derive(Debug, Clone, Default)]
pub struct ResolvedHeaders {
    labels: HashMap<String, String>,
}

impl ResolvedHeaders {
    /// Header label used for a canonical field; unresolved names are used verbatim
    pub fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.labels.get(field).map(String::as_str).unwrap_or(field)
    }

    /// Value of a canonical field in `row`, empty when absent
    pub fn value<'r>(&self, row: &'r Row, field: &str) -> &'r str {
        row.get(self.label(field)).unwrap_or("")
    }

    /// Whether the field maps onto one of the table's headers
    pub fn contains(&self, field: &str) -> bool {
        self.labels.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_embedded_field() {
        assert_eq!(embedded_field("Number (tool_number)"), Some("tool_number"));
        assert_eq!(embedded_field("  Type (tool_type) "), Some("tool_type"));
        assert_eq!(embedded_field("Outer (a) (b)"), Some("b"));
        assert_eq!(embedded_field("Plain"), None);
        assert_eq!(embedded_field("Empty ()"), None);
    }

    #[test]
    fn test_resolve_fusion_labels() {
        let resolved = HeaderMap::new().resolve(&headers(&[
            "Tool Index (tool_index)",
            "Number (tool_number)",
        ]));

        assert_eq!(resolved.label(TOOL_INDEX), "Tool Index (tool_index)");
        assert_eq!(resolved.label(TOOL_NUMBER), "Number (tool_number)");
        assert!(resolved.contains(TOOL_NUMBER));
        assert!(!resolved.contains(TOOL_VENDOR));
    }

    #[test]
    fn test_resolve_alias_overrides_detection() {
        let map = HeaderMap::new().with_alias(TOOL_NUMBER, "T#");
        let resolved = map.resolve(&headers(&["Number (tool_number)", "T#"]));

        assert_eq!(resolved.label(TOOL_NUMBER), "T#");
    }

    #[test]
    fn test_value_falls_back_to_exact_header() {
        let resolved = HeaderMap::new().resolve(&headers(&["tool_vendor"]));
        let row = Row::from_pairs(2, [("tool_vendor", "Harvey")]);

        assert_eq!(resolved.value(&row, TOOL_VENDOR), "Harvey");
        assert_eq!(resolved.value(&row, TOOL_COMMENT), "");
    }

    #[test]
    fn test_header_map_json_is_plain_object() {
        let map = HeaderMap::new().with_alias(TOOL_TYPE, "Kind");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"tool_type":"Kind"}"#);
    }
}
