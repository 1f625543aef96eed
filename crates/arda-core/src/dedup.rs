//! First-occurrence deduplication of input rows

use crate::table::Row;
use std::collections::HashSet;
use std::hash::Hash;

/// Identity of a row for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Trimmed value of the index field
    Index(String),
    /// Entire row content, used when the index is missing, blank or `nan`
    Content(Vec<(String, String)>),
}

/// Compute the dedup key of a row given the raw value of its index field
pub fn dedup_key(row: &Row, index_value: Option<&str>) -> DedupKey {
    let index = index_value.unwrap_or("").trim();
    if index.is_empty() || index.eq_ignore_ascii_case("nan") {
        DedupKey::Content(
            row.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    } else {
        DedupKey::Index(index.to_string())
    }
}

/// Keep the first item for every key, preserving input order
pub fn dedupe<T, K, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key_fn(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, index: &str, name: &str) -> Row {
        Row::from_pairs(line, [("idx", index), ("name", name)])
    }

    fn by_index(r: &&Row) -> DedupKey {
        dedup_key(r, r.get("idx"))
    }

    #[test]
    fn test_dedupe_by_index_keeps_first() {
        let rows = vec![row(2, "7", "a"), row(3, " 7 ", "b"), row(4, "8", "c")];
        let kept = dedupe(&rows, by_index);

        let names: Vec<&str> = kept.iter().map(|r| r.get("name").unwrap()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_dedupe_without_index_uses_content() {
        let rows = vec![
            row(2, "", "a"),
            row(3, "NaN", "a"),
            row(4, "nan", "b"),
            row(5, "", "a"),
        ];
        let kept = dedupe(&rows, by_index);

        // "" and "NaN" rows differ in content, so both survive
        let lines: Vec<usize> = kept.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_index_and_content_keys_do_not_collide() {
        let with_index = Row::from_pairs(2, [("idx", "x")]);
        let without = Row::from_pairs(3, [("idx", "")]);

        assert_ne!(
            dedup_key(&with_index, with_index.get("idx")),
            dedup_key(&without, without.get("idx"))
        );
    }

    #[test]
    fn test_missing_index_field() {
        let r = Row::from_pairs(2, [("name", "a")]);
        assert_eq!(
            dedup_key(&r, None),
            DedupKey::Content(vec![("name".to_string(), "a".to_string())])
        );
    }

    #[test]
    fn test_dedupe_preserves_order() {
        let kept = dedupe(vec![3, 1, 3, 2, 1], |n| *n);
        assert_eq!(kept, vec![3, 1, 2]);
    }
}
