//! Core table types for the input export and the Arda output schema

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A parsed input table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Header names, in file order
    pub headers: Vec<String>,
    /// Accepted data rows
    pub rows: Vec<Row>,
    /// Line numbers of records dropped by the tolerant row policy
    pub skipped_lines: Vec<usize>,
}

impl Table {
    /// Create a table from headers and rows
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            headers,
            rows,
            skipped_lines: Vec::new(),
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find the position of a header by name
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// One input record keyed by header name
///
/// Keys keep the position of their first insertion; inserting a duplicate
/// header replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Physical line (1-based) on which the record started
    pub line: usize,
    fields: IndexMap<String, String>,
}

impl Row {
    /// Create an empty row for the record starting at `line`
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: IndexMap::new(),
        }
    }

    /// Build a row from header/value pairs
    pub fn from_pairs<I, K, V>(line: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new(line);
        for (k, v) in pairs {
            row.insert(k, v);
        }
        row
    }

    /// Set a field value
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(header.into(), value.into());
    }

    /// Get a field value by exact header name
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    /// Iterate over header/value pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct headers in the row
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A field of the Arda.cards import schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputField {
    ItemName,
    Notes,
    Sku,
    Supplier,
    Location,
    Minimum,
    OrderQuantity,
    ProductUrl,
    ImageUrl,
    ColorCoding,
}

impl OutputField {
    /// All fields in output column order
    pub const ALL: [OutputField; 10] = [
        OutputField::ItemName,
        OutputField::Notes,
        OutputField::Sku,
        OutputField::Supplier,
        OutputField::Location,
        OutputField::Minimum,
        OutputField::OrderQuantity,
        OutputField::ProductUrl,
        OutputField::ImageUrl,
        OutputField::ColorCoding,
    ];

    /// Column name as written in the header line
    pub fn name(self) -> &'static str {
        match self {
            OutputField::ItemName => "Item Name",
            OutputField::Notes => "Notes",
            OutputField::Sku => "SKU",
            OutputField::Supplier => "Supplier",
            OutputField::Location => "Location",
            OutputField::Minimum => "Minimum",
            OutputField::OrderQuantity => "Order Quantity",
            OutputField::ProductUrl => "Product URL",
            OutputField::ImageUrl => "Image URL",
            OutputField::ColorCoding => "Color Coding",
        }
    }

    /// Look up a field by its exact column name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One record of the output schema; every field defaults to empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRow {
    values: [String; 10],
}

impl OutputRow {
    /// Create a row with every field empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value
    pub fn get(&self, field: OutputField) -> &str {
        &self.values[field.index()]
    }

    /// Set a field value
    pub fn set(&mut self, field: OutputField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Builder-style variant of [`OutputRow::set`]
    pub fn with(mut self, field: OutputField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Iterate over fields in output column order
    pub fn iter(&self) -> impl Iterator<Item = (OutputField, &str)> {
        OutputField::ALL
            .into_iter()
            .map(move |f| (f, self.values[f.index()].as_str()))
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(OutputField::ALL.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_duplicate_header_last_value_wins() {
        let row = Row::from_pairs(2, [("A", "1"), ("B", "2"), ("A", "3")]);

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("A"), Some("3"));
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_row_missing_header() {
        let row = Row::from_pairs(2, [("A", "1")]);
        assert_eq!(row.get("B"), None);
    }

    #[test]
    fn test_output_field_order_and_names() {
        let names: Vec<&str> = OutputField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "Item Name",
                "Notes",
                "SKU",
                "Supplier",
                "Location",
                "Minimum",
                "Order Quantity",
                "Product URL",
                "Image URL",
                "Color Coding",
            ]
        );
        assert_eq!(OutputField::from_name("SKU"), Some(OutputField::Sku));
        assert_eq!(OutputField::from_name("sku"), None);
    }

    #[test]
    fn test_output_row_defaults_empty() {
        let row = OutputRow::new().with(OutputField::Notes, "keep dry");

        assert_eq!(row.get(OutputField::Notes), "keep dry");
        assert_eq!(row.get(OutputField::ItemName), "");
        assert_eq!(row.iter().filter(|(_, v)| v.is_empty()).count(), 9);
    }

    #[test]
    fn test_output_row_serializes_as_ordered_map() {
        let row = OutputRow::new().with(OutputField::ItemName, "T1");
        let json = serde_json::to_string(&row).unwrap();

        assert!(json.starts_with("{\"Item Name\":\"T1\",\"Notes\":\"\""));
        assert!(json.ends_with("\"Color Coding\":\"\"}"));
    }
}
