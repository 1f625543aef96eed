//! CSV writer for the Arda.cards import schema

use crate::table::{OutputField, OutputRow};
use std::borrow::Cow;

/// Quote a value only if it contains a comma, a quote or a newline
pub fn escape_field(s: &str) -> Cow<'_, str> {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

/// Header line of the output document
pub fn header_line() -> String {
    OutputField::ALL
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize rows as CSV, header first, lines joined by `\n`
pub fn write_table(rows: &[OutputRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header_line());

    for row in rows {
        let values: Vec<Cow<'_, str>> = row.iter().map(|(_, v)| escape_field(v)).collect();
        lines.push(values.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{read_table, RowPolicy};

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("simple"), "simple");
        assert_eq!(escape_field(""), "");
        assert_eq!(escape_field("with,comma"), "\"with,comma\"");
        assert_eq!(escape_field("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_field("with\nnewline"), "\"with\nnewline\"");
        assert_eq!(escape_field("tab\tonly"), "tab\tonly");
    }

    #[test]
    fn test_header_only_document() {
        assert_eq!(
            write_table(&[]),
            "Item Name,Notes,SKU,Supplier,Location,Minimum,Order Quantity,Product URL,Image URL,Color Coding"
        );
    }

    #[test]
    fn test_write_rows() {
        let rows = vec![
            OutputRow::new()
                .with(OutputField::ItemName, "1 - Drill")
                .with(OutputField::ImageUrl, "drill.jpg"),
            OutputRow::new().with(OutputField::Notes, "a, \"b\""),
        ];
        let text = write_table(&rows);
        let lines: Vec<&str> = text.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1 - Drill,,,,,,,,drill.jpg,");
        assert_eq!(lines[2], ",\"a, \"\"b\"\"\",,,,,,,,");
        assert!(!text.ends_with('\n'));
    }

    fn tricky_rows() -> Vec<OutputRow> {
        vec![
            OutputRow::new()
                .with(OutputField::ItemName, "7 - End Mill 1/2\"")
                .with(OutputField::Notes, "line one\nline two, with comma")
                .with(OutputField::Sku, "\"quoted\"")
                .with(OutputField::ProductUrl, "https://example.com/?a=1&b=2"),
            OutputRow::new().with(OutputField::Supplier, "Ünïcødé ✓"),
            OutputRow::new(),
        ]
    }

    #[test]
    fn test_round_trip_through_reader() {
        let rows = tricky_rows();
        let text = write_table(&rows) + "\n";
        let table = read_table(&text, RowPolicy::Strict).unwrap();

        assert_eq!(table.row_count(), rows.len());
        for (written, read) in rows.iter().zip(&table.rows) {
            for (field, value) in written.iter() {
                assert_eq!(read.get(field.name()), Some(value), "field {field}");
            }
        }
    }

    #[test]
    fn test_output_parses_with_rfc4180_reader() {
        let rows = tricky_rows();
        let text = write_table(&rows);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 10);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), rows.len());
        for (written, record) in rows.iter().zip(&records) {
            let values: Vec<&str> = written.iter().map(|(_, v)| v).collect();
            assert_eq!(record.iter().collect::<Vec<_>>(), values);
        }
    }
}
