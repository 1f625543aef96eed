//! Tolerant CSV reader for tool library exports

use crate::error::{Error, Result};
use crate::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How the reader treats records whose column count drifts from the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Accept a drift of one column, silently drop anything worse
    #[default]
    Tolerant,
    /// Any drift fails the read
    Strict,
}

/// Text decoded from raw input bytes
#[derive(Debug, Clone)]
pub struct DecodedInput {
    pub text: String,
    /// Name of the encoding that was used
    pub encoding: &'static str,
    /// True if malformed sequences were replaced
    pub had_errors: bool,
}

/// Decode raw bytes, honouring a byte-order mark and falling back to UTF-8
pub fn decode_input(bytes: &[u8]) -> DecodedInput {
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(bytes);
    DecodedInput {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_errors,
    }
}

/// Split one CSV record into field values
///
/// Never fails: an unterminated quote simply runs to the end of the line.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    fields.push(current);
    fields
}

/// Quote state of a record being scanned line by line
#[derive(Debug, Clone, Copy)]
struct QuoteScan {
    in_quotes: bool,
    at_field_start: bool,
    /// The open quote began a field, so a newline may belong to the value
    field_quoted: bool,
}

impl QuoteScan {
    fn new() -> Self {
        Self {
            in_quotes: false,
            at_field_start: true,
            field_quoted: false,
        }
    }

    fn scan(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match (self.in_quotes, bytes[i]) {
                (true, b'"') if bytes.get(i + 1) == Some(&b'"') => i += 1,
                (true, b'"') => self.in_quotes = false,
                (true, _) => {}
                (false, b'"') => {
                    self.in_quotes = true;
                    self.field_quoted = self.at_field_start;
                    self.at_field_start = false;
                }
                (false, b',') => self.at_field_start = true,
                (false, _) => self.at_field_start = false,
            }
            i += 1;
        }
    }

    /// Whether the record continues past the end of the scanned line
    fn continues(&self) -> bool {
        self.in_quotes && self.field_quoted
    }
}

/// Split normalized text into records, returning each with its starting line
///
/// Records end at `\n`. A field that opens with a quote may span lines until
/// the quote closes; if it never closes, its first line is a record on its own
/// and splitting resumes on the next line. Empty records are dropped.
pub fn split_records(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        lines.push((offset, line));
        offset += line.len() + 1;
    }

    let mut records = Vec::new();
    let mut start = 0;
    while start < lines.len() {
        let mut scan = QuoteScan::new();
        scan.scan(lines[start].1);

        let mut end = start;
        while scan.continues() && end + 1 < lines.len() {
            end += 1;
            scan.scan(lines[end].1);
        }
        if scan.continues() {
            end = start;
        }

        let (from, _) = lines[start];
        let (last, last_line) = lines[end];
        let record = &text[from..last + last_line.len()];
        if !record.is_empty() {
            records.push((start + 1, record));
        }
        start = end + 1;
    }
    records
}

/// Parse a full CSV text blob into a table
pub fn read_table(text: &str, policy: RowPolicy) -> Result<Table> {
    let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut records = split_records(&text).into_iter();

    let headers = match records.next() {
        Some((_, header_line)) => parse_line(header_line),
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(headers, Vec::new());

    for (line, record) in records {
        let values = parse_line(record);
        let drift = values.len().abs_diff(table.headers.len());

        let accepted = match policy {
            RowPolicy::Tolerant => drift <= 1,
            RowPolicy::Strict => drift == 0,
        };
        if !accepted {
            if policy == RowPolicy::Strict {
                return Err(Error::MalformedRow {
                    line,
                    expected: table.headers.len(),
                    found: values.len(),
                });
            }
            debug!(
                line,
                expected = table.headers.len(),
                found = values.len(),
                "skipping malformed row"
            );
            table.skipped_lines.push(line);
            continue;
        }

        let mut row = Row::new(line);
        for (idx, header) in table.headers.iter().enumerate() {
            row.insert(header.as_str(), values.get(idx).map(String::as_str).unwrap_or(""));
        }
        table.rows.push(row);
    }

    Ok(table)
}

/// Read and decode an input file, warning if malformed bytes were replaced
pub fn read_input_file<P: AsRef<Path>>(path: P) -> Result<DecodedInput> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let decoded = decode_input(&bytes);
    if decoded.had_errors {
        tracing::warn!(
            path = %path.display(),
            encoding = decoded.encoding,
            "input contained malformed sequences, replaced with U+FFFD"
        );
    }
    Ok(decoded)
}

/// Read and parse a CSV file from disk
pub fn read_table_file<P: AsRef<Path>>(path: P, policy: RowPolicy) -> Result<Table> {
    read_table(&read_input_file(path)?.text, policy)
}
