//! End-to-end conversion: CSV text in, Arda.cards CSV text out

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::headers::HeaderMap;
use crate::images::TypeImageMap;
use crate::mapper::{MapContext, MappingLogic};
use crate::parser::{read_table, RowPolicy};
use crate::table::OutputRow;
use crate::writer::write_table;
use serde::Serialize;
use tracing::{info, instrument};

/// Row counts for one conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Data records accepted by the reader
    pub rows_read: usize,
    /// Data records dropped for column-count drift
    pub rows_skipped: usize,
    /// Rows written to the output
    pub rows_written: usize,
}

impl ConversionReport {
    /// Rows removed as duplicates
    pub fn duplicates_removed(&self) -> usize {
        self.rows_read.saturating_sub(self.rows_written)
    }
}

/// Result of a successful conversion
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Output CSV document
    pub output: String,
    /// Output rows, in document order
    pub rows: Vec<OutputRow>,
    pub report: ConversionReport,
}

/// Convert a tool library export to Arda.cards CSV with the tolerant row policy
pub fn convert(
    input: &str,
    headers: &HeaderMap,
    logic: &dyn MappingLogic,
    images: &TypeImageMap,
) -> Result<String> {
    let config = ConverterConfig {
        headers: headers.clone(),
        images: images.clone(),
        row_policy: RowPolicy::Tolerant,
        logic_store: None,
    };
    convert_with(input, &config, logic).map(|c| c.output)
}

/// Convert using a full configuration, reporting row counts
///
/// Either every row converts or an error is returned; there is no partial output.
#[instrument(skip_all, fields(input_len = input.len()))]
pub fn convert_with(
    input: &str,
    config: &ConverterConfig,
    logic: &dyn MappingLogic,
) -> Result<Conversion> {
    let table = read_table(input, config.row_policy)?;
    let ctx = MapContext::new(config.headers.resolve(&table.headers), &config.images);
    let rows = logic.apply(&table, &ctx)?;

    let report = ConversionReport {
        rows_read: table.row_count(),
        rows_skipped: table.skipped_lines.len(),
        rows_written: rows.len(),
    };
    info!(
        rows_read = report.rows_read,
        rows_skipped = report.rows_skipped,
        duplicates = report.duplicates_removed(),
        rows_written = report.rows_written,
        "conversion complete"
    );

    Ok(Conversion {
        output: write_table(&rows),
        rows,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mapper::DefaultLogic;
    use crate::script::compile;
    use crate::writer::header_line;

    const INPUT: &str = "Tool Index (tool_index),Number (tool_number),Description (tool_description),Type (tool_type),Vendor (tool_vendor)\r\n\
        1,1,\"Flat End Mill, 1/2\"\"\",Flat End Mill,Harvey\r\n\
        1,1,Flat End Mill copy,Flat End Mill,Harvey\r\n\
        2,2,Spot Drill,spot drill\r\n\
        3,oops\r\n\
        \r\n";

    #[test]
    fn test_convert_default_logic() {
        let images = TypeImageMap::new("").with("flat end mill", "flat.jpg");
        let output = convert(INPUT, &HeaderMap::new(), &DefaultLogic, &images).unwrap();

        assert_eq!(
            output,
            format!(
                "{}\n1 - Flat End Mill 1/2,,,Harvey,,,,,flat.jpg,\n2 - Spot Drill,,,,,,,,,",
                header_line()
            )
        );
    }

    #[test]
    fn test_convert_with_report() {
        let config = ConverterConfig::default();
        let conversion = convert_with(INPUT, &config, &DefaultLogic).unwrap();

        assert_eq!(
            conversion.report,
            ConversionReport {
                rows_read: 3,
                rows_skipped: 1,
                rows_written: 2,
            }
        );
        assert_eq!(conversion.report.duplicates_removed(), 1);
        assert_eq!(conversion.rows.len(), 2);
    }

    #[test]
    fn test_strict_policy_fails_whole_conversion() {
        let config = ConverterConfig {
            row_policy: RowPolicy::Strict,
            ..ConverterConfig::default()
        };
        let err = convert_with(INPUT, &config, &DefaultLogic).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { line: 4, .. }));
    }

    #[test]
    fn test_header_only_and_empty_input() {
        let images = TypeImageMap::default();
        let output = convert("A,B\n", &HeaderMap::new(), &DefaultLogic, &images).unwrap();
        assert_eq!(output, header_line());

        let output = convert("", &HeaderMap::new(), &DefaultLogic, &images).unwrap();
        assert_eq!(output, header_line());
    }

    #[test]
    fn test_runtime_error_returns_no_output() {
        let logic = compile("\"Supplier\" = require(col(\"tool_vendor\"), \"no vendor\")").unwrap();
        let images = TypeImageMap::default();

        let err = convert(INPUT, &HeaderMap::new(), &logic, &images).unwrap_err();
        match err {
            Error::LogicRuntime { line, message } => {
                assert_eq!(line, 4);
                assert_eq!(message, "no vendor");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_aliases() {
        let input = "Idx,No.,Name\n5,A1,Reamer\n5,A1,Reamer again\n";
        let headers = HeaderMap::new()
            .with_alias("tool_index", "Idx")
            .with_alias("tool_number", "No.")
            .with_alias("tool_description", "Name");
        let images = TypeImageMap::default();

        let output = convert(input, &headers, &DefaultLogic, &images).unwrap();
        assert_eq!(output, format!("{}\nA1 - Reamer,,,,,,,,,", header_line()));
    }

    #[test]
    fn test_output_is_idempotent_under_reconversion() {
        let images = TypeImageMap::new("x.jpg");
        let first = convert(INPUT, &HeaderMap::new(), &DefaultLogic, &images).unwrap();
        let second = convert(INPUT, &HeaderMap::new(), &DefaultLogic, &images).unwrap();
        assert_eq!(first, second);
    }
}
