//! User-editable mapping logic
//!
//! Mapping logic is stored as text in a small line-oriented language and
//! compiled before use. Compilation is the syntax check: a source that
//! compiles can only fail at run time through `require`.
//!
//! ```text
//! dedupe col("tool_index")
//! let num = nan_empty(trim(col("tool_number")))
//! "Item Name" = join(" - ", num, trim(col("tool_description")))
//! "Image URL" = image(col("tool_type"))
//! ```
//!
//! Output fields that are never assigned stay empty.

mod compile;
mod eval;
mod lexer;

use crate::dedup::dedupe;
use crate::error::Result;
use crate::mapper::{MapContext, MappingLogic};
use crate::table::{OutputField, OutputRow, Row, Table};
use compile::{compile_program, Program, Stmt};

/// Source of the default mapping, equivalent to [`crate::DefaultLogic`]
pub const DEFAULT_LOGIC_SOURCE: &str = include_str!("../default_logic.arda");

/// Compiled mapping logic together with its source text
#[derive(Debug, Clone)]
pub struct ScriptLogic {
    source: String,
    program: Program,
}

impl ScriptLogic {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the logic deduplicates rows before mapping
    pub fn dedupes(&self) -> bool {
        self.program.has_dedupe()
    }

    /// Output fields the logic assigns, in schema order
    pub fn assigned_fields(&self) -> Vec<OutputField> {
        OutputField::ALL
            .into_iter()
            .filter(|f| {
                self.program
                    .stmts
                    .iter()
                    .any(|s| matches!(s, Stmt::Assign { field, .. } if field == f))
            })
            .collect()
    }
}

/// Compile mapping logic source
pub fn compile(source: &str) -> Result<ScriptLogic> {
    let program = compile_program(source)?;
    Ok(ScriptLogic {
        source: source.to_string(),
        program,
    })
}

/// Check that mapping logic source compiles
pub fn validate(source: &str) -> Result<()> {
    compile_program(source).map(|_| ())
}

/// Compiled form of [`DEFAULT_LOGIC_SOURCE`]
pub fn default_logic() -> Result<ScriptLogic> {
    compile(DEFAULT_LOGIC_SOURCE)
}

impl MappingLogic for ScriptLogic {
    fn apply(&self, table: &Table, ctx: &MapContext<'_>) -> Result<Vec<OutputRow>> {
        let rows: Vec<&Row> = if self.program.has_dedupe() {
            let keyed = table
                .rows
                .iter()
                .map(|row| Ok((self.program.dedup_key(row, ctx)?, row)))
                .collect::<Result<Vec<_>>>()?;
            dedupe(keyed, |(key, _)| key.clone())
                .into_iter()
                .map(|(_, row)| row)
                .collect()
        } else {
            table.rows.iter().collect()
        };

        rows.into_iter()
            .map(|row| self.program.map_row(row, ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::headers::HeaderMap;
    use crate::images::TypeImageMap;
    use crate::mapper::DefaultLogic;
    use crate::parser::{read_table, RowPolicy};

    const FUSION_SAMPLE: &str = "\
Tool Index (tool_index),Number (tool_number),Description (tool_description),Type (tool_type),Comment (tool_comment),Product ID (tool_productId),Vendor (tool_vendor),Product Link (tool_productLink)
1,1,\"Flat End Mill, 1/2\"\"\",flat end mill,roughing,EM-1,Harvey,https://example.com/1
2,nan,Drill Bit,Drill,,D-2,Guhring,
1,1,Duplicate,flat end mill,,,,
nan,,\"Chamfer, 90deg\",chamfer mill,\"note, with comma\",,,
nan,,\"Chamfer, 90deg\",chamfer mill,\"note, with comma\",,,
,,,probe,,,,
";

    fn run(logic: &dyn MappingLogic) -> Vec<OutputRow> {
        let table = read_table(FUSION_SAMPLE, RowPolicy::Tolerant).unwrap();
        let images = TypeImageMap::new("default.jpg")
            .with("flat end mill", "flat.jpg")
            .with("drill", "drill.jpg");
        let ctx = MapContext::new(HeaderMap::new().resolve(&table.headers), &images);
        logic.apply(&table, &ctx).unwrap()
    }

    #[test]
    fn test_default_source_matches_builtin_logic() {
        let script = default_logic().unwrap();
        let from_script = run(&script);
        let from_builtin = run(&DefaultLogic);

        assert_eq!(from_script.len(), 4);
        assert_eq!(from_script, from_builtin);
        assert_eq!(
            from_script[0].get(OutputField::ItemName),
            "1 - Flat End Mill 1/2"
        );
        assert_eq!(from_script[1].get(OutputField::ItemName), "Drill Bit");
        assert_eq!(from_script[1].get(OutputField::ImageUrl), "drill.jpg");
        assert_eq!(from_script[2].get(OutputField::Notes), "note, with comma");
        assert_eq!(from_script[3].get(OutputField::ImageUrl), "default.jpg");
    }

    #[test]
    fn test_script_without_dedupe_keeps_all_rows() {
        let script = compile("\"Item Name\" = col(\"tool_description\")").unwrap();
        let out = run(&script);

        assert!(!script.dedupes());
        assert_eq!(out.len(), 6);
        assert_eq!(out[2].get(OutputField::ItemName), "Duplicate");
        assert_eq!(out[0].get(OutputField::Sku), "");
    }

    #[test]
    fn test_custom_script() {
        let script = compile(
            r#"
dedupe col("tool_index")
"Item Name" = upper(trim(col("tool_description")))
"Location" = "Crib " + or(col("tool_number"), "?")
"Color Coding" = if(contains(lower(col("tool_type")), "mill"), "Blue", "")
"#,
        )
        .unwrap();
        let out = run(&script);

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].get(OutputField::Location), "Crib 1");
        assert_eq!(out[0].get(OutputField::ColorCoding), "Blue");
        assert_eq!(out[1].get(OutputField::ColorCoding), "");
        assert_eq!(out[2].get(OutputField::Location), "Crib ?");
    }

    #[test]
    fn test_runtime_error_aborts_conversion() {
        let script = compile("\"SKU\" = require(col(\"tool_productId\"), \"missing SKU\")").unwrap();
        let table = read_table(FUSION_SAMPLE, RowPolicy::Tolerant).unwrap();
        let images = TypeImageMap::default();
        let ctx = MapContext::new(HeaderMap::new().resolve(&table.headers), &images);

        match script.apply(&table, &ctx) {
            Err(Error::LogicRuntime { line, message }) => {
                assert_eq!(line, 4);
                assert_eq!(message, "missing SKU");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_assigned_fields() {
        let script = default_logic().unwrap();
        assert_eq!(
            script.assigned_fields(),
            vec![
                OutputField::ItemName,
                OutputField::Notes,
                OutputField::Sku,
                OutputField::Supplier,
                OutputField::ProductUrl,
                OutputField::ImageUrl,
            ]
        );
        assert!(script.dedupes());
        assert_eq!(script.source(), DEFAULT_LOGIC_SOURCE);
    }

    #[test]
    fn test_validate_reports_syntax_error() {
        assert!(validate(DEFAULT_LOGIC_SOURCE).is_ok());
        assert!(matches!(
            validate("return rows.map(r => r)"),
            Err(Error::LogicSyntax { line: 1, .. })
        ));
    }
}
