//! Row mapping from Fusion tool records to Arda.cards items

use crate::dedup::{dedup_key, dedupe};
use crate::error::Result;
use crate::headers::{
    ResolvedHeaders, TOOL_COMMENT, TOOL_DESCRIPTION, TOOL_INDEX, TOOL_NUMBER, TOOL_PRODUCT_ID,
    TOOL_PRODUCT_LINK, TOOL_TYPE, TOOL_VENDOR,
};
use crate::images::TypeImageMap;
use crate::table::{OutputField, OutputRow, Row, Table};

/// Read-only inputs shared by every row of one conversion
#[derive(Debug, Clone)]
pub struct MapContext<'a> {
    pub headers: ResolvedHeaders,
    pub images: &'a TypeImageMap,
}

impl<'a> MapContext<'a> {
    pub fn new(headers: ResolvedHeaders, images: &'a TypeImageMap) -> Self {
        Self { headers, images }
    }

    /// Value of a canonical field in `row`, empty when absent
    pub fn value<'r>(&self, row: &'r Row, field: &str) -> &'r str {
        self.headers.value(row, field)
    }
}

/// Conversion from a parsed table to output rows
///
/// Implementations see the whole table so they can deduplicate before mapping,
/// and must not keep state between calls.
pub trait MappingLogic: Send + Sync {
    fn apply(&self, table: &Table, ctx: &MapContext<'_>) -> Result<Vec<OutputRow>>;
}

/// The built-in per-row mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMapper;

impl DefaultMapper {
    pub fn map_row(&self, row: &Row, ctx: &MapContext<'_>) -> OutputRow {
        let description: String = ctx
            .value(row, TOOL_DESCRIPTION)
            .trim()
            .chars()
            .filter(|c| *c != ',' && *c != '"')
            .collect();

        let number = ctx.value(row, TOOL_NUMBER).trim();
        let number = if number.eq_ignore_ascii_case("nan") {
            ""
        } else {
            number
        };

        let item_name = match (number.is_empty(), description.is_empty()) {
            (false, false) => format!("{number} - {description}"),
            (false, true) => number.to_string(),
            _ => description,
        };

        OutputRow::new()
            .with(OutputField::ItemName, item_name)
            .with(OutputField::Notes, ctx.value(row, TOOL_COMMENT))
            .with(OutputField::Sku, ctx.value(row, TOOL_PRODUCT_ID))
            .with(OutputField::Supplier, ctx.value(row, TOOL_VENDOR))
            .with(OutputField::ProductUrl, ctx.value(row, TOOL_PRODUCT_LINK))
            .with(
                OutputField::ImageUrl,
                ctx.images.lookup(ctx.value(row, TOOL_TYPE)),
            )
    }
}

/// Deduplicate by `tool_index`, then apply [`DefaultMapper`] to each row
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLogic;

impl MappingLogic for DefaultLogic {
    fn apply(&self, table: &Table, ctx: &MapContext<'_>) -> Result<Vec<OutputRow>> {
        let unique = dedupe(&table.rows, |row| {
            dedup_key(row, Some(ctx.value(row, TOOL_INDEX)))
        });
        Ok(unique
            .into_iter()
            .map(|row| DefaultMapper.map_row(row, ctx))
            .collect())
    }
}
