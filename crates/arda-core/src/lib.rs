//! arda-core: Core library for converting Fusion 360 tool libraries to Arda.cards
//!
//! This library provides functionality to:
//! - Parse tool library CSV exports, tolerating minor column-count drift
//! - Deduplicate tools by tool index, keeping the first occurrence
//! - Map tools to the Arda.cards item schema with built-in or user-edited logic
//! - Keep versioned, syntax-checked mapping logic
//! - Write the Arda.cards bulk import CSV with minimal quoting

pub mod config;
pub mod convert;
pub mod dedup;
pub mod error;
pub mod headers;
pub mod images;
pub mod mapper;
pub mod parser;
pub mod script;
pub mod store;
pub mod table;
pub mod writer;

pub use config::ConverterConfig;
pub use convert::{convert, convert_with, Conversion, ConversionReport};
pub use dedup::{dedup_key, dedupe, DedupKey};
pub use error::{Error, Result};
pub use headers::{HeaderMap, ResolvedHeaders};
pub use images::TypeImageMap;
pub use mapper::{DefaultLogic, DefaultMapper, MapContext, MappingLogic};
pub use parser::{
    decode_input, parse_line, read_input_file, read_table, read_table_file, DecodedInput,
    RowPolicy,
};
pub use script::{compile, validate, ScriptLogic, DEFAULT_LOGIC_SOURCE};
pub use store::{LogicEntry, LogicStore};
pub use table::{OutputField, OutputRow, Row, Table};
pub use writer::{escape_field, write_table};
