// src/extractors/mod.rs
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod lines;
pub mod normalize;
pub mod pipeline;
pub mod rows;

// Re-export key extraction types for convenience
pub use aggregate::{aggregate, ParsedPage, SectionTable, SectionTables};
pub use classify::{classify_page, SectionKind};
pub use config::{ExtractConfig, ParseMode};
pub use lines::{PositionedToken, PAGE_END_MARKER};
pub use normalize::{NormalizedRow, PriceStatus};
pub use pipeline::{extract_tables, extract_tables_from_text};
pub use rows::{CandidateRow, RowParser};
