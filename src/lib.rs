// src/lib.rs
//! Closing-price table extraction from the Santiago exchange daily bulletin.
//!
//! The core lives in [`extractors`]: positioned tokens are rebuilt into lines,
//! pages are classified by their table heading, rows are matched and prices
//! normalized, and accepted pages are collected per section. [`pdf`],
//! [`bulletin`] and [`storage`] are the I/O around it.

pub mod bulletin;
pub mod extractors;
pub mod pdf;
pub mod storage;
pub mod utils;

pub use extractors::{
    extract_tables, extract_tables_from_text, ExtractConfig, NormalizedRow, ParseMode,
    PositionedToken, PriceStatus, SectionKind, SectionTable, SectionTables,
};
pub use utils::error::ExtractError;
