// src/extractors/aggregate.rs
use serde::{Deserialize, Serialize};

use super::classify::SectionKind;
use super::config::ExtractConfig;
use super::normalize::NormalizedRow;
use crate::utils::error::ExtractError;

/// A page after classification, parsing and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub page_index: usize,
    pub section: Option<SectionKind>,
    pub rows: Vec<NormalizedRow>,
}

/// The rows one page contributed to a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTable {
    pub section: SectionKind,
    /// Zero-based position of the page in the document.
    pub page_index: usize,
    pub rows: Vec<NormalizedRow>,
}

/// Per-section page tables, each list in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionTables {
    pub equities: Vec<SectionTable>,
    pub cfi: Vec<SectionTable>,
}

impl SectionTables {
    pub fn push(&mut self, table: SectionTable) {
        match table.section {
            SectionKind::Equities => self.equities.push(table),
            SectionKind::Cfi => self.cfi.push(table),
        }
    }

    pub fn tables(&self, section: SectionKind) -> &[SectionTable] {
        match section {
            SectionKind::Equities => &self.equities,
            SectionKind::Cfi => &self.cfi,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equities.is_empty() && self.cfi.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.equities
            .iter()
            .chain(self.cfi.iter())
            .map(|t| t.rows.len())
            .sum()
    }

    /// Plain `(symbol, price)` lists per page, the shape a spreadsheet writer lays
    /// out side by side.
    pub fn price_lists(&self, section: SectionKind) -> Vec<Vec<(&str, f64)>> {
        self.tables(section)
            .iter()
            .map(|t| t.rows.iter().map(|r| (r.symbol.as_str(), r.price)).collect())
            .collect()
    }
}

/// Collects accepted pages into per-section lists, preserving page order.
///
/// Fails with [`ExtractError::NoTablesFound`] when neither section receives a table.
pub fn aggregate<I>(pages: I, config: &ExtractConfig) -> Result<SectionTables, ExtractError>
where
    I: IntoIterator<Item = ParsedPage>,
{
    let mut tables = SectionTables::default();

    for page in pages {
        let Some(section) = page.section else {
            continue;
        };
        if !config.accepts(page.rows.len()) {
            tracing::debug!(
                "Page {} ({}) rejected: {} rows, need {}",
                page.page_index,
                section,
                page.rows.len(),
                config.effective_min_rows()
            );
            continue;
        }
        tables.push(SectionTable {
            section,
            page_index: page.page_index,
            rows: page.rows,
        });
    }

    if tables.is_empty() {
        return Err(ExtractError::NoTablesFound);
    }
    Ok(tables)
}
