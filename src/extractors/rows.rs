// src/extractors/rows.rs
//! Pulls (symbol, price) candidates out of a classified page's lines.

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::ParseMode;

// --- Regex Patterns (Lazy Static) ---
// Free-text symbol followed by a price in `1.234,567` / `0,123` form, anchored at line end.
static FULL_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)((?:[1-9][0-9]{0,2}(?:\.[0-9]{3})*|0),[0-9]{3})$")
        .expect("Failed to compile FULL_ROW_RE")
});

// A line holding nothing but a ticker.
static SYMBOL_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9.\-]{3,15}$").expect("Failed to compile SYMBOL_ONLY_RE")
});

// --- Noise markers ---
const HEADER_MARKER: &str = "nemo"; // matched against lower-cased text
const HEADER_FRAGMENT: &str = "Nemotécnico";
const SCHEDULE_MARKER: &str = "DE 09:00"; // operating-hours footer, case-sensitive

/// One row candidate before numeric normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub symbol: String,
    /// `None` when the line listed the instrument without a price.
    pub raw_price: Option<String>,
}

/// What the parser made of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Blank,
    /// Header restatement or schedule footer.
    Noise,
    Priced,
    BareSymbol,
    /// Looked like a bare symbol but the parse mode does not emit those.
    BareSymbolIgnored,
    Unmatched,
}

/// Line-level row parser. Cheap to build; holds no per-document state.
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    emit_bare_symbols: bool,
}

impl RowParser {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            emit_bare_symbols: mode.emits_bare_symbols(),
        }
    }

    /// Classifies one line and returns the row it yields, if any.
    pub fn parse_line(&self, line: &str) -> (LineOutcome, Option<CandidateRow>) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return (LineOutcome::Blank, None);
        }
        if trimmed.to_lowercase().contains(HEADER_MARKER) || trimmed.contains(SCHEDULE_MARKER) {
            return (LineOutcome::Noise, None);
        }

        if let Some(caps) = FULL_ROW_RE.captures(trimmed) {
            let symbol = caps.get(1).map_or("", |m| m.as_str()).trim();
            let price = caps.get(2).map_or("", |m| m.as_str()).trim();
            if symbol.is_empty() || symbol == HEADER_FRAGMENT {
                return (LineOutcome::Unmatched, None);
            }
            let row = CandidateRow {
                symbol: symbol.to_string(),
                raw_price: Some(price.to_string()),
            };
            return (LineOutcome::Priced, Some(row));
        }

        if SYMBOL_ONLY_RE.is_match(trimmed) {
            if !self.emit_bare_symbols {
                return (LineOutcome::BareSymbolIgnored, None);
            }
            let row = CandidateRow {
                symbol: trimmed.to_string(),
                raw_price: None,
            };
            return (LineOutcome::BareSymbol, Some(row));
        }

        (LineOutcome::Unmatched, None)
    }

    /// Parses every line of a page, keeping line order. Symbols are not deduplicated.
    pub fn parse_page(&self, text: &str) -> Vec<CandidateRow> {
        text.lines()
            .filter_map(|line| {
                let (outcome, row) = self.parse_line(line);
                if row.is_none() && outcome != LineOutcome::Blank {
                    tracing::trace!("Skipping line ({:?}): '{}'", outcome, line.trim());
                }
                row
            })
            .collect()
    }
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new(ParseMode::default())
    }
}
