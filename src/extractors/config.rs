// src/extractors/config.rs
use serde::{Deserialize, Serialize};

use crate::utils::error::ExtractError;

/// Default vertical epsilon (PDF units) for grouping tokens into one line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 0.5;

/// Which row-parser behaviour to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Bare-symbol lines become zero-price rows; any non-empty page is kept.
    #[default]
    Lenient,
    /// Bare-symbol lines are skipped, so only rows with a price are counted:
    /// a page needs more than 3 priced rows to be kept.
    Strict,
}

impl ParseMode {
    /// Whether a line holding only a symbol is emitted as a no-trade row.
    pub fn emits_bare_symbols(self) -> bool {
        matches!(self, ParseMode::Lenient)
    }

    /// Minimum number of parsed rows a page needs to contribute a table.
    /// In strict mode every parsed row is a priced row.
    pub fn default_min_rows(self) -> usize {
        match self {
            ParseMode::Lenient => 1,
            ParseMode::Strict => 4,
        }
    }
}

/// Knobs for one extraction run. Passed explicitly to every pipeline entry
/// point; nothing here is read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Tokens whose vertical coordinates differ by at most this much share a line.
    /// `0.0` gives exact-equality grouping.
    pub line_tolerance: f32,
    pub parse_mode: ParseMode,
    /// Overrides the mode's page acceptance threshold when set.
    pub min_rows: Option<usize>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            parse_mode: ParseMode::default(),
            min_rows: None,
        }
    }
}

impl ExtractConfig {
    pub fn strict() -> Self {
        Self {
            parse_mode: ParseMode::Strict,
            ..Self::default()
        }
    }

    /// The acceptance threshold actually applied to each page.
    pub fn effective_min_rows(&self) -> usize {
        self.min_rows
            .unwrap_or_else(|| self.parse_mode.default_min_rows())
            .max(1)
    }

    /// A page with `row_count` parsed rows contributes a table iff this holds.
    pub fn accepts(&self, row_count: usize) -> bool {
        row_count >= self.effective_min_rows()
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "line tolerance must be a non-negative number, got {}",
                self.line_tolerance
            )));
        }
        Ok(())
    }
}
