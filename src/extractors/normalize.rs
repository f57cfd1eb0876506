// src/extractors/normalize.rs
use serde::{Deserialize, Serialize};

use super::rows::CandidateRow;

/// Literal the bulletin uses for "no price".
pub const ZERO_MARKER: &str = "0";

/// How a row's numeric price came about. The price is 0.0 for every status
/// except `Quoted`, so this is what tells a no-trade row from format drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    Quoted,
    NoTrade,
    Unparsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub symbol: String,
    pub price: f64,
    pub status: PriceStatus,
}

/// Parses a `1.234,567`-style string: drops every `.`, turns the first `,`
/// into the decimal point.
pub fn parse_locale_price(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('.', "").replacen(',', ".", 1);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Maps a raw price (or its absence) to a number. Never fails: anything
/// unparsable becomes 0.0 tagged `Unparsed`.
pub fn normalize_price(raw: Option<&str>) -> (f64, PriceStatus) {
    match raw {
        None => (0.0, PriceStatus::NoTrade),
        Some(r) if r.trim() == ZERO_MARKER => (0.0, PriceStatus::NoTrade),
        Some(r) => match parse_locale_price(r) {
            Some(value) => (value, PriceStatus::Quoted),
            None => {
                tracing::warn!("Unparsable price '{}', defaulting to 0", r);
                (0.0, PriceStatus::Unparsed)
            }
        },
    }
}

pub fn normalize_row(row: CandidateRow) -> NormalizedRow {
    let (price, status) = normalize_price(row.raw_price.as_deref());
    NormalizedRow {
        symbol: row.symbol,
        price,
        status,
    }
}
