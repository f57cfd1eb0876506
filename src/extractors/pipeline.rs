// src/extractors/pipeline.rs
//! Stateless entry points: page tokens (or page text) in, section tables out.
//!
//! Every function here is a pure function of its arguments; concurrent callers
//! working on different documents share nothing.

use super::aggregate::{aggregate, ParsedPage, SectionTables};
use super::classify::classify_page;
use super::config::ExtractConfig;
use super::lines::{page_text, reconstruct_lines, PositionedToken};
use super::normalize::normalize_row;
use super::rows::RowParser;
use crate::utils::error::ExtractError;

/// Runs the full pipeline on per-page token streams.
pub fn extract_tables(
    pages: &[Vec<PositionedToken>],
    config: &ExtractConfig,
) -> Result<SectionTables, ExtractError> {
    config.validate()?;
    let texts = reconstruct_pages(pages, config.line_tolerance);
    extract_tables_from_text(&texts, config)
}

/// Runs the pipeline on pages whose lines were already rebuilt upstream.
pub fn extract_tables_from_text<S: AsRef<str>>(
    pages: &[S],
    config: &ExtractConfig,
) -> Result<SectionTables, ExtractError> {
    config.validate()?;
    let parser = RowParser::new(config.parse_mode);

    let parsed = pages
        .iter()
        .enumerate()
        .map(|(index, text)| analyze_page(index, text.as_ref(), &parser));

    let tables = aggregate(parsed, config)?;
    tracing::info!(
        "Extracted {} equities and {} CFI page tables ({} rows) from {} pages",
        tables.equities.len(),
        tables.cfi.len(),
        tables.row_count(),
        pages.len()
    );
    Ok(tables)
}

/// Rebuilds each page's text from its tokens.
pub fn reconstruct_pages(pages: &[Vec<PositionedToken>], tolerance: f32) -> Vec<String> {
    pages
        .iter()
        .map(|tokens| page_text(&reconstruct_lines(tokens, tolerance)))
        .collect()
}

fn analyze_page(page_index: usize, text: &str, parser: &RowParser) -> ParsedPage {
    let Some(section) = classify_page(text) else {
        tracing::debug!("Page {} unclassified, skipping", page_index);
        return ParsedPage {
            page_index,
            section: None,
            rows: Vec::new(),
        };
    };

    let rows: Vec<_> = parser
        .parse_page(text)
        .into_iter()
        .map(normalize_row)
        .collect();
    tracing::debug!("Page {} classified as {}: {} rows", page_index, section, rows.len());

    ParsedPage {
        page_index,
        section: Some(section),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::classify::SectionKind;
    use crate::extractors::normalize::PriceStatus;

    fn line_tokens(lines: &[&str], top: f32) -> Vec<PositionedToken> {
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| PositionedToken::new(*l, 20.0, top - 12.0 * i as f32))
            .collect()
    }

    #[test]
    fn test_tokens_to_tables() {
        let mut page = line_tokens(&["Precios de Cierre de Acciones", "Nemotécnico Cierre ($)"], 800.0);
        // symbol and price as separate fragments on the same row
        page.push(PositionedToken::new("AGUAS-A", 20.0, 700.0));
        page.push(PositionedToken::new("1.101,400", 300.0, 700.02));
        page.extend(line_tokens(&["BCI"], 688.0));

        let tables = extract_tables(&[page], &ExtractConfig::default()).unwrap();
        assert_eq!(tables.equities.len(), 1);
        let rows = &tables.equities[0].rows;
        assert_eq!(rows[0].symbol, "AGUAS-A");
        assert_eq!(rows[0].price, 1101.4);
        assert_eq!(rows[1].symbol, "BCI");
        assert_eq!(rows[1].status, PriceStatus::NoTrade);
    }

    #[test]
    fn test_unclassified_pages_are_skipped_before_parsing() {
        let pages = vec![
            "Resumen de mercado\nIPSA 6.500,120".to_string(),
            "Precios de cierre CFI\nCFIABC 1.000,500".to_string(),
        ];
        let tables = extract_tables_from_text(&pages, &ExtractConfig::default()).unwrap();
        assert!(tables.equities.is_empty());
        assert_eq!(tables.cfi[0].section, SectionKind::Cfi);
        assert_eq!(tables.cfi[0].page_index, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractConfig {
            line_tolerance: -1.0,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            extract_tables(&[], &config),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_same_input_same_output() {
        let pages = vec!["Precios de Cierre de Acciones\nCAP 7.950,000\nBCI".to_string()];
        let a = extract_tables_from_text(&pages, &ExtractConfig::default()).unwrap();
        let b = extract_tables_from_text(&pages, &ExtractConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
