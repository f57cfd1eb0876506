// src/utils/page_debug.rs
//! Annotated page dumps for `--debug` runs: what each page was classified as and
//! what the row parser made of every line.

use std::fmt::Write;

use crate::extractors::classify::classify_page;
use crate::extractors::rows::{LineOutcome, RowParser};
use crate::extractors::PAGE_END_MARKER;

fn outcome_tag(outcome: LineOutcome) -> &'static str {
    match outcome {
        LineOutcome::Blank => "     ",
        LineOutcome::Noise => "NOISE",
        LineOutcome::Priced => "ROW  ",
        LineOutcome::BareSymbol => "BARE ",
        LineOutcome::BareSymbolIgnored => "BARE-",
        LineOutcome::Unmatched => "  -  ",
    }
}

/// Renders every page with a header line and per-line parse outcomes.
/// Unclassified pages are dumped without annotations since they never reach the parser.
pub fn annotate_pages<S: AsRef<str>>(pages: &[S], parser: &RowParser) -> String {
    let mut out = String::new();

    for (index, page) in pages.iter().enumerate() {
        let text = page.as_ref();
        let section = classify_page(text);
        let _ = writeln!(
            out,
            "=== page {} [{}] ===",
            index,
            section.map_or_else(|| "unclassified".to_string(), |s| s.to_string())
        );

        for line in text.lines() {
            if section.is_some() {
                let (outcome, _) = parser.parse_line(line);
                let _ = writeln!(out, "{} | {}", outcome_tag(outcome), line);
            } else {
                let _ = writeln!(out, "      | {}", line);
            }
        }
        let _ = writeln!(out, "{}", PAGE_END_MARKER);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::ParseMode;

    #[test]
    fn test_annotations_per_line() {
        let pages = ["Precios de Cierre de Acciones\nAGUAS-A 1.101,400\nBCI", "Indices"];
        let dump = annotate_pages(&pages, &RowParser::new(ParseMode::Strict));

        assert!(dump.contains("=== page 0 [equities] ==="));
        assert!(dump.contains("ROW   | AGUAS-A 1.101,400"));
        assert!(dump.contains("BARE- | BCI"));
        assert!(dump.contains("=== page 1 [unclassified] ==="));
        assert!(dump.contains("      | Indices"));
        assert_eq!(dump.matches(PAGE_END_MARKER).count(), 2);
    }
}
