// src/extractors/classify.rs
//! Tags a page by the closing-price table heading it carries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The table categories a bulletin page can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Equities,
    Cfi,
}

impl SectionKind {
    /// Sheet label used in the bulletin's own terminology.
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Equities => "Acciones",
            SectionKind::Cfi => "CFI",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Equities => write!(f, "equities"),
            SectionKind::Cfi => write!(f, "cfi"),
        }
    }
}

/// A heading test run against lower-cased page text (substring containment).
#[derive(Debug)]
pub enum Marker {
    /// At least one phrase is present.
    AnyOf(&'static [&'static str]),
    /// Every phrase is present.
    AllOf(&'static [&'static str]),
}

impl Marker {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Marker::AnyOf(phrases) => phrases.iter().any(|p| lowered.contains(p)),
            Marker::AllOf(phrases) => phrases.iter().all(|p| lowered.contains(p)),
        }
    }
}

/// A section and the markers, any of which, identify it.
#[derive(Debug)]
pub struct SectionRule {
    pub section: SectionKind,
    pub markers: &'static [Marker],
}

impl SectionRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.markers.iter().any(|m| m.matches(lowered))
    }
}

/// Evaluated top to bottom; the first matching rule wins, so Equities
/// takes precedence over CFI.
pub static SECTION_RULES: &[SectionRule] = &[
    SectionRule {
        section: SectionKind::Equities,
        markers: &[Marker::AnyOf(&[
            "precio de cierre de acciones",
            "precios de cierre de acciones",
        ])],
    },
    SectionRule {
        section: SectionKind::Cfi,
        markers: &[
            Marker::AnyOf(&[
                "precio de cierre de cfi",
                "precios de cierre de cfi",
                "precio de cierre cfi",
                "precios de cierre cfi",
            ]),
            Marker::AllOf(&["precios de cierre", "mercado cfi"]),
        ],
    },
];

/// Classifies a page's full text with the bulletin rule table.
/// `None` means the page is unclassified.
pub fn classify_page(text: &str) -> Option<SectionKind> {
    classify_with(SECTION_RULES, text)
}

/// Classifies against an arbitrary ordered rule table.
pub fn classify_with(rules: &[SectionRule], text: &str) -> Option<SectionKind> {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.section)
}
