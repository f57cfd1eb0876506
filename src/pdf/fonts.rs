// src/pdf/fonts.rs
//! Per-page font decoders: `ToUnicode` CMaps and the Identity encodings.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;

use super::decode_text;

// Largest bfrange expanded; bigger ranges are malformed or hostile.
const MAX_RANGE_LEN: u32 = 0xFFFF;

static BFCHAR_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)beginbfchar(.*?)endbfchar").expect("Failed to compile BFCHAR_SECTION_RE")
});

static BFRANGE_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)beginbfrange(.*?)endbfrange").expect("Failed to compile BFRANGE_SECTION_RE")
});

static BFCHAR_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([0-9A-Fa-f\s]+)>\s*<([0-9A-Fa-f\s]*)>").expect("Failed to compile BFCHAR_ENTRY_RE")
});

// <lo> <hi> <dst>  or  <lo> <hi> [<dst1> <dst2> ...]
static BFRANGE_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([0-9A-Fa-f\s]+)>\s*<([0-9A-Fa-f\s]+)>\s*(?:<([0-9A-Fa-f\s]*)>|\[([^\]]*)\])")
        .expect("Failed to compile BFRANGE_ENTRY_RE")
});

static HEX_STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([0-9A-Fa-f\s]*)>").expect("Failed to compile HEX_STRING_RE"));

/// Character-code to Unicode table from a `ToUnicode` CMap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    /// Bytes per character code, taken from the CMap's source codes.
    pub code_width: usize,
    map: HashMap<u32, String>,
}

impl ToUnicodeMap {
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, source: &[u8], target: String) {
        self.code_width = self.code_width.max(source.len());
        self.map.insert(code_of(source), target);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let width = self.code_width.max(1);
        bytes
            .chunks(width)
            .map(|chunk| {
                let code = code_of(chunk);
                match self.map.get(&code) {
                    Some(s) => s.clone(),
                    None if width == 1 => (chunk[0] as char).to_string(),
                    None => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER).to_string(),
                }
            })
            .collect()
    }
}

/// How the strings shown with one font resource are turned into text.
#[derive(Debug, Clone, PartialEq)]
pub enum FontDecoder {
    /// `Identity-H` / `Identity-V` without a usable `ToUnicode`: 2-byte codes read as UTF-16BE.
    Identity,
    ToUnicode(ToUnicodeMap),
}

impl FontDecoder {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::ToUnicode(map) => map.decode(bytes),
            FontDecoder::Identity => {
                if bytes.is_empty() || bytes.len() % 2 != 0 {
                    return decode_text(bytes);
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

/// Font resource name (`F1`, ...) to decoder. Fonts missing from the map use
/// [`decode_text`].
pub type PageFonts = HashMap<Vec<u8>, FontDecoder>;

/// Collects decoders for the fonts a page can select with `Tf`.
pub fn page_fonts(doc: &Document, page_id: ObjectId) -> PageFonts {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::warn!("Cannot read fonts of page {:?}: {}", page_id, e);
            return PageFonts::new();
        }
    };

    fonts
        .into_iter()
        .filter_map(|(name, font)| {
            let decoder = font_decoder(doc, font)?;
            tracing::debug!(
                "Font {} decodes via {}",
                String::from_utf8_lossy(&name),
                match decoder {
                    FontDecoder::Identity => "Identity encoding",
                    FontDecoder::ToUnicode(_) => "ToUnicode CMap",
                }
            );
            Some((name, decoder))
        })
        .collect()
}

fn font_decoder(doc: &Document, font: &Dictionary) -> Option<FontDecoder> {
    if let Some(map) = to_unicode_map(doc, font) {
        return Some(FontDecoder::ToUnicode(map));
    }
    let encoding = font.get(b"Encoding").and_then(Object::as_name).ok()?;
    encoding.starts_with(b"Identity").then_some(FontDecoder::Identity)
}

fn to_unicode_map(doc: &Document, font: &Dictionary) -> Option<ToUnicodeMap> {
    let stream = match font.get(b"ToUnicode").ok()? {
        Object::Reference(id) => doc.get_object(*id).and_then(Object::as_stream).ok()?,
        Object::Stream(stream) => stream,
        _ => return None,
    };
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    parse_to_unicode(&data)
}

/// Parses the `bfchar` and `bfrange` sections of a `ToUnicode` CMap.
/// Returns `None` when no mapping is found.
pub fn parse_to_unicode(data: &[u8]) -> Option<ToUnicodeMap> {
    let text = String::from_utf8_lossy(data);
    let mut cmap = ToUnicodeMap::default();

    for section in BFCHAR_SECTION_RE.captures_iter(&text) {
        for entry in BFCHAR_ENTRY_RE.captures_iter(&section[1]) {
            if let (Some(src), Some(dst)) = (hex_bytes(&entry[1]), hex_bytes(&entry[2])) {
                cmap.insert(&src, utf16_text(&dst));
            }
        }
    }

    for section in BFRANGE_SECTION_RE.captures_iter(&text) {
        for entry in BFRANGE_ENTRY_RE.captures_iter(&section[1]) {
            let (Some(lo), Some(hi)) = (hex_bytes(&entry[1]), hex_bytes(&entry[2])) else {
                continue;
            };
            let (lo_code, hi_code) = (code_of(&lo), code_of(&hi));
            if hi_code < lo_code || hi_code - lo_code > MAX_RANGE_LEN {
                tracing::warn!("Skipping bfrange <{}> <{}>", &entry[1], &entry[2]);
                continue;
            }

            if let Some(dst) = entry.get(3).and_then(|m| hex_bytes(m.as_str())) {
                let mut units = utf16_units(&dst);
                for code in lo_code..=hi_code {
                    cmap.insert(&code_bytes(code, lo.len()), String::from_utf16_lossy(&units));
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
            } else if let Some(array) = entry.get(4) {
                let targets = HEX_STRING_RE
                    .captures_iter(array.as_str())
                    .filter_map(|c| hex_bytes(&c[1]));
                for (code, dst) in (lo_code..=hi_code).zip(targets) {
                    cmap.insert(&code_bytes(code, lo.len()), utf16_text(&dst));
                }
            }
        }
    }

    (!cmap.is_empty()).then_some(cmap)
}

// Whitespace is ignored and an odd trailing digit is padded with 0.
fn hex_bytes(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    Some(
        digits
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
            .collect(),
    )
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn code_bytes(code: u32, width: usize) -> Vec<u8> {
    (0..width).rev().map(|i| (code >> (8 * i)) as u8).collect()
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c.get(1).copied().unwrap_or(0)]))
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}
