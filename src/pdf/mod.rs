// src/pdf/mod.rs
//! Positioned text tokens from PDF content streams.
//!
//! A reduced text-state machine: it tracks the text and line matrices closely
//! enough to give every shown string a stable vertical coordinate, which is all
//! line reconstruction needs. Glyph widths are approximated. Shown strings are
//! decoded with the selected font's `ToUnicode` map or Identity encoding when the
//! page declares one.

pub mod fonts;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

pub use fonts::{page_fonts, FontDecoder, PageFonts};

use crate::extractors::lines::PositionedToken;
use crate::utils::error::PdfError;

/// The identity text matrix [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Approximate glyph width as a fraction of font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

#[derive(Debug, Clone)]
struct TextState {
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_key: Vec<u8>,
    font_size: f32,
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    leading: f32,
    text_rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            font_key: Vec::new(),
            font_size: 0.0,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            text_rise: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn decode(&self, bytes: &[u8], fonts: &PageFonts) -> String {
        match fonts.get(&self.font_key) {
            Some(decoder) => decoder.decode(bytes),
            None => decode_text(bytes),
        }
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    fn advance_after_show(&mut self, text: &str) {
        let glyph = self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale;
        let dx: f32 = text
            .chars()
            .map(|c| glyph + self.char_spacing + if c == ' ' { self.word_spacing } else { 0.0 })
            .sum();
        self.advance_x(dx);
    }
}

/// Loads a PDF and returns one token stream per page, in page-number order.
pub fn load_page_tokens(bytes: &[u8]) -> Result<Vec<Vec<PositionedToken>>, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    let pages = doc.get_pages();
    tracing::info!("Reading text from {} PDF pages", pages.len());

    let mut result = Vec::with_capacity(pages.len());
    for (page_num, page_id) in pages {
        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::Parse(format!("cannot get content of page {}: {}", page_num, e)))?;
        let content = Content::decode(&raw)
            .map_err(|e| PdfError::Parse(format!("content stream decode error on page {}: {}", page_num, e)))?;
        let fonts = page_fonts(&doc, page_id);
        let tokens = tokens_from_operations(&content.operations, &fonts);
        tracing::debug!("Page {}: {} text tokens", page_num, tokens.len());
        result.push(tokens);
    }

    Ok(result)
}

/// Walks decoded content-stream operations and emits one token per shown string.
/// `fonts` maps `Tf` resource names to decoders; unknown fonts use [`decode_text`].
pub fn tokens_from_operations(ops: &[Operation], fonts: &PageFonts) -> Vec<PositionedToken> {
    let mut state = TextState::default();
    let mut tokens = Vec::new();

    for op in ops {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font_key = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "Tm" => {
                let vals: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
                if let &[a, b, c, d, e, f] = vals.as_slice() {
                    state.text_matrix = [a, b, c, d, e, f];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (operands.first().and_then(number), operands.get(1).and_then(number)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => set_from(operands, &mut state.leading),
            "Tc" => set_from(operands, &mut state.char_spacing),
            "Tw" => set_from(operands, &mut state.word_spacing),
            "Ts" => set_from(operands, &mut state.text_rise),
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Tj" => {
                if let Some(operand) = operands.first() {
                    show_string(operand, fonts, &mut state, &mut tokens);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(operand) = operands.first() {
                    show_string(operand, fonts, &mut state, &mut tokens);
                }
            }
            "\"" => {
                if let [aw, ac, operand] = &operands[..] {
                    if let Some(v) = number(aw) {
                        state.word_spacing = v;
                    }
                    if let Some(v) = number(ac) {
                        state.char_spacing = v;
                    }
                    state.translate_line(0.0, -state.leading);
                    show_string(operand, fonts, &mut state, &mut tokens);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    show_array(items, fonts, &mut state, &mut tokens);
                }
            }
            _ => {}
        }
    }

    tokens
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

fn set_from(operands: &[Object], target: &mut f32) {
    if let Some(v) = operands.first().and_then(number) {
        *target = v;
    }
}

fn show_string(operand: &Object, fonts: &PageFonts, state: &mut TextState, tokens: &mut Vec<PositionedToken>) {
    let Object::String(bytes, _) = operand else {
        return;
    };
    let text = state.decode(bytes, fonts);
    if text.is_empty() {
        return;
    }
    tokens.push(PositionedToken::new(text.clone(), state.x(), state.y()));
    state.advance_after_show(&text);
}

// One token per TJ array; large negative kerning becomes a space.
fn show_array(items: &[Object], fonts: &PageFonts, state: &mut TextState, tokens: &mut Vec<PositionedToken>) {
    let (x, y) = (state.x(), state.y());
    let mut buf = String::new();

    for item in items {
        match item {
            Object::String(bytes, _) => {
                let fragment = state.decode(bytes, fonts);
                state.advance_after_show(&fragment);
                buf.push_str(&fragment);
            }
            other => {
                if let Some(adj) = number(other) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap = state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
                    if dx > gap && !buf.is_empty() {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    let text = buf.trim_end();
    if !text.is_empty() {
        tokens.push(PositionedToken::new(text, x, y));
    }
}

/// Font-independent decoding: UTF-16BE (with BOM), then UTF-8, then Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, payload @ ..] = bytes {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{extract_tables, ExtractConfig};
    use lopdf::{dictionary, Dictionary, Stream, StringFormat};

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn int(i: i64) -> Object {
        Object::Integer(i)
    }

    fn text(s: &str) -> Object {
        Object::string_literal(s)
    }

    fn place(x: i64, y: i64, shown: Object) -> Vec<Operation> {
        vec![
            op("Tm", vec![int(1), int(0), int(0), int(1), int(x), int(y)]),
            op("Tj", vec![shown]),
        ]
    }

    fn text_block(lines: Vec<Vec<Operation>>) -> Vec<Operation> {
        let mut ops = vec![op("BT", vec![]), op("Tf", vec![Object::Name(b"F1".to_vec()), int(9)])];
        ops.extend(lines.into_iter().flatten());
        ops.push(op("ET", vec![]));
        ops
    }

    /// Saves a document whose pages all select the font built by `font` as `/F1`.
    fn build_pdf(font: impl FnOnce(&mut Document) -> Dictionary, pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font = font(&mut doc);
        let font_id = doc.add_object(font);

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![int(0), int(0), int(595), int(842)],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = Object::Integer(kids.len() as i64);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn courier(_: &mut Document) -> Dictionary {
        dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Courier" }
    }

    fn identity_h() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ArialMT",
            "Encoding" => "Identity-H",
        }
    }

    fn hex(bytes: &[u8]) -> Object {
        Object::String(bytes.to_vec(), StringFormat::Hexadecimal)
    }

    #[test]
    fn test_tm_positions_each_string() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), int(9)]),
            op("Tm", vec![int(1), int(0), int(0), int(1), int(40), int(700)]),
            op("Tj", vec![text("AGUAS-A")]),
            op("Tm", vec![int(1), int(0), int(0), int(1), int(300), int(700)]),
            op("Tj", vec![text("1.101,400")]),
            op("ET", vec![]),
        ];
        let tokens = tokens_from_operations(&ops, &PageFonts::new());
        assert_eq!(
            tokens,
            vec![
                PositionedToken::new("AGUAS-A", 40.0, 700.0),
                PositionedToken::new("1.101,400", 300.0, 700.0),
            ]
        );
    }

    #[test]
    fn test_td_and_t_star_move_down() {
        let ops = vec![
            op("BT", vec![]),
            op("Td", vec![int(50), int(600)]),
            op("TL", vec![int(12)]),
            op("Tj", vec![text("BCI")]),
            op("T*", vec![]),
            op("Tj", vec![text("CAP")]),
            op("TD", vec![int(0), int(-10)]),
            op("Tj", vec![text("SQM-B")]),
        ];
        let ys: Vec<f32> = tokens_from_operations(&ops, &PageFonts::new()).iter().map(|t| t.y).collect();
        assert_eq!(ys, vec![600.0, 588.0, 578.0]);
    }

    #[test]
    fn test_tj_array_joins_fragments() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), int(10)]),
            op(
                "TJ",
                vec![Object::Array(vec![text("Precios de"), int(-3000), text("Cierre")])],
            ),
        ];
        let tokens = tokens_from_operations(&ops, &PageFonts::new());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "Precios de Cierre");
    }

    #[test]
    fn test_decode_text_fallbacks() {
        assert_eq!(decode_text(b"BCI"), "BCI");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x42, 0x00, 0x43]), "BC");
        // WinAnsi/Latin-1 e-acute
        assert_eq!(decode_text(b"Nemot\xe9cnico"), "Nemotécnico");
    }

    #[test]
    fn test_pages_load_in_page_order() {
        let bytes = build_pdf(
            courier,
            vec![
                text_block(vec![
                    place(180, 780, text("Precios de Cierre de Acciones")),
                    place(40, 760, text("AGUAS-A")),
                    place(260, 760, text("1.101,400")),
                ]),
                text_block(vec![
                    place(180, 780, text("Precios de Cierre")),
                    place(180, 768, text("Mercado CFI")),
                    place(40, 750, text("CFIABC-E")),
                    place(260, 750, text("0,850")),
                ]),
            ],
        );

        let pages = load_page_tokens(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(
            pages[0],
            vec![
                PositionedToken::new("Precios de Cierre de Acciones", 180.0, 780.0),
                PositionedToken::new("AGUAS-A", 40.0, 760.0),
                PositionedToken::new("1.101,400", 260.0, 760.0),
            ]
        );
        let second: Vec<_> = pages[1].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(second, vec!["Precios de Cierre", "Mercado CFI", "CFIABC-E", "0,850"]);

        let tables = extract_tables(&pages, &ExtractConfig::default()).unwrap();
        assert_eq!(tables.equities[0].page_index, 0);
        assert_eq!(tables.equities[0].rows[0].price, 1101.4);
        assert_eq!(tables.cfi[0].page_index, 1);
        assert_eq!(tables.cfi[0].rows[0].symbol, "CFIABC-E");
    }

    #[test]
    fn test_identity_h_font_is_decoded() {
        let bytes = build_pdf(
            |_| identity_h(),
            vec![text_block(vec![place(40, 700, hex(&[0x00, 0x42, 0x00, 0x43, 0x00, 0x49]))])],
        );

        let pages = load_page_tokens(&bytes).unwrap();
        assert_eq!(pages[0], vec![PositionedToken::new("BCI", 40.0, 700.0)]);
    }

    #[test]
    fn test_to_unicode_map_takes_precedence() {
        let cmap = b"begincmap\n1 beginbfrange\n<0024> <002F> <0041>\nendbfrange\nendcmap".to_vec();
        let with_cmap = |doc: &mut Document| {
            let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap));
            let mut font = identity_h();
            font.set("ToUnicode", cmap_id);
            font
        };
        // glyph ids 0x25 0x26 0x2A: B C G
        let bytes = build_pdf(
            with_cmap,
            vec![text_block(vec![place(40, 700, hex(&[0x00, 0x25, 0x00, 0x26, 0x00, 0x2A]))])],
        );

        let pages = load_page_tokens(&bytes).unwrap();
        assert_eq!(pages[0][0].text, "BCG");
    }

    #[test]
    fn test_unknown_font_uses_plain_decoding() {
        let mut fonts = PageFonts::new();
        fonts.insert(b"F2".to_vec(), FontDecoder::Identity);
        let ops = text_block(vec![place(40, 700, text("CAP"))]);
        assert_eq!(tokens_from_operations(&ops, &fonts)[0].text, "CAP");
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        assert!(matches!(load_page_tokens(b"not a pdf"), Err(PdfError::Parse(_))));
    }
}
