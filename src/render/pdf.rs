//! PDF encoding of laid out pages

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

use super::layout::{Item, PAGE_HEIGHT, PAGE_WIDTH, Page, Rgb, Run};
use super::markup::Weight;
use crate::{Result, TripPlannerError};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn font_name(weight: Weight) -> &'static str {
    match weight {
        Weight::Normal => REGULAR_FONT,
        Weight::Bold => BOLD_FONT,
    }
}

/// WinAnsi code for `c`, `None` when the standard fonts have no glyph for it
#[must_use]
pub fn win_ansi(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            '\t' => Some(b' '),
            _ => None,
        },
    }
}

/// Glyph bytes for `text`; characters without a WinAnsi code are left out
#[must_use]
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars().filter_map(win_ansi).collect()
}

fn fill(color: Rgb) -> Operation {
    Operation::new("rg", vec![real(color.r), real(color.g), real(color.b)])
}

fn text_operations(x: f32, y: f32, size: f32, runs: &[Run], ops: &mut Vec<Operation>) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    for run in runs {
        let glyphs = encode_text(&run.text);
        if glyphs.is_empty() {
            continue;
        }
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font_name(run.weight).as_bytes().to_vec()), real(size)],
        ));
        ops.push(fill(run.color));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(glyphs, StringFormat::Hexadecimal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
}

fn rule_operations(x1: f32, x2: f32, y: f32, thickness: f32, color: Rgb, ops: &mut Vec<Operation>) {
    ops.extend([
        Operation::new("q", vec![]),
        Operation::new("RG", vec![real(color.r), real(color.g), real(color.b)]),
        Operation::new("w", vec![real(thickness)]),
        Operation::new("m", vec![real(x1), real(y)]),
        Operation::new("l", vec![real(x2), real(y)]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]);
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::new();
    for item in &page.items {
        match item {
            Item::Text { x, y, size, runs } => text_operations(*x, *y, *size, runs, &mut operations),
            Item::Rule { x1, x2, y, thickness, color } => {
                rule_operations(*x1, *x2, *y, *thickness, *color, &mut operations);
            }
        }
    }
    Content { operations }
}

fn font(doc: &mut Document, base: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Encode pages as a complete PDF file
pub fn encode(pages: &[Page], title: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = font(&mut doc, "Helvetica");
    let bold = font(&mut doc, "Helvetica-Bold");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular,
            BOLD_FONT => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| TripPlannerError::render(format!("Failed to encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len())
        .map_err(|_| TripPlannerError::render("Too many pages"))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_text(title), StringFormat::Literal),
        "Producer" => Object::string_literal(concat!("tripplanner ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| TripPlannerError::render(format!("Failed to write PDF: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::layout;
    use crate::render::markup::parse;
    use rstest::rstest;

    #[rstest]
    #[case('A', Some(b'A'))]
    #[case('é', Some(0xE9))]
    #[case('•', Some(0x95))]
    #[case('€', Some(0x80))]
    #[case('—', Some(0x97))]
    #[case('🧳', None)]
    #[case('中', None)]
    fn test_win_ansi(#[case] c: char, #[case] expected: Option<u8>) {
        assert_eq!(win_ansi(c), expected);
    }

    #[test]
    fn test_unmapped_characters_are_dropped() {
        assert_eq!(encode_text("🧳 Trip"), b" Trip".to_vec());
    }

    #[test]
    fn test_encoded_document_loads_back() {
        let text = "**DAY 1 - Arrival**\n• Hotel: Hotel Arts\n---\nVisit the **Picasso Museum**";
        let pages = layout(&parse(text), Some("Personalized Travel Itinerary"));
        let bytes = encode(&pages, "Personalized Travel Itinerary").unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), pages.len());
    }
}
