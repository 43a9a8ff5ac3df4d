//! Page layout
//!
//! Turns classified blocks into positioned text lines and rules on US Letter
//! pages. Coordinates are PDF points with the origin at the bottom left, `y` is
//! the text baseline.

use super::markup::{Block, Span, Weight};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

pub const TITLE_SIZE: f32 = 20.0;
pub const DAY_HEADING_SIZE: f32 = 16.0;
pub const HEADING_SIZE: f32 = 13.0;
pub const BODY_SIZE: f32 = 11.0;

const LINE_SPACING: f32 = 1.35;
const SPACER: f32 = 8.0;
const BULLET_INDENT: f32 = 14.0;
const RULE_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

pub const TEXT_COLOR: Rgb = Rgb::new(0.0, 0.0, 0.0);
pub const DAY_COLOR: Rgb = Rgb::new(0.10, 0.32, 0.58);
pub const HEADING_COLOR: Rgb = Rgb::new(0.20, 0.20, 0.20);
pub const RULE_COLOR: Rgb = Rgb::new(0.70, 0.70, 0.70);

/// A piece of text in one style
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub weight: Weight,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// One output line; runs follow each other left to right
    Text {
        x: f32,
        y: f32,
        size: f32,
        runs: Vec<Run>,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
}

impl Page {
    /// Text of every line on the page, runs joined
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.items.iter().filter_map(|item| match item {
            Item::Text { runs, .. } => Some(runs.iter().map(|r| r.text.as_str()).collect()),
            Item::Rule { .. } => None,
        })
    }
}

/// Cursor and pen for one document. Created per layout call.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub y: f32,
    pub weight: Weight,
    pub color: Rgb,
    pub page: usize,
}

impl RenderState {
    fn new() -> Self {
        Self {
            y: PAGE_HEIGHT - MARGIN,
            weight: Weight::Normal,
            color: TEXT_COLOR,
            page: 0,
        }
    }

    fn pen(&mut self, weight: Weight, color: Rgb) {
        self.weight = weight;
        self.color = color;
    }

    fn run(&self, text: &str) -> Run {
        Run {
            text: text.to_string(),
            weight: self.weight,
            color: self.color,
        }
    }
}

struct Layout {
    state: RenderState,
    pages: Vec<Page>,
}

impl Layout {
    fn new() -> Self {
        Self {
            state: RenderState::new(),
            pages: vec![Page::default()],
        }
    }

    /// Start a new page if `height` does not fit above the bottom margin
    fn reserve(&mut self, height: f32) {
        if self.state.y - height >= MARGIN {
            return;
        }
        if !self.current().items.is_empty() {
            self.pages.push(Page::default());
            self.state.page += 1;
        }
        self.state.y = PAGE_HEIGHT - MARGIN;
    }

    fn current(&mut self) -> &mut Page {
        let index = self.state.page;
        &mut self.pages[index]
    }

    fn advance(&mut self, by: f32) {
        self.state.y -= by;
    }

    fn text_lines(&mut self, runs: Vec<Run>, x: f32, width: f32, size: f32) {
        let line_height = size * LINE_SPACING;
        for line in wrap(runs, width, size) {
            self.reserve(line_height);
            self.advance(size);
            let y = self.state.y;
            self.current().items.push(Item::Text { x, y, size, runs: line });
            self.advance(line_height - size);
        }
    }

    fn centered(&mut self, text: &str, size: f32) {
        let line_height = size * LINE_SPACING;
        self.reserve(line_height);
        self.advance(size);
        let width = text_width(text, self.state.weight, size);
        let x = MARGIN + ((TEXT_WIDTH - width) / 2.0).max(0.0);
        let y = self.state.y;
        let run = self.state.run(text);
        self.current().items.push(Item::Text { x, y, size, runs: vec![run] });
        self.advance(line_height - size);
    }

    fn rule(&mut self, thickness: f32, color: Rgb) {
        self.reserve(RULE_GAP);
        let y = self.state.y - RULE_GAP / 2.0;
        self.current().items.push(Item::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y,
            thickness,
            color,
        });
        self.advance(RULE_GAP);
    }

    fn spans(&mut self, spans: &[Span], color: Rgb) -> Vec<Run> {
        spans
            .iter()
            .map(|span| {
                self.state.pen(span.weight, color);
                self.state.run(&span.text)
            })
            .collect()
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Spacer => self.advance(SPACER),
            Block::Rule => self.rule(0.5, RULE_COLOR),
            Block::DayHeading(title) => {
                self.advance(SPACER / 2.0);
                self.state.pen(Weight::Bold, DAY_COLOR);
                let runs = vec![self.state.run(title)];
                self.text_lines(runs, MARGIN, TEXT_WIDTH, DAY_HEADING_SIZE);
                self.rule(1.0, DAY_COLOR);
            }
            Block::Heading(title) => {
                self.state.pen(Weight::Bold, HEADING_COLOR);
                let runs = vec![self.state.run(title)];
                self.text_lines(runs, MARGIN, TEXT_WIDTH, HEADING_SIZE);
            }
            Block::Bullet(spans) => {
                let runs = self.spans(spans, TEXT_COLOR);
                self.text_lines(
                    runs,
                    MARGIN + BULLET_INDENT,
                    TEXT_WIDTH - BULLET_INDENT,
                    BODY_SIZE,
                );
            }
            Block::Prose(spans) => {
                if spans.is_empty() {
                    return;
                }
                let runs = self.spans(spans, TEXT_COLOR);
                self.text_lines(runs, MARGIN, TEXT_WIDTH, BODY_SIZE);
            }
        }
    }
}

/// Lay out `blocks` below an optional centered title
#[must_use]
pub fn layout(blocks: &[Block], title: Option<&str>) -> Vec<Page> {
    let mut layout = Layout::new();

    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        layout.state.pen(Weight::Bold, TEXT_COLOR);
        layout.centered(title, TITLE_SIZE);
        layout.advance(SPACER * 2.0);
    }

    for block in blocks {
        layout.block(block);
    }
    layout.pages
}

/// Split runs into lines no wider than `width`, breaking after spaces.
/// Words wider than a whole line are broken between characters.
fn wrap(runs: Vec<Run>, width: f32, size: f32) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut used = 0.0;

    let pieces = runs.iter().flat_map(|run| {
        run.text.split_inclusive(' ').map(move |piece| (piece, run))
    });

    for (piece, run) in pieces {
        for chunk in fit_chunks(piece, run.weight, size, width) {
            let visible = text_width(chunk.trim_end(), run.weight, size);
            if used + visible > width && !line.is_empty() {
                trim_line_end(&mut line);
                lines.push(std::mem::take(&mut line));
                used = 0.0;
            }
            used += text_width(chunk, run.weight, size);
            push_text(&mut line, chunk, run);
        }
    }

    if !line.is_empty() {
        trim_line_end(&mut line);
        lines.push(line);
    }
    lines
}

/// `piece` unchanged when it fits on a line, otherwise cut into line sized parts
fn fit_chunks(piece: &str, weight: Weight, size: f32, width: f32) -> Vec<&str> {
    if text_width(piece.trim_end(), weight, size) <= width {
        return vec![piece];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut used = 0.0;
    for (index, ch) in piece.char_indices() {
        let w = char_width(ch, weight) * size / 1000.0;
        if used + w > width && index > start {
            chunks.push(&piece[start..index]);
            start = index;
            used = 0.0;
        }
        used += w;
    }
    chunks.push(&piece[start..]);
    chunks
}

fn push_text(line: &mut Vec<Run>, text: &str, style: &Run) {
    match line.last_mut() {
        Some(last) if last.weight == style.weight && last.color == style.color => {
            last.text.push_str(text);
        }
        _ => line.push(Run {
            text: text.to_string(),
            weight: style.weight,
            color: style.color,
        }),
    }
}

fn trim_line_end(line: &mut Vec<Run>) {
    while let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
        if !last.text.is_empty() {
            break;
        }
        line.pop();
    }
}

/// Width of `text` in points
#[must_use]
pub fn text_width(text: &str, weight: Weight, size: f32) -> f32 {
    text.chars().map(|c| char_width(c, weight)).sum::<f32>() * size / 1000.0
}

// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, weight: Weight) -> f32 {
    let table = match weight {
        Weight::Normal => &HELVETICA,
        Weight::Bold => &HELVETICA_BOLD,
    };
    let code = c as u32;
    let width = match code {
        0x20..=0x7E => table[(code - 0x20) as usize],
        0x2022 => 350,
        0x2013 => 556,
        0x2014 => 1000,
        // accented letters and other Latin-1 glyphs are close to an average lowercase letter
        _ => 556,
    };
    f32::from(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markup::parse;

    fn text_items(pages: &[Page]) -> Vec<&Item> {
        pages
            .iter()
            .flat_map(|p| p.items.iter())
            .filter(|i| matches!(i, Item::Text { .. }))
            .collect()
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("Hi", Weight::Normal, 10.0), (722.0 + 222.0) / 100.0);
        assert!(text_width("Hi", Weight::Bold, 10.0) > text_width("Hi", Weight::Normal, 10.0));
    }

    #[test]
    fn test_title_is_centered() {
        let pages = layout(&[], Some("Trip"));
        let Item::Text { x, size, .. } = &pages[0].items[0] else {
            panic!("expected a text line");
        };
        let width = text_width("Trip", Weight::Bold, TITLE_SIZE);
        assert!((x - (MARGIN + (TEXT_WIDTH - width) / 2.0)).abs() < 0.01);
        assert_eq!(*size, TITLE_SIZE);
    }

    #[test]
    fn test_long_prose_wraps_and_keeps_styles() {
        let line = format!("{} **bold tail**", "word ".repeat(40).trim_end());
        let pages = layout(&parse(&line), None);
        let lines: Vec<String> = pages[0].lines().collect();

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), line.replace("**", ""));
        for item in text_items(&pages) {
            let Item::Text { runs, size, .. } = item else { unreachable!() };
            let width: f32 = runs.iter().map(|r| text_width(&r.text, r.weight, *size)).sum();
            assert!(width <= TEXT_WIDTH + 0.01);
        }
        let last = pages[0].items.last().unwrap();
        let Item::Text { runs, .. } = last else { panic!("expected text") };
        assert_eq!(runs.last().unwrap().weight, Weight::Bold);
    }

    #[test]
    fn test_overlong_word_is_split() {
        let url = "x".repeat(200);
        let pages = layout(&parse(&url), None);
        let lines: Vec<String> = pages[0].lines().collect();
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), url);
    }

    #[test]
    fn test_pages_break_at_bottom_margin() {
        let text = "A line of itinerary text\n".repeat(120);
        let pages = layout(&parse(&text), None);

        assert!(pages.len() > 1);
        for page in &pages {
            for item in &page.items {
                if let Item::Text { y, .. } = item {
                    assert!(*y >= MARGIN && *y <= PAGE_HEIGHT - MARGIN);
                }
            }
        }
        let total: usize = pages.iter().map(|p| p.lines().count()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn test_bullets_are_indented() {
        let pages = layout(&parse("• Hotel: Arts\nPlain"), None);
        let xs: Vec<f32> = text_items(&pages)
            .into_iter()
            .map(|i| match i {
                Item::Text { x, .. } => *x,
                Item::Rule { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![MARGIN + BULLET_INDENT, MARGIN]);
    }
}
