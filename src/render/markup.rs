//! Line classification for itinerary text
//!
//! The generated text follows a small line oriented convention. Each line maps to
//! exactly one [`Block`]; the first matching rule wins:
//!
//! 1. blank line: vertical space
//! 2. `---`: horizontal rule
//! 3. `**TEXT**` with no inner `**`: heading, a day heading if it starts with a day marker
//! 4. `• ...`: bullet, with a bold label when it contains a colon
//! 5. anything else: prose, `**` toggles bold
//!
//! Nothing here can fail. Lines that look almost like markup are prose.

const SEPARATOR: &str = "---";
const BOLD: &str = "**";
const BULLET: char = '•';
const DAY_MARKERS: [&str; 3] = ["DAY", "DÍA", "DIA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub weight: Weight,
}

impl Span {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: Weight::Normal,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: Weight::Bold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Spacer,
    Rule,
    /// Uppercased text of a day heading
    DayHeading(String),
    /// Uppercased text of any other heading
    Heading(String),
    Bullet(Vec<Span>),
    Prose(Vec<Span>),
}

/// Classify every line of `text`
#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    text.split('\n')
        .map(|line| classify(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

#[must_use]
pub fn classify(line: &str) -> Block {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Block::Spacer;
    }
    if trimmed == SEPARATOR {
        return Block::Rule;
    }
    if let Some(title) = heading_text(trimmed) {
        let title = title.to_uppercase();
        return if is_day_heading(&title) {
            Block::DayHeading(title)
        } else {
            Block::Heading(title)
        };
    }
    if let Some(rest) = trimmed.strip_prefix(BULLET) {
        return Block::Bullet(bullet_spans(rest.trim_start()));
    }
    Block::Prose(prose_spans(line))
}

fn heading_text(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix(BOLD)?.strip_suffix(BOLD)?;
    if inner.contains(BOLD) || inner.trim().is_empty() {
        return None;
    }
    Some(inner.trim())
}

fn is_day_heading(title: &str) -> bool {
    DAY_MARKERS.iter().any(|marker| {
        title
            .strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn bullet_spans(rest: &str) -> Vec<Span> {
    match rest.split_once(':') {
        Some((label, value)) => {
            // the label may close its own emphasis after the colon: "**Time:** 10:00"
            let value = if label.matches(BOLD).count() % 2 == 1 {
                value.replacen(BOLD, "", 1)
            } else {
                value.to_string()
            };
            let label = label.replace(BOLD, "");
            let mut spans = vec![Span::bold(format!("{BULLET} {}:", label.trim()))];
            spans.extend(prose_spans(&value));
            spans
        }
        None => prose_spans(&format!("{BULLET} {rest}")),
    }
}

fn prose_spans(line: &str) -> Vec<Span> {
    line.split(BOLD)
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
        .map(|(i, segment)| {
            if i % 2 == 0 {
                Span::normal(segment)
            } else {
                Span::bold(segment)
            }
        })
        .collect()
}
