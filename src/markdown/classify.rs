use crate::model::ClassifiedLine;

pub(crate) const FENCE_MARKER: &str = "```";

#[derive(Clone, Copy, Debug, PartialEq)]
enum FenceState {
    Normal,
    InFence,
}

/// Classify every line of `text`, one output entry per input line.
pub fn classify_text(text: &str) -> Vec<ClassifiedLine> {
    classify(text.lines())
}

/// Single forward pass over the lines. Inside an open fence every line is
/// verbatim code; only a line whose trimmed text starts with the fence marker
/// opens or closes it.
///
/// List markers need whitespace after them: `-item`, `1.5` and `2024.report`
/// are paragraphs.
pub fn classify<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<ClassifiedLine> {
    let mut state = FenceState::Normal;
    let mut out = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with(FENCE_MARKER) {
            state = match state {
                FenceState::Normal => FenceState::InFence,
                FenceState::InFence => FenceState::Normal,
            };
            out.push(ClassifiedLine::CodeFenceMarker);
            continue;
        }
        let classified = match state {
            FenceState::InFence => ClassifiedLine::CodeLine(line.to_string()),
            FenceState::Normal => classify_normal(line, trimmed),
        };
        out.push(classified);
    }

    if state == FenceState::InFence {
        log::debug!("classify: code fence still open at end of input");
    }
    out
}

fn classify_normal(line: &str, trimmed: &str) -> ClassifiedLine {
    if trimmed.is_empty() {
        return ClassifiedLine::Blank;
    }
    // Longest prefix first; `#### x` matches none of these and stays a paragraph.
    for (level, prefix) in [(3u8, "### "), (2, "## "), (1, "# ")] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return ClassifiedLine::Heading(level, rest.trim().to_string());
        }
    }
    if let Some(item) = bullet_item(trimmed) {
        return ClassifiedLine::BulletItem(item.to_string());
    }
    if let Some(item) = numbered_item(trimmed) {
        return ClassifiedLine::NumberedItem(item.to_string());
    }
    ClassifiedLine::Paragraph(line.to_string())
}

/// `- item` or `* item`. The marker must be followed by whitespace, which keeps
/// `**bold** text` and `---` out of lists.
fn bullet_item(trimmed: &str) -> Option<&str> {
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('*'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// `<digits>.` followed by whitespace or end of line.
fn numbered_item(trimmed: &str) -> Option<&str> {
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = trimmed[digits..].strip_prefix('.')?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}
