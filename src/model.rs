#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// One inline-styled span of a single line of text.
///
/// Text is stored in flow markup form: a literal `&` is already escaped to
/// `&amp;`. Angle brackets are left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineRun {
    PlainText(String),
    Bold(String),
    Italic(String),
    Code(String),
}

impl InlineRun {
    pub fn text(&self) -> &str {
        match self {
            InlineRun::PlainText(t)
            | InlineRun::Bold(t)
            | InlineRun::Italic(t)
            | InlineRun::Code(t) => t,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedLine {
    Blank,
    Heading(u8, String), // level 1..=3
    BulletItem(String),
    NumberedItem(String),
    CodeFenceMarker,
    CodeLine(String),
    Paragraph(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentNode {
    Title(Vec<InlineRun>),
    Heading(u8, Vec<InlineRun>),
    Paragraph(Vec<InlineRun>),
    BulletList(Vec<Vec<InlineRun>>),
    NumberedList(Vec<Vec<InlineRun>>),
    /// Raw lines, no inline markup applied.
    CodeBlock(Vec<String>),
    Spacer(f32), // height in points
}

impl DocumentNode {
    /// Short name of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DocumentNode::Title(_) => "title",
            DocumentNode::Heading(1, _) => "heading1",
            DocumentNode::Heading(2, _) => "heading2",
            DocumentNode::Heading(_, _) => "heading3",
            DocumentNode::Paragraph(_) => "paragraph",
            DocumentNode::BulletList(_) => "bullet list",
            DocumentNode::NumberedList(_) => "numbered list",
            DocumentNode::CodeBlock(_) => "code block",
            DocumentNode::Spacer(_) => "spacer",
        }
    }
}

/// A finished PDF. Owned by the caller; never mutated after rendering.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}
