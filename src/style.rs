use std::collections::HashMap;

use crate::model::{Alignment, DocumentNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Title,
    Heading1,
    Heading2,
    Heading3,
    Body,
    List,
    Code,
}

impl StyleKind {
    pub const ALL: [StyleKind; 7] = [
        StyleKind::Title,
        StyleKind::Heading1,
        StyleKind::Heading2,
        StyleKind::Heading3,
        StyleKind::Body,
        StyleKind::List,
        StyleKind::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleKind::Title => "title",
            StyleKind::Heading1 => "heading1",
            StyleKind::Heading2 => "heading2",
            StyleKind::Heading3 => "heading3",
            StyleKind::Body => "body",
            StyleKind::List => "list",
            StyleKind::Code => "code",
        }
    }

    pub fn parse(name: &str) -> Option<StyleKind> {
        StyleKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Style kind used for a node; spacers have none.
    pub fn for_node(node: &DocumentNode) -> Option<StyleKind> {
        match node {
            DocumentNode::Title(_) => Some(StyleKind::Title),
            DocumentNode::Heading(1, _) => Some(StyleKind::Heading1),
            DocumentNode::Heading(2, _) => Some(StyleKind::Heading2),
            DocumentNode::Heading(_, _) => Some(StyleKind::Heading3),
            DocumentNode::Paragraph(_) => Some(StyleKind::Body),
            DocumentNode::BulletList(_) | DocumentNode::NumberedList(_) => Some(StyleKind::List),
            DocumentNode::CodeBlock(_) => Some(StyleKind::Code),
            DocumentNode::Spacer(_) => None,
        }
    }

    /// Title and headings are set in the bold face.
    pub fn is_bold(self) -> bool {
        matches!(
            self,
            StyleKind::Title | StyleKind::Heading1 | StyleKind::Heading2 | StyleKind::Heading3
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub font_size: f32,      // points
    pub text_color: [u8; 3], // RGB
    pub space_before: f32,
    pub space_after: f32,
    pub left_indent: f32,
    pub alignment: Alignment,
}

impl NodeStyle {
    pub fn default_for(kind: StyleKind) -> NodeStyle {
        let base = NodeStyle {
            font_size: 11.0,
            text_color: [0, 0, 0],
            space_before: 0.0,
            space_after: 0.0,
            left_indent: 0.0,
            alignment: Alignment::Left,
        };
        match kind {
            StyleKind::Title => NodeStyle {
                font_size: 24.0,
                text_color: [0x1F, 0x3A, 0x5F],
                space_after: 6.0,
                alignment: Alignment::Center,
                ..base
            },
            StyleKind::Heading1 => NodeStyle {
                font_size: 18.0,
                text_color: [0x1F, 0x3A, 0x5F],
                space_before: 12.0,
                space_after: 6.0,
                ..base
            },
            StyleKind::Heading2 => NodeStyle {
                font_size: 14.0,
                text_color: [0x2E, 0x54, 0x88],
                space_before: 10.0,
                space_after: 4.0,
                ..base
            },
            StyleKind::Heading3 => NodeStyle {
                font_size: 12.0,
                text_color: [0x33, 0x33, 0x33],
                space_before: 8.0,
                space_after: 4.0,
                ..base
            },
            StyleKind::Body => NodeStyle {
                alignment: Alignment::Justify,
                ..base
            },
            StyleKind::List => NodeStyle {
                space_after: 6.0,
                left_indent: 18.0,
                ..base
            },
            StyleKind::Code => NodeStyle {
                font_size: 9.0,
                text_color: [0x33, 0x33, 0x33],
                space_before: 4.0,
                space_after: 8.0,
                left_indent: 12.0,
                ..base
            },
        }
    }

    fn is_valid(&self) -> bool {
        let spacing_ok = |v: f32| v.is_finite() && v >= 0.0;
        self.font_size.is_finite()
            && self.font_size > 0.0
            && spacing_ok(self.space_before)
            && spacing_ok(self.space_after)
            && spacing_ok(self.left_indent)
    }
}

/// Style table keyed by node kind. Missing or invalid entries resolve to the
/// kind's default rather than failing a render.
#[derive(Clone, Debug)]
pub struct StyleSpec {
    pub styles: HashMap<StyleKind, NodeStyle>,
}

impl Default for StyleSpec {
    fn default() -> Self {
        StyleSpec {
            styles: StyleKind::ALL
                .into_iter()
                .map(|k| (k, NodeStyle::default_for(k)))
                .collect(),
        }
    }
}

impl StyleSpec {
    pub fn resolve(&self, kind: StyleKind) -> NodeStyle {
        match self.styles.get(&kind) {
            Some(style) if style.is_valid() => *style,
            Some(style) => {
                log::warn!("Invalid style for {}: {style:?}, using defaults", kind.name());
                NodeStyle::default_for(kind)
            }
            None => {
                log::warn!("No style for {}, using defaults", kind.name());
                NodeStyle::default_for(kind)
            }
        }
    }

    /// Set one key of one kind's style from its string form.
    /// Returns false (and logs) when the kind, key or value is not recognized.
    pub fn set(&mut self, kind: &str, key: &str, value: &str) -> bool {
        let Some(kind) = StyleKind::parse(kind) else {
            log::warn!("Unknown style kind {kind:?}, ignored");
            return false;
        };
        let style = self
            .styles
            .entry(kind)
            .or_insert_with(|| NodeStyle::default_for(kind));
        let applied = match key {
            "font_size" => parse_points(value).map(|v| style.font_size = v),
            "text_color" => parse_hex_color(value).map(|c| style.text_color = c),
            "space_before" => parse_points(value).map(|v| style.space_before = v),
            "space_after" => parse_points(value).map(|v| style.space_after = v),
            "left_indent" => parse_points(value).map(|v| style.left_indent = v),
            "alignment" => parse_alignment(value).map(|a| style.alignment = a),
            _ => None,
        };
        if applied.is_none() {
            log::warn!("Ignoring style override {}.{key}={value:?}", kind.name());
        }
        applied.is_some()
    }

    /// Apply an override written as `kind.key=value`.
    pub fn apply_override(&mut self, spec: &str) -> bool {
        let parsed = spec
            .split_once('=')
            .and_then(|(path, value)| path.split_once('.').map(|(k, key)| (k, key, value)));
        match parsed {
            Some((kind, key, value)) => self.set(kind.trim(), key.trim(), value.trim()),
            None => {
                log::warn!("Malformed style override {spec:?}, expected kind.key=value");
                false
            }
        }
    }
}

fn parse_points(val: &str) -> Option<f32> {
    let v: f32 = val.trim_end_matches("pt").parse().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

pub(crate) fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    let val = val.strip_prefix('#').unwrap_or(val);
    if val.len() != 6 || !val.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

pub(crate) fn parse_alignment(val: &str) -> Option<Alignment> {
    match val.to_ascii_lowercase().as_str() {
        "left" => Some(Alignment::Left),
        "center" | "centre" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "justify" | "justified" => Some(Alignment::Justify),
        _ => None,
    }
}
