use std::collections::{BTreeMap, BTreeSet};

use crate::fonts::Face;
use crate::model::{DocumentNode, InlineRun};
use crate::style::{NodeStyle, StyleKind, StyleSpec};

pub(super) const BULLET_MARKER: &str = "\u{2022}";

/// A styled stretch of flow markup. Markup is entity-escaped text: `&amp;`,
/// `&lt;` and `&gt;` stand for their characters, everything else is literal.
pub(super) struct Span {
    pub(super) face: Face,
    pub(super) markup: String,
}

impl Span {
    pub(super) fn text(&self) -> String {
        decode_markup(&self.markup)
    }
}

pub(super) struct ListEntry {
    pub(super) marker: String,
    pub(super) spans: Vec<Span>,
}

/// One unit of paginated content, built from one document node.
pub(super) enum Flowable {
    Text {
        kind: &'static str,
        style: NodeStyle,
        spans: Vec<Span>,
    },
    List {
        kind: &'static str,
        style: NodeStyle,
        entries: Vec<ListEntry>,
    },
    Code {
        kind: &'static str,
        style: NodeStyle,
        lines: Vec<String>,
    },
    Spacer(f32),
}

/// Escape the characters flow markup reserves.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turn flow markup back into drawable text. Unknown entities and bare `<`
/// or `>` pass through unchanged.
pub(crate) fn decode_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let entity = [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')]
            .into_iter()
            .find(|(name, _)| rest.starts_with(name));
        match entity {
            Some((name, ch)) => {
                out.push(ch);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn spans_for(runs: &[InlineRun], kind: StyleKind) -> Vec<Span> {
    let bold = kind.is_bold();
    runs.iter()
        .map(|run| {
            let face = match run {
                InlineRun::PlainText(_) => Face::from_flags(bold, false),
                InlineRun::Bold(_) => Face::from_flags(true, false),
                InlineRun::Italic(_) => Face::from_flags(bold, true),
                InlineRun::Code(_) => Face::Mono,
            };
            Span {
                face,
                markup: run.text().to_string(),
            }
        })
        .collect()
}

fn list_entries(items: &[Vec<InlineRun>], numbered: bool) -> Vec<ListEntry> {
    items
        .iter()
        .enumerate()
        .map(|(i, runs)| ListEntry {
            marker: if numbered {
                format!("{}.", i + 1)
            } else {
                BULLET_MARKER.to_string()
            },
            spans: spans_for(runs, StyleKind::List),
        })
        .collect()
}

/// Map each node to its flowable, resolving styles through `spec`.
pub(super) fn build_flowables(nodes: &[DocumentNode], spec: &StyleSpec) -> Vec<Flowable> {
    nodes
        .iter()
        .map(|node| {
            let kind = StyleKind::for_node(node).unwrap_or(StyleKind::Body);
            let name = node.kind_name();
            match node {
                DocumentNode::Spacer(h) => {
                    Flowable::Spacer(if h.is_finite() { h.max(0.0) } else { 0.0 })
                }
                DocumentNode::Title(runs)
                | DocumentNode::Heading(_, runs)
                | DocumentNode::Paragraph(runs) => Flowable::Text {
                    kind: name,
                    style: spec.resolve(kind),
                    spans: spans_for(runs, kind),
                },
                DocumentNode::BulletList(items) => Flowable::List {
                    kind: name,
                    style: spec.resolve(kind),
                    entries: list_entries(items, false),
                },
                DocumentNode::NumberedList(items) => Flowable::List {
                    kind: name,
                    style: spec.resolve(kind),
                    entries: list_entries(items, true),
                },
                DocumentNode::CodeBlock(lines) => Flowable::Code {
                    kind: name,
                    style: spec.resolve(kind),
                    lines: lines.iter().map(|l| escape_markup(l)).collect(),
                },
            }
        })
        .collect()
}

fn add_span_chars(used: &mut BTreeMap<Face, BTreeSet<char>>, spans: &[Span]) {
    for span in spans {
        used.entry(span.face).or_default().extend(span.text().chars());
    }
}

/// Characters each face will draw, for font subsetting.
pub(super) fn used_chars(flowables: &[Flowable]) -> BTreeMap<Face, BTreeSet<char>> {
    let mut used: BTreeMap<Face, BTreeSet<char>> = BTreeMap::new();
    for flowable in flowables {
        match flowable {
            Flowable::Text { spans, .. } => add_span_chars(&mut used, spans),
            Flowable::List { entries, .. } => {
                for entry in entries {
                    used.entry(Face::Regular)
                        .or_default()
                        .extend(entry.marker.chars());
                    add_span_chars(&mut used, &entry.spans);
                }
            }
            Flowable::Code { lines, .. } => {
                let mono = used.entry(Face::Mono).or_default();
                for line in lines {
                    mono.extend(decode_markup(line).chars().filter(|c| *c != '\t'));
                }
            }
            Flowable::Spacer(_) => {}
        }
    }
    used
}
