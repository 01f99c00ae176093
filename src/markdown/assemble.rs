use crate::model::{ClassifiedLine, DocumentNode, InlineRun, ListKind};

use super::inline::translate;

/// Gap after the title block.
pub const TITLE_SPACER: f32 = 12.0;
/// Gap emitted for a blank source line.
pub const BLANK_SPACER: f32 = 6.0;
/// Gap after every paragraph.
pub const PARAGRAPH_SPACER: f32 = 6.0;

#[derive(Default)]
struct Assembler {
    nodes: Vec<DocumentNode>,
    list_items: Vec<Vec<InlineRun>>,
    list_kind: Option<ListKind>,
    code_lines: Vec<String>,
    in_fence: bool,
}

impl Assembler {
    fn flush_list(&mut self) {
        let Some(kind) = self.list_kind.take() else {
            return;
        };
        let items = std::mem::take(&mut self.list_items);
        self.nodes.push(match kind {
            ListKind::Bullet => DocumentNode::BulletList(items),
            ListKind::Numbered => DocumentNode::NumberedList(items),
        });
    }

    fn flush_code(&mut self) {
        let lines = std::mem::take(&mut self.code_lines);
        if !lines.is_empty() {
            self.nodes.push(DocumentNode::CodeBlock(lines));
        }
    }

    fn push_item(&mut self, kind: ListKind, text: &str) {
        if self.list_kind.is_some_and(|k| k != kind) {
            self.flush_list();
        }
        self.list_items.push(translate(text));
        self.list_kind = Some(kind);
    }

    fn line(&mut self, line: &ClassifiedLine) {
        match line {
            ClassifiedLine::CodeFenceMarker => {
                if self.in_fence {
                    self.flush_code();
                } else {
                    self.flush_list();
                }
                self.in_fence = !self.in_fence;
            }
            ClassifiedLine::CodeLine(raw) => {
                self.code_lines.push(raw.clone());
            }
            ClassifiedLine::Blank => {
                if self.list_kind.is_some() {
                    self.flush_list();
                } else {
                    self.nodes.push(DocumentNode::Spacer(BLANK_SPACER));
                }
            }
            ClassifiedLine::Heading(level, text) => {
                self.flush_list();
                self.nodes.push(DocumentNode::Heading(*level, translate(text)));
            }
            ClassifiedLine::BulletItem(text) => self.push_item(ListKind::Bullet, text),
            ClassifiedLine::NumberedItem(text) => self.push_item(ListKind::Numbered, text),
            ClassifiedLine::Paragraph(text) => {
                self.flush_list();
                self.nodes.push(DocumentNode::Paragraph(translate(text)));
                self.nodes.push(DocumentNode::Spacer(PARAGRAPH_SPACER));
            }
        }
    }

    fn finish(mut self) -> Vec<DocumentNode> {
        self.flush_list();
        if self.in_fence {
            log::debug!(
                "assemble: closing unterminated code fence ({} line(s))",
                self.code_lines.len()
            );
            self.flush_code();
        }
        self.nodes
    }
}

/// Build the node sequence for a document: title and spacer first, then one
/// node per heading, paragraph, list run, code block and blank line.
///
/// A list run ends at any non-list line and whenever the item type switches,
/// and is flushed before that line is processed.
pub fn assemble(title: &str, classified: &[ClassifiedLine]) -> Vec<DocumentNode> {
    let mut asm = Assembler::default();
    asm.nodes.push(DocumentNode::Title(translate(title)));
    asm.nodes.push(DocumentNode::Spacer(TITLE_SPACER));
    for line in classified {
        asm.line(line);
    }
    asm.finish()
}
