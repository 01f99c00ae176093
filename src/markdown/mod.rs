//! Markdown-like text to document nodes.
//!
//! Three stages, each a plain function: [`classify`] tags every source line,
//! [`assemble`] folds the tagged lines into block nodes, and [`translate`]
//! splits the text of a single block into inline runs.

mod assemble;
mod classify;
mod inline;

pub use assemble::{BLANK_SPACER, PARAGRAPH_SPACER, TITLE_SPACER, assemble};
pub use classify::{classify, classify_text};
pub use inline::translate;

use crate::model::DocumentNode;

/// Classify and assemble `text` under `title`.
pub fn parse(title: &str, text: &str) -> Vec<DocumentNode> {
    let classified = classify_text(text);
    assemble(title, &classified)
}
