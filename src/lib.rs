mod error;
mod fonts;
pub mod markdown;
mod model;
pub mod pdf;
pub mod pipeline;
mod style;

pub use error::Error;
pub use fonts::{CustomFonts, Face};
pub use model::{
    Alignment, ClassifiedLine, DocumentNode, InlineRun, ListKind, RenderedDocument,
};
pub use style::{NodeStyle, StyleKind, StyleSpec};

use std::time::Instant;

/// Render markdown-like `text` under `title` with the standard PDF fonts.
pub fn markdown_to_pdf(
    title: &str,
    text: &str,
    style: &StyleSpec,
) -> Result<RenderedDocument, Error> {
    markdown_to_pdf_with_fonts(title, text, style, &CustomFonts::new())
}

pub fn markdown_to_pdf_with_fonts(
    title: &str,
    text: &str,
    style: &StyleSpec,
    fonts: &CustomFonts,
) -> Result<RenderedDocument, Error> {
    let t0 = Instant::now();

    let classified = markdown::classify_text(text);
    let t_classify = t0.elapsed();

    let nodes = markdown::assemble(title, &classified);
    let t_assemble = t0.elapsed();

    let doc = pdf::render(&nodes, style, fonts)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: classify={:.1}ms, assemble={:.1}ms, render={:.1}ms, total={:.1}ms ({} lines, {} nodes, {} bytes)",
        t_classify.as_secs_f64() * 1000.0,
        (t_assemble - t_classify).as_secs_f64() * 1000.0,
        (t_total - t_assemble).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        classified.len(),
        nodes.len(),
        doc.bytes.len(),
    );

    Ok(doc)
}
