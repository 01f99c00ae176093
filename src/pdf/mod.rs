mod flow;
mod layout;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{CustomFonts, Face, FontSet, register_fonts};
use crate::model::{Alignment, DocumentNode, InlineRun, RenderedDocument};
use crate::style::{NodeStyle, StyleSpec};

use flow::{Flowable, ListEntry, Span, build_flowables, decode_markup, used_chars};
use layout::{TextLine, build_code_lines, build_lines, draw_line};

// US Letter, 1" margins except a 0.25" bottom margin
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN_LEFT: f32 = 72.0;
pub const MARGIN_RIGHT: f32 = 72.0;
pub const MARGIN_TOP: f32 = 72.0;
pub const MARGIN_BOTTOM: f32 = 18.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const CONTENT_HEIGHT: f32 = PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

/// Gap between a list marker and the item text.
const MARKER_GAP: f32 = 4.0;
const CODE_PADDING: f32 = 4.0;
const CODE_BACKGROUND: [u8; 3] = [0xF4, 0xF4, 0xF4];
const PRODUCER: &str = concat!("transcript-pdf ", env!("CARGO_PKG_VERSION"));

/// One placed line of a block, with an optional marker in the hanging indent.
struct Row {
    line: TextLine,
    x: f32,
    width: f32,
    justify: bool,
    marker: Option<(TextLine, f32, f32)>, // line, x, width (right-aligned)
}

struct Block {
    kind: &'static str,
    style: NodeStyle,
    rows: Vec<Row>,
    background: bool,
}

/// Places blocks top-down onto fixed-size pages, starting a new page when
/// the next line does not fit.
struct Frame<'a> {
    fonts: &'a FontSet,
    pages: Vec<Content>,
    current: Content,
    y: f32,
    fresh_page: bool,
}

impl<'a> Frame<'a> {
    fn new(fonts: &'a FontSet) -> Self {
        Frame {
            fonts,
            pages: Vec::new(),
            current: Content::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
            fresh_page: true,
        }
    }

    fn new_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Content::new());
        self.pages.push(done);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.fresh_page = true;
    }

    fn spacer(&mut self, height: f32) {
        if self.fresh_page {
            return;
        }
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    fn place(&mut self, block: Block) -> Result<(), Error> {
        if !self.fresh_page {
            self.y -= block.style.space_before;
        }

        let mut segment: Vec<(Row, f32)> = Vec::new();
        let mut segment_top = self.y;
        for row in block.rows {
            let h = row.line.height();
            if h > CONTENT_HEIGHT {
                return Err(Error::LayoutOverflow {
                    node: block.kind,
                    detail: format!(
                        "line height {h:.1}pt exceeds page content height {CONTENT_HEIGHT:.1}pt"
                    ),
                });
            }
            if self.y - h < MARGIN_BOTTOM && !self.fresh_page {
                let placed = std::mem::take(&mut segment);
                self.draw_segment(&block.style, block.background, segment_top, placed);
                self.new_page();
                segment_top = self.y;
            }
            let baseline = self.y - (h - row.line.font_size) / 2.0 - row.line.ascent;
            segment.push((row, baseline));
            self.y -= h;
            self.fresh_page = false;
        }
        self.draw_segment(&block.style, block.background, segment_top, segment);

        self.y -= block.style.space_after;
        Ok(())
    }

    fn draw_segment(
        &mut self,
        style: &NodeStyle,
        background: bool,
        top: f32,
        rows: Vec<(Row, f32)>,
    ) {
        if rows.is_empty() {
            return;
        }
        if background {
            let x = MARGIN_LEFT + style.left_indent - CODE_PADDING;
            let w = CONTENT_WIDTH - style.left_indent + 2.0 * CODE_PADDING;
            let bottom = self.y - CODE_PADDING;
            let [r, g, b] = CODE_BACKGROUND;
            self.current.save_state();
            self.current.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            self.current.rect(x, bottom, w, top + CODE_PADDING - bottom);
            self.current.fill_nonzero();
            self.current.restore_state();
        }
        for (row, baseline) in &rows {
            if let Some((marker, mx, mw)) = &row.marker {
                draw_line(
                    &mut self.current,
                    marker,
                    self.fonts,
                    style.text_color,
                    Alignment::Right,
                    *mx,
                    *mw,
                    *baseline,
                    false,
                );
            }
            draw_line(
                &mut self.current,
                &row.line,
                self.fonts,
                style.text_color,
                style.alignment,
                row.x,
                row.width,
                *baseline,
                row.justify,
            );
        }
    }

    fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.current);
        self.pages
    }
}

fn text_area(kind: &'static str, style: &NodeStyle) -> Result<(f32, f32), Error> {
    let x = MARGIN_LEFT + style.left_indent;
    let width = CONTENT_WIDTH - style.left_indent;
    if width < style.font_size {
        return Err(Error::LayoutOverflow {
            node: kind,
            detail: format!(
                "indent of {:.1}pt leaves {width:.1}pt for text",
                style.left_indent
            ),
        });
    }
    Ok((x, width))
}

fn text_rows(lines: Vec<TextLine>, x: f32, width: f32, alignment: Alignment) -> Vec<Row> {
    let last = lines.len().saturating_sub(1);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| Row {
            line,
            x,
            width,
            justify: alignment == Alignment::Justify && i != last,
            marker: None,
        })
        .collect()
}

fn list_rows(
    kind: &'static str,
    style: &NodeStyle,
    entries: &[ListEntry],
    fonts: &FontSet,
) -> Result<Vec<Row>, Error> {
    let (x, width) = text_area(kind, style)?;
    let marker_width = (style.left_indent - MARKER_GAP).max(0.0);
    let mut rows = Vec::new();
    for entry in entries {
        let lines = build_lines(&entry.spans, fonts, style.font_size, width);
        let mut item_rows = text_rows(lines, x, width, style.alignment);
        let marker_span = [Span {
            face: Face::Regular,
            markup: entry.marker.clone(),
        }];
        let marker = build_lines(&marker_span, fonts, style.font_size, f32::INFINITY)
            .into_iter()
            .next();
        if let (Some(first), Some(marker)) = (item_rows.first_mut(), marker) {
            first.marker = Some((marker, MARGIN_LEFT, marker_width));
        }
        rows.append(&mut item_rows);
    }
    Ok(rows)
}

fn block_for(flowable: &Flowable, fonts: &FontSet) -> Result<Option<Block>, Error> {
    let block = match flowable {
        Flowable::Spacer(_) => return Ok(None),
        Flowable::Text { kind, style, spans } => {
            let kind = *kind;
            let (x, width) = text_area(kind, style)?;
            let lines = build_lines(spans, fonts, style.font_size, width);
            Block {
                kind,
                style: *style,
                rows: text_rows(lines, x, width, style.alignment),
                background: false,
            }
        }
        Flowable::List { kind, style, entries } => Block {
            kind: *kind,
            style: *style,
            rows: list_rows(*kind, style, entries, fonts)?,
            background: false,
        },
        Flowable::Code { kind, style, lines } => {
            let kind = *kind;
            let (x, width) = text_area(kind, style)?;
            let code_style = NodeStyle {
                alignment: Alignment::Left,
                ..*style
            };
            let lines = build_code_lines(lines, fonts, style.font_size, width);
            Block {
                kind,
                style: code_style,
                rows: text_rows(lines, x, width, Alignment::Left),
                background: true,
            }
        }
    };
    Ok(Some(block))
}

fn document_title(nodes: &[DocumentNode]) -> String {
    nodes
        .iter()
        .find_map(|node| match node {
            DocumentNode::Title(runs) => Some(
                runs.iter()
                    .map(InlineRun::text)
                    .map(decode_markup)
                    .collect::<String>(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

/// Lay out `nodes` onto Letter pages and serialize the PDF.
///
/// Missing or invalid styles fall back to defaults. A line too tall for a
/// page, or an indent leaving no room for text, fails the whole render with
/// [`Error::LayoutOverflow`]; no partial output is returned.
pub fn render(
    nodes: &[DocumentNode],
    style: &StyleSpec,
    custom_fonts: &CustomFonts,
) -> Result<RenderedDocument, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: flowables and the fonts they need
    let flowables = build_flowables(nodes, style);
    let used = used_chars(&flowables);
    let fonts = register_fonts(&mut pdf, &mut alloc, custom_fonts, &used)?;
    let t_fonts = t0.elapsed();

    // Phase 2: pagination
    let mut frame = Frame::new(&fonts);
    for flowable in &flowables {
        match flowable {
            Flowable::Spacer(h) => frame.spacer(*h),
            _ => {
                if let Some(block) = block_for(flowable, &fonts)? {
                    frame.place(block)?;
                }
            }
        }
    }
    let all_contents = frame.finish();
    let t_layout = t0.elapsed();

    // Phase 3: allocate page and content IDs now that page count is known
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let title = document_title(nodes);
    {
        let mut info = pdf.document_info(info_id);
        if !title.is_empty() {
            info.title(TextStr(&title));
        }
        info.producer(TextStr(PRODUCER));
    }

    let font_pairs: Vec<(String, Ref)> = fonts
        .entries()
        .map(|e| (e.pdf_name.clone(), e.font_ref))
        .collect();

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (name, font_ref) in &font_pairs {
            font_dict.pair(Name(name.as_bytes()), *font_ref);
        }
    }

    let bytes = pdf.finish();
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: fonts={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} page(s), {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
        bytes.len(),
    );

    Ok(RenderedDocument {
        bytes,
        page_count: n,
    })
}
