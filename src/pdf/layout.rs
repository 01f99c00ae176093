use pdf_writer::{Content, Name, Str};

use crate::fonts::{Face, FontSet};
use crate::model::Alignment;

use super::flow::{Span, decode_markup};

/// Line height as a multiple of the tallest font size on the line.
pub(super) const LINE_PITCH: f32 = 1.2;

const CODE_TAB_WIDTH: usize = 4;

pub(super) struct WordChunk {
    pub(super) face: Face,
    pub(super) text: String,
    pub(super) font_size: f32,
    pub(super) x_offset: f32, // x relative to line start
    pub(super) width: f32,
    pub(super) gap_before: bool, // separated from the previous chunk by a space
}

pub(super) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
    pub(super) font_size: f32,
    pub(super) ascent: f32,
}

impl TextLine {
    pub(super) fn height(&self) -> f32 {
        self.font_size * LINE_PITCH
    }
}

fn finish_line(chunks: &mut Vec<WordChunk>, base_size: f32, fonts: &FontSet) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    let font_size = chunks.iter().map(|c| c.font_size).fold(base_size, f32::max);
    let ascent = chunks
        .iter()
        .map(|c| c.font_size * fonts.get(c.face).ascender_ratio)
        .fold(base_size * fonts.get(Face::Regular).ascender_ratio, f32::max);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
        font_size,
        ascent,
    }
}

/// Break a word wider than the line into pieces that fit, char by char.
fn split_long_word(word: &str, width_of: impl Fn(&str) -> f32, max_width: f32) -> Vec<String> {
    if width_of(word) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && width_of(&current) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Layout spans into wrapped lines.
/// Handles cross-span contiguous text: no space is inserted between spans
/// unless the preceding text ended with whitespace or the new span starts
/// with whitespace (e.g., "bold" + ", " → "bold," not "bold ,").
pub(super) fn build_lines(
    spans: &[Span],
    fonts: &FontSet,
    font_size: f32,
    max_width: f32,
) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_chunks: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;

    for span in spans {
        let entry = fonts.get(span.face);
        let text = span.text();
        let space_w = entry.space_width(font_size);
        let starts_with_ws = text.starts_with(char::is_whitespace);

        for (i, word) in text.split_whitespace().enumerate() {
            let pieces = split_long_word(word, |w| entry.word_width(w, font_size), max_width);
            for (k, piece) in pieces.into_iter().enumerate() {
                let ww = entry.word_width(&piece, font_size);
                let need_space = k == 0
                    && !current_chunks.is_empty()
                    && (i > 0 || starts_with_ws || prev_ended_with_ws);

                // The space belongs to whichever span holds the whitespace character
                let effective_space_w = if i > 0 || starts_with_ws {
                    space_w
                } else {
                    prev_space_w
                };
                let proposed_x = if need_space {
                    current_x + effective_space_w
                } else {
                    current_x
                };

                let wrapped = !current_chunks.is_empty() && proposed_x + ww > max_width;
                if wrapped {
                    lines.push(finish_line(&mut current_chunks, font_size, fonts));
                    current_x = 0.0;
                } else {
                    current_x = proposed_x;
                }

                current_chunks.push(WordChunk {
                    face: span.face,
                    text: piece,
                    font_size,
                    x_offset: current_x,
                    width: ww,
                    gap_before: need_space && !wrapped,
                });
                current_x += ww;
            }
        }

        if !text.is_empty() {
            prev_ended_with_ws = text.ends_with(char::is_whitespace);
            prev_space_w = space_w;
        }
    }

    if !current_chunks.is_empty() || lines.is_empty() {
        lines.push(finish_line(&mut current_chunks, font_size, fonts));
    }
    lines
}

/// Lay out verbatim code lines in the mono face. Leading whitespace is kept,
/// tabs expand to spaces, and lines longer than the column limit are hard wrapped.
pub(super) fn build_code_lines(
    lines: &[String],
    fonts: &FontSet,
    font_size: f32,
    max_width: f32,
) -> Vec<TextLine> {
    let entry = fonts.get(Face::Mono);
    let char_w = entry.char_width_1000('M') * font_size / 1000.0;
    let columns = if char_w > 0.0 {
        ((max_width / char_w).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut out = Vec::with_capacity(lines.len());
    for markup in lines {
        let text = decode_markup(markup).replace('\t', &" ".repeat(CODE_TAB_WIDTH));
        let chars: Vec<char> = text.trim_end().chars().collect();
        if chars.is_empty() {
            out.push(finish_line(&mut Vec::new(), font_size, fonts));
            continue;
        }
        for piece in chars.chunks(columns) {
            let piece: String = piece.iter().collect();
            let mut chunks = vec![WordChunk {
                face: Face::Mono,
                width: entry.word_width(&piece, font_size),
                text: piece,
                font_size,
                x_offset: 0.0,
                gap_before: false,
            }];
            out.push(finish_line(&mut chunks, font_size, fonts));
        }
    }
    out
}

/// Draw one line at `baseline_y`. With `justify`, the slack is spread over the
/// word gaps; contiguous chunks (no space between them) stay together.
pub(super) fn draw_line(
    content: &mut Content,
    line: &TextLine,
    fonts: &FontSet,
    color: [u8; 3],
    alignment: Alignment,
    x: f32,
    width: f32,
    baseline_y: f32,
    justify: bool,
) {
    if line.chunks.is_empty() {
        return;
    }

    let line_start_x = match alignment {
        Alignment::Center => x + (width - line.total_width) / 2.0,
        Alignment::Right => x + width - line.total_width,
        Alignment::Left | Alignment::Justify => x,
    };

    let gap_count = line.chunks.iter().skip(1).filter(|c| c.gap_before).count();
    let extra_per_gap = if justify && gap_count > 0 && width > line.total_width {
        (width - line.total_width) / gap_count as f32
    } else {
        0.0
    };

    let [r, g, b] = color;
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.begin_text();

    let mut td_x = 0.0_f32;
    let mut td_y = 0.0_f32;
    let mut cur_face: Option<Face> = None;
    let mut cur_font_size: f32 = -1.0;
    let mut gaps_seen = 0usize;

    for (idx, chunk) in line.chunks.iter().enumerate() {
        if idx > 0 && chunk.gap_before {
            gaps_seen += 1;
        }
        let entry = fonts.get(chunk.face);
        let cx = line_start_x + chunk.x_offset + gaps_seen as f32 * extra_per_gap;

        if cur_face != Some(chunk.face) || cur_font_size != chunk.font_size {
            content.set_font(Name(entry.pdf_name.as_bytes()), chunk.font_size);
            cur_face = Some(chunk.face);
            cur_font_size = chunk.font_size;
        }

        content.next_line(cx - td_x, baseline_y - td_y);
        td_x = cx;
        td_y = baseline_y;
        content.show(Str(&entry.encode(&chunk.text)));
    }
    content.end_text();
}
