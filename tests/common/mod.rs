#![allow(dead_code)]

use proptest::prelude::*;

use transcript_pdf::{DocumentNode, InlineRun};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Number of `/Type /Page` objects (not `/Type /Pages`).
pub fn page_count(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    let mut count = 0;
    let mut pos = 0;
    while let Some(at) = find(pdf, needle, pos) {
        let next = pdf.get(at + needle.len()).copied();
        if next != Some(b's') {
            count += 1;
        }
        pos = at + needle.len();
    }
    count
}

/// Inflate every zlib stream in the file, in object order. Streams that are
/// not zlib-compressed are skipped.
pub fn content_streams(pdf: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = find(pdf, b"stream\n", pos) {
        let data_start = start + b"stream\n".len();
        let Some(end) = find(pdf, b"\nendstream", data_start) else {
            break;
        };
        if let Ok(raw) = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[data_start..end]) {
            out.push(String::from_utf8_lossy(&raw).into_owned());
        }
        pos = end + b"\nendstream".len();
    }
    out
}

/// All page content concatenated.
pub fn page_text(pdf: &[u8]) -> String {
    content_streams(pdf).join("\n")
}

/// Literal strings shown with `Tj`, in drawing order.
pub fn shown_strings(pdf: &[u8]) -> Vec<String> {
    let text = page_text(pdf);
    text.lines()
        .filter_map(|l| l.strip_suffix(" Tj"))
        .filter_map(|l| l.strip_prefix('(').and_then(|s| s.strip_suffix(')')))
        .map(str::to_string)
        .collect()
}

/// A string shown with `Tj`, at its position in text space.
#[derive(Debug)]
pub struct Placed {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// `Tj` strings of each content stream with their positions. `Td` offsets
/// add up from the origin inside each `BT` .. `ET` block.
pub fn placed_strings(pdf: &[u8]) -> Vec<Vec<Placed>> {
    content_streams(pdf)
        .iter()
        .map(|stream| {
            let mut placed = Vec::new();
            let (mut x, mut y) = (0.0_f32, 0.0_f32);
            for line in stream.lines() {
                if line == "BT" {
                    (x, y) = (0.0, 0.0);
                } else if let Some(operands) = line.strip_suffix(" Td") {
                    let mut nums = operands.split_whitespace().map(|v| v.parse::<f32>());
                    if let (Some(Ok(dx)), Some(Ok(dy))) = (nums.next(), nums.next()) {
                        x += dx;
                        y += dy;
                    }
                } else if let Some(text) = line
                    .strip_suffix(" Tj")
                    .and_then(|l| l.strip_prefix('('))
                    .and_then(|l| l.strip_suffix(')'))
                {
                    placed.push(Placed {
                        x,
                        y,
                        text: text.to_string(),
                    });
                }
            }
            placed
        })
        .collect()
}

pub fn plain(s: &str) -> InlineRun {
    InlineRun::PlainText(s.to_string())
}

pub fn runs(s: &str) -> Vec<InlineRun> {
    vec![plain(s)]
}

/// Nodes after the leading title and its spacer.
pub fn body(nodes: &[DocumentNode]) -> &[DocumentNode] {
    assert!(
        matches!(nodes.first(), Some(DocumentNode::Title(_))),
        "document must start with a title: {nodes:?}"
    );
    assert!(
        matches!(nodes.get(1), Some(DocumentNode::Spacer(_))),
        "title must be followed by a spacer: {nodes:?}"
    );
    &nodes[2..]
}

const WORDS: &[&str] = &[
    "the", "meeting", "budget", "**review**", "*draft*", "`cargo`", "R&D", "quarterly",
    "team", "deadline", "<note>", "follow-up", "numbers", "snake_case", "Q3", "plan",
];

/// Space-separated words, some carrying inline markup.
pub fn sentence(max_words: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..=max_words).prop_map(|w| w.join(" "))
}

/// A line of any block shape, including blanks and fences.
pub fn any_line() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => Just(String::new()),
        1 => "[ \t]{1,4}",
        1 => sentence(4).prop_map(|s| format!("# {s}")),
        1 => sentence(4).prop_map(|s| format!("## {s}")),
        1 => sentence(6).prop_map(|s| format!("- {s}")),
        1 => (1u32..100, sentence(6)).prop_map(|(n, s)| format!("{n}. {s}")),
        1 => Just("```".to_string()),
        3 => sentence(30),
        1 => "[^\n\r]{0,40}",
    ]
}

/// Text made of `lines` joined with newlines.
pub fn any_text(lines: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(any_line(), lines).prop_map(|l| l.join("\n"))
}
