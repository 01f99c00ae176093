mod common;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use common::{any_line, body, plain, runs, sentence};
use transcript_pdf::markdown::{
    BLANK_SPACER, PARAGRAPH_SPACER, TITLE_SPACER, assemble, classify, classify_text, parse,
    translate,
};
use transcript_pdf::{ClassifiedLine, DocumentNode, InlineRun};

#[test]
fn heading_then_paragraph_with_bold() {
    let nodes = parse("Notes", "# Title\n\nHello **world**.");
    assert_eq!(
        nodes,
        vec![
            DocumentNode::Title(runs("Notes")),
            DocumentNode::Spacer(TITLE_SPACER),
            DocumentNode::Heading(1, runs("Title")),
            DocumentNode::Spacer(BLANK_SPACER),
            DocumentNode::Paragraph(vec![
                plain("Hello "),
                InlineRun::Bold("world".into()),
                plain("."),
            ]),
            DocumentNode::Spacer(PARAGRAPH_SPACER),
        ]
    );
}

#[test]
fn list_type_switch_flushes_the_pending_list() {
    let nodes = parse("T", "- a\n- b\n1. c");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::BulletList(vec![runs("a"), runs("b")]),
            DocumentNode::NumberedList(vec![runs("c")]),
        ]
    );
}

#[test]
fn numbered_then_bullet_switch_is_symmetric() {
    let nodes = parse("T", "1. one\n2. two\n* three");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::NumberedList(vec![runs("one"), runs("two")]),
            DocumentNode::BulletList(vec![runs("three")]),
        ]
    );
}

#[test]
fn unterminated_fence_flushes_at_end_of_input() {
    let nodes = parse("T", "```\ncode line\n");
    assert_eq!(
        body(&nodes),
        &[DocumentNode::CodeBlock(vec!["code line".into()])]
    );
}

#[test]
fn empty_input_is_title_and_spacer_only() {
    let nodes = parse("Only a title", "");
    assert_eq!(
        nodes,
        vec![
            DocumentNode::Title(runs("Only a title")),
            DocumentNode::Spacer(TITLE_SPACER),
        ]
    );
}

#[test]
fn fence_content_is_verbatim() {
    let text = "```\n# not a heading\n- not a bullet\n  **not bold** & raw\n```";
    let classified = classify_text(text);
    assert_eq!(
        classified,
        vec![
            ClassifiedLine::CodeFenceMarker,
            ClassifiedLine::CodeLine("# not a heading".into()),
            ClassifiedLine::CodeLine("- not a bullet".into()),
            ClassifiedLine::CodeLine("  **not bold** & raw".into()),
            ClassifiedLine::CodeFenceMarker,
        ]
    );
    let nodes = assemble("T", &classified);
    assert_eq!(
        body(&nodes),
        &[DocumentNode::CodeBlock(vec![
            "# not a heading".into(),
            "- not a bullet".into(),
            "  **not bold** & raw".into(),
        ])]
    );
}

#[test]
fn indented_fence_with_language_tag_still_toggles() {
    let classified = classify_text("  ```rust\nfn main() {}\n```");
    assert_eq!(
        classified,
        vec![
            ClassifiedLine::CodeFenceMarker,
            ClassifiedLine::CodeLine("fn main() {}".into()),
            ClassifiedLine::CodeFenceMarker,
        ]
    );
}

#[test]
fn adjacent_fences_emit_nothing() {
    let nodes = parse("T", "```\n```\nafter");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::Paragraph(runs("after")),
            DocumentNode::Spacer(PARAGRAPH_SPACER),
        ]
    );
}

#[test]
fn opening_fence_flushes_pending_list() {
    let nodes = parse("T", "- a\n```\nx\n```");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::BulletList(vec![runs("a")]),
            DocumentNode::CodeBlock(vec!["x".into()]),
        ]
    );
}

#[test]
fn blank_line_flushes_list_without_a_spacer() {
    let nodes = parse("T", "- a\n\n- b");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::BulletList(vec![runs("a")]),
            DocumentNode::BulletList(vec![runs("b")]),
        ]
    );
}

#[test]
fn heading_and_paragraph_flush_lists() {
    let nodes = parse("T", "- a\n## Next\n1. b\nplain text");
    assert_eq!(
        body(&nodes),
        &[
            DocumentNode::BulletList(vec![runs("a")]),
            DocumentNode::Heading(2, runs("Next")),
            DocumentNode::NumberedList(vec![runs("b")]),
            DocumentNode::Paragraph(runs("plain text")),
            DocumentNode::Spacer(PARAGRAPH_SPACER),
        ]
    );
}

#[test]
fn heading_markers_need_exactly_one_to_three_hashes_and_a_space() {
    let classified = classify(["# one", "## two", "### three", "#### four", "#nospace", "###"]);
    assert_eq!(
        classified,
        vec![
            ClassifiedLine::Heading(1, "one".into()),
            ClassifiedLine::Heading(2, "two".into()),
            ClassifiedLine::Heading(3, "three".into()),
            ClassifiedLine::Paragraph("#### four".into()),
            ClassifiedLine::Paragraph("#nospace".into()),
            ClassifiedLine::Paragraph("###".into()),
        ]
    );
}

#[test]
fn list_item_shapes() {
    let classified = classify([
        "- dash",
        "* star",
        "  -   padded  ",
        "12. twelve",
        "3.",
        "**bold** start",
        "---",
        "-",
        "1.5 percent",
        "2024.report",
        "-item",
    ]);
    assert_eq!(
        classified,
        vec![
            ClassifiedLine::BulletItem("dash".into()),
            ClassifiedLine::BulletItem("star".into()),
            ClassifiedLine::BulletItem("padded".into()),
            ClassifiedLine::NumberedItem("twelve".into()),
            ClassifiedLine::NumberedItem("".into()),
            ClassifiedLine::Paragraph("**bold** start".into()),
            ClassifiedLine::Paragraph("---".into()),
            ClassifiedLine::Paragraph("-".into()),
            ClassifiedLine::Paragraph("1.5 percent".into()),
            ClassifiedLine::Paragraph("2024.report".into()),
            ClassifiedLine::Paragraph("-item".into()),
        ]
    );
}

#[test]
fn paragraph_keeps_the_raw_line() {
    let classified = classify_text("   indented text  ");
    assert_eq!(
        classified,
        vec![ClassifiedLine::Paragraph("   indented text  ".into())]
    );
}

proptest! {
    #[test]
    fn classify_emits_one_entry_per_line(lines in prop::collection::vec(any_line(), 0..60)) {
        let text = lines.join("\n");
        prop_assert_eq!(classify_text(&text).len(), text.lines().count());
        prop_assert_eq!(classify(lines.iter().map(String::as_str)).len(), lines.len());
    }

    #[test]
    fn consecutive_list_lines_collapse_into_one_node(
        items in prop::collection::vec(sentence(8), 1..25),
        numbered in any::<bool>(),
    ) {
        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, words)| {
                if numbered {
                    format!("{}. {words}", i + 1)
                } else {
                    format!("- {words}")
                }
            })
            .collect();
        let nodes = parse("T", &lines.join("\n"));
        let rest = body(&nodes);
        prop_assert_eq!(rest.len(), 1, "expected a single list node: {:?}", rest);
        let count = match (&rest[0], numbered) {
            (DocumentNode::NumberedList(list), true) => list.len(),
            (DocumentNode::BulletList(list), false) => list.len(),
            (other, _) => return Err(TestCaseError::fail(format!("unexpected node {other:?}"))),
        };
        prop_assert_eq!(count, items.len());
    }
}

#[test]
fn title_is_translated() {
    let nodes = parse("Q&A: **draft**", "");
    assert_eq!(
        nodes[0],
        DocumentNode::Title(vec![plain("Q&amp;A: "), InlineRun::Bold("draft".into())])
    );
}

#[test]
fn translate_bold_italic_and_code() {
    assert_eq!(
        translate("**bold** and *it* or `code`"),
        vec![
            InlineRun::Bold("bold".into()),
            plain(" and "),
            InlineRun::Italic("it".into()),
            plain(" or "),
            InlineRun::Code("code".into()),
        ]
    );
    assert_eq!(translate("__b__ _i_"), vec![
        InlineRun::Bold("b".into()),
        plain(" "),
        InlineRun::Italic("i".into()),
    ]);
}

#[test]
fn translate_code_contents_are_not_reprocessed() {
    assert_eq!(translate("`**x**`"), vec![InlineRun::Code("**x**".into())]);
}

#[test]
fn translate_escapes_ampersand_only() {
    assert_eq!(translate("R&D <b>"), runs("R&amp;D <b>"));
    assert_eq!(
        translate("`a & b`"),
        vec![InlineRun::Code("a &amp; b".into())]
    );
}

#[test]
fn translate_leaves_unbalanced_markers_literal() {
    assert_eq!(translate("a lone * star"), runs("a lone * star"));
    assert_eq!(translate("2 * 3 * 4"), runs("2 * 3 * 4"));
    assert_eq!(translate("**unclosed"), runs("**unclosed"));
    assert_eq!(translate("`tick"), runs("`tick"));
    assert_eq!(translate("snake_case_name"), runs("snake_case_name"));
    assert_eq!(translate(""), Vec::<InlineRun>::new());
}
