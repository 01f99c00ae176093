use crate::model::InlineRun;

/// Split one line of text into inline runs.
///
/// `&` is escaped to `&amp;` before any markup is recognized, so the escape
/// never touches characters produced by the translation itself. Markers that
/// do not form a balanced span stay in the text as literals.
pub fn translate(text: &str) -> Vec<InlineRun> {
    let escaped = text.replace('&', "&amp;");
    let chars: Vec<char> = escaped.chars().collect();

    let mut runs: Vec<InlineRun> = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        let matched = match chars[i] {
            '*' | '_' => match_bold(&chars, i).or_else(|| match_italic(&chars, i)),
            '`' => match_code(&chars, i),
            _ => None,
        };
        match matched {
            Some((run, next)) => {
                if !plain.is_empty() {
                    runs.push(InlineRun::PlainText(std::mem::take(&mut plain)));
                }
                runs.push(run);
                i = next;
            }
            None => {
                plain.push(chars[i]);
                i += 1;
            }
        }
    }

    if !plain.is_empty() {
        runs.push(InlineRun::PlainText(plain));
    }
    runs
}

fn is_word_char(c: Option<&char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric())
}

/// Emphasis content may not start or end with whitespace (`2 * 3 * 4` stays literal).
fn valid_content(content: &[char]) -> bool {
    match (content.first(), content.last()) {
        (Some(first), Some(last)) => !first.is_whitespace() && !last.is_whitespace(),
        _ => false,
    }
}

/// Underscore markers only count at word boundaries, so `snake_case_name` is plain text.
fn underscore_boundary_ok(chars: &[char], open: usize, close_end: usize) -> bool {
    let before = open.checked_sub(1).and_then(|p| chars.get(p));
    !is_word_char(before) && !is_word_char(chars.get(close_end))
}

fn match_bold(chars: &[char], i: usize) -> Option<(InlineRun, usize)> {
    let m = chars[i];
    if chars.get(i + 1) != Some(&m) {
        return None;
    }
    let start = i + 2;
    let mut j = start;
    while j + 1 < chars.len() {
        if chars[j] == m && chars[j + 1] == m {
            let content = &chars[start..j];
            if valid_content(content) && (m != '_' || underscore_boundary_ok(chars, i, j + 2)) {
                return Some((InlineRun::Bold(content.iter().collect()), j + 2));
            }
        }
        j += 1;
    }
    None
}

fn match_italic(chars: &[char], i: usize) -> Option<(InlineRun, usize)> {
    let m = chars[i];
    let prev = i.checked_sub(1).map(|p| chars[p]);
    if prev == Some(m) || chars.get(i + 1) == Some(&m) {
        return None;
    }
    let start = i + 1;
    for j in start..chars.len() {
        if chars[j] != m || chars[j - 1] == m || chars.get(j + 1) == Some(&m) {
            continue;
        }
        let content = &chars[start..j];
        if valid_content(content) && (m != '_' || underscore_boundary_ok(chars, i, j + 1)) {
            return Some((InlineRun::Italic(content.iter().collect()), j + 1));
        }
    }
    None
}

fn match_code(chars: &[char], i: usize) -> Option<(InlineRun, usize)> {
    let start = i + 1;
    let close = chars[start..].iter().position(|&c| c == '`')? + start;
    if close == start {
        return None;
    }
    Some((InlineRun::Code(chars[start..close].iter().collect()), close + 1))
}
