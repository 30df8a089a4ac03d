//! KDoc reflow
//!
//! Renders the logical content of a documentation comment (delimiters and
//! ` * ` markers already stripped by the scanner) back into `/** … */`
//! form at a given indent and line limit.
//!
//! A comment that is one logical line and fits inline stays on one line.
//! Everything else becomes the block form: prose paragraphs reflow at word
//! boundaries, `@tag` paragraphs wrap with a four-space hanging indent,
//! list items keep their own lines, fenced code passes through untouched,
//! and a word with no internal whitespace is never split even when it
//! overflows.

use crate::tokens::display_width;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@[A-Za-z]+").expect("tag pattern"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([*\-]|\d+\.)\s").expect("list pattern"));

/// Render `content` as a KDoc comment starting at `indent` columns.
pub fn render(content: &str, indent: usize, max_line_length: usize) -> String {
    if content.is_empty() {
        return "/** */".to_string();
    }
    if !content.contains('\n')
        && !TAG_LINE.is_match(content)
        && indent + display_width(content) + 7 <= max_line_length
    {
        return format!("/** {} */", content);
    }

    let width = max_line_length.saturating_sub(indent + 3).max(1);
    let pad = " ".repeat(indent);
    let mut out = String::from("/**\n");
    for line in layout(content, width) {
        if line.is_empty() {
            out.push_str(&pad);
            out.push_str(" *\n");
        } else {
            out.push_str(&pad);
            out.push_str(" * ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&pad);
    out.push_str(" */");
    out
}

struct Paragraph {
    words: Vec<String>,
    hanging_indent: usize,
}

/// Break content into output lines (without the ` * ` prefix).
fn layout(content: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut paragraph: Option<Paragraph> = None;
    let mut in_fence = false;

    for raw_line in content.split('\n') {
        let line = raw_line.trim_end();
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            flush(&mut paragraph, width, &mut lines);
            lines.push(line.to_string());
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.to_string());
            continue;
        }
        if trimmed.is_empty() {
            flush(&mut paragraph, width, &mut lines);
            lines.push(String::new());
            continue;
        }
        if TAG_LINE.is_match(trimmed) {
            flush(&mut paragraph, width, &mut lines);
            paragraph = Some(Paragraph {
                words: words_of(trimmed),
                hanging_indent: 4,
            });
            continue;
        }
        if LIST_ITEM.is_match(trimmed) {
            flush(&mut paragraph, width, &mut lines);
            let words = words_of(trimmed);
            let marker_width = words.first().map(|w| display_width(w) + 1).unwrap_or(2);
            paragraph = Some(Paragraph {
                words,
                hanging_indent: marker_width,
            });
            continue;
        }
        match paragraph.as_mut() {
            Some(para) => para.words.extend(words_of(trimmed)),
            None => {
                paragraph = Some(Paragraph {
                    words: words_of(trimmed),
                    hanging_indent: 0,
                })
            }
        }
    }
    flush(&mut paragraph, width, &mut lines);
    lines
}

fn words_of(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Wrap a paragraph at word boundaries. Continuation lines carry the
/// paragraph's hanging indent; a word longer than the width goes out on
/// its own line unbroken.
fn flush(paragraph: &mut Option<Paragraph>, width: usize, lines: &mut Vec<String>) {
    let Some(para) = paragraph.take() else {
        return;
    };
    let hang = " ".repeat(para.hanging_indent);
    let mut line = String::new();
    for word in para.words {
        if line.is_empty() {
            line = word;
        } else if display_width(&line) + 1 + display_width(&word) <= width {
            line.push(' ');
            line.push_str(&word);
        } else {
            lines.push(std::mem::take(&mut line));
            line = format!("{}{}", hang, word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_comment_stays_single_line() {
        assert_eq!(render("Does the thing.", 0, 80), "/** Does the thing. */");
    }

    #[test]
    fn overflowing_single_line_expands() {
        let text = "long text that would overflow the limit for sure";
        let rendered = render(text, 0, 40);
        assert!(rendered.starts_with("/**\n"));
        assert!(rendered.ends_with(" */"));
        for line in rendered.lines().skip(1) {
            assert!(line.starts_with(" *"));
            assert!(display_width(line) <= 40, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn indent_counts_against_the_limit() {
        let text = "words to be wrapped at a narrow width for the test";
        let rendered = render(text, 4, 30);
        for line in rendered.lines().skip(1) {
            assert!(line.starts_with("     *") || line.starts_with("    "), "{:?}", line);
        }
    }

    #[test]
    fn paragraph_break_preserved() {
        let rendered = render("First.\n\nSecond.", 0, 80);
        assert_eq!(rendered, "/**\n * First.\n *\n * Second.\n */");
    }

    #[test]
    fn tag_lines_start_paragraphs_with_hanging_continuation() {
        let content = "@param name a description that is long enough to need wrapping here";
        let rendered = render(content, 0, 40);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].starts_with(" * @param name"));
        assert!(lines[2].starts_with(" *     "), "continuation indented: {:?}", lines[2]);
    }

    #[test]
    fn tag_comment_never_single_line() {
        let rendered = render("@return the answer", 0, 80);
        assert!(rendered.starts_with("/**\n"));
    }

    #[test]
    fn fenced_code_passes_verbatim() {
        let content = "Example:\n```\nval x =    1\n```";
        let rendered = render(content, 0, 20);
        assert!(rendered.contains(" * val x =    1"));
    }

    #[test]
    fn unbreakable_word_overflows_without_split() {
        let url = "https://example.invalid/a/very/long/path/that/never/fits";
        let rendered = render(url, 0, 30);
        assert!(rendered.contains(url));
    }

    #[test]
    fn list_items_keep_their_lines() {
        let content = "Options:\n- first choice\n- second choice";
        let rendered = render(content, 0, 80);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], " * - first choice");
        assert_eq!(lines[3], " * - second choice");
    }
}
