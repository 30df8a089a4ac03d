//! Printer
//!
//! Consumes the preprocessed token stream and produces text. All lookahead
//! was resolved upstream, so the printer is a single forward pass over the
//! tokens with three pieces of mutable state: the current column, the frame
//! stack (one frame per open block), and the indent of the current line.
//!
//! A frame remembers the block's *base indent* (the indentation of the
//! line it was opened on) and whether the block already failed to fit when
//! it opened. Candidates and synchronized breaks consult those two flags;
//! once one break fires in a block, the rest of its depth-0 breaks fire
//! too.

use crate::kdoc;
use crate::tokens::{display_width, State, Token};

/// Layout knobs; the formatter facade fills these from its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterOptions {
    pub max_line_length: usize,
    pub standard_indent: usize,
    pub continuation_indent: usize,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        PrinterOptions {
            max_line_length: 100,
            standard_indent: 4,
            continuation_indent: 8,
        }
    }
}

pub struct Printer {
    options: PrinterOptions,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BreakKind {
    /// Plain whitespace candidate: statement continuation.
    Plain,
    /// Synchronized or forced: list items and statement bodies.
    Step,
    /// Closing: back to the block's base indent.
    Closing,
}

struct Frame {
    state: State,
    base: usize,
    exceeded: bool,
    broken: bool,
}

impl Printer {
    pub fn new(options: PrinterOptions) -> Self {
        Printer { options }
    }

    pub fn print(&self, tokens: &[Token]) -> String {
        let mut job = PrintJob {
            options: self.options,
            frames: Vec::new(),
            out: String::new(),
            column: 0,
            line_indent: 0,
        };
        job.run(tokens);
        job.out
    }
}

struct PrintJob {
    options: PrinterOptions,
    frames: Vec<Frame>,
    out: String,
    column: usize,
    line_indent: usize,
}

impl PrintJob {
    fn run(&mut self, tokens: &[Token]) {
        for token in tokens {
            match token {
                Token::Begin { state, length } => {
                    let exceeded = self.column + length > self.options.max_line_length;
                    self.frames.push(Frame {
                        state: *state,
                        base: self.line_indent,
                        exceeded,
                        broken: false,
                    });
                }
                Token::End => {
                    self.frames.pop();
                }
                Token::Leaf(text) => self.emit(text),
                Token::KDocContent(text) => self.emit_kdoc(text),
                Token::Whitespace { content, length } => self.candidate(content, *length),
                Token::SynchronizedBreak { spaces } => self.sync_break(*spaces, false),
                Token::ClosingSynchronizedBreak { spaces } => self.sync_break(*spaces, true),
                Token::ForcedBreak { count } => self.break_line(BreakKind::Step, *count),
                Token::ClosingForcedBreak => self.break_line(BreakKind::Closing, 1),
                // Directives never survive preprocessing; tolerate them.
                Token::Marker | Token::BlockFromMarker | Token::BlockFromLastForcedBreak => {}
            }
        }
    }

    fn state(&self) -> State {
        self.frames.last().map(|f| f.state).unwrap_or(State::Code)
    }

    /// Whether the enclosing block is committed to breaking.
    fn block_breaks(&self) -> bool {
        self.frames
            .last()
            .map(|f| f.exceeded || f.broken)
            .unwrap_or(false)
    }

    fn candidate(&mut self, content: &str, length: usize) {
        if self.state() == State::PackageImport {
            self.emit(content);
            return;
        }
        // String literals fill: only the candidate that actually overflows
        // breaks, and the threshold reserves room for the `" +` splice.
        // Code blocks break consistently once the block is committed to
        // breaking.
        let in_string = self.state() == State::StringLiteral;
        let limit = if in_string {
            self.options.max_line_length.saturating_sub(3)
        } else {
            self.options.max_line_length
        };
        if (!in_string && self.block_breaks()) || self.column + length > limit {
            if self.state() == State::StringLiteral {
                // Keep the spacing inside the closing quote, splice the
                // concatenation, reopen on the continuation line.
                self.emit(content);
                self.emit("\" +");
                self.break_line(BreakKind::Plain, 1);
                self.emit("\"");
            } else {
                self.break_line(BreakKind::Plain, 1);
            }
        } else {
            self.emit(content);
        }
    }

    fn sync_break(&mut self, spaces: usize, closing: bool) {
        if self.state() == State::PackageImport {
            self.emit(&" ".repeat(spaces));
            return;
        }
        if self.block_breaks() {
            let kind = if closing {
                BreakKind::Closing
            } else {
                BreakKind::Step
            };
            self.break_line(kind, 1);
        } else {
            self.emit(&" ".repeat(spaces));
        }
    }

    fn break_line(&mut self, kind: BreakKind, count: u8) {
        let state = self.state();
        if let Some(frame) = self.frames.last_mut() {
            frame.broken = true;
        }
        if state == State::MultilineString {
            // Verbatim content: bare newlines, no indent, no stripping.
            for _ in 0..count {
                self.out.push('\n');
            }
            self.column = 0;
            self.line_indent = 0;
            return;
        }
        for _ in 0..count {
            self.strip_trailing_spaces();
            self.out.push('\n');
        }
        let indent = self.break_indent(state, kind);
        for _ in 0..indent {
            self.out.push(' ');
        }
        self.column = indent;
        self.line_indent = indent;
    }

    fn break_indent(&self, state: State, kind: BreakKind) -> usize {
        let frame = match self.frames.last() {
            Some(frame) => frame,
            None => return 0,
        };
        match state {
            State::Code => match kind {
                BreakKind::Plain => frame.base + self.options.continuation_indent,
                BreakKind::Step => frame.base + self.options.standard_indent,
                BreakKind::Closing => frame.base,
            },
            State::StringLiteral => frame.base + self.options.continuation_indent,
            State::MultilineString => 0,
            State::PackageImport
            | State::LineComment
            | State::BlockComment
            | State::KDoc
            | State::LongCommentContinuation => frame.base,
        }
    }

    fn emit(&mut self, text: &str) {
        self.out.push_str(text);
        self.column += display_width(text);
    }

    fn emit_kdoc(&mut self, text: &str) {
        let rendered = kdoc::render(text, self.line_indent, self.options.max_line_length);
        match rendered.rsplit_once('\n') {
            Some((_, last)) => {
                self.out.push_str(&rendered);
                self.column = display_width(last);
            }
            None => self.emit(&rendered),
        }
    }

    fn strip_trailing_spaces(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;

    fn print_with(max: usize, tokens: Vec<Token>) -> String {
        let options = PrinterOptions {
            max_line_length: max,
            ..PrinterOptions::default()
        };
        Printer::new(options).print(&tokens)
    }

    #[test]
    fn fitting_candidate_stays_inline() {
        let text = print_with(
            40,
            vec![
                Token::Begin {
                    state: State::Code,
                    length: 7,
                },
                Token::leaf("a"),
                Token::Whitespace {
                    content: " ".into(),
                    length: 2,
                },
                Token::leaf("b"),
                Token::End,
            ],
        );
        assert_eq!(text, "a b");
    }

    #[test]
    fn oversized_block_breaks_candidates_consistently() {
        let text = print_with(
            4,
            vec![
                Token::Begin {
                    state: State::Code,
                    length: 20,
                },
                Token::leaf("aaa"),
                Token::Whitespace {
                    content: " ".into(),
                    length: 4,
                },
                Token::leaf("bbb"),
                Token::End,
            ],
        );
        assert_eq!(text, "aaa\n        bbb");
    }

    #[test]
    fn sync_breaks_fire_together() {
        let tokens = vec![
            Token::Begin {
                state: State::Code,
                length: 30,
            },
            Token::leaf("("),
            Token::SynchronizedBreak { spaces: 0 },
            Token::leaf("first"),
            Token::leaf(","),
            Token::SynchronizedBreak { spaces: 1 },
            Token::leaf("second"),
            Token::ClosingSynchronizedBreak { spaces: 0 },
            Token::leaf(")"),
            Token::End,
        ];
        assert_eq!(
            print_with(10, tokens.clone()),
            "(\n    first,\n    second\n)"
        );
        assert_eq!(print_with(80, tokens), "(first, second)");
    }

    #[test]
    fn forced_break_indents_one_step() {
        let text = print_with(
            80,
            vec![
                Token::leaf("{"),
                Token::Begin {
                    state: State::Code,
                    length: 0,
                },
                Token::ForcedBreak { count: 1 },
                Token::leaf("body"),
                Token::ClosingForcedBreak,
                Token::leaf("}"),
                Token::End,
            ],
        );
        assert_eq!(text, "{\n    body\n}");
    }

    #[test]
    fn blank_line_break_strips_trailing_spaces() {
        let text = print_with(
            80,
            vec![
                Token::leaf("a"),
                Token::leaf("  "),
                Token::ForcedBreak { count: 2 },
                Token::leaf("b"),
            ],
        );
        assert_eq!(text, "a\n\nb");
    }

    #[test]
    fn top_level_breaks_have_no_indent() {
        let text = print_with(
            80,
            vec![
                Token::leaf("first"),
                Token::ForcedBreak { count: 1 },
                Token::leaf("second"),
            ],
        );
        assert_eq!(text, "first\nsecond");
    }

    #[test]
    fn string_literal_reopens_on_break() {
        let text = print_with(
            12,
            vec![
                Token::Begin {
                    state: State::StringLiteral,
                    length: 30,
                },
                Token::leaf("\""),
                Token::leaf("hello"),
                Token::Whitespace {
                    content: " ".into(),
                    length: 7,
                },
                Token::leaf("world"),
                Token::leaf("\""),
                Token::End,
            ],
        );
        assert_eq!(text, "\"hello \" +\n        \"world\"");
    }

    #[test]
    fn package_import_never_breaks() {
        let text = print_with(
            10,
            vec![
                Token::Begin {
                    state: State::PackageImport,
                    length: 30,
                },
                Token::leaf("package"),
                Token::leaf(" "),
                Token::leaf("org.example.very.long.name"),
                Token::End,
            ],
        );
        assert_eq!(text, "package org.example.very.long.name");
    }

    #[test]
    fn multiline_string_lines_stay_verbatim() {
        let text = print_with(
            10,
            vec![
                Token::Begin {
                    state: State::MultilineString,
                    length: 0,
                },
                Token::leaf("\"\"\"keep   "),
                Token::ForcedBreak { count: 1 },
                Token::leaf("  this\"\"\""),
                Token::End,
            ],
        );
        assert_eq!(text, "\"\"\"keep   \n  this\"\"\"");
    }
}
