//! Formatting token IR
//!
//! The intermediate representation between the tree scanners and the
//! printer. Scanners emit these tokens in document order; the preprocessor
//! fills in the length annotations (`Whitespace::length`, `Begin::length`)
//! and rewrites the marker directives; the printer consumes the annotated
//! stream and never looks back.
//!
//! Width here always means *display* width (what a terminal column counts),
//! not bytes or chars.

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Display width of a piece of output text.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Formatting state carried by a [`Token::Begin`].
///
/// The state decides three things for everything inside the block: the
/// indent increment applied when a break is taken, whether embedded
/// newlines promote synchronized breaks to forced ones, and the prefix (if
/// any) put on continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    Code,
    StringLiteral,
    MultilineString,
    LineComment,
    BlockComment,
    KDoc,
    PackageImport,
    LongCommentContinuation,
}

impl State {
    /// Comment-flavored states: a newline-bearing whitespace flushed right
    /// before one of these becomes a forced break (the comment keeps its
    /// own line).
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            State::LineComment
                | State::BlockComment
                | State::KDoc
                | State::LongCommentContinuation
        )
    }

    /// Whether depth-0 synchronized breaks inside a block of this state are
    /// promoted to forced breaks when the block contains embedded newlines.
    /// Multiline strings are verbatim content and never rewritten.
    pub fn promotes_breaks(&self) -> bool {
        !matches!(self, State::MultilineString)
    }
}

/// One token of the formatting stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    /// Literal output.
    Leaf(String),
    /// A candidate break point. `content` is emitted verbatim when the
    /// break is not taken; `length` (filled in by the preprocessor) covers
    /// the content plus the non-breaking run that follows it.
    Whitespace { content: String, length: usize },
    /// Opens a block. `length` (filled in by the preprocessor) is the
    /// block's flat width.
    Begin { state: State, length: usize },
    /// Closes the nearest enclosing `Begin`.
    End,
    /// Unconditional newline(s); `count == 2` produces a blank line.
    ForcedBreak { count: u8 },
    /// Unconditional newline that returns to the block's base indent,
    /// used before a closing delimiter.
    ClosingForcedBreak,
    /// Breaks iff any break at the same depth in the same block breaks;
    /// otherwise prints `spaces` spaces.
    SynchronizedBreak { spaces: usize },
    /// Synchronized break that returns to the block's base indent.
    ClosingSynchronizedBreak { spaces: usize },
    /// Position placeholder consumed by [`Token::BlockFromMarker`].
    Marker,
    /// Preprocessor directive: wrap the current block's tokens since the
    /// most recent marker in a synthetic `Begin(Code)…End`.
    BlockFromMarker,
    /// Same, keyed on the last depth-0 forced break of the current block.
    BlockFromLastForcedBreak,
    /// Opaque documentation content, possibly spanning lines; rendered by
    /// the KDoc reflow rules.
    KDocContent(String),
}

impl Token {
    pub fn leaf(text: impl Into<String>) -> Token {
        Token::Leaf(text.into())
    }

    /// A break candidate with unresolved length.
    pub fn whitespace(content: impl Into<String>) -> Token {
        Token::Whitespace {
            content: content.into(),
            length: 0,
        }
    }

    /// A block opener with unresolved length.
    pub fn begin(state: State) -> Token {
        Token::Begin { state, length: 0 }
    }

    pub fn sync_break(spaces: usize) -> Token {
        Token::SynchronizedBreak { spaces }
    }

    pub fn closing_sync_break(spaces: usize) -> Token {
        Token::ClosingSynchronizedBreak { spaces }
    }

    pub fn forced_break() -> Token {
        Token::ForcedBreak { count: 1 }
    }

    pub fn blank_line() -> Token {
        Token::ForcedBreak { count: 2 }
    }

    /// Contribution of this token to the flat width of its block.
    ///
    /// `Begin` counts its whole annotated length (callers skip the nested
    /// span); whitespace counts its inline content; synchronized breaks
    /// count the spaces they print when not firing; forced breaks and
    /// markers count nothing.
    pub fn width(&self) -> usize {
        match self {
            Token::Leaf(text) => display_width(text),
            Token::Whitespace { content, .. } => display_width(content),
            Token::Begin { length, .. } => *length,
            Token::SynchronizedBreak { spaces }
            | Token::ClosingSynchronizedBreak { spaces } => *spaces,
            Token::KDocContent(text) => {
                text.lines().map(display_width).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn is_forced_break(&self) -> bool {
        matches!(
            self,
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak
        )
    }

    pub fn is_sync_break(&self) -> bool {
        matches!(
            self,
            Token::SynchronizedBreak { .. } | Token::ClosingSynchronizedBreak { .. }
        )
    }
}
