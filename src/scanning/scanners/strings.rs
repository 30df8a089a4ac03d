//! String templates and multiline strings.
//!
//! Single-line templates break at word boundaries: the candidates carry the
//! original spacing as content, and the printer closes the quote, appends
//! ` +`, and reopens at the continuation indent when one fires.
//! Interpolation entries are unbreakable atoms with a zero-width candidate
//! on each side.
//!
//! Triple-quoted strings are verbatim: their lines become leaves separated
//! by forced breaks inside a `MultilineString` block, which the printer
//! renders without indent or trailing-space stripping.

use crate::scanning::{NodeScanner, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

pub struct StringTemplateScanner;

impl NodeScanner for StringTemplateScanner {
    fn scan(&self, node: &NodeRef, _ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::begin(State::StringLiteral), Token::leaf("\"")];
        for child in &node.children {
            match child.kind {
                NodeKind::Interpolation => {
                    if !ends_with_candidate(&out) && !starts_opening_quote(&out) {
                        out.push(Token::whitespace(""));
                    }
                    out.push(Token::leaf(&child.text));
                }
                _ => {
                    if !ends_with_candidate(&out) && !starts_opening_quote(&out) {
                        // Boundary after an interpolation entry.
                        out.push(Token::whitespace(""));
                    }
                    push_words(&mut out, &child.text);
                }
            }
        }
        out.push(Token::leaf("\""));
        out.push(Token::End);
        Ok(out)
    }
}

fn ends_with_candidate(tokens: &[Token]) -> bool {
    matches!(tokens.last(), Some(Token::Whitespace { .. }))
}

fn starts_opening_quote(tokens: &[Token]) -> bool {
    tokens.len() == 2
}

/// Split literal text into word leaves and space-run candidates; the
/// candidate content is the original run so the inline rendering is exact.
fn push_words(out: &mut Vec<Token>, text: &str) {
    let mut rest = text;
    while !rest.is_empty() {
        let space_len = rest.chars().take_while(|c| *c == ' ').count();
        if space_len > 0 {
            let (run, tail) = rest.split_at(space_len);
            out.push(Token::whitespace(run));
            rest = tail;
            continue;
        }
        let word_len = rest
            .char_indices()
            .find(|(_, c)| *c == ' ')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (word, tail) = rest.split_at(word_len);
        out.push(Token::leaf(word));
        rest = tail;
    }
}

pub struct MultilineStringScanner;

impl NodeScanner for MultilineStringScanner {
    fn scan(&self, node: &NodeRef, _ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::begin(State::MultilineString)];
        for (i, line) in node.text.split('\n').enumerate() {
            if i > 0 {
                out.push(Token::forced_break());
            }
            out.push(Token::leaf(line.trim_end_matches('\r')));
        }
        out.push(Token::End);
        Ok(out)
    }
}
