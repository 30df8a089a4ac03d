//! Comments and documentation.
//!
//! KDoc bodies are stripped down to logical content here; the printer
//! re-renders them through the reflow rules. Plain comments stay verbatim:
//! line comments as a single leaf, block comments line by line, with the
//! ` * ` continuation alignment kept only when the source used it.

use crate::scanning::scanners::in_block;
use crate::scanning::{NodeScanner, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::NodeRef;

pub struct KDocScanner;

impl NodeScanner for KDocScanner {
    fn scan(&self, node: &NodeRef, _ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let content = strip_kdoc(&node.text);
        Ok(in_block(State::KDoc, vec![Token::KDocContent(content)]))
    }
}

/// `/** … */` → logical content: delimiters and leading ` * ` markers
/// removed, surrounding blank lines dropped.
fn strip_kdoc(raw: &str) -> String {
    let body = raw.strip_suffix("*/").unwrap_or(raw);
    let body = body
        .strip_prefix("/**")
        .or_else(|| body.strip_prefix("/*"))
        .unwrap_or(body);
    let body = body.trim_matches(|c| c == ' ' || c == '\t');
    let mut lines: Vec<String> = body
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_start();
            let without_star = trimmed.strip_prefix('*').unwrap_or(trimmed);
            without_star.strip_prefix(' ').unwrap_or(without_star).trim_end().to_string()
        })
        .collect();
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

pub struct EolCommentScanner;

impl NodeScanner for EolCommentScanner {
    fn scan(&self, node: &NodeRef, _ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        Ok(in_block(
            State::LineComment,
            vec![Token::leaf(node.text.trim_end())],
        ))
    }
}

pub struct BlockCommentScanner;

impl NodeScanner for BlockCommentScanner {
    fn scan(&self, node: &NodeRef, _ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let lines: Vec<&str> = node.text.split('\n').collect();
        if lines.len() == 1 {
            return Ok(in_block(
                State::BlockComment,
                vec![Token::leaf(lines[0].trim_end())],
            ));
        }
        let starred = lines[1..]
            .iter()
            .all(|line| line.trim_start().starts_with('*'));
        let mut tokens = vec![Token::leaf(lines[0].trim_end().to_string())];
        for line in &lines[1..] {
            tokens.push(Token::forced_break());
            if starred {
                // Realign the star column under the opener.
                tokens.push(Token::leaf(format!(" {}", line.trim())));
            } else {
                tokens.push(Token::leaf(line.trim_end().to_string()));
            }
        }
        let state = if starred {
            State::BlockComment
        } else {
            State::LongCommentContinuation
        };
        Ok(in_block(state, tokens))
    }
}
