//! Statement lists and control flow.
//!
//! The two list scanners own vertical layout: forced breaks between
//! statements (blank lines collapse to one), raw whitespace ahead of
//! comments (the preprocessor decides whether it becomes a forced break),
//! and a wrapping block around every statement that does not bring its
//! own: markers at file level, the last forced break inside braces.

use crate::scanning::scanners::wraps_itself;
use crate::scanning::{node_pattern, NodePattern, NodeScanner, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

use super::last_significant;

/// Top-level file layout.
pub struct FileScanner;

impl NodeScanner for FileScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = Vec::new();
        let mut pending_ws = String::new();
        let mut first = true;
        for child in &node.children {
            if child.is_whitespace() {
                pending_ws.push_str(&child.text);
                continue;
            }
            if !first {
                push_separator(&mut out, &pending_ws, child);
            }
            pending_ws.clear();
            let wrap = !wraps_itself(child.kind);
            if wrap {
                out.push(Token::Marker);
            }
            out.extend(ctx.scan(child)?);
            if wrap {
                out.push(Token::BlockFromMarker);
            }
            first = false;
        }
        Ok(out)
    }
}

/// `{ … }` bodies (statement blocks and class bodies).
pub struct BlockScanner;

impl NodeScanner for BlockScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let inner = interior(node);
        if !inner.iter().any(|c| !c.is_whitespace()) {
            return Ok(vec![Token::leaf("{"), Token::leaf("}")]);
        }
        let mut out = vec![Token::leaf("{"), Token::begin(State::Code)];
        let mut pending_ws = String::new();
        let mut first = true;
        for child in inner {
            if child.is_whitespace() {
                pending_ws.push_str(&child.text);
                continue;
            }
            if first {
                if child.kind.is_comment() && !pending_ws.contains('\n') {
                    out.push(Token::leaf(" "));
                } else {
                    out.push(Token::forced_break());
                }
            } else {
                push_separator(&mut out, &pending_ws, child);
            }
            pending_ws.clear();
            out.extend(ctx.scan(child)?);
            if !wraps_itself(child.kind) {
                out.push(Token::BlockFromLastForcedBreak);
            }
            first = false;
        }
        out.push(Token::ClosingForcedBreak);
        out.push(Token::End);
        out.push(Token::leaf("}"));
        Ok(out)
    }
}

/// Children strictly between the braces.
fn interior(node: &NodeRef) -> &[NodeRef] {
    let children = &node.children[..];
    let start = children
        .iter()
        .position(|c| c.kind == NodeKind::LBrace)
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = children
        .iter()
        .rposition(|c| c.kind == NodeKind::RBrace)
        .unwrap_or(children.len());
    &children[start..end]
}

/// Separator ahead of a statement-list item. A comment on its own line
/// gets the original whitespace run (the preprocessor rewrites it into a
/// forced break); a trailing comment keeps a plain space, never a break
/// candidate, so it stays on its statement's line. Everything else gets a
/// forced break, a blank line surviving as `count == 2`.
fn push_separator(out: &mut Vec<Token>, pending_ws: &str, next: &NodeRef) {
    if next.kind.is_comment() {
        if pending_ws.contains('\n') {
            out.push(Token::whitespace(pending_ws));
        } else {
            out.push(Token::leaf(" "));
        }
        return;
    }
    let newlines = pending_ws.matches('\n').count();
    out.push(Token::ForcedBreak {
        count: if newlines >= 2 { 2 } else { 1 },
    });
}

pub struct IfScanner {
    pattern: NodePattern,
}

impl IfScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::IfKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("if"), Token::leaf(" ")]));
            condition(b);
            b.any_node();
            b.then_map_to_tokens(|ctx, nodes| branch_tokens(ctx, nodes));
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::ElseKw);
                b.any_node();
                b.then_map_to_tokens(|ctx, nodes| {
                    let mut out = vec![
                        Token::leaf(" "),
                        Token::leaf("else"),
                    ];
                    out.extend(branch_tokens(ctx, nodes)?);
                    Ok(out)
                });
            });
            b.end();
        });
        IfScanner { pattern }
    }
}

impl NodeScanner for IfScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct WhileScanner {
    pattern: NodePattern,
}

impl WhileScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::WhileKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("while"), Token::leaf(" ")]));
            condition(b);
            b.any_node();
            b.then_map_to_tokens(|ctx, nodes| branch_tokens(ctx, nodes));
            b.end();
        });
        WhileScanner { pattern }
    }
}

impl NodeScanner for WhileScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct ForScanner {
    pattern: NodePattern,
}

impl ForScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::ForKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("for"), Token::leaf(" ")]));
            b.node_of_type(NodeKind::LParen);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("("), Token::Marker]));
            b.node_of_type(NodeKind::Identifier);
            b.node_of_type(NodeKind::InKw);
            b.then_map_to_tokens(|_, nodes| {
                let name = nodes
                    .iter()
                    .find(|n| n.kind == NodeKind::Identifier)
                    .map(|n| n.text.clone())
                    .unwrap_or_default();
                Ok(vec![
                    Token::leaf(name),
                    Token::leaf(" "),
                    Token::leaf("in"),
                    Token::whitespace(" "),
                ])
            });
            b.any_node();
            b.then_map_to_tokens(|ctx, nodes| {
                let mut out = Vec::new();
                if let Some(iterable) = last_significant(nodes) {
                    out.extend(ctx.scan(iterable)?);
                }
                out.push(Token::closing_sync_break(0));
                out.push(Token::BlockFromMarker);
                Ok(out)
            });
            b.node_of_type(NodeKind::RParen);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf(")")]));
            b.any_node();
            b.then_map_to_tokens(|ctx, nodes| branch_tokens(ctx, nodes));
            b.end();
        });
        ForScanner { pattern }
    }
}

impl NodeScanner for ForScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct ReturnScanner {
    pattern: NodePattern,
}

impl ReturnScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::ReturnKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("return")]));
            b.zero_or_one(|b| {
                b.any_node();
                b.then_map_to_tokens(|ctx, nodes| {
                    // Never a break candidate: a value on the next line
                    // would reparse as a bare return.
                    let mut out = vec![Token::leaf(" ")];
                    if let Some(value) = last_significant(nodes) {
                        out.extend(ctx.scan(value)?);
                    }
                    Ok(out)
                });
            });
            b.end();
        });
        ReturnScanner { pattern }
    }
}

impl NodeScanner for ReturnScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

/// `( condition )` with the condition and a closing synchronized break
/// wrapped in a marker block: a long condition breaks after its operators
/// and puts `)` back on the base indent.
fn condition(b: &mut crate::scanning::PatternBuilder) {
    b.node_of_type(NodeKind::LParen);
    b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("("), Token::Marker]));
    b.any_node();
    b.then_map_to_tokens(|ctx, nodes| {
        let mut out = Vec::new();
        if let Some(cond) = last_significant(nodes) {
            out.extend(ctx.scan(cond)?);
        }
        out.push(Token::closing_sync_break(0));
        out.push(Token::BlockFromMarker);
        Ok(out)
    });
    b.node_of_type(NodeKind::RParen);
    b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf(")")]));
}

/// A branch body: `{ … }` blocks sit on the same line after a space;
/// single-statement branches likewise.
fn branch_tokens(ctx: &ScanContext<'_>, nodes: &[NodeRef]) -> Result<Vec<Token>, ScanError> {
    let mut out = vec![Token::leaf(" ")];
    if let Some(branch) = nodes
        .iter()
        .rev()
        .find(|n| !n.is_whitespace() && n.kind != NodeKind::ElseKw)
    {
        out.extend(ctx.scan(branch)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::TreeScanner;
    use kotfmt_syntax::parse;

    fn scan_source(source: &str) -> Vec<Token> {
        let tree = parse(source).expect("parses");
        TreeScanner::with_defaults()
            .scan_tree(&tree)
            .expect("scans")
    }

    #[test]
    fn blank_line_between_declarations_survives_once() {
        let tokens = scan_source("val a = 1\n\n\n\nval b = 2\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::ForcedBreak { count: 2 })));
        assert!(!tokens
            .iter()
            .any(|t| matches!(t, Token::ForcedBreak { count } if *count > 2)));
    }

    #[test]
    fn block_statements_wrap_from_last_forced_break() {
        let tokens = scan_source("fun f() {\n    return g()\n}\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::BlockFromLastForcedBreak)));
        assert!(tokens.iter().any(|t| matches!(t, Token::ClosingForcedBreak)));
    }

    #[test]
    fn empty_block_is_flat() {
        let tokens = scan_source("fun f() {\n}\n");
        let text: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Leaf(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert!(text.ends_with("{}"));
    }

    #[test]
    fn comment_separator_keeps_raw_whitespace() {
        let tokens = scan_source("val a = 1\n\n// note\nval b = 2\n");
        assert!(tokens.iter().any(
            |t| matches!(t, Token::Whitespace { content, .. } if content.contains('\n'))
        ));
    }

    #[test]
    fn if_condition_carries_marker_block() {
        let tokens = scan_source("fun f() {\n    if (a && b) {\n    }\n}\n");
        let markers = tokens.iter().filter(|t| matches!(t, Token::Marker)).count();
        let wraps = tokens
            .iter()
            .filter(|t| matches!(t, Token::BlockFromMarker))
            .count();
        assert_eq!(markers, wraps);
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::ClosingSynchronizedBreak { .. })));
    }
}
