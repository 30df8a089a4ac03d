//! Expressions: call/selector chains, binary operator runs, argument
//! lists, unary and parenthesized expressions.
//!
//! Chains and operator runs are flattened into a single block by walking
//! the left spine of the parse tree, so all their candidates break
//! consistently: an overflowing selector chain breaks before every `.`, an
//! overflowing condition after every operator of the run.

use crate::scanning::scanners::last_significant;
use crate::scanning::{node_pattern, NodePattern, NodeScanner, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

/// Call expressions and `.`/`?.` selector chains, flattened.
pub struct ChainScanner;

impl ChainScanner {
    fn emit(
        &self,
        node: &NodeRef,
        ctx: &ScanContext<'_>,
        out: &mut Vec<Token>,
    ) -> Result<(), ScanError> {
        match node.kind {
            NodeKind::Call => {
                self.emit(&node.children[0], ctx, out)?;
                out.extend(ctx.scan(&node.children[1])?);
            }
            NodeKind::DotQualified | NodeKind::SafeAccess => {
                self.emit(&node.children[0], ctx, out)?;
                // Zero-width candidate ahead of the selector.
                out.push(Token::whitespace(""));
                out.push(Token::leaf(format!(
                    "{}{}",
                    node.children[1].text, node.children[2].text
                )));
            }
            _ => out.extend(ctx.scan(node)?),
        }
        Ok(())
    }
}

impl NodeScanner for ChainScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::begin(State::Code)];
        self.emit(node, ctx, &mut out)?;
        out.push(Token::End);
        Ok(out)
    }
}

/// Binary operator runs, flattened along the left spine; the break
/// candidate sits after each operator.
pub struct BinaryScanner;

impl BinaryScanner {
    fn emit(
        &self,
        node: &NodeRef,
        ctx: &ScanContext<'_>,
        out: &mut Vec<Token>,
    ) -> Result<(), ScanError> {
        if node.kind == NodeKind::Binary {
            self.emit(&node.children[0], ctx, out)?;
            out.push(Token::leaf(" "));
            out.push(Token::leaf(&node.children[1].text));
            out.push(Token::whitespace(" "));
            out.extend(ctx.scan(&node.children[2])?);
        } else {
            out.extend(ctx.scan(node)?);
        }
        Ok(())
    }
}

impl NodeScanner for BinaryScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::begin(State::Code)];
        self.emit(node, ctx, &mut out)?;
        out.push(Token::End);
        Ok(out)
    }
}

/// Call argument lists, the synchronized-break layout of parameter lists.
pub struct ArgumentListScanner {
    pattern: NodePattern,
}

impl ArgumentListScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::LParen);
            b.then_map_to_tokens(|_, _| {
                Ok(vec![Token::begin(State::Code), Token::leaf("(")])
            });
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::Argument);
                b.then_map_to_tokens(|ctx, nodes| {
                    let mut out = vec![Token::sync_break(0)];
                    if let Some(argument) = last_significant(nodes) {
                        out.extend(ctx.scan(argument)?);
                    }
                    Ok(out)
                });
                b.zero_or_more(|b| {
                    b.node_of_type(NodeKind::Comma);
                    b.node_of_type(NodeKind::Argument);
                    b.then_map_to_tokens(|ctx, nodes| {
                        let mut out = vec![Token::leaf(","), Token::sync_break(1)];
                        if let Some(argument) = last_significant(nodes) {
                            out.extend(ctx.scan(argument)?);
                        }
                        Ok(out)
                    });
                });
                b.then_map_to_tokens(|_, _| Ok(vec![Token::closing_sync_break(0)]));
            });
            b.node_of_type(NodeKind::RParen);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf(")"), Token::End]));
            b.end();
        });
        ArgumentListScanner { pattern }
    }
}

impl NodeScanner for ArgumentListScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

/// Unary prefix: `!x`, `-x`.
pub struct UnaryScanner;

impl NodeScanner for UnaryScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::leaf(&node.children[0].text)];
        out.extend(ctx.scan(&node.children[1])?);
        Ok(out)
    }
}

/// Parenthesized sub-expression, reproduced inline.
pub struct ParenScanner;

impl NodeScanner for ParenScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = vec![Token::leaf("(")];
        for child in node.significant_children() {
            match child.kind {
                NodeKind::LParen | NodeKind::RParen => {}
                _ => out.extend(ctx.scan(child)?),
            }
        }
        out.push(Token::leaf(")"));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::TreeScanner;
    use kotfmt_syntax::parse;

    fn scan_expr(source: &str) -> Vec<Token> {
        let tree = parse(source).expect("parses");
        TreeScanner::with_defaults()
            .scan_tree(&tree)
            .expect("scans")
    }

    fn leaves(tokens: &[Token]) -> Vec<&str> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Leaf(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn chain_flattens_with_candidate_before_each_selector() {
        let tokens = scan_expr("val x = a.b().c().d()\n");
        let empties = tokens
            .iter()
            .filter(|t| matches!(t, Token::Whitespace { content, .. } if content.is_empty()))
            .count();
        assert_eq!(empties, 3, "one zero-width candidate per selector");
        assert!(leaves(&tokens).contains(&".b"));
        assert!(leaves(&tokens).contains(&".d"));
    }

    #[test]
    fn safe_access_spelling_kept() {
        let tokens = scan_expr("val x = a?.b\n");
        assert!(leaves(&tokens).contains(&"?.b"));
    }

    #[test]
    fn binary_run_shares_one_block() {
        let tokens = scan_expr("val x = a && b && c\n");
        // Two operators, two candidates, flattened into a single block.
        let candidates = tokens
            .iter()
            .filter(|t| matches!(t, Token::Whitespace { content, .. } if content == " "))
            .count();
        // One extra candidate from the property initializer itself.
        assert_eq!(candidates, 3);
    }

    #[test]
    fn argument_list_has_sync_breaks() {
        let tokens = scan_expr("val a = f(p1, p2, p3)\n");
        let sync = tokens
            .iter()
            .filter(|t| matches!(t, Token::SynchronizedBreak { .. }))
            .count();
        assert_eq!(sync, 3);
    }

    #[test]
    fn unary_and_paren_render_inline() {
        let tokens = scan_expr("val a = !(b || c)\n");
        let text: String = leaves(&tokens).concat();
        assert!(text.contains("!("));
        assert!(text.contains(')'));
    }
}
