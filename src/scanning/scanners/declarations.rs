//! Declarations: properties, functions, classes, and their pieces.
//!
//! Each declaration scanner places a `Marker` after the documentation
//! prefix and closes with `BlockFromMarker`, so the declaration proper ends
//! up in its own block. That block's flat length is what makes the break
//! candidate at `=` (and friends) fire when the line cannot hold the whole
//! declaration.
//!
//! Parameter lists use synchronized breaks: either the whole list stays on
//! one line, or every parameter gets its own line at the standard indent
//! with the closing parenthesis back at the base indent.

use crate::scanning::scanners::last_significant;
use crate::scanning::{node_pattern, NodePattern, NodeScanner, PatternBuilder, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

/// Optional doc comment, then the wrap marker, then modifiers. Shared
/// prefix of all three declaration patterns.
fn declaration_prefix(b: &mut PatternBuilder) {
    b.zero_or_one(|b| {
        b.node_of_type(NodeKind::KDoc);
        b.then_map_to_tokens(|ctx, nodes| {
            let mut out = Vec::new();
            for node in nodes.iter().filter(|n| n.kind == NodeKind::KDoc) {
                out.extend(ctx.scan(node)?);
            }
            out.push(Token::forced_break());
            Ok(out)
        });
        b.possible_whitespace();
    });
    b.then_map_to_tokens(|_, _| Ok(vec![Token::Marker]));
    b.zero_or_more(|b| {
        b.node_of_type(NodeKind::Modifier);
        b.then_map_to_tokens(|_, nodes| {
            let mut out = Vec::new();
            for node in nodes.iter().filter(|n| !n.is_whitespace()) {
                out.push(Token::leaf(&node.text));
                out.push(Token::leaf(" "));
            }
            Ok(out)
        });
    });
}

/// `: Type` suffix used by properties, functions, and parameters.
fn type_annotation(b: &mut PatternBuilder) {
    b.zero_or_one(|b| {
        b.node_of_type(NodeKind::Colon);
        b.node_of_type(NodeKind::TypeReference);
        b.then_map_to_tokens(|ctx, nodes| {
            let mut out = vec![Token::leaf(":"), Token::leaf(" ")];
            for node in nodes.iter().filter(|n| n.kind == NodeKind::TypeReference) {
                out.extend(ctx.scan(node)?);
            }
            Ok(out)
        });
    });
}

pub struct PropertyScanner {
    pattern: NodePattern,
}

impl PropertyScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            declaration_prefix(b);
            b.either(
                |b| {
                    b.node_of_type(NodeKind::ValKw);
                },
                |b| {
                    b.node_of_type(NodeKind::VarKw);
                },
            );
            b.then_map_to_tokens(|_, nodes| {
                let kw = last_significant(nodes).map(|n| n.text.clone()).unwrap_or_default();
                Ok(vec![Token::leaf(kw), Token::leaf(" ")])
            });
            b.node_of_type(NodeKind::Identifier);
            b.then_map_to_tokens(|_, nodes| {
                let name = last_significant(nodes).map(|n| n.text.clone()).unwrap_or_default();
                Ok(vec![Token::leaf(name)])
            });
            type_annotation(b);
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::Eq);
                b.any_node();
                b.then_map_to_tokens(|ctx, nodes| {
                    let mut out = vec![
                        Token::leaf(" "),
                        Token::leaf("="),
                        Token::whitespace(" "),
                    ];
                    if let Some(value) = last_significant(nodes) {
                        out.extend(ctx.scan(value)?);
                    }
                    Ok(out)
                });
            });
            b.then_map_to_tokens(|_, _| Ok(vec![Token::BlockFromMarker]));
            b.end();
        });
        PropertyScanner { pattern }
    }
}

impl NodeScanner for PropertyScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct FunctionScanner {
    pattern: NodePattern,
}

impl FunctionScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            declaration_prefix(b);
            b.node_of_type(NodeKind::FunKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("fun"), Token::leaf(" ")]));
            b.node_of_type(NodeKind::Identifier);
            b.then_map_to_tokens(|_, nodes| {
                let name = last_significant(nodes).map(|n| n.text.clone()).unwrap_or_default();
                Ok(vec![Token::leaf(name)])
            });
            b.node_of_type(NodeKind::ParameterList);
            b.then_map_to_tokens(|ctx, nodes| match last_significant(nodes) {
                Some(params) => ctx.scan(params),
                None => Ok(Vec::new()),
            });
            type_annotation(b);
            b.zero_or_one(|b| {
                b.either(
                    |b| {
                        b.node_of_type(NodeKind::Block);
                        b.then_map_to_tokens(|ctx, nodes| {
                            let mut out = vec![Token::leaf(" ")];
                            if let Some(body) = last_significant(nodes) {
                                out.extend(ctx.scan(body)?);
                            }
                            Ok(out)
                        });
                    },
                    |b| {
                        b.node_of_type(NodeKind::Eq);
                        b.any_node();
                        b.then_map_to_tokens(|ctx, nodes| {
                            let mut out = vec![
                                Token::leaf(" "),
                                Token::leaf("="),
                                Token::whitespace(" "),
                            ];
                            if let Some(body) = last_significant(nodes) {
                                out.extend(ctx.scan(body)?);
                            }
                            Ok(out)
                        });
                    },
                );
            });
            b.then_map_to_tokens(|_, _| Ok(vec![Token::BlockFromMarker]));
            b.end();
        });
        FunctionScanner { pattern }
    }
}

impl NodeScanner for FunctionScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct ClassScanner {
    pattern: NodePattern,
}

impl ClassScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            declaration_prefix(b);
            b.node_of_type(NodeKind::ClassKw);
            b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("class"), Token::leaf(" ")]));
            b.node_of_type(NodeKind::Identifier);
            b.then_map_to_tokens(|_, nodes| {
                let name = last_significant(nodes).map(|n| n.text.clone()).unwrap_or_default();
                Ok(vec![Token::leaf(name)])
            });
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::ParameterList);
                b.then_map_to_tokens(|ctx, nodes| match last_significant(nodes) {
                    Some(params) => ctx.scan(params),
                    None => Ok(Vec::new()),
                });
            });
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::ClassBody);
                b.then_map_to_tokens(|ctx, nodes| {
                    let mut out = vec![Token::leaf(" ")];
                    if let Some(body) = last_significant(nodes) {
                        out.extend(ctx.scan(body)?);
                    }
                    Ok(out)
                });
            });
            b.then_map_to_tokens(|_, _| Ok(vec![Token::BlockFromMarker]));
            b.end();
        });
        ClassScanner { pattern }
    }
}

impl NodeScanner for ClassScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct ParameterListScanner {
    pattern: NodePattern,
}

impl ParameterListScanner {
    pub fn new() -> Self {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::LParen);
            b.then_map_to_tokens(|_, _| {
                Ok(vec![Token::begin(State::Code), Token::leaf("(")])
            });
            b.zero_or_one(|b| {
                b.node_of_type(NodeKind::Parameter);
                b.then_map_to_tokens(|ctx, nodes| {
                    let mut out = vec![Token::sync_break(0)];
                    if let Some(param) = last_significant(nodes) {
                        out.extend(ctx.scan(param)?);
                    }
                    Ok(out)
                });
                b.zero_or_more(|b| {
                    b.node_of_type(NodeKind::Comma);
                    b.node_of_type(NodeKind::Parameter);
                    b.then_map_to_tokens(|ctx, nodes| {
                        let mut out = vec![Token::leaf(","), Token::sync_break(1)];
                        if let Some(param) = last_significant(nodes) {
                            out.extend(ctx.scan(param)?);
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
        ParameterListScanner { pattern }
    }
}

impl NodeScanner for ParameterListScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

/// One parameter: `modifiers name: Type` with an optional default value.
/// No break candidates; the list decides the layout.
pub struct ParameterScanner;

impl NodeScanner for ParameterScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = Vec::new();
        for child in node.significant_children() {
            match child.kind {
                NodeKind::Modifier | NodeKind::ValKw | NodeKind::VarKw => {
                    out.push(Token::leaf(&child.text));
                    out.push(Token::leaf(" "));
                }
                NodeKind::Identifier => out.push(Token::leaf(&child.text)),
                NodeKind::Colon => {
                    out.push(Token::leaf(":"));
                    out.push(Token::leaf(" "));
                }
                NodeKind::Eq => {
                    out.push(Token::leaf(" "));
                    out.push(Token::leaf("="));
                    out.push(Token::leaf(" "));
                }
                _ => out.extend(ctx.scan(child)?),
            }
        }
        Ok(out)
    }
}

/// Types print as one run: `Map<String, Int>?`.
pub struct TypeScanner;

impl NodeScanner for TypeScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = Vec::new();
        for child in node.significant_children() {
            match child.kind {
                NodeKind::Comma => {
                    out.push(Token::leaf(","));
                    out.push(Token::leaf(" "));
                }
                NodeKind::TypeReference => out.extend(ctx.scan(child)?),
                _ => out.push(Token::leaf(&child.text)),
            }
        }
        Ok(out)
    }
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

    fn leaves(tokens: &[Token]) -> String {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Leaf(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn property_emits_break_candidate_at_initializer() {
        let tokens = scan_source("val a = f(x)\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Whitespace { content, .. } if content == " ")));
        assert!(leaves(&tokens).starts_with("val a ="));
    }

    #[test]
    fn declaration_is_marker_wrapped() {
        let tokens = scan_source("val a = 1\n");
        assert!(tokens.iter().any(|t| matches!(t, Token::Marker)));
        assert!(tokens.iter().any(|t| matches!(t, Token::BlockFromMarker)));
    }

    #[test]
    fn parameter_list_uses_synchronized_breaks() {
        let tokens = scan_source("fun f(a: Int, b: String) {\n}\n");
        let sync = tokens
            .iter()
            .filter(|t| matches!(t, Token::SynchronizedBreak { .. }))
            .count();
        let closing = tokens
            .iter()
            .filter(|t| matches!(t, Token::ClosingSynchronizedBreak { .. }))
            .count();
        assert_eq!(sync, 2, "one candidate before each parameter");
        assert_eq!(closing, 1, "one before the closing parenthesis");
    }

    #[test]
    fn modifiers_precede_keyword() {
        let tokens = scan_source("private val answer = 42\n");
        assert!(leaves(&tokens).starts_with("private val answer"));
    }

    #[test]
    fn type_annotation_renders_inline() {
        let tokens = scan_source("val m: Map<String, Int>? = x\n");
        assert!(leaves(&tokens).contains("Map<String, Int>?"));
    }

    #[test]
    fn expression_body_function() {
        let tokens = scan_source("fun twice(x: Int): Int = x + x\n");
        let text = leaves(&tokens);
        assert!(text.contains("fun twice"));
        assert!(text.contains('='));
    }
}
