//! Per-node-kind scanning rules.
//!
//! Grouped by construct family. Most scanners are pattern-driven; a few
//! (lists of statements, chain flattening, verbatim content) are plain
//! walks where an automaton would add nothing.

pub mod comments;
pub mod declarations;
pub mod directives;
pub mod expressions;
pub mod statements;
pub mod strings;

use super::TreeScanner;
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

/// Register the default rule set.
pub fn register_defaults(registry: &mut TreeScanner) {
    registry.register(NodeKind::File, Box::new(statements::FileScanner));
    registry.register(
        NodeKind::PackageDirective,
        Box::new(directives::PackageDirectiveScanner::new()),
    );
    registry.register(
        NodeKind::ImportDirective,
        Box::new(directives::ImportDirectiveScanner::new()),
    );
    registry.register(NodeKind::ImportList, Box::new(directives::ImportListScanner));
    registry.register(
        NodeKind::Property,
        Box::new(declarations::PropertyScanner::new()),
    );
    registry.register(
        NodeKind::Function,
        Box::new(declarations::FunctionScanner::new()),
    );
    registry.register(NodeKind::Class, Box::new(declarations::ClassScanner::new()));
    registry.register(
        NodeKind::ParameterList,
        Box::new(declarations::ParameterListScanner::new()),
    );
    registry.register(NodeKind::Parameter, Box::new(declarations::ParameterScanner));
    registry.register(NodeKind::TypeReference, Box::new(declarations::TypeScanner));
    registry.register(NodeKind::Block, Box::new(statements::BlockScanner));
    registry.register(NodeKind::ClassBody, Box::new(statements::BlockScanner));
    registry.register(NodeKind::If, Box::new(statements::IfScanner::new()));
    registry.register(NodeKind::While, Box::new(statements::WhileScanner::new()));
    registry.register(NodeKind::For, Box::new(statements::ForScanner::new()));
    registry.register(NodeKind::Return, Box::new(statements::ReturnScanner::new()));
    registry.register(NodeKind::Call, Box::new(expressions::ChainScanner));
    registry.register(NodeKind::DotQualified, Box::new(expressions::ChainScanner));
    registry.register(NodeKind::SafeAccess, Box::new(expressions::ChainScanner));
    registry.register(
        NodeKind::ArgumentList,
        Box::new(expressions::ArgumentListScanner::new()),
    );
    registry.register(NodeKind::Binary, Box::new(expressions::BinaryScanner));
    registry.register(NodeKind::Unary, Box::new(expressions::UnaryScanner));
    registry.register(NodeKind::Paren, Box::new(expressions::ParenScanner));
    registry.register(
        NodeKind::StringTemplate,
        Box::new(strings::StringTemplateScanner),
    );
    registry.register(
        NodeKind::MultilineString,
        Box::new(strings::MultilineStringScanner),
    );
    registry.register(NodeKind::KDoc, Box::new(comments::KDocScanner));
    registry.register(NodeKind::EolComment, Box::new(comments::EolCommentScanner));
    registry.register(
        NodeKind::BlockComment,
        Box::new(comments::BlockCommentScanner),
    );
}

/// Wrap tokens in a `Begin(state) … End` block.
pub(crate) fn in_block(state: State, tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() + 2);
    out.push(Token::begin(state));
    out.extend(tokens);
    out.push(Token::End);
    out
}

/// Last non-whitespace node of an action's pending list; actions use this
/// to pick out the operand a quantifier just matched.
pub(crate) fn last_significant(nodes: &[NodeRef]) -> Option<&NodeRef> {
    nodes.iter().rev().find(|n| !n.is_whitespace())
}

/// Statement kinds that produce their own enclosing block. The statement
/// list scanners wrap everything else so that every statement has a block
/// to make breaking decisions in.
pub(crate) fn wraps_itself(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Property
            | NodeKind::Function
            | NodeKind::Class
            | NodeKind::PackageDirective
            | NodeKind::ImportList
            | NodeKind::ImportDirective
            | NodeKind::EolComment
            | NodeKind::BlockComment
            | NodeKind::KDoc
    )
}
