//! Package and import directives.
//!
//! Both render inside a `PackageImport` block: a single unbreakable run, no
//! candidates, so an over-long qualified name is emitted unchanged.

use crate::scanning::{node_pattern, NodePattern, NodeScanner, ScanContext, ScanError};
use crate::tokens::{State, Token};
use kotfmt_syntax::{NodeKind, NodeRef};

fn directive_pattern(keyword_kind: NodeKind, keyword: &'static str) -> NodePattern {
    node_pattern(|b| {
        b.node_of_type(keyword_kind);
        b.then_map_to_tokens(move |_, _| {
            Ok(vec![
                Token::begin(State::PackageImport),
                Token::leaf(keyword),
                Token::leaf(" "),
            ])
        });
        b.one_or_more(|b| {
            b.any_node();
        });
        b.then_map_to_tokens(|_, nodes| {
            let mut out: Vec<Token> = nodes
                .iter()
                .filter(|n| !n.is_whitespace())
                .map(|n| Token::leaf(&n.text))
                .collect();
            out.push(Token::End);
            Ok(out)
        });
        b.end();
    })
}

pub struct PackageDirectiveScanner {
    pattern: NodePattern,
}

impl PackageDirectiveScanner {
    pub fn new() -> Self {
        PackageDirectiveScanner {
            pattern: directive_pattern(NodeKind::PackageKw, "package"),
        }
    }
}

impl NodeScanner for PackageDirectiveScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

pub struct ImportDirectiveScanner {
    pattern: NodePattern,
}

impl ImportDirectiveScanner {
    pub fn new() -> Self {
        ImportDirectiveScanner {
            pattern: directive_pattern(NodeKind::ImportKw, "import"),
        }
    }
}

impl NodeScanner for ImportDirectiveScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        self.pattern.matches(&node.children, ctx)
    }
}

/// Directives one per line; blank lines inside the list are deduplicated.
pub struct ImportListScanner;

impl NodeScanner for ImportListScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut out = Vec::new();
        let mut first = true;
        for child in node.significant_children() {
            if !first {
                out.push(Token::forced_break());
            }
            out.extend(ctx.scan(child)?);
            first = false;
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
        let registry = TreeScanner::with_defaults();
        registry.scan_tree(&tree).expect("scans")
    }

    #[test]
    fn package_directive_has_no_break_candidates() {
        let tokens = scan_source("package org.example.deep.nesting\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Begin { state: State::PackageImport, .. })));
        assert!(!tokens
            .iter()
            .any(|t| matches!(t, Token::Whitespace { .. })));
        let rendered: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Leaf(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(rendered, "package org.example.deep.nesting");
    }

    #[test]
    fn import_list_separates_with_single_breaks() {
        let tokens = scan_source("import a.b.C\n\n\nimport a.b.D\n");
        let breaks = tokens
            .iter()
            .filter(|t| matches!(t, Token::ForcedBreak { count: 1 }))
            .count();
        assert_eq!(breaks, 1, "blank lines inside the import list collapse");
    }

    #[test]
    fn wildcard_import_kept() {
        let tokens = scan_source("import a.b.*\n");
        let rendered: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Leaf(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(rendered, "import a.b.*");
    }
}
