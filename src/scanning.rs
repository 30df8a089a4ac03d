//! Tree scanning
//!
//! Turns a syntax tree into the formatting token stream. The work is split
//! between a declarative layer and a thin dispatch layer:
//!
//! - [`matcher`] / [`pattern`] implement the nondeterministic node-pattern
//!   automaton and its builder DSL. Scanners describe the child sequence
//!   they accept and attach actions that map matched sub-sequences to
//!   tokens.
//! - [`scanners`] holds the per-node-kind rules.
//! - [`TreeScanner`] is the registry gluing them together: it dispatches a
//!   node to its scanner, falls back to verbatim text for bare leaves, and
//!   concatenates children for composite kinds nobody registered.
//!
//! A pattern that fails to match is a hard error ([`ScanError::NoMatch`]):
//! it means the tree provider produced a shape the rules do not understand,
//! and silently guessing would corrupt output.

pub mod matcher;
pub mod pattern;
pub mod scanners;

pub use matcher::NodePattern;
pub use pattern::{node_pattern, PatternBuilder};

use crate::tokens::Token;
use kotfmt_syntax::{NodeKind, NodeRef};
use std::collections::HashMap;
use std::fmt;

/// Scanning failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No accepting path of a scanner's automaton covers the child
    /// sequence. Carries the kinds it saw and the first node's line.
    NoMatch { line: usize, kinds: Vec<NodeKind> },
}

impl ScanError {
    pub fn line(&self) -> usize {
        match self {
            ScanError::NoMatch { line, .. } => *line,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoMatch { line, kinds } => {
                let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                write!(
                    f,
                    "no pattern matched node sequence [{}] starting at line {}",
                    kinds.join(", "),
                    line
                )
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// Handle passed to scanners and pattern actions so they can recurse into
/// child nodes through the registry.
pub struct ScanContext<'a> {
    scanner: &'a TreeScanner,
}

impl ScanContext<'_> {
    /// Scan one node through the registry.
    pub fn scan(&self, node: &NodeRef) -> Result<Vec<Token>, ScanError> {
        self.scanner.scan_node(node)
    }

    /// Scan several nodes, concatenating their tokens.
    pub fn scan_all<'n>(
        &self,
        nodes: impl IntoIterator<Item = &'n NodeRef>,
    ) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        for node in nodes {
            tokens.extend(self.scan(node)?);
        }
        Ok(tokens)
    }
}

/// One per-node-kind scanning rule.
pub trait NodeScanner {
    fn scan(&self, node: &NodeRef, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError>;
}

/// Registry mapping node kinds to scanners.
pub struct TreeScanner {
    scanners: HashMap<NodeKind, Box<dyn NodeScanner>>,
}

impl TreeScanner {
    /// Registry with the full default rule set.
    pub fn with_defaults() -> Self {
        let mut registry = TreeScanner {
            scanners: HashMap::new(),
        };
        scanners::register_defaults(&mut registry);
        registry
    }

    pub fn register(&mut self, kind: NodeKind, scanner: Box<dyn NodeScanner>) {
        self.scanners.insert(kind, scanner);
    }

    /// A context recursing through this registry.
    pub fn context(&self) -> ScanContext<'_> {
        ScanContext { scanner: self }
    }

    /// Scan a whole tree (normally the `File` root).
    pub fn scan_tree(&self, root: &NodeRef) -> Result<Vec<Token>, ScanError> {
        self.scan_node(root)
    }

    /// Dispatch one node. Unregistered leaves print verbatim; unregistered
    /// composites concatenate their significant children.
    pub fn scan_node(&self, node: &NodeRef) -> Result<Vec<Token>, ScanError> {
        if let Some(scanner) = self.scanners.get(&node.kind) {
            let ctx = ScanContext { scanner: self };
            return scanner.scan(node, &ctx);
        }
        if !node.text.is_empty() {
            return Ok(vec![Token::leaf(&node.text)]);
        }
        let ctx = ScanContext { scanner: self };
        let mut tokens = Vec::new();
        for child in node.significant_children() {
            tokens.extend(ctx.scan(child)?);
        }
        Ok(tokens)
    }
}
