//! Syntax tree
//!
//! The tree handed to the formatter is concrete and loosely typed: every
//! node carries a [`NodeKind`], leaves carry their source text, composites
//! carry ordered children. Whitespace runs and comments appear as ordinary
//! children of declaration and statement lists; inside expressions the
//! builder normalizes them away (comments are hoisted to the nearest
//! statement boundary).
//!
//! The tree intentionally knows nothing about formatting. Its one concession
//! to the downstream pipeline is [`NodeKind::Terminal`], the synthetic
//! end-of-sequence kind the pattern matcher appends when it runs a node's
//! children through an automaton.

pub mod builder;

use std::fmt;
use std::rc::Rc;

/// Shared handle to a node. The matcher keeps nodes on many speculative
/// paths at once, so cloning must be cheap.
pub type NodeRef = Rc<Node>;

/// Kinds of syntax tree nodes.
///
/// Composite kinds first, then leaf kinds. `Operator` covers every leaf the
/// formatter only ever reproduces verbatim (binary and unary operator
/// spellings, `*` in imports); keywords that drive scanner dispatch get
/// dedicated kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    PackageDirective,
    ImportList,
    ImportDirective,
    Class,
    ClassBody,
    Function,
    Property,
    ParameterList,
    Parameter,
    ArgumentList,
    Argument,
    TypeReference,
    Block,
    If,
    While,
    For,
    Return,
    Call,
    DotQualified,
    SafeAccess,
    Binary,
    Unary,
    Paren,
    StringTemplate,

    PackageKw,
    ImportKw,
    ValKw,
    VarKw,
    FunKw,
    ClassKw,
    IfKw,
    ElseKw,
    WhileKw,
    ForKw,
    InKw,
    ReturnKw,
    Modifier,
    Identifier,
    Number,
    MultilineString,
    LiteralEntry,
    Interpolation,
    Dot,
    SafeDot,
    Comma,
    Colon,
    Semicolon,
    Eq,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Operator,
    Whitespace,
    EolComment,
    BlockComment,
    KDoc,
    Terminal,
}

impl NodeKind {
    /// Whitespace trivia (not comments: those are dispatched explicitly).
    pub fn is_whitespace(&self) -> bool {
        matches!(self, NodeKind::Whitespace)
    }

    /// Comment kinds, documentation included.
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            NodeKind::EolComment | NodeKind::BlockComment | NodeKind::KDoc
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Source text; non-empty only on leaves.
    pub text: String,
    pub children: Vec<NodeRef>,
    /// 1-based line of the node's first token. Diagnostics only.
    pub line: usize,
}

impl Node {
    pub fn leaf(kind: NodeKind, text: impl Into<String>, line: usize) -> NodeRef {
        Rc::new(Node {
            kind,
            text: text.into(),
            children: Vec::new(),
            line,
        })
    }

    pub fn composite(kind: NodeKind, children: Vec<NodeRef>) -> NodeRef {
        let line = children.first().map(|c| c.line).unwrap_or(1);
        Rc::new(Node {
            kind,
            text: String::new(),
            children,
            line,
        })
    }

    /// The synthetic end-of-sequence node consumed by `end()` in patterns.
    pub fn terminal() -> NodeRef {
        Node::leaf(NodeKind::Terminal, "", 0)
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind.is_whitespace()
    }

    /// Newlines in a whitespace leaf; 0 for everything else.
    pub fn newline_count(&self) -> usize {
        if self.kind == NodeKind::Whitespace {
            self.text.matches('\n').count()
        } else {
            0
        }
    }

    /// Children with whitespace trivia skipped.
    pub fn significant_children(&self) -> impl Iterator<Item = &NodeRef> {
        self.children.iter().filter(|c| !c.is_whitespace())
    }
}

/// Tree construction failure, positioned on the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line {}) {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse source text into a [`Node`] tree rooted at a `File` node.
pub fn parse(source: &str) -> Result<NodeRef, ParseError> {
    builder::TreeBuilder::new(source)?.parse_file()
}
