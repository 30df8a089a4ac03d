//! # kotfmt-syntax
//!
//! Tree provider for the kotfmt formatting pipeline.
//!
//! This crate turns source text into a syntax tree of [`Node`]s tagged with
//! [`NodeKind`]s. The tree is deliberately concrete: whitespace runs and
//! comments survive as ordinary children wherever the formatter needs to see
//! them (declaration and statement lists), so the downstream scanners can
//! decide how much of the original layout to keep.
//!
//! Structure:
//!
//! 1. Core tokenization using a logos lexer ([`lexing`]). Strings and
//!    comments are consumed by callbacks so that interpolation and nested
//!    delimiters never leak partial tokens.
//! 2. A recursive-descent tree builder ([`tree`]) that groups tokens into
//!    composite nodes. Inside expressions the builder drops insignificant
//!    whitespace; at statement level it preserves it (newline counts drive
//!    blank-line handling later in the pipeline).

pub mod lexing;
pub mod tree;

pub use lexing::{tokenize, Token};
pub use tree::{parse, Node, NodeKind, NodeRef, ParseError};
