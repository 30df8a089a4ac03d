//! Structural invariants of the annotated token stream.
//!
//! These hold for every input the tree provider accepts: balanced blocks,
//! no residual marker directives, and length annotations that agree with a
//! recomputation from the stream itself.

use kotfmt_core::{Formatter, State, Token};
use kotfmt_syntax::{Node, NodeRef};

const CORPUS: &[&str] = &[
    "val a = 1\n",
    "val result = buildThingies(argumentOne, argumentTwo)\n",
    "private var counter: Int = 0\n",
    "class Widget(alphaParameter: String, betaParameter: String)\n",
    "class Box(value: Int) {\n    fun get(): Int {\n        return value\n    }\n}\n",
    "fun f() {\n    if (condAlpha && condBeta) {\n        g()\n    } else {\n        h()\n    }\n}\n",
    "fun add(a: Int, b: Int): Int = a + b\n",
    "package a.b\n\nimport a.b.C\nimport a.b.D\n\nval x = C()\n",
    "/** Documented. */\nfun f() {\n    return 1\n}\n",
    "val chain = firstCall().secondCall().thirdCall()\n",
    "val s = \"alpha beta ${gamma(1)} delta\"\n",
    "val s = \"\"\"raw\n  content\"\"\"\n",
    "fun f() {\n    // a note\n    val a = 1 // trailing\n    /* block\n     * comment\n     */\n    val b = 2\n}\n",
    "fun loopy() {\n    while (busy) {\n        spin()\n    }\n    for (x in items) {\n        use(x)\n    }\n}\n",
];

fn annotated(source: &str) -> Vec<Token> {
    Formatter::default()
        .preprocessed_tokens(source)
        .expect("pipeline accepts the corpus")
}

#[test]
fn blocks_are_balanced_and_properly_nested() {
    for source in CORPUS {
        let tokens = annotated(source);
        let mut depth: isize = 0;
        for token in &tokens {
            match token {
                Token::Begin { .. } => depth += 1,
                Token::End => {
                    depth -= 1;
                    assert!(depth >= 0, "{:?}: End without Begin", source);
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0, "{:?}: unbalanced blocks", source);
    }
}

#[test]
fn no_residual_markers_or_directives() {
    for source in CORPUS {
        let tokens = annotated(source);
        assert!(
            !tokens.iter().any(|t| matches!(
                t,
                Token::Marker | Token::BlockFromMarker | Token::BlockFromLastForcedBreak
            )),
            "{:?}: directives survived preprocessing",
            source
        );
    }
}

/// Recompute every block's flat width from the stream and compare with the
/// annotation the preprocessor wrote.
#[test]
fn begin_lengths_match_recomputation() {
    for source in CORPUS {
        let tokens = annotated(source);
        let mut stack: Vec<(usize, usize)> = Vec::new(); // (annotated, recomputed)
        for token in &tokens {
            match token {
                Token::Begin { length, .. } => stack.push((*length, 0)),
                Token::End => {
                    let (annotated_len, computed) =
                        stack.pop().expect("balanced blocks");
                    assert_eq!(
                        annotated_len, computed,
                        "{:?}: Begin length disagrees with contents",
                        source
                    );
                    if let Some(parent) = stack.last_mut() {
                        parent.1 += annotated_len;
                    }
                }
                other => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += other.width();
                    }
                }
            }
        }
    }
}

#[test]
fn formatting_is_idempotent_across_corpus() {
    let formatter = Formatter::default();
    for source in CORPUS {
        let once = formatter.format(source).expect("first pass");
        let twice = formatter.format(&once).expect("second pass");
        assert_eq!(once, twice, "{:?}: not idempotent", source);
    }
}

/// Formatting must not change what the code says: the significant leaf
/// sequence of the reparsed output equals the input's (whitespace,
/// comments, and string wrapping aside).
#[test]
fn significant_tokens_are_preserved() {
    let formatter = Formatter::default();
    for source in CORPUS {
        let before = significant_leaves(&kotfmt_syntax::parse(source).expect("parses"));
        let output = formatter.format(source).expect("formats");
        let after = significant_leaves(&kotfmt_syntax::parse(&output).expect("reparses"));
        assert_eq!(before, after, "{:?}: token sequence changed", source);
    }
}

fn significant_leaves(root: &NodeRef) -> Vec<String> {
    let mut out = Vec::new();
    collect_leaves(root, &mut out);
    out
}

fn collect_leaves(node: &Node, out: &mut Vec<String>) {
    if node.children.is_empty() {
        let skip = node.kind.is_whitespace() || node.kind.is_comment();
        if !skip && !node.text.is_empty() {
            out.push(node.text.clone());
        }
        return;
    }
    for child in &node.children {
        collect_leaves(child, out);
    }
}

/// Whitespace candidates never survive inside a package/import block, so
/// those runs can never break.
#[test]
fn package_blocks_carry_no_break_candidates() {
    let tokens = annotated("package org.example.a.b.c\n\nimport org.example.a.b.C\n");
    let mut inside = 0usize;
    for token in &tokens {
        match token {
            Token::Begin {
                state: State::PackageImport,
                ..
            } => inside += 1,
            Token::Begin { .. } if inside > 0 => inside += 1,
            Token::End if inside > 0 => inside -= 1,
            Token::Whitespace { .. } if inside > 0 => {
                panic!("break candidate inside a package/import block")
            }
            _ => {}
        }
    }
}
