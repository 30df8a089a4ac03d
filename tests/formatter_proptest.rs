//! Property-based tests for the formatting pipeline.
//!
//! Sources are generated from the supported declaration grammar so that
//! the parser accepts every case; the properties then hold the pipeline to
//! its contract: formatting is idempotent, blocks stay balanced, no
//! directive survives preprocessing, and the significant token sequence is
//! untouched.

use proptest::prelude::*;

use kotfmt_core::{Formatter, FormatterOptions, Token};

const RESERVED: &[&str] = &[
    "package", "import", "val", "var", "fun", "class", "if", "else", "while", "for", "in",
    "return", "public", "private", "internal", "protected", "open", "override", "abstract",
    "final", "data", "sealed",
];

/// Generate valid identifiers (keywords and modifiers excluded)
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_filter("identifiers must not be reserved words", |s| {
        !RESERVED.contains(&s.as_str())
    })
}

/// Generate type names
fn type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Int".to_string()),
        Just("String".to_string()),
        Just("Boolean".to_string()),
        Just("List<Int>".to_string()),
        Just("Map<String, Int>".to_string()),
    ]
}

/// Generate simple expressions (identifiers, literals, calls, operators)
fn expression_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        identifier_strategy(),
        (1u32..10000).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            (identifier_strategy(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(name, args)| format!("{}({})", name, args.join(", "))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{} + {}", a, b)),
            (inner.clone(), identifier_strategy()).prop_map(|(a, b)| format!("{}.{}()", a, b)),
        ]
    })
}

/// Generate a property declaration
fn property_strategy() -> impl Strategy<Value = String> {
    (
        prop::bool::ANY,
        identifier_strategy(),
        prop::option::of(type_strategy()),
        expression_strategy(),
    )
        .prop_map(|(mutable, name, annotation, value)| {
            let keyword = if mutable { "var" } else { "val" };
            match annotation {
                Some(t) => format!("{} {}: {} = {}", keyword, name, t, value),
                None => format!("{} {} = {}", keyword, name, value),
            }
        })
}

/// Generate a function declaration with parameters and a small body
fn function_strategy() -> impl Strategy<Value = String> {
    (
        identifier_strategy(),
        prop::collection::vec((identifier_strategy(), type_strategy()), 0..4),
        expression_strategy(),
    )
        .prop_map(|(name, params, value)| {
            let params: Vec<String> = params
                .into_iter()
                .map(|(n, t)| format!("{}: {}", n, t))
                .collect();
            format!(
                "fun {}({}) {{\n    return {}\n}}",
                name,
                params.join(", "),
                value
            )
        })
}

/// Generate a whole source file
fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![property_strategy(), function_strategy()],
        1..5,
    )
    .prop_map(|declarations| format!("{}\n", declarations.join("\n\n")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn formatting_is_idempotent(source in source_strategy()) {
        let formatter = Formatter::default();
        let once = formatter.format(&source).expect("generated sources parse");
        let twice = formatter.format(&once).expect("formatted output parses");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn narrow_limit_is_still_idempotent(source in source_strategy()) {
        let formatter = Formatter::new(FormatterOptions {
            max_line_length: 40,
            standard_indent: 4,
            continuation_indent: 8,
        });
        let once = formatter.format(&source).expect("generated sources parse");
        let twice = formatter.format(&once).expect("formatted output parses");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn preprocessed_stream_is_well_formed(source in source_strategy()) {
        let tokens = Formatter::default()
            .preprocessed_tokens(&source)
            .expect("generated sources parse");
        let mut depth: isize = 0;
        for token in &tokens {
            match token {
                Token::Begin { .. } => depth += 1,
                Token::End => {
                    depth -= 1;
                    prop_assert!(depth >= 0);
                }
                Token::Marker | Token::BlockFromMarker | Token::BlockFromLastForcedBreak => {
                    prop_assert!(false, "directive survived preprocessing");
                }
                _ => {}
            }
        }
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn significant_tokens_survive_formatting(source in source_strategy()) {
        let formatter = Formatter::default();
        let output = formatter.format(&source).expect("generated sources parse");
        let before = leaves(&source);
        let after = leaves(&output);
        prop_assert_eq!(before, after);
    }
}

fn leaves(source: &str) -> Vec<String> {
    fn walk(node: &kotfmt_syntax::Node, out: &mut Vec<String>) {
        if node.children.is_empty() {
            if !node.kind.is_whitespace() && !node.kind.is_comment() && !node.text.is_empty() {
                out.push(node.text.clone());
            }
            return;
        }
        for child in &node.children {
            walk(child, out);
        }
    }
    let tree = kotfmt_syntax::parse(source).expect("parses");
    let mut out = Vec::new();
    walk(&tree, &mut out);
    out
}
