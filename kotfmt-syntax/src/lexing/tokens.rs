//! Token definitions for the source language.
//!
//! All tokens are produced by the logos derive macro. Strings, block
//! comments, and KDoc comments are consumed by callbacks: their bodies may
//! contain arbitrary text (including nested `${…}` interpolation with its own
//! string literals), which no single regular expression can delimit safely.

use logos::{Lexer, Logos};
use serde::Serialize;

/// All tokens produced by the lexer.
///
/// Keyword variants exist only for words the tree builder dispatches on;
/// everything else that looks like a word is an [`Token::Ident`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Token {
    #[token("package")]
    PackageKw,
    #[token("import")]
    ImportKw,
    #[token("val")]
    ValKw,
    #[token("var")]
    VarKw,
    #[token("fun")]
    FunKw,
    #[token("class")]
    ClassKw,
    #[token("if")]
    IfKw,
    #[token("else")]
    ElseKw,
    #[token("while")]
    WhileKw,
    #[token("for")]
    ForKw,
    #[token("in")]
    InKw,
    #[token("return")]
    ReturnKw,

    // Declaration modifiers are one token kind; the builder keeps their text.
    #[regex(
        "public|private|internal|protected|open|override|abstract|final|data|sealed",
        priority = 10
    )]
    Modifier,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?[fFL]?")]
    Number,

    // """…""" including the delimiters; body is verbatim.
    #[token("\"\"\"", lex_multiline_string)]
    MultilineString,

    // "…" including the delimiters; interpolation handled by the callback.
    #[token("\"", lex_string_template)]
    StringTemplate,

    // /** ... */; must win over BlockComment on the shared prefix.
    #[token("/**", lex_kdoc)]
    KDoc,

    #[token("/*", lex_block_comment)]
    BlockComment,

    #[regex(r"//[^\n]*")]
    EolComment,

    // Whitespace runs, newlines included; the builder counts the newlines.
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("?.")]
    SafeDot,
    #[token("?:")]
    Elvis,
    #[token("->")]
    Arrow,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

impl Token {
    /// Whitespace and comments: tokens the builder treats as trivia.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::EolComment | Token::BlockComment | Token::KDoc
        )
    }

    /// Binary operators recognized by the expression parser, with their
    /// precedence (higher binds tighter).
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            Token::Star | Token::Slash | Token::Percent => Some(7),
            Token::Plus | Token::Minus => Some(6),
            Token::Elvis => Some(5),
            Token::Lt | Token::Gt | Token::Le | Token::Ge => Some(4),
            Token::EqEq | Token::NotEq => Some(3),
            Token::AndAnd => Some(2),
            Token::OrOr => Some(1),
            _ => None,
        }
    }
}

/// Consume the body and closing delimiter of a `"""…"""` string.
fn lex_multiline_string(lex: &mut Lexer<Token>) -> bool {
    match lex.remainder().find("\"\"\"") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// Consume the body and closing quote of a single-line string template.
///
/// Tracks `${…}` nesting so that braces and even nested string literals
/// inside an interpolation do not terminate the outer string. A bare newline
/// outside interpolation means the string is unterminated.
fn lex_string_template(lex: &mut Lexer<Token>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if depth == 0 => i += 2,
            b'"' if depth == 0 => {
                lex.bump(i + 1);
                return true;
            }
            b'"' => {
                // Nested string literal inside an interpolation expression.
                i += 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
            }
            b'$' if depth == 0 && bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
            }
            b'{' if depth > 0 => {
                depth += 1;
                i += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                i += 1;
            }
            b'\n' if depth == 0 => return false,
            _ => i += 1,
        }
    }
    false
}

/// Consume the body and closing `*/` of a KDoc comment.
fn lex_kdoc(lex: &mut Lexer<Token>) -> bool {
    let rem = lex.remainder();
    // "/**/" is a complete (empty) comment whose second '*' was already
    // consumed as part of the opening "/**".
    if rem.starts_with('/') {
        lex.bump(1);
        return true;
    }
    match rem.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

/// Consume the body and closing `*/` of a plain block comment.
fn lex_block_comment(lex: &mut Lexer<Token>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let mut lexer = Token::lexer(source);
        let mut out = Vec::new();
        while let Some(result) = lexer.next() {
            out.push(result.expect("lex error"));
        }
        out
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("val value"),
            vec![Token::ValKw, Token::Whitespace, Token::Ident]
        );
        // Longest match: an identifier that merely starts with a keyword.
        assert_eq!(kinds("valuation"), vec![Token::Ident]);
        assert_eq!(kinds("internal"), vec![Token::Modifier]);
        assert_eq!(kinds("internals"), vec![Token::Ident]);
    }

    #[test]
    fn string_template_with_interpolation() {
        assert_eq!(kinds(r#""a ${f("x")} b""#), vec![Token::StringTemplate]);
        assert_eq!(kinds(r#""plain $name tail""#), vec![Token::StringTemplate]);
        assert_eq!(kinds(r#""esc \" quote""#), vec![Token::StringTemplate]);
    }

    #[test]
    fn multiline_string_spans_newlines() {
        let toks = kinds("\"\"\"line one\nline two\"\"\"");
        assert_eq!(toks, vec![Token::MultilineString]);
    }

    #[test]
    fn comment_flavors() {
        assert_eq!(kinds("/** doc */"), vec![Token::KDoc]);
        assert_eq!(kinds("/* plain */"), vec![Token::BlockComment]);
        assert_eq!(kinds("// rest of line"), vec![Token::EolComment]);
        assert_eq!(kinds("/**/"), vec![Token::KDoc]);
    }

    #[test]
    fn compound_operators_win_over_singles() {
        assert_eq!(
            kinds("a?.b"),
            vec![Token::Ident, Token::SafeDot, Token::Ident]
        );
        assert_eq!(
            kinds("x ?: y"),
            vec![
                Token::Ident,
                Token::Whitespace,
                Token::Elvis,
                Token::Whitespace,
                Token::Ident
            ]
        );
        assert_eq!(kinds("a==b"), vec![Token::Ident, Token::EqEq, Token::Ident]);
    }

    #[test]
    fn number_then_dot_call() {
        assert_eq!(
            kinds("1.plus"),
            vec![Token::Number, Token::Dot, Token::Ident]
        );
        assert_eq!(kinds("1.5"), vec![Token::Number]);
    }
}
