//! Tree builder
//!
//! Recursive descent over the lexed token stream. The builder works at two
//! altitudes:
//!
//! - **Statement lists** (file top level, `{ … }` bodies): whitespace runs
//!   and comments are kept as children, because blank-line handling and
//!   comment placement are formatting decisions made downstream.
//! - **Inside a declaration or expression**: whitespace is dropped and
//!   comments are hoisted to the nearest statement boundary; the scanners
//!   regenerate canonical spacing there anyway.
//!
//! A documentation comment that directly precedes a declaration is pulled
//! into that declaration's children so the declaration scanners can keep the
//! two together across reformatting.

use super::{Node, NodeKind, NodeRef, ParseError};
use crate::lexing::{self, Spanned, Token};

pub(crate) struct TreeBuilder<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    line_starts: Vec<usize>,
    /// Comments found inside expressions, waiting for a statement boundary.
    hoisted: Vec<NodeRef>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut line_starts = vec![0usize];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        let tokens = match lexing::tokenize(source) {
            Ok(tokens) => tokens,
            Err(err) => {
                let line = line_starts.partition_point(|s| *s <= err.offset);
                return Err(ParseError {
                    line,
                    message: err.to_string(),
                });
            }
        };
        Ok(TreeBuilder {
            source,
            tokens,
            pos: 0,
            line_starts,
            hoisted: Vec::new(),
        })
    }

    // ===== token stream access =====

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|s| *s <= offset)
    }

    fn cur_line(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some((_, span)) => self.line_of(span.start),
            None => self.line_starts.len(),
        }
    }

    fn peek_token(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn token_text(&self, index: usize) -> &'a str {
        let (_, span) = &self.tokens[index];
        &self.source[span.clone()]
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.cur_line(),
            message: message.into(),
        }
    }

    /// Leaf node kind for a token; anything without a dedicated kind is an
    /// `Operator` reproduced verbatim.
    fn leaf_kind(token: Token) -> NodeKind {
        match token {
            Token::PackageKw => NodeKind::PackageKw,
            Token::ImportKw => NodeKind::ImportKw,
            Token::ValKw => NodeKind::ValKw,
            Token::VarKw => NodeKind::VarKw,
            Token::FunKw => NodeKind::FunKw,
            Token::ClassKw => NodeKind::ClassKw,
            Token::IfKw => NodeKind::IfKw,
            Token::ElseKw => NodeKind::ElseKw,
            Token::WhileKw => NodeKind::WhileKw,
            Token::ForKw => NodeKind::ForKw,
            Token::InKw => NodeKind::InKw,
            Token::ReturnKw => NodeKind::ReturnKw,
            Token::Modifier => NodeKind::Modifier,
            Token::Ident => NodeKind::Identifier,
            Token::Number => NodeKind::Number,
            Token::MultilineString => NodeKind::MultilineString,
            Token::KDoc => NodeKind::KDoc,
            Token::BlockComment => NodeKind::BlockComment,
            Token::EolComment => NodeKind::EolComment,
            Token::Whitespace => NodeKind::Whitespace,
            Token::Dot => NodeKind::Dot,
            Token::SafeDot => NodeKind::SafeDot,
            Token::Comma => NodeKind::Comma,
            Token::Colon => NodeKind::Colon,
            Token::Semicolon => NodeKind::Semicolon,
            Token::Eq => NodeKind::Eq,
            Token::LParen => NodeKind::LParen,
            Token::RParen => NodeKind::RParen,
            Token::LBrace => NodeKind::LBrace,
            Token::RBrace => NodeKind::RBrace,
            _ => NodeKind::Operator,
        }
    }

    /// Consume the current token as a leaf node.
    fn bump(&mut self) -> NodeRef {
        let (token, span) = self.tokens[self.pos].clone();
        let leaf = Node::leaf(
            Self::leaf_kind(token),
            &self.source[span.clone()],
            self.line_of(span.start),
        );
        self.pos += 1;
        leaf
    }

    /// Consume trivia, keeping it: whitespace and comments become children.
    fn collect_trivia(&mut self, children: &mut Vec<NodeRef>) {
        while let Some(t) = self.peek_token() {
            if t.is_trivia() {
                children.push(self.bump());
            } else {
                break;
            }
        }
    }

    /// Consume trivia, normalizing it away: whitespace is dropped, comments
    /// are hoisted to the nearest statement boundary. Returns whether the
    /// skipped run contained a newline.
    fn skip_trivia(&mut self) -> bool {
        let mut saw_newline = false;
        while let Some(t) = self.peek_token() {
            match t {
                Token::Whitespace => {
                    if self.token_text(self.pos).contains('\n') {
                        saw_newline = true;
                    }
                    self.pos += 1;
                }
                Token::EolComment | Token::BlockComment | Token::KDoc => {
                    let leaf = self.bump();
                    self.hoisted.push(leaf);
                }
                _ => break,
            }
        }
        saw_newline
    }

    fn drain_hoisted(&mut self, children: &mut Vec<NodeRef>) {
        for comment in std::mem::take(&mut self.hoisted) {
            children.push(Node::leaf(NodeKind::Whitespace, " ", comment.line));
            children.push(comment);
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<NodeRef, ParseError> {
        self.skip_trivia();
        match self.peek_token() {
            Some(t) if t == token => Ok(self.bump()),
            Some(t) => Err(self.error(format!("expected {}, found {:?}", what, t))),
            None => Err(self.error(format!("expected {}, found end of input", what))),
        }
    }

    // ===== file structure =====

    pub(crate) fn parse_file(mut self) -> Result<NodeRef, ParseError> {
        let mut children = Vec::new();
        self.collect_trivia(&mut children);
        if self.peek_token() == Some(Token::PackageKw) {
            let directive = self.parse_package()?;
            children.push(directive);
            self.collect_trivia(&mut children);
        }
        if self.peek_token() == Some(Token::ImportKw) {
            let imports = self.parse_import_list()?;
            children.push(imports);
        }
        self.parse_statement_list(&mut children, None)?;
        Ok(Node::composite(NodeKind::File, children))
    }

    fn parse_package(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        children.push(self.expect(Token::Ident, "package segment")?);
        loop {
            self.skip_trivia();
            if self.peek_token() == Some(Token::Dot) {
                children.push(self.bump());
                children.push(self.expect(Token::Ident, "package segment")?);
            } else {
                break;
            }
        }
        Ok(Node::composite(NodeKind::PackageDirective, children))
    }

    fn parse_import_list(&mut self) -> Result<NodeRef, ParseError> {
        let mut children: Vec<NodeRef> = Vec::new();
        loop {
            // Look past trivia for the next directive without losing the
            // trivia if the list is over: trailing runs belong to the file.
            let mark = self.pos;
            let mut pending = Vec::new();
            self.collect_trivia(&mut pending);
            if self.peek_token() == Some(Token::ImportKw) {
                children.append(&mut pending);
                let directive = self.parse_import_directive()?;
                children.push(directive);
            } else {
                self.pos = mark;
                break;
            }
        }
        Ok(Node::composite(NodeKind::ImportList, children))
    }

    fn parse_import_directive(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        children.push(self.expect(Token::Ident, "import segment")?);
        loop {
            self.skip_trivia();
            if self.peek_token() == Some(Token::Dot) {
                children.push(self.bump());
                self.skip_trivia();
                match self.peek_token() {
                    Some(Token::Ident) => children.push(self.bump()),
                    Some(Token::Star) => children.push(self.bump()),
                    _ => return Err(self.error("expected import segment or *")),
                }
            } else {
                break;
            }
        }
        Ok(Node::composite(NodeKind::ImportDirective, children))
    }

    // ===== statements =====

    fn parse_statement_list(
        &mut self,
        children: &mut Vec<NodeRef>,
        end: Option<Token>,
    ) -> Result<(), ParseError> {
        loop {
            self.collect_trivia(children);
            self.drain_hoisted(children);
            match self.peek_token() {
                None => {
                    return match end {
                        None => Ok(()),
                        Some(t) => Err(self.error(format!("expected {:?}, found end of input", t))),
                    }
                }
                Some(t) if Some(t) == end => return Ok(()),
                Some(Token::Semicolon) => {
                    self.pos += 1;
                }
                Some(t) => {
                    let leading = if is_declaration_start(t) {
                        detach_doc(children)
                    } else {
                        Vec::new()
                    };
                    let statement = self.parse_statement(leading)?;
                    children.push(statement);
                    self.drain_hoisted(children);
                }
            }
        }
    }

    fn parse_statement(&mut self, leading: Vec<NodeRef>) -> Result<NodeRef, ParseError> {
        match self.peek_token() {
            Some(t) if is_declaration_start(t) => self.parse_declaration(leading),
            Some(Token::IfKw) => self.parse_if(),
            Some(Token::WhileKw) => self.parse_while(),
            Some(Token::ForKw) => self.parse_for(),
            Some(Token::ReturnKw) => self.parse_return(),
            _ => self.parse_expr(),
        }
    }

    fn parse_declaration(&mut self, leading: Vec<NodeRef>) -> Result<NodeRef, ParseError> {
        let mut children = leading;
        loop {
            self.skip_trivia();
            if self.peek_token() == Some(Token::Modifier) {
                children.push(self.bump());
            } else {
                break;
            }
        }
        match self.peek_token() {
            Some(Token::ValKw) | Some(Token::VarKw) => self.parse_property(children),
            Some(Token::FunKw) => self.parse_function(children),
            Some(Token::ClassKw) => self.parse_class(children),
            _ => Err(self.error("expected val, var, fun, or class after modifiers")),
        }
    }

    fn parse_property(&mut self, mut children: Vec<NodeRef>) -> Result<NodeRef, ParseError> {
        children.push(self.bump());
        children.push(self.expect(Token::Ident, "property name")?);
        self.skip_trivia();
        if self.peek_token() == Some(Token::Colon) {
            children.push(self.bump());
            children.push(self.parse_type()?);
            self.skip_trivia();
        }
        if self.peek_token() == Some(Token::Eq) {
            children.push(self.bump());
            children.push(self.parse_expr()?);
        }
        Ok(Node::composite(NodeKind::Property, children))
    }

    fn parse_function(&mut self, mut children: Vec<NodeRef>) -> Result<NodeRef, ParseError> {
        children.push(self.bump());
        children.push(self.expect(Token::Ident, "function name")?);
        children.push(self.parse_parameter_list()?);
        self.skip_trivia();
        if self.peek_token() == Some(Token::Colon) {
            children.push(self.bump());
            children.push(self.parse_type()?);
            self.skip_trivia();
        }
        match self.peek_token() {
            Some(Token::LBrace) => {
                children.push(self.parse_brace_list(NodeKind::Block)?);
            }
            Some(Token::Eq) => {
                children.push(self.bump());
                children.push(self.parse_expr()?);
            }
            _ => {}
        }
        Ok(Node::composite(NodeKind::Function, children))
    }

    fn parse_class(&mut self, mut children: Vec<NodeRef>) -> Result<NodeRef, ParseError> {
        children.push(self.bump());
        children.push(self.expect(Token::Ident, "class name")?);
        self.skip_trivia();
        if self.peek_token() == Some(Token::LParen) {
            children.push(self.parse_parameter_list()?);
            self.skip_trivia();
        }
        if self.peek_token() == Some(Token::LBrace) {
            children.push(self.parse_brace_list(NodeKind::ClassBody)?);
        }
        Ok(Node::composite(NodeKind::Class, children))
    }

    fn parse_parameter_list(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.expect(Token::LParen, "(")?];
        self.skip_trivia();
        if self.peek_token() != Some(Token::RParen) {
            loop {
                children.push(self.parse_parameter()?);
                self.skip_trivia();
                if self.peek_token() == Some(Token::Comma) {
                    let comma = self.bump();
                    self.skip_trivia();
                    if self.peek_token() == Some(Token::RParen) {
                        // Trailing comma: the scanners regenerate list
                        // punctuation, so it is dropped here.
                        break;
                    }
                    children.push(comma);
                } else {
                    break;
                }
            }
        }
        children.push(self.expect(Token::RParen, ")")?);
        Ok(Node::composite(NodeKind::ParameterList, children))
    }

    fn parse_parameter(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek_token() {
                Some(Token::Modifier) => children.push(self.bump()),
                Some(Token::ValKw) | Some(Token::VarKw) => {
                    children.push(self.bump());
                    break;
                }
                _ => break,
            }
        }
        children.push(self.expect(Token::Ident, "parameter name")?);
        children.push(self.expect(Token::Colon, ":")?);
        children.push(self.parse_type()?);
        self.skip_trivia();
        if self.peek_token() == Some(Token::Eq) {
            children.push(self.bump());
            children.push(self.parse_expr()?);
        }
        Ok(Node::composite(NodeKind::Parameter, children))
    }

    fn parse_type(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.expect(Token::Ident, "type name")?];
        loop {
            self.skip_trivia();
            if self.peek_token() == Some(Token::Dot) {
                children.push(self.bump());
                children.push(self.expect(Token::Ident, "type segment")?);
            } else {
                break;
            }
        }
        if self.peek_token() == Some(Token::Lt) {
            children.push(self.bump());
            loop {
                children.push(self.parse_type()?);
                self.skip_trivia();
                if self.peek_token() == Some(Token::Comma) {
                    children.push(self.bump());
                } else {
                    break;
                }
            }
            children.push(self.expect(Token::Gt, ">")?);
            self.skip_trivia();
        }
        if self.peek_token() == Some(Token::Question) {
            children.push(self.bump());
        }
        Ok(Node::composite(NodeKind::TypeReference, children))
    }

    fn parse_brace_list(&mut self, kind: NodeKind) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.expect(Token::LBrace, "{")?];
        self.parse_statement_list(&mut children, Some(Token::RBrace))?;
        children.push(self.expect(Token::RBrace, "}")?);
        Ok(Node::composite(kind, children))
    }

    fn parse_branch(&mut self) -> Result<NodeRef, ParseError> {
        self.skip_trivia();
        if self.peek_token() == Some(Token::LBrace) {
            self.parse_brace_list(NodeKind::Block)
        } else {
            self.parse_statement(Vec::new())
        }
    }

    fn parse_if(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        children.push(self.expect(Token::LParen, "(")?);
        children.push(self.parse_expr()?);
        children.push(self.expect(Token::RParen, ")")?);
        children.push(self.parse_branch()?);
        let mark = self.pos;
        let hoisted_mark = self.hoisted.len();
        self.skip_trivia();
        if self.peek_token() == Some(Token::ElseKw) {
            children.push(self.bump());
            self.skip_trivia();
            if self.peek_token() == Some(Token::IfKw) {
                children.push(self.parse_if()?);
            } else {
                children.push(self.parse_branch()?);
            }
        } else {
            self.pos = mark;
            self.hoisted.truncate(hoisted_mark);
        }
        Ok(Node::composite(NodeKind::If, children))
    }

    fn parse_while(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        children.push(self.expect(Token::LParen, "(")?);
        children.push(self.parse_expr()?);
        children.push(self.expect(Token::RParen, ")")?);
        children.push(self.parse_branch()?);
        Ok(Node::composite(NodeKind::While, children))
    }

    fn parse_for(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        children.push(self.expect(Token::LParen, "(")?);
        children.push(self.expect(Token::Ident, "loop variable")?);
        children.push(self.expect(Token::InKw, "in")?);
        children.push(self.parse_expr()?);
        children.push(self.expect(Token::RParen, ")")?);
        children.push(self.parse_branch()?);
        Ok(Node::composite(NodeKind::For, children))
    }

    fn parse_return(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.bump()];
        // A value must start on the same line as the keyword.
        let mut i = self.pos;
        let mut saw_newline = false;
        while let Some((t, span)) = self.tokens.get(i) {
            if t.is_trivia() {
                if *t == Token::Whitespace && self.source[span.clone()].contains('\n') {
                    saw_newline = true;
                }
                i += 1;
            } else {
                break;
            }
        }
        let next = self.tokens.get(i).map(|(t, _)| *t);
        let bare = saw_newline
            || matches!(next, None | Some(Token::RBrace) | Some(Token::Semicolon));
        if !bare {
            children.push(self.parse_expr()?);
        }
        Ok(Node::composite(NodeKind::Return, children))
    }

    // ===== expressions =====

    fn parse_expr(&mut self) -> Result<NodeRef, ParseError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<NodeRef, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.skip_trivia();
            let precedence = match self.peek_token().and_then(|t| t.binary_precedence()) {
                Some(p) if p >= min_precedence => p,
                _ => break,
            };
            let op = self.bump();
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Node::composite(NodeKind::Binary, vec![lhs, op, rhs]);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeRef, ParseError> {
        self.skip_trivia();
        match self.peek_token() {
            Some(Token::Bang) | Some(Token::Minus) => {
                let op = self.bump();
                let operand = self.parse_unary()?;
                Ok(Node::composite(NodeKind::Unary, vec![op, operand]))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<NodeRef, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            let mark = self.pos;
            let hoisted_mark = self.hoisted.len();
            let saw_newline = self.skip_trivia();
            match self.peek_token() {
                Some(Token::Dot) => {
                    let dot = self.bump();
                    let selector = self.expect(Token::Ident, "selector")?;
                    expr = Node::composite(NodeKind::DotQualified, vec![expr, dot, selector]);
                }
                Some(Token::SafeDot) => {
                    let dot = self.bump();
                    let selector = self.expect(Token::Ident, "selector")?;
                    expr = Node::composite(NodeKind::SafeAccess, vec![expr, dot, selector]);
                }
                // A '(' on a later line starts a new statement, not a call.
                Some(Token::LParen) if !saw_newline => {
                    let arguments = self.parse_argument_list()?;
                    expr = Node::composite(NodeKind::Call, vec![expr, arguments]);
                }
                _ => {
                    self.pos = mark;
                    self.hoisted.truncate(hoisted_mark);
                    break;
                }
            }
        }
        Ok(expr)
    }

    fn parse_argument_list(&mut self) -> Result<NodeRef, ParseError> {
        let mut children = vec![self.expect(Token::LParen, "(")?];
        self.skip_trivia();
        if self.peek_token() != Some(Token::RParen) {
            loop {
                let value = self.parse_expr()?;
                children.push(Node::composite(NodeKind::Argument, vec![value]));
                self.skip_trivia();
                if self.peek_token() == Some(Token::Comma) {
                    let comma = self.bump();
                    self.skip_trivia();
                    if self.peek_token() == Some(Token::RParen) {
                        break;
                    }
                    children.push(comma);
                } else {
                    break;
                }
            }
        }
        children.push(self.expect(Token::RParen, ")")?);
        Ok(Node::composite(NodeKind::ArgumentList, children))
    }

    fn parse_primary(&mut self) -> Result<NodeRef, ParseError> {
        self.skip_trivia();
        match self.peek_token() {
            Some(Token::Ident) | Some(Token::Number) => Ok(self.bump()),
            Some(Token::MultilineString) => Ok(self.bump()),
            Some(Token::StringTemplate) => self.parse_string_template(),
            Some(Token::LParen) => {
                let lparen = self.bump();
                let inner = self.parse_expr()?;
                let rparen = self.expect(Token::RParen, ")")?;
                Ok(Node::composite(NodeKind::Paren, vec![lparen, inner, rparen]))
            }
            Some(t) => Err(self.error(format!("expected expression, found {:?}", t))),
            None => Err(self.error("expected expression, found end of input")),
        }
    }

    fn parse_string_template(&mut self) -> Result<NodeRef, ParseError> {
        let (_, span) = self.tokens[self.pos].clone();
        let line = self.line_of(span.start);
        let raw = &self.source[span.clone()];
        self.pos += 1;
        // Strip the delimiting quotes; entries cover the body only.
        let body = &raw[1..raw.len() - 1];
        let mut children = Vec::new();
        for (is_interpolation, text) in split_template(body) {
            let kind = if is_interpolation {
                NodeKind::Interpolation
            } else {
                NodeKind::LiteralEntry
            };
            children.push(Node::leaf(kind, text, line));
        }
        Ok(std::rc::Rc::new(Node {
            kind: NodeKind::StringTemplate,
            text: String::new(),
            children,
            line,
        }))
    }
}

fn is_declaration_start(token: Token) -> bool {
    matches!(
        token,
        Token::Modifier | Token::ValKw | Token::VarKw | Token::FunKw | Token::ClassKw
    )
}

/// Pull a trailing doc comment (and the single newline after it) out of a
/// statement list so it can lead the declaration it documents.
fn detach_doc(children: &mut Vec<NodeRef>) -> Vec<NodeRef> {
    let n = children.len();
    let take = if n >= 1 && children[n - 1].kind == NodeKind::KDoc {
        1
    } else if n >= 2
        && children[n - 2].kind == NodeKind::KDoc
        && children[n - 1].kind == NodeKind::Whitespace
        && children[n - 1].newline_count() <= 1
    {
        2
    } else {
        0
    };
    children.split_off(n - take)
}

/// Split a string-template body into literal and interpolation entries.
/// Escape sequences stay verbatim inside literal entries.
fn split_template(body: &str) -> Vec<(bool, String)> {
    let chars: Vec<(usize, char)> = body.char_indices().collect();
    let mut entries = Vec::new();
    let mut literal = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '\\' => {
                literal.push(c);
                if let Some(&(_, escaped)) = chars.get(i + 1) {
                    literal.push(escaped);
                }
                i += 2;
            }
            '$' => {
                let next = chars.get(i + 1).map(|&(_, c)| c);
                if next == Some('{') {
                    let end = scan_interpolation(body, offset);
                    if !literal.is_empty() {
                        entries.push((false, std::mem::take(&mut literal)));
                    }
                    entries.push((true, body[offset..end].to_string()));
                    while i < chars.len() && chars[i].0 < end {
                        i += 1;
                    }
                } else if next.map(|c| c.is_alphabetic() || c == '_') == Some(true) {
                    let mut j = i + 1;
                    while j < chars.len() && (chars[j].1.is_alphanumeric() || chars[j].1 == '_') {
                        j += 1;
                    }
                    let end = chars.get(j).map(|&(o, _)| o).unwrap_or(body.len());
                    if !literal.is_empty() {
                        entries.push((false, std::mem::take(&mut literal)));
                    }
                    entries.push((true, body[offset..end].to_string()));
                    i = j;
                } else {
                    literal.push(c);
                    i += 1;
                }
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        entries.push((false, literal));
    }
    entries
}

/// Byte offset just past the `}` matching the `${` at `start`.
fn scan_interpolation(body: &str, start: usize) -> usize {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            b'"' => {
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
            _ => i += 1,
        }
    }
    body.len()
}
