//! Token preprocessor
//!
//! Single pass between the scanners and the printer. Resolves everything
//! the printer must not have to look ahead for:
//!
//! - block flat lengths (`Begin.length`), with `End` sinking past trailing
//!   leaves so the length covers closing delimiters,
//! - whitespace candidate lengths (content plus the following non-breaking
//!   run, a directly following block counting its whole flat length),
//! - promotion of synchronized breaks to forced breaks in blocks that
//!   already contain a forced break or newline-bearing documentation,
//! - the `Marker` / `BlockFromMarker` / `BlockFromLastForcedBreak`
//!   directives, rewritten into ordinary `Begin(Code)…End` spans,
//! - whitespace ahead of comment blocks, turned into forced breaks when the
//!   original run had newlines.
//!
//! The stack holds tagged elements: open blocks, one pending whitespace
//! candidate buffering its following run, and marker positions. `End`
//! effects are counted and applied lazily rather than popped mid-iteration.

use crate::tokens::{display_width, State, Token};

enum StackElement {
    Block { state: State, tokens: Vec<Token> },
    Whitespace { content: String, tokens: Vec<Token> },
    Marker { tokens: Vec<Token> },
}

pub struct TokenPreprocessor {
    stack: Vec<StackElement>,
    deferred_ends: usize,
}

impl Default for TokenPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenPreprocessor {
    pub fn new() -> Self {
        TokenPreprocessor {
            stack: vec![StackElement::Block {
                state: State::Code,
                tokens: Vec::new(),
            }],
            deferred_ends: 0,
        }
    }

    /// Run the pass. The result contains no markers or directives, and
    /// every `Begin`/`Whitespace` carries its resolved length.
    pub fn preprocess(mut self, tokens: Vec<Token>) -> Vec<Token> {
        for token in tokens {
            self.step(token);
        }
        self.flush_deferred_ends();
        while self.stack.len() > 1 {
            match self.stack.last() {
                Some(StackElement::Whitespace { .. }) => self.flush_whitespace(),
                Some(StackElement::Marker { .. }) => self.collapse_marker(),
                _ => self.end_block(),
            }
        }
        match self.stack.pop() {
            Some(StackElement::Block { tokens, .. }) => tokens,
            _ => Vec::new(),
        }
    }

    fn step(&mut self, token: Token) {
        match token {
            // Leaves sink under deferred Ends so trailing delimiters count
            // into the closing block's length.
            Token::Leaf(_) | Token::KDocContent(_) => self.append(token),
            Token::End => self.deferred_ends += 1,
            other => {
                self.flush_deferred_ends();
                self.handle(other);
            }
        }
    }

    fn handle(&mut self, token: Token) {
        match token {
            Token::Begin { state, .. } => self.stack.push(StackElement::Block {
                state,
                tokens: Vec::new(),
            }),
            Token::Whitespace { content, .. } => self.push_whitespace(content),
            Token::SynchronizedBreak { .. } | Token::ClosingSynchronizedBreak { .. } => {
                self.flush_whitespace();
                if !self.last_is_forced_break() {
                    self.append(token);
                }
            }
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak => {
                self.flush_whitespace();
                self.append(token);
            }
            Token::Marker => self.stack.push(StackElement::Marker { tokens: Vec::new() }),
            Token::BlockFromMarker => self.block_from_marker(),
            Token::BlockFromLastForcedBreak => self.block_from_last_forced_break(),
            // Leaf / KDocContent / End are routed in `step`.
            other => self.append(other),
        }
    }

    fn append(&mut self, token: Token) {
        match self
            .stack
            .last_mut()
            .expect("preprocessor stack always holds the root block")
        {
            StackElement::Block { tokens, .. }
            | StackElement::Whitespace { tokens, .. }
            | StackElement::Marker { tokens } => tokens.push(token),
        }
    }

    fn last_is_forced_break(&self) -> bool {
        let tokens = match self.stack.last() {
            Some(StackElement::Block { tokens, .. })
            | Some(StackElement::Whitespace { tokens, .. })
            | Some(StackElement::Marker { tokens }) => tokens,
            None => return false,
        };
        tokens.last().map(Token::is_forced_break).unwrap_or(false)
    }

    /// Candidate dedup: a candidate directly after another collapses into
    /// it, the latter content winning when non-empty.
    fn push_whitespace(&mut self, content: String) {
        if let Some(StackElement::Whitespace {
            content: previous,
            tokens,
        }) = self.stack.last_mut()
        {
            if tokens.is_empty() {
                if !content.is_empty() {
                    *previous = content;
                }
                return;
            }
        }
        self.flush_whitespace();
        self.stack.push(StackElement::Whitespace {
            content,
            tokens: Vec::new(),
        });
    }

    /// Resolve the pending candidate: its length covers the content plus
    /// the buffered run.
    fn flush_whitespace(&mut self) {
        if !matches!(self.stack.last(), Some(StackElement::Whitespace { .. })) {
            return;
        }
        if let Some(StackElement::Whitespace { content, tokens }) = self.stack.pop() {
            let length = display_width(&content) + run_width(&tokens);
            self.append(Token::Whitespace { content, length });
            for token in tokens {
                self.append(token);
            }
        }
    }

    /// An unresolved marker at block end degrades to its plain tokens.
    fn collapse_marker(&mut self) {
        if let Some(StackElement::Marker { tokens }) = self.stack.pop() {
            for token in tokens {
                self.append(token);
            }
        }
    }

    fn flush_deferred_ends(&mut self) {
        while self.deferred_ends > 0 {
            self.deferred_ends -= 1;
            self.end_block();
        }
    }

    fn end_block(&mut self) {
        loop {
            match self.stack.last() {
                Some(StackElement::Whitespace { .. }) => self.flush_whitespace(),
                Some(StackElement::Marker { .. }) => self.collapse_marker(),
                _ => break,
            }
        }
        if self.stack.len() == 1 {
            return;
        }
        if let Some(StackElement::Block { state, tokens }) = self.stack.pop() {
            let tokens = promote_breaks(state, tokens);
            let length = flat_width(&tokens);
            self.emit_block(state, length, tokens);
        }
    }

    /// Emit a completed `Begin … End` span into the parent element. A
    /// pending whitespace candidate below resolves here: either its length
    /// absorbs the block's flat length, or, for newline-bearing content
    /// ahead of a comment block, it becomes a forced break.
    fn emit_block(&mut self, state: State, length: usize, tokens: Vec<Token>) {
        if matches!(self.stack.last(), Some(StackElement::Whitespace { .. })) {
            if let Some(StackElement::Whitespace {
                content,
                tokens: buffered,
            }) = self.stack.pop()
            {
                if state.is_comment() && content.contains('\n') {
                    let count = if content.matches('\n').count() >= 2 { 2 } else { 1 };
                    self.append(Token::ForcedBreak { count });
                    for token in buffered {
                        self.append(token);
                    }
                } else {
                    let ws_length = display_width(&content) + run_width(&buffered) + length;
                    self.append(Token::Whitespace {
                        content,
                        length: ws_length,
                    });
                    for token in buffered {
                        self.append(token);
                    }
                }
            }
        }
        self.append(Token::Begin { state, length });
        for token in tokens {
            self.append(token);
        }
        self.append(Token::End);
    }

    /// Wrap everything since the nearest marker (or the whole current
    /// block, when no marker remains) in a synthetic `Begin(Code)…End`.
    ///
    /// The synthetic block is pushed back open with a deferred `End`, so
    /// it closes through the ordinary machinery: trailing leaves emitted
    /// after the directive still sink into it and count into its length.
    fn block_from_marker(&mut self) {
        let mut suffix: Vec<Token> = Vec::new();
        loop {
            match self.stack.last() {
                Some(StackElement::Whitespace { .. }) => {
                    if let Some(StackElement::Whitespace { content, tokens }) = self.stack.pop() {
                        let length = display_width(&content) + run_width(&tokens);
                        let mut run = vec![Token::Whitespace { content, length }];
                        run.extend(tokens);
                        run.extend(suffix);
                        suffix = run;
                    }
                }
                Some(StackElement::Marker { .. }) => {
                    if let Some(StackElement::Marker { mut tokens }) = self.stack.pop() {
                        tokens.extend(suffix);
                        suffix = tokens;
                    }
                    break;
                }
                _ => {
                    if let Some(StackElement::Block { state, mut tokens }) = self.stack.pop() {
                        tokens.extend(suffix);
                        suffix = tokens;
                        self.stack.push(StackElement::Block {
                            state,
                            tokens: Vec::new(),
                        });
                    }
                    break;
                }
            }
        }
        self.stack.push(StackElement::Block {
            state: State::Code,
            tokens: suffix,
        });
        self.deferred_ends += 1;
    }

    /// Same as [`Self::block_from_marker`], keyed on the last depth-0
    /// forced break of the current block; forced breaks act as implicit
    /// markers. With no forced break the block wraps from its beginning.
    fn block_from_last_forced_break(&mut self) {
        loop {
            match self.stack.last() {
                Some(StackElement::Whitespace { .. }) => self.flush_whitespace(),
                Some(StackElement::Marker { .. }) => self.collapse_marker(),
                _ => break,
            }
        }
        let suffix = match self.stack.last_mut() {
            Some(StackElement::Block { tokens, .. }) => {
                let split = last_forced_break_index(tokens).map(|i| i + 1).unwrap_or(0);
                tokens.split_off(split)
            }
            _ => Vec::new(),
        };
        if suffix.is_empty() {
            return;
        }
        self.stack.push(StackElement::Block {
            state: State::Code,
            tokens: suffix,
        });
        self.deferred_ends += 1;
    }
}

/// Width of a whitespace candidate's buffered run (leaves and completed
/// block contents, never break candidates).
fn run_width(tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    let mut width = 0usize;
    for token in tokens {
        match token {
            Token::Begin { length, .. } => {
                if depth == 0 {
                    width += length;
                }
                depth += 1;
            }
            Token::End => depth = depth.saturating_sub(1),
            other => {
                if depth == 0 {
                    width += other.width();
                }
            }
        }
    }
    width
}

/// Flat width of a block body: depth-0 token widths, nested spans counted
/// through their `Begin.length`.
fn flat_width(tokens: &[Token]) -> usize {
    run_width(tokens)
}

fn last_forced_break_index(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    let mut last = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth = depth.saturating_sub(1),
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak => {
                if depth == 0 {
                    last = Some(i);
                }
            }
            _ => {}
        }
    }
    last
}

/// If a block's depth-0 content already contains a forced break (or
/// multi-line documentation), every depth-0 synchronized break becomes a
/// forced one, so the block breaks consistently.
fn promote_breaks(state: State, tokens: Vec<Token>) -> Vec<Token> {
    if !state.promotes_breaks() {
        return tokens;
    }
    let mut depth = 0usize;
    let mut must_break = false;
    for token in &tokens {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth = depth.saturating_sub(1),
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak => {
                if depth == 0 {
                    must_break = true;
                }
            }
            Token::KDocContent(text) => {
                if depth == 0 && text.contains('\n') {
                    must_break = true;
                }
            }
            _ => {}
        }
    }
    if !must_break {
        return tokens;
    }
    let mut depth = 0usize;
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let rewritten = match &token {
            Token::Begin { .. } => {
                depth += 1;
                token
            }
            Token::End => {
                depth = depth.saturating_sub(1);
                token
            }
            Token::SynchronizedBreak { .. } if depth == 0 => Token::ForcedBreak { count: 1 },
            Token::ClosingSynchronizedBreak { .. } if depth == 0 => Token::ClosingForcedBreak,
            _ => token,
        };
        out.push(rewritten);
    }
    out
}
