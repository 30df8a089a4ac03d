//! Pattern builder DSL
//!
//! Scanners describe the child sequences they accept with a small builder
//! vocabulary: element matchers (`node_of_type`, `any_node`,
//! `possible_whitespace`), quantifiers in greedy and frugal flavors,
//! ordered alternatives (`either`), and actions (`then_map_to_tokens`,
//! `then_map_tokens`). `build`/`node_pattern` compiles the element list
//! into the arena NFA the matcher runs.
//!
//! Compilation threads immutable fragments: every element gets an entry and
//! an exit state, sequences chain exits to entries with ε-transitions, and
//! quantifiers loop back by index, which is what lets a fragment reference
//! itself without cyclic ownership.

use super::matcher::{Effect, NodeAction, NodePattern, PatternState, Predicate, StateId, TokenMap};
use super::ScanError;
use super::ScanContext;
use crate::tokens::Token;
use kotfmt_syntax::{NodeKind, NodeRef};
use std::rc::Rc;

enum Element {
    Match(Predicate),
    Group(Vec<Element>),
    ZeroOrOne { inner: Vec<Element>, frugal: bool },
    ZeroOrMore { inner: Vec<Element>, frugal: bool },
    OneOrMore { inner: Vec<Element>, frugal: bool },
    Either { first: Vec<Element>, second: Vec<Element> },
    MapNodes(NodeAction),
    TokenMap { inner: Box<Element>, map: TokenMap },
    End,
}

/// Builds one [`NodePattern`]. See [`node_pattern`].
#[derive(Default)]
pub struct PatternBuilder {
    elements: Vec<Element>,
}

impl PatternBuilder {
    /// Accept exactly one child of the given kind.
    pub fn node_of_type(&mut self, kind: NodeKind) -> &mut Self {
        self.elements.push(Element::Match(Predicate::Kind(kind)));
        self
    }

    /// Accept any one child.
    pub fn any_node(&mut self) -> &mut Self {
        self.elements.push(Element::Match(Predicate::Any));
        self
    }

    /// Optionally accept a whitespace child.
    pub fn possible_whitespace(&mut self) -> &mut Self {
        self.elements.push(Element::ZeroOrOne {
            inner: vec![Element::Match(Predicate::Whitespace)],
            frugal: false,
        });
        self
    }

    /// Group a sub-sequence; useful as the target of `then_map_tokens`.
    pub fn exactly_one(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::Group(Self::nested(build)));
        self
    }

    pub fn zero_or_one(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::ZeroOrOne {
            inner: Self::nested(build),
            frugal: false,
        });
        self
    }

    pub fn zero_or_one_frugal(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::ZeroOrOne {
            inner: Self::nested(build),
            frugal: true,
        });
        self
    }

    pub fn zero_or_more(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::ZeroOrMore {
            inner: Self::nested(build),
            frugal: false,
        });
        self
    }

    pub fn zero_or_more_frugal(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::ZeroOrMore {
            inner: Self::nested(build),
            frugal: true,
        });
        self
    }

    pub fn one_or_more(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::OneOrMore {
            inner: Self::nested(build),
            frugal: false,
        });
        self
    }

    pub fn one_or_more_frugal(&mut self, build: impl FnOnce(&mut PatternBuilder)) -> &mut Self {
        self.elements.push(Element::OneOrMore {
            inner: Self::nested(build),
            frugal: true,
        });
        self
    }

    /// Ordered alternatives: the first accepting branch wins.
    pub fn either(
        &mut self,
        first: impl FnOnce(&mut PatternBuilder),
        second: impl FnOnce(&mut PatternBuilder),
    ) -> &mut Self {
        self.elements.push(Element::Either {
            first: Self::nested(first),
            second: Self::nested(second),
        });
        self
    }

    /// Attach an action over the nodes matched since the previous action.
    pub fn then_map_to_tokens(
        &mut self,
        action: impl Fn(&ScanContext<'_>, &[NodeRef]) -> Result<Vec<Token>, ScanError> + 'static,
    ) -> &mut Self {
        self.elements.push(Element::MapNodes(Rc::new(action)));
        self
    }

    /// Alias of [`Self::then_map_to_tokens`] for mid-pattern actions.
    pub fn and_then(
        &mut self,
        action: impl Fn(&ScanContext<'_>, &[NodeRef]) -> Result<Vec<Token>, ScanError> + 'static,
    ) -> &mut Self {
        self.then_map_to_tokens(action)
    }

    /// Transform the tokens produced by the immediately preceding element.
    pub fn then_map_tokens(&mut self, map: impl Fn(Vec<Token>) -> Vec<Token> + 'static) -> &mut Self {
        let inner = self
            .elements
            .pop()
            .expect("then_map_tokens requires a preceding element");
        self.elements.push(Element::TokenMap {
            inner: Box::new(inner),
            map: Rc::new(map),
        });
        self
    }

    /// Require end-of-sequence. Every pattern finishes with this.
    pub fn end(&mut self) -> &mut Self {
        self.elements.push(Element::End);
        self
    }

    fn nested(build: impl FnOnce(&mut PatternBuilder)) -> Vec<Element> {
        let mut builder = PatternBuilder::default();
        build(&mut builder);
        builder.elements
    }

    /// Compile the accumulated elements into an automaton.
    pub fn build(self) -> NodePattern {
        let mut states: Vec<PatternState> = vec![PatternState::default()];
        let _exit = compile_sequence(&mut states, 0, &self.elements);
        NodePattern { states, initial: 0 }
    }
}

/// Build a pattern in one expression.
pub fn node_pattern(build: impl FnOnce(&mut PatternBuilder)) -> NodePattern {
    let mut builder = PatternBuilder::default();
    build(&mut builder);
    builder.build()
}

fn new_state(states: &mut Vec<PatternState>) -> StateId {
    states.push(PatternState::default());
    states.len() - 1
}

fn compile_sequence(states: &mut Vec<PatternState>, entry: StateId, elements: &[Element]) -> StateId {
    let mut cursor = entry;
    for element in elements {
        cursor = compile_element(states, cursor, element);
    }
    cursor
}

fn compile_element(states: &mut Vec<PatternState>, entry: StateId, element: &Element) -> StateId {
    match element {
        Element::Match(predicate) => {
            let exit = new_state(states);
            states[entry].edges.push((predicate.clone(), exit));
            exit
        }
        Element::Group(inner) => compile_sequence(states, entry, inner),
        Element::ZeroOrOne { inner, frugal } => {
            let inner_entry = new_state(states);
            let exit = new_state(states);
            if *frugal {
                states[entry].epsilon.push(exit);
                states[entry].epsilon.push(inner_entry);
            } else {
                states[entry].epsilon.push(inner_entry);
                states[entry].epsilon.push(exit);
            }
            let inner_exit = compile_sequence(states, inner_entry, inner);
            states[inner_exit].epsilon.push(exit);
            exit
        }
        Element::ZeroOrMore { inner, frugal } => {
            let junction = new_state(states);
            let inner_entry = new_state(states);
            let exit = new_state(states);
            states[entry].epsilon.push(junction);
            if *frugal {
                states[junction].epsilon.push(exit);
                states[junction].epsilon.push(inner_entry);
            } else {
                states[junction].epsilon.push(inner_entry);
                states[junction].epsilon.push(exit);
            }
            let inner_exit = compile_sequence(states, inner_entry, inner);
            states[inner_exit].epsilon.push(junction);
            exit
        }
        Element::OneOrMore { inner, frugal } => {
            let inner_entry = new_state(states);
            let junction = new_state(states);
            let exit = new_state(states);
            states[entry].epsilon.push(inner_entry);
            let inner_exit = compile_sequence(states, inner_entry, inner);
            states[inner_exit].epsilon.push(junction);
            if *frugal {
                states[junction].epsilon.push(exit);
                states[junction].epsilon.push(inner_entry);
            } else {
                states[junction].epsilon.push(inner_entry);
                states[junction].epsilon.push(exit);
            }
            exit
        }
        Element::Either { first, second } => {
            let first_entry = new_state(states);
            let second_entry = new_state(states);
            let exit = new_state(states);
            states[entry].epsilon.push(first_entry);
            states[entry].epsilon.push(second_entry);
            let first_exit = compile_sequence(states, first_entry, first);
            states[first_exit].epsilon.push(exit);
            let second_exit = compile_sequence(states, second_entry, second);
            states[second_exit].epsilon.push(exit);
            exit
        }
        Element::MapNodes(action) => {
            let exit = new_state(states);
            states[exit].effect = Some(Effect::MapNodes(action.clone()));
            states[entry].epsilon.push(exit);
            exit
        }
        Element::TokenMap { inner, map } => {
            let push = new_state(states);
            states[push].effect = Some(Effect::PushFrame);
            states[entry].epsilon.push(push);
            let inner_exit = compile_element(states, push, inner);
            let pop = new_state(states);
            states[pop].effect = Some(Effect::PopFrame(map.clone()));
            states[inner_exit].epsilon.push(pop);
            pop
        }
        Element::End => {
            let exit = new_state(states);
            states[exit].terminal = true;
            states[entry].edges.push((Predicate::Terminal, exit));
            exit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::TreeScanner;
    use kotfmt_syntax::Node;

    fn ident(text: &str) -> NodeRef {
        Node::leaf(NodeKind::Identifier, text, 1)
    }

    fn ws(text: &str) -> NodeRef {
        Node::leaf(NodeKind::Whitespace, text, 1)
    }

    fn run(pattern: &NodePattern, nodes: &[NodeRef]) -> Result<Vec<Token>, ScanError> {
        let registry = TreeScanner::with_defaults();
        let ctx = registry.context();
        pattern.matches(nodes, &ctx)
    }

    fn texts(nodes: &[NodeRef]) -> Vec<Token> {
        nodes
            .iter()
            .filter(|n| !n.is_whitespace())
            .map(|n| Token::leaf(&n.text))
            .collect()
    }

    #[test]
    fn single_node_with_action() {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::Identifier);
            b.then_map_to_tokens(|_, nodes| Ok(texts(nodes)));
            b.end();
        });
        let tokens = run(&pattern, &[ident("x")]).expect("matches");
        assert_eq!(tokens, vec![Token::leaf("x")]);
    }

    #[test]
    fn no_match_reports_kinds() {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::Identifier);
            b.end();
        });
        let err = run(&pattern, &[ws(" ")]).expect_err("no match");
        let ScanError::NoMatch { kinds, .. } = err;
        assert_eq!(kinds, vec![NodeKind::Whitespace]);
    }

    #[test]
    fn missing_end_of_sequence_fails() {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::Identifier);
            b.end();
        });
        assert!(run(&pattern, &[ident("x"), ident("y")]).is_err());
    }

    #[test]
    fn zero_or_more_collects_all() {
        let pattern = node_pattern(|b| {
            b.zero_or_more(|b| {
                b.any_node();
            });
            b.then_map_to_tokens(|_, nodes| Ok(texts(nodes)));
            b.end();
        });
        let tokens = run(&pattern, &[ident("a"), ident("b"), ident("c")]).expect("matches");
        assert_eq!(tokens.len(), 3);
        assert!(run(&pattern, &[]).expect("empty matches").is_empty());
    }

    #[test]
    fn either_prefers_first_branch() {
        let pattern = node_pattern(|b| {
            b.either(
                |b| {
                    b.any_node();
                    b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("first")]));
                },
                |b| {
                    b.node_of_type(NodeKind::Identifier);
                    b.then_map_to_tokens(|_, _| Ok(vec![Token::leaf("second")]));
                },
            );
            b.end();
        });
        let tokens = run(&pattern, &[ident("x")]).expect("matches");
        assert_eq!(tokens, vec![Token::leaf("first")]);
    }

    #[test]
    fn greedy_and_frugal_split_differently() {
        // Greedy: the quantifier eats both identifiers; the trailing
        // any_node must take the whitespace.
        let greedy = node_pattern(|b| {
            b.zero_or_more(|b| {
                b.any_node();
            });
            b.then_map_to_tokens(|_, nodes| Ok(vec![Token::leaf(nodes.len().to_string())]));
            b.any_node();
            b.then_map_to_tokens(|_, _| Ok(vec![]));
            b.end();
        });
        let tokens = run(&greedy, &[ident("a"), ident("b"), ws(" ")]).expect("matches");
        assert_eq!(tokens, vec![Token::leaf("2")]);

        // Frugal: the quantifier stops as early as the rest of the pattern
        // allows.
        let frugal = node_pattern(|b| {
            b.zero_or_more_frugal(|b| {
                b.any_node();
            });
            b.then_map_to_tokens(|_, nodes| Ok(vec![Token::leaf(nodes.len().to_string())]));
            b.zero_or_more(|b| {
                b.any_node();
            });
            b.then_map_to_tokens(|_, _| Ok(vec![]));
            b.end();
        });
        let tokens = run(&frugal, &[ident("a"), ident("b")]).expect("matches");
        assert_eq!(tokens, vec![Token::leaf("0")]);
    }

    #[test]
    fn token_map_wraps_group_output() {
        let pattern = node_pattern(|b| {
            b.exactly_one(|b| {
                b.one_or_more(|b| {
                    b.any_node();
                });
                b.then_map_to_tokens(|_, nodes| Ok(texts(nodes)));
            });
            b.then_map_tokens(|tokens| {
                let mut out = vec![Token::leaf("<")];
                out.extend(tokens);
                out.push(Token::leaf(">"));
                out
            });
            b.end();
        });
        let tokens = run(&pattern, &[ident("a"), ident("b")]).expect("matches");
        assert_eq!(
            tokens,
            vec![
                Token::leaf("<"),
                Token::leaf("a"),
                Token::leaf("b"),
                Token::leaf(">")
            ]
        );
    }

    #[test]
    fn possible_whitespace_is_optional() {
        let pattern = node_pattern(|b| {
            b.node_of_type(NodeKind::Identifier);
            b.possible_whitespace();
            b.node_of_type(NodeKind::Identifier);
            b.then_map_to_tokens(|_, nodes| Ok(texts(nodes)));
            b.end();
        });
        assert!(run(&pattern, &[ident("a"), ws(" "), ident("b")]).is_ok());
        assert!(run(&pattern, &[ident("a"), ident("b")]).is_ok());
    }
}
