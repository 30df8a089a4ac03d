//! Node-pattern automaton
//!
//! A compiled pattern is a small NFA over arena-allocated states. Matching
//! runs all alternatives in parallel as a frontier of *paths*; each path is
//! a reference-counted spine link back to its predecessor, so abandoning a
//! branch costs nothing and no tokens are produced for it. Only the winning
//! path is replayed, front to back, running the actions its states carry.
//!
//! Priority is positional: ε-successors are explored depth-first in the
//! order the builder registered them, and the frontier keeps the first path
//! that reaches any given state. That single rule implements both ordered
//! `either` alternatives and the greedy/frugal quantifier variants.

use super::{ScanContext, ScanError};
use crate::tokens::Token;
use kotfmt_syntax::{Node, NodeKind, NodeRef};
use std::collections::HashSet;
use std::rc::Rc;

/// Action over the nodes matched since the previous action.
pub type NodeAction =
    Rc<dyn Fn(&ScanContext<'_>, &[NodeRef]) -> Result<Vec<Token>, ScanError>>;

/// Transform over the tokens produced by a group.
pub type TokenMap = Rc<dyn Fn(Vec<Token>) -> Vec<Token>>;

/// Guard on a consuming transition.
#[derive(Clone)]
pub(crate) enum Predicate {
    Kind(NodeKind),
    /// Any real node (never the synthetic terminal).
    Any,
    Whitespace,
    Terminal,
}

impl Predicate {
    fn accepts(&self, node: &Node) -> bool {
        match self {
            Predicate::Kind(kind) => node.kind == *kind,
            Predicate::Any => node.kind != NodeKind::Terminal,
            Predicate::Whitespace => node.kind == NodeKind::Whitespace,
            Predicate::Terminal => node.kind == NodeKind::Terminal,
        }
    }
}

/// Replay-time effect attached to a state.
#[derive(Clone)]
pub(crate) enum Effect {
    /// Open a group frame (token transforms are group-scoped).
    PushFrame,
    /// Close the group frame, mapping its tokens into the parent.
    PopFrame(TokenMap),
    /// Flush the pending matched nodes through an action.
    MapNodes(NodeAction),
}

pub(crate) type StateId = usize;

#[derive(Default)]
pub(crate) struct PatternState {
    /// ε-successors in priority order.
    pub(crate) epsilon: Vec<StateId>,
    /// Consuming transitions in priority order.
    pub(crate) edges: Vec<(Predicate, StateId)>,
    pub(crate) terminal: bool,
    pub(crate) effect: Option<Effect>,
}

/// One branch of the frontier: the state entered, the node consumed on the
/// way in (none for ε-steps), and the predecessor step.
struct PathStep {
    prev: Option<Rc<PathStep>>,
    state: StateId,
    node: Option<NodeRef>,
}

/// A compiled node pattern.
pub struct NodePattern {
    pub(crate) states: Vec<PatternState>,
    pub(crate) initial: StateId,
}

impl NodePattern {
    /// Match a child sequence, producing the accepting path's tokens.
    ///
    /// The synthetic terminal node is appended here; patterns accept it via
    /// `end()`.
    pub fn matches(
        &self,
        nodes: &[NodeRef],
        ctx: &ScanContext<'_>,
    ) -> Result<Vec<Token>, ScanError> {
        let no_match = || ScanError::NoMatch {
            line: nodes.first().map(|n| n.line).unwrap_or(0),
            kinds: nodes.iter().map(|n| n.kind).collect(),
        };

        let mut frontier = vec![Rc::new(PathStep {
            prev: None,
            state: self.initial,
            node: None,
        })];

        let terminal = Node::terminal();
        let sequence = nodes.iter().chain(std::iter::once(&terminal));
        for node in sequence {
            frontier = self.closure(frontier);
            let mut next: Vec<Rc<PathStep>> = Vec::new();
            let mut seen: HashSet<StateId> = HashSet::new();
            for path in &frontier {
                for (predicate, target) in &self.states[path.state].edges {
                    if predicate.accepts(node) && seen.insert(*target) {
                        next.push(Rc::new(PathStep {
                            prev: Some(path.clone()),
                            state: *target,
                            node: Some(node.clone()),
                        }));
                    }
                }
            }
            if next.is_empty() {
                return Err(no_match());
            }
            frontier = next;
        }

        match frontier.iter().find(|p| self.states[p.state].terminal) {
            Some(winner) => self.replay(winner, ctx),
            None => Err(no_match()),
        }
    }

    /// ε-closure of the frontier, depth-first in priority order. The first
    /// path to reach a state wins; later arrivals are dropped, which keeps
    /// the frontier bounded by the state count.
    fn closure(&self, frontier: Vec<Rc<PathStep>>) -> Vec<Rc<PathStep>> {
        let mut seen: HashSet<StateId> = HashSet::new();
        let mut closed: Vec<Rc<PathStep>> = Vec::new();
        for path in frontier {
            self.closure_visit(path, &mut seen, &mut closed);
        }
        closed
    }

    fn closure_visit(
        &self,
        path: Rc<PathStep>,
        seen: &mut HashSet<StateId>,
        closed: &mut Vec<Rc<PathStep>>,
    ) {
        if !seen.insert(path.state) {
            return;
        }
        closed.push(path.clone());
        for target in self.states[path.state].epsilon.clone() {
            let step = Rc::new(PathStep {
                prev: Some(path.clone()),
                state: target,
                node: None,
            });
            self.closure_visit(step, seen, closed);
        }
    }

    /// Run the winning path's actions front to back.
    ///
    /// Consumed nodes accumulate in the current frame until a `MapNodes`
    /// effect flushes them; `PushFrame`/`PopFrame` bracket group-scoped
    /// token transforms.
    fn replay(&self, path: &Rc<PathStep>, ctx: &ScanContext<'_>) -> Result<Vec<Token>, ScanError> {
        let mut spine: Vec<Rc<PathStep>> = Vec::new();
        let mut cursor = Some(path.clone());
        while let Some(step) = cursor {
            cursor = step.prev.clone();
            spine.push(step);
        }
        spine.reverse();

        #[derive(Default)]
        struct Frame {
            nodes: Vec<NodeRef>,
            tokens: Vec<Token>,
        }

        const FRAMES: &str = "group frames are balanced by construction";
        let mut frames: Vec<Frame> = vec![Frame::default()];
        for step in &spine {
            if let Some(node) = &step.node {
                if node.kind != NodeKind::Terminal {
                    frames.last_mut().expect(FRAMES).nodes.push(node.clone());
                }
            }
            match &self.states[step.state].effect {
                Some(Effect::PushFrame) => frames.push(Frame::default()),
                Some(Effect::PopFrame(map)) => {
                    let frame = frames.pop().expect(FRAMES);
                    let mapped = map(frame.tokens);
                    let parent = frames.last_mut().expect(FRAMES);
                    parent.tokens.extend(mapped);
                    parent.nodes.extend(frame.nodes);
                }
                Some(Effect::MapNodes(action)) => {
                    let frame = frames.last_mut().expect(FRAMES);
                    let nodes = std::mem::take(&mut frame.nodes);
                    let tokens = action(ctx, &nodes)?;
                    frames.last_mut().expect(FRAMES).tokens.extend(tokens);
                }
                None => {}
            }
        }

        let root = frames.pop().expect(FRAMES);
        Ok(root.tokens)
    }
}
