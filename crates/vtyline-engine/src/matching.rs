//! Token-to-child matching.
//!
//! `find_matches` resolves a complete token against a child set: an exact
//! length-and-content match short-circuits to a single result, otherwise
//! every child whose name extends the token is collected and the tie is
//! surfaced to the caller — the cursor narrows it with further keystrokes,
//! scripted execution asks the `AmbiguityResolver`.

use vtyline_types::TokenValue;

use crate::tree::{Edge, Grammar, NodeId};

/// Result of matching a token against a child set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Exactly one name matched by full length and content.
    Exact(NodeId),
    /// One or more names have the token as a proper prefix.
    Prefix(Vec<NodeId>),
    /// No keyword child matched at all.
    NoMatch,
}

/// Match a complete token against keyword children.
///
/// Leaf children never participate; the cursor tracks its one leaf
/// candidate independently. A negation keyword is skipped once `negated`
/// is set, so a command cannot be negated twice.
pub fn find_matches(
    grammar: &Grammar,
    edges: &[Edge],
    token: &str,
    negated: bool,
) -> MatchResult {
    let mut prefix_hits = Vec::new();
    let mut seen = Vec::new();

    for edge in edges {
        let node = grammar.node(edge.target);
        if node.is_leaf() || (negated && node.is_negation()) {
            continue;
        }
        let name = node.word();
        // Shared aliases can surface the same name twice; first slot wins.
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);
        if name == token {
            return MatchResult::Exact(edge.target);
        }
        if name.starts_with(token) {
            prefix_hits.push(edge.target);
        }
    }

    if prefix_hits.is_empty() {
        MatchResult::NoMatch
    } else {
        MatchResult::Prefix(prefix_hits)
    }
}

/// First character position at or beyond `from` where any two candidate
/// names diverge (a name ending counts as divergence).
///
/// Word-boundary completion auto-types up to this position.
pub fn common_prefix_len(grammar: &Grammar, candidates: &[NodeId], from: usize) -> usize {
    let Some(first) = candidates.first() else {
        return from;
    };
    let first_name: Vec<char> = grammar.node(*first).word().chars().collect();

    let mut pos = from;
    loop {
        let Some(&ch) = first_name.get(pos) else {
            return pos;
        };
        for id in &candidates[1..] {
            if grammar.node(*id).word().chars().nth(pos) != Some(ch) {
                return pos;
            }
        }
        pos += 1;
    }
}

/// Synchronous numbered-choice prompt for ambiguous full tokens.
///
/// Scripted execution presents the surviving candidate names and blocks
/// for one selection. Returning `None` or an out-of-range index is treated
/// as "no match". The blocking read lives in the embedder; tests script it.
pub trait AmbiguityResolver {
    /// Choose among `options` for the ambiguous `token`; the prior
    /// accepted tokens are available for context.
    fn choose(&mut self, token: &str, options: &[String], so_far: &[TokenValue]) -> Option<usize>;
}

/// Resolver that never answers; ambiguous tokens simply fail to match.
pub struct NoPrompt;

impl AmbiguityResolver for NoPrompt {
    fn choose(&mut self, _token: &str, _options: &[String], _so_far: &[TokenValue]) -> Option<usize> {
        None
    }
}
