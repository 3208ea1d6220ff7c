//! The per-session parsing cursor.
//!
//! One cursor per interactive session (plus ephemeral ones for scripted
//! lines). It consumes one decoded key per call, matching the word in
//! progress against the current node's children, and commits words onto a
//! pair of index-aligned stacks: `path_stack[i]` is the node matched at
//! depth `i`, `value_stack[i]` its extracted token record. Rejected keys
//! leave every field untouched so the user can correct and retry.

use vtyline_types::{Key, KeyOutcome, Result, TokenValue, VtyError};

use crate::matching;
use crate::submit::{self, SubmitReport};
use crate::tree::{Grammar, NodeId, NodeKind};
use crate::{MAX_DEPTH, MAX_WORD};

/// Matching-state machine phases of the word in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// No character typed yet at this level.
    Init,
    /// Two or more keyword children still fit the typed prefix.
    MultipleMatches,
    /// Exactly one keyword child fits; every further character must agree.
    SingleMatch,
    /// The word is being collected as free text for the level's leaf.
    MatchingLeaf,
    /// A scripted token failed to resolve.
    NoMatch,
}

/// One listed continuation for in-line help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Keyword, type placeholder, or an enumerated legal value.
    pub label: String,
    pub help: String,
}

/// Per-session parsing state walking the grammar one keystroke at a time.
pub struct Cursor {
    pub(crate) root: NodeId,
    pub(crate) path_stack: Vec<NodeId>,
    pub(crate) value_stack: Vec<TokenValue>,
    pub(crate) mode_checkpoint: usize,
    pub(crate) filter_checkpoint: Option<usize>,
    pub(crate) current_node: NodeId,
    pub(crate) partial: String,
    pub(crate) cursor_offset: usize,
    pub(crate) match_state: MatchState,
    pub(crate) candidates: Vec<NodeId>,
    pub(crate) leaf_candidate: Option<NodeId>,
    pub(crate) single: Option<NodeId>,
    pub(crate) negated: bool,
    pub(crate) committed: bool,
    pub(crate) in_config: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) last_report: Option<SubmitReport>,
}

impl Cursor {
    /// Fresh session rooted at the grammar root. Frame 0 is the root and
    /// its synthetic token record.
    pub fn new(grammar: &Grammar) -> Self {
        let root = grammar.root();
        Self {
            root,
            path_stack: vec![root],
            value_stack: vec![TokenValue::keyword("")],
            mode_checkpoint: 0,
            filter_checkpoint: None,
            current_node: root,
            partial: String::new(),
            cursor_offset: 0,
            match_state: MatchState::Init,
            candidates: Vec::new(),
            leaf_candidate: None,
            single: None,
            negated: false,
            committed: false,
            in_config: false,
            last_error: None,
            last_report: None,
        }
    }

    // -- Accessors --

    pub fn match_state(&self) -> MatchState {
        self.match_state
    }

    /// Number of committed frames including the root frame.
    pub fn path_len(&self) -> usize {
        self.path_stack.len()
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path_stack
    }

    /// Every frame's token record, including the synthetic root record.
    pub fn values(&self) -> &[TokenValue] {
        &self.value_stack
    }

    /// The typed token records (synthetic root excluded).
    pub fn typed_values(&self) -> &[TokenValue] {
        &self.value_stack[1..]
    }

    /// Token records of the current mode path (empty outside a mode).
    pub fn mode_values(&self) -> &[TokenValue] {
        &self.value_stack[1..=self.mode_checkpoint]
    }

    pub fn mode_checkpoint(&self) -> usize {
        self.mode_checkpoint
    }

    pub fn filter_checkpoint(&self) -> Option<usize> {
        self.filter_checkpoint
    }

    pub fn in_mode(&self) -> bool {
        self.mode_checkpoint > 0
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn committed(&self) -> bool {
        self.committed
    }

    /// The word in progress.
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Explanation for the most recent rejection, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Report of the most recent submission attempt.
    pub fn last_report(&self) -> Option<&SubmitReport> {
        self.last_report.as_ref()
    }

    // -- Key dispatch --

    /// Consume one decoded key. `Help` never mutates; render the listing
    /// with [`Cursor::help_entries`].
    pub fn key(&mut self, grammar: &mut Grammar, key: Key) -> KeyOutcome {
        self.last_error = None;
        match key {
            Key::Char(c) if c.is_whitespace() => self.word_boundary(grammar),
            Key::Char(c) => self.feed_char(grammar, c),
            Key::Space | Key::Tab => self.word_boundary(grammar),
            Key::Enter => self.submit_line(grammar),
            Key::Backspace => self.backspace(grammar),
            Key::WordErase => {
                let width = self.exit_one_level(grammar, false, true);
                if width == 0 {
                    KeyOutcome::Blocked
                } else {
                    KeyOutcome::Erased(width)
                }
            },
            Key::Help => KeyOutcome::Accepted,
        }
    }

    // -- Character matching --

    fn feed_char(&mut self, grammar: &Grammar, c: char) -> KeyOutcome {
        if self.cursor_offset >= MAX_WORD {
            self.last_error = Some("word too long".into());
            return KeyOutcome::Blocked;
        }
        match self.match_state {
            MatchState::Init | MatchState::NoMatch => self.begin_word(grammar, c),
            MatchState::MultipleMatches => self.narrow_candidates(grammar, c),
            MatchState::SingleMatch => self.extend_single(grammar, c),
            MatchState::MatchingLeaf => {
                self.push_char(c);
                KeyOutcome::Accepted
            },
        }
    }

    /// First character of a word: compute the candidate set and note the
    /// level's leaf fallback.
    fn begin_word(&mut self, grammar: &Grammar, c: char) -> KeyOutcome {
        let mut cands = Vec::new();
        let mut leaf = None;
        let mut seen: Vec<&str> = Vec::new();
        for edge in grammar.children_of(self.current_node) {
            let node = grammar.node(edge.target);
            if node.is_leaf() {
                if leaf.is_none() {
                    leaf = Some(edge.target);
                }
                continue;
            }
            if self.negated && node.is_negation() {
                continue;
            }
            let name = node.word();
            // Shared aliases can surface a name twice; first slot wins.
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            if name.chars().next() == Some(c) {
                cands.push(edge.target);
            }
        }
        self.leaf_candidate = leaf;

        match cands.len() {
            0 if leaf.is_some() => {
                self.match_state = MatchState::MatchingLeaf;
                self.push_char(c);
                KeyOutcome::Accepted
            },
            0 => {
                self.last_error = Some("no matching command".into());
                KeyOutcome::Blocked
            },
            1 => {
                self.single = Some(cands[0]);
                self.candidates = cands;
                self.match_state = MatchState::SingleMatch;
                self.push_char(c);
                KeyOutcome::Accepted
            },
            _ => {
                self.candidates = cands;
                self.match_state = MatchState::MultipleMatches;
                self.push_char(c);
                KeyOutcome::Accepted
            },
        }
    }

    fn narrow_candidates(&mut self, grammar: &Grammar, c: char) -> KeyOutcome {
        let filtered: Vec<NodeId> = self
            .candidates
            .iter()
            .copied()
            .filter(|id| grammar.node(*id).word().chars().nth(self.cursor_offset) == Some(c))
            .collect();

        if filtered.is_empty() {
            // Fall back to the leaf, replaying the buffered prefix as leaf
            // text; otherwise reject without touching the candidate set.
            if self.leaf_candidate.is_some() {
                self.candidates.clear();
                self.single = None;
                self.match_state = MatchState::MatchingLeaf;
                self.push_char(c);
                return KeyOutcome::Accepted;
            }
            self.last_error = Some("no matching command".into());
            return KeyOutcome::Blocked;
        }

        if filtered.len() == 1 {
            self.single = Some(filtered[0]);
            self.match_state = MatchState::SingleMatch;
        }
        self.candidates = filtered;
        self.push_char(c);
        KeyOutcome::Accepted
    }

    fn extend_single(&mut self, grammar: &Grammar, c: char) -> KeyOutcome {
        let Some(id) = self.single else {
            return KeyOutcome::Blocked;
        };
        if grammar.node(id).word().chars().nth(self.cursor_offset) == Some(c) {
            self.push_char(c);
            return KeyOutcome::Accepted;
        }
        if self.leaf_candidate.is_some() {
            self.single = None;
            self.candidates.clear();
            self.match_state = MatchState::MatchingLeaf;
            self.push_char(c);
            return KeyOutcome::Accepted;
        }
        self.last_error = Some("no matching command".into());
        KeyOutcome::Blocked
    }

    fn push_char(&mut self, c: char) {
        self.partial.push(c);
        self.cursor_offset += 1;
    }

    // -- Word boundary --

    /// Commit the word in progress: auto-complete a unique candidate and
    /// advance a level, extend a tied prefix to the divergence point, or
    /// validate and accept leaf text.
    fn word_boundary(&mut self, grammar: &Grammar) -> KeyOutcome {
        match self.match_state {
            MatchState::Init | MatchState::NoMatch => KeyOutcome::Blocked,
            MatchState::SingleMatch => {
                let Some(id) = self.single else {
                    return KeyOutcome::Blocked;
                };
                self.complete_keyword(grammar, id)
            },
            MatchState::MultipleMatches => {
                // A fully typed name wins over longer siblings.
                let exact = self
                    .candidates
                    .iter()
                    .copied()
                    .find(|id| grammar.node(*id).word().chars().count() == self.cursor_offset);
                if let Some(id) = exact {
                    return self.complete_keyword(grammar, id);
                }
                if self.candidates.len() == 1 {
                    let id = self.candidates[0];
                    return self.complete_keyword(grammar, id);
                }
                let div =
                    matching::common_prefix_len(grammar, &self.candidates, self.cursor_offset);
                if div > self.cursor_offset {
                    let ext: String = grammar
                        .node(self.candidates[0])
                        .word()
                        .chars()
                        .skip(self.cursor_offset)
                        .take(div - self.cursor_offset)
                        .collect();
                    for ch in ext.chars() {
                        self.partial.push(ch);
                    }
                    self.cursor_offset = div;
                    return KeyOutcome::AutoCompleted(ext);
                }
                self.last_error = Some("ambiguous command".into());
                KeyOutcome::Blocked
            },
            MatchState::MatchingLeaf => self.complete_leaf(grammar),
        }
    }

    /// Auto-type the remainder of a unique keyword and advance a level.
    fn complete_keyword(&mut self, grammar: &Grammar, id: NodeId) -> KeyOutcome {
        let node = grammar.node(id);
        let name = node.word().to_string();
        let rest: String = name.chars().skip(self.cursor_offset).collect();
        let tlv = if node.is_negation() {
            TokenValue::negation(name)
        } else {
            TokenValue::keyword(name)
        };
        if !self.advance_level(grammar, id, tlv) {
            return KeyOutcome::Blocked;
        }
        if rest.is_empty() {
            KeyOutcome::Accepted
        } else {
            KeyOutcome::AutoCompleted(rest)
        }
    }

    /// Validate leaf text (built-in type check, then the application
    /// validator) and advance; rejection mutates nothing.
    fn complete_leaf(&mut self, grammar: &Grammar) -> KeyOutcome {
        let Some(leaf) = self.leaf_candidate else {
            return KeyOutcome::Blocked;
        };
        let NodeKind::Leaf { leaf_type, leaf_id } = *grammar.node(leaf).kind() else {
            return KeyOutcome::Blocked;
        };
        if !leaf_type.accepts(&self.partial) {
            self.last_error = Some(format!(
                "invalid {} '{}'",
                leaf_type.placeholder(),
                self.partial
            ));
            return KeyOutcome::Blocked;
        }
        if let Some(v) = grammar.node(leaf).validator()
            && !v.validate(&self.value_stack[1..], &self.partial)
        {
            self.last_error = Some(format!("value '{}' rejected", self.partial));
            return KeyOutcome::Blocked;
        }
        let tlv = TokenValue::value(leaf_type, leaf_id, self.partial.clone());
        if !self.advance_level(grammar, leaf, tlv) {
            return KeyOutcome::Blocked;
        }
        KeyOutcome::Accepted
    }

    /// Push the matched node and its token record, reset per-word state,
    /// and run the entry hooks.
    pub(crate) fn advance_level(
        &mut self,
        grammar: &Grammar,
        node: NodeId,
        tlv: TokenValue,
    ) -> bool {
        if self.path_stack.len() >= MAX_DEPTH {
            self.last_error = Some("command too deep".into());
            return false;
        }
        self.path_stack.push(node);
        self.value_stack.push(tlv);
        let idx = self.path_stack.len() - 1;
        if grammar.node(node).is_negation() {
            self.negated = true;
        }
        if node == grammar.pipe() && self.filter_checkpoint.is_none() {
            self.filter_checkpoint = Some(idx);
        }
        self.current_node = node;
        self.reset_word();
        log::debug!("accepted '{}' at depth {idx}", self.value_stack[idx].text());
        true
    }

    /// Resolve a complete scripted token straight onto the stacks.
    pub(crate) fn accept_scripted(
        &mut self,
        grammar: &Grammar,
        node: NodeId,
        text: &str,
    ) -> Result<()> {
        let tlv = match grammar.node(node).kind() {
            NodeKind::Command { name } => TokenValue::keyword(name.clone()),
            NodeKind::Negation { name } => TokenValue::negation(name.clone()),
            NodeKind::Leaf { leaf_type, leaf_id } => {
                TokenValue::value(*leaf_type, *leaf_id, text)
            },
        };
        if !self.advance_level(grammar, node, tlv) {
            self.match_state = MatchState::NoMatch;
            return Err(VtyError::Parse("command too deep".into()));
        }
        Ok(())
    }

    pub(crate) fn reset_word(&mut self) {
        self.partial.clear();
        self.cursor_offset = 0;
        self.candidates.clear();
        self.leaf_candidate = None;
        self.single = None;
        self.match_state = MatchState::Init;
    }

    // -- Erase --

    fn backspace(&mut self, grammar: &mut Grammar) -> KeyOutcome {
        if self.cursor_offset == 0 {
            let width = self.exit_one_level(grammar, true, false);
            return if width == 0 {
                KeyOutcome::Blocked
            } else {
                KeyOutcome::Erased(width)
            };
        }
        // Drop the last character and replay the shorter word; every
        // remaining character was accepted before and will be again.
        let mut word = self.partial.clone();
        word.pop();
        self.reset_word();
        for ch in word.chars() {
            let _ = self.feed_char(grammar, ch);
        }
        KeyOutcome::Erased(1)
    }

    // -- Submission --

    fn submit_line(&mut self, grammar: &mut Grammar) -> KeyOutcome {
        if self.cursor_offset > 0 {
            let _ = self.word_boundary(grammar);
            if self.cursor_offset > 0 {
                if self.last_error.is_none() {
                    self.last_error = Some("incomplete command".into());
                }
                return KeyOutcome::Blocked;
            }
        }
        if self.path_stack.len() - 1 == self.mode_checkpoint {
            // Empty line: nothing typed since the last reset.
            return KeyOutcome::Accepted;
        }
        if grammar.node(self.current_node).flags().mode {
            match self.enter_mode(grammar) {
                Ok(true) => return KeyOutcome::Submitted(self.committed),
                Ok(false) => {},
                Err(e) => {
                    log::warn!("mode entry failed: {e}");
                    self.last_error = Some(format!("{e}"));
                    return KeyOutcome::Submitted(false);
                },
            }
        }
        let ok = match submit::submit(self, grammar) {
            Ok(report) => {
                let ok = report.success;
                self.last_report = Some(report);
                ok
            },
            Err(e) => {
                log::warn!("submission failed: {e}");
                self.last_error = Some(format!("{e}"));
                self.last_report = None;
                false
            },
        };
        self.reset_for_next_command();
        KeyOutcome::Submitted(ok)
    }

    // -- Help --

    /// Legal continuations for the word in progress.
    ///
    /// Hidden and no-expand nodes stay out of the listing, as does the
    /// negation keyword once a negation was accepted. Leaf entries consult
    /// the node's display hook for enumerated legal values.
    pub fn help_entries(&self, grammar: &Grammar) -> Vec<HelpEntry> {
        let mut entries = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        let restrict: Option<&[NodeId]> = match self.match_state {
            MatchState::MatchingLeaf => Some(&[]),
            MatchState::MultipleMatches | MatchState::SingleMatch => Some(&self.candidates),
            MatchState::Init | MatchState::NoMatch => None,
        };

        for edge in grammar.children_of(self.current_node) {
            let node = grammar.node(edge.target);
            if node.is_leaf() {
                self.push_leaf_entries(grammar, edge.target, &mut entries);
                continue;
            }
            if let Some(allowed) = restrict
                && !allowed.contains(&edge.target)
            {
                continue;
            }
            let flags = node.flags();
            if flags.hidden || flags.no_expand {
                continue;
            }
            if self.negated && node.is_negation() {
                continue;
            }
            let name = node.word().to_string();
            if seen.contains(&name) {
                continue;
            }
            seen.push(name.clone());
            entries.push(HelpEntry {
                label: name,
                help: node.help().to_string(),
            });
        }
        entries
    }

    fn push_leaf_entries(&self, grammar: &Grammar, leaf: NodeId, entries: &mut Vec<HelpEntry>) {
        let node = grammar.node(leaf);
        let flags = node.flags();
        if flags.hidden || flags.no_expand {
            return;
        }
        if let Some(d) = node.display() {
            for choice in d.choices(&self.value_stack[1..]) {
                entries.push(HelpEntry {
                    label: choice,
                    help: node.help().to_string(),
                });
            }
        } else {
            entries.push(HelpEntry {
                label: node.word().to_string(),
                help: node.help().to_string(),
            });
        }
    }
}
