//! The submission engine.
//!
//! At commit time the engine walks the cursor's stacks: it finds the node
//! that owns the application callback, determines the command mode from
//! the path, extracts the token slice scoped to the active checkpoint, and
//! dispatches. Dispatch is fire-and-forget toward any external executor —
//! success is recorded when the handler accepts the call, not when its
//! effects land.

use vtyline_types::{Result, TokenValue, VtyError};

use crate::cursor::{Cursor, MatchState};
use crate::handler::CommandMode;
use crate::matching::{self, AmbiguityResolver, MatchResult};
use crate::tree::{Grammar, NodeId};

/// Outcome of a submission: mode, success, filter clause slice.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub mode: CommandMode,
    /// Every dispatched handler accepted the call.
    pub success: bool,
    /// The accepted filter clause tokens, verbatim, for the output
    /// filtering subsystem. `None` when no pipe clause was typed.
    pub filter: Option<Vec<TokenValue>>,
}

/// The node whose callback a submission fires: the frame just below the
/// filter clause when one is active (filter clauses never own the
/// application callback), otherwise the top of the path stack.
fn find_trigger_node(cursor: &Cursor) -> usize {
    match cursor.filter_checkpoint {
        Some(fc) => fc - 1,
        None => cursor.path_stack.len() - 1,
    }
}

/// Mode the submission executes under, determined by which top-level hook
/// the typed path descends from.
fn command_mode(cursor: &Cursor, grammar: &Grammar, trigger_idx: usize) -> CommandMode {
    let lo = cursor.mode_checkpoint + 1;
    // A grammar-root command issued through a universal shortcut carries
    // its own hook; judge it by its typed path alone, not the mode it was
    // typed in.
    let via_universal = cursor
        .path_stack
        .get(lo)
        .is_some_and(|id| grammar.is_universal(*id));
    let configures = if via_universal {
        cursor.path_stack[lo..=trigger_idx]
            .iter()
            .any(|id| grammar.is_config_entry(*id))
    } else {
        cursor.in_config
            || cursor.path_stack[1..=trigger_idx]
                .iter()
                .any(|id| grammar.is_config_entry(*id))
    };
    if configures {
        if cursor.negated {
            CommandMode::ConfigDisable
        } else {
            CommandMode::ConfigEnable
        }
    } else {
        CommandMode::Operational
    }
}

/// Submit the cursor's committed path.
///
/// Batch-flagged triggers fire every handler-owning frame above the mode
/// checkpoint in root-to-leaf order, each scoped to the slice ending at
/// that frame; a failing step stops the walk but already-applied steps are
/// not rolled back. Ordinary triggers fire exactly once with the full
/// slice from checkpoint to trigger.
pub(crate) fn submit(cursor: &mut Cursor, grammar: &Grammar) -> Result<SubmitReport> {
    let trigger_idx = find_trigger_node(cursor);
    if trigger_idx <= cursor.mode_checkpoint {
        return Err(VtyError::Submit("incomplete command".into()));
    }
    let trigger = cursor.path_stack[trigger_idx];
    if grammar.node(trigger).handler().is_none() {
        return Err(VtyError::Submit("incomplete command".into()));
    }

    let mode = command_mode(cursor, grammar, trigger_idx);
    let lo = cursor.mode_checkpoint + 1;
    let mut success = true;

    if grammar.node(trigger).flags().batch {
        for i in lo..=trigger_idx {
            let frame = cursor.path_stack[i];
            let Some(handler) = grammar.node(frame).handler() else {
                continue;
            };
            let code = grammar.node(frame).code();
            if let Err(e) = handler.execute(code, &cursor.value_stack[lo..=i], mode) {
                log::warn!("batch step {i} failed: {e}");
                success = false;
                break;
            }
        }
    } else {
        let handler = grammar
            .node(trigger)
            .handler()
            .ok_or_else(|| VtyError::Submit("incomplete command".into()))?;
        let code = grammar.node(trigger).code();
        if let Err(e) = handler.execute(code, &cursor.value_stack[lo..=trigger_idx], mode) {
            log::warn!("command handler failed: {e}");
            success = false;
        }
    }

    let filter = cursor
        .filter_checkpoint
        .map(|fc| cursor.value_stack[fc..].to_vec());

    cursor.committed = success;
    log::debug!(
        "submitted '{}' ({mode:?}, success={success})",
        cursor.value_stack[lo..]
            .iter()
            .map(TokenValue::text)
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(SubmitReport {
        mode,
        success,
        filter,
    })
}

/// Fire a mode root's own handler at mode entry, without resetting the
/// session stacks.
pub(crate) fn dispatch_mode_entry(cursor: &mut Cursor, grammar: &Grammar) -> bool {
    let root = cursor.root;
    let Some(handler) = grammar.node(root).handler() else {
        return true;
    };
    let mode = if cursor.in_config {
        if cursor.negated {
            CommandMode::ConfigDisable
        } else {
            CommandMode::ConfigEnable
        }
    } else {
        CommandMode::Operational
    };
    let code = grammar.node(root).code();
    match handler.execute(code, &cursor.value_stack[1..], mode) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("mode entry handler failed: {e}");
            false
        },
    }
}

/// Execute one complete command line on a dedicated ephemeral cursor.
///
/// Used for history replay, startup scripts, and grammar-root commands
/// issued while a live session sits inside a mode — the live stacks are
/// never disturbed. Ambiguous full tokens go through the resolver; an
/// out-of-range choice is logged and treated as no match. The cursor is
/// discarded regardless of outcome.
pub fn run_line(
    grammar: &Grammar,
    line: &str,
    resolver: &mut dyn AmbiguityResolver,
) -> Result<SubmitReport> {
    let mut cursor = Cursor::new(grammar);
    for token in line.split_whitespace() {
        step_token(&mut cursor, grammar, token, resolver)?;
    }
    if cursor.path_len() == 1 {
        return Err(VtyError::Parse("empty command".into()));
    }
    submit(&mut cursor, grammar)
}

fn step_token(
    cursor: &mut Cursor,
    grammar: &Grammar,
    token: &str,
    resolver: &mut dyn AmbiguityResolver,
) -> Result<()> {
    let edges = grammar.children_of(cursor.current_node);
    match matching::find_matches(grammar, edges, token, cursor.negated) {
        MatchResult::Exact(id) => cursor.accept_scripted(grammar, id, token),
        MatchResult::Prefix(ids) if ids.len() == 1 => {
            cursor.accept_scripted(grammar, ids[0], token)
        },
        MatchResult::Prefix(ids) => {
            let options: Vec<String> = ids
                .iter()
                .map(|id| grammar.node(*id).word().to_string())
                .collect();
            match resolver.choose(token, &options, cursor.typed_values()) {
                Some(i) if i < ids.len() => cursor.accept_scripted(grammar, ids[i], token),
                Some(i) => {
                    log::warn!("ambiguity choice {i} out of range for '{token}'");
                    cursor.match_state = MatchState::NoMatch;
                    Err(VtyError::Parse(format!("ambiguous command '{token}'")))
                },
                None => {
                    cursor.match_state = MatchState::NoMatch;
                    Err(VtyError::Parse(format!("ambiguous command '{token}'")))
                },
            }
        },
        MatchResult::NoMatch => {
            let leaf = edges
                .iter()
                .map(|e| e.target)
                .find(|id| grammar.node(*id).is_leaf());
            let Some(leaf) = leaf else {
                cursor.match_state = MatchState::NoMatch;
                return Err(VtyError::Parse(format!("no match for '{token}'")));
            };
            accept_leaf_token(cursor, grammar, leaf, token)
        },
    }
}

fn accept_leaf_token(
    cursor: &mut Cursor,
    grammar: &Grammar,
    leaf: NodeId,
    token: &str,
) -> Result<()> {
    let node = grammar.node(leaf);
    let crate::tree::NodeKind::Leaf { leaf_type, .. } = *node.kind() else {
        return Err(VtyError::Parse(format!("no match for '{token}'")));
    };
    if !leaf_type.accepts(token) {
        cursor.match_state = MatchState::NoMatch;
        return Err(VtyError::Parse(format!(
            "invalid {} '{token}'",
            leaf_type.placeholder()
        )));
    }
    if let Some(v) = node.validator()
        && !v.validate(cursor.typed_values(), token)
    {
        cursor.match_state = MatchState::NoMatch;
        return Err(VtyError::Parse(format!("value '{token}' rejected")));
    }
    cursor.accept_scripted(grammar, leaf, token)
}
