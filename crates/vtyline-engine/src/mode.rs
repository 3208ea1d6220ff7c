//! Configuration mode management.
//!
//! A mode persists a sub-root of the grammar: subsequent commands are
//! implicitly rooted at it until the mode is left. The cursor records the
//! boundary as a checkpoint index into its stacks; in-mode editing may not
//! erase past it. Universal shortcuts (`show`, `config`) ride along on the
//! mode root so grammar-root commands stay reachable.

use vtyline_types::Result;

use crate::cursor::{Cursor, MatchState};
use crate::submit;
use crate::tree::Grammar;

impl Cursor {
    /// Persist the current path as a mode.
    ///
    /// No-op (returns `Ok(false)`) when a word is still in progress, when
    /// nothing was typed since the last boundary, or when sitting on a
    /// universal shortcut alias. Nested re-entry splices the outer mode's
    /// frames out of both stacks first, so the new mode is rooted directly
    /// under the grammar root. A mode root owning a handler is submitted
    /// immediately: commands like `config interface <name>` apply on entry.
    pub fn enter_mode(&mut self, grammar: &mut Grammar) -> Result<bool> {
        if self.cursor_offset > 0 || !matches!(self.match_state, MatchState::Init) {
            return Ok(false);
        }
        let top = self.path_stack.len() - 1;
        if top == self.mode_checkpoint {
            return Ok(false);
        }
        if grammar.is_universal(self.current_node) {
            return Ok(false);
        }

        let descends_config = self.path_stack[self.mode_checkpoint + 1..]
            .iter()
            .any(|id| grammar.is_config_entry(*id));

        if self.mode_checkpoint > 0 {
            // Nested re-entry: splice the outer mode's frames and reseat
            // the checkpoint at the current top.
            let cp = self.mode_checkpoint;
            self.path_stack.drain(1..=cp);
            self.value_stack.drain(1..=cp);
            grammar.uninstall_universal(self.root);
            self.filter_checkpoint = None;
        }

        self.in_config = self.in_config || descends_config;
        self.root = self.current_node;
        self.mode_checkpoint = self.path_stack.len() - 1;
        let except: &[&str] = if self.in_config { &["config"] } else { &[] };
        grammar.install_universal(self.root, except)?;

        let mut ok = true;
        if grammar.node(self.root).handler().is_some() {
            ok = submit::dispatch_mode_entry(self, grammar);
        }
        self.committed = ok;
        self.negated = false;
        log::debug!(
            "entered mode '{}' (checkpoint {})",
            grammar.node(self.root).word(),
            self.mode_checkpoint
        );
        Ok(true)
    }

    /// Pop exactly one completed frame.
    ///
    /// Returns the display width the frame occupied (word plus separating
    /// space), or 0 when there is nothing to pop — at the grammar root, or
    /// at the mode checkpoint while `honor_checkpoint` is set. With
    /// `update_root` the session root is reseated on the new top and the
    /// universal shortcuts move with it; a checkpoint popped through this
    /// way decrements exactly once.
    pub fn exit_one_level(
        &mut self,
        grammar: &mut Grammar,
        honor_checkpoint: bool,
        update_root: bool,
    ) -> usize {
        let top = self.path_stack.len() - 1;
        if top == 0 {
            return 0;
        }
        if honor_checkpoint && top == self.mode_checkpoint {
            return 0;
        }

        let (Some(popped_id), Some(popped_val)) =
            (self.path_stack.pop(), self.value_stack.pop())
        else {
            return 0;
        };
        let width = popped_val.text().chars().count() + 1;

        // Exit hooks mirror the entry hooks of advance_level.
        if grammar.node(popped_id).is_negation() {
            self.negated = false;
        }
        if self.filter_checkpoint == Some(top) {
            self.filter_checkpoint = None;
        }
        if top == self.mode_checkpoint {
            self.mode_checkpoint = top - 1;
        }

        self.current_node = self.path_stack[self.path_stack.len() - 1];
        self.reset_word();

        if update_root {
            let old_root = self.root;
            if self.mode_checkpoint == 0 {
                if old_root != grammar.root() {
                    grammar.uninstall_universal(old_root);
                }
                self.root = grammar.root();
                self.in_config = false;
            } else if old_root != self.current_node {
                grammar.uninstall_universal(old_root);
                self.root = self.current_node;
                let except: &[&str] = if self.in_config { &["config"] } else { &[] };
                if let Err(e) = grammar.install_universal(self.root, except) {
                    log::warn!("universal install on mode root failed: {e}");
                }
            }
        }

        width
    }

    /// Leave the current mode entirely, back to the grammar root.
    pub fn exit_mode(&mut self, grammar: &mut Grammar) -> bool {
        if self.mode_checkpoint == 0 {
            return false;
        }
        let old_root = self.root;
        self.path_stack.truncate(1);
        self.value_stack.truncate(1);
        self.mode_checkpoint = 0;
        self.filter_checkpoint = None;
        grammar.uninstall_universal(old_root);
        self.root = grammar.root();
        self.current_node = self.root;
        self.in_config = false;
        self.negated = false;
        self.committed = false;
        self.reset_word();
        log::debug!("left mode '{}'", grammar.node(old_root).word());
        true
    }

    /// Truncate both stacks back to the mode checkpoint and clear the
    /// per-command state, leaving the session ready for the next line.
    pub fn reset_for_next_command(&mut self) {
        self.path_stack.truncate(self.mode_checkpoint + 1);
        self.value_stack.truncate(self.mode_checkpoint + 1);
        self.filter_checkpoint = None;
        self.negated = false;
        self.committed = false;
        self.current_node = self.root;
        self.reset_word();
    }
}

/// Observable per-command state, for the round-trip property tests.
#[cfg(test)]
pub(crate) fn observable(
    cursor: &Cursor,
) -> (usize, Vec<vtyline_types::TokenValue>, usize, bool, bool) {
    (
        cursor.path_len(),
        cursor.values().to_vec(),
        cursor.mode_checkpoint(),
        cursor.negated(),
        cursor.committed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtyline_types::{Key, KeyOutcome, LeafType, TokenValue};

    fn config_grammar() -> Grammar {
        let mut g = Grammar::new();
        let host = g.make_command("host-name", "System host name");
        let host_val = g.make_leaf(LeafType::String, 1, "Name");
        let iface = g.make_command("interface", "Select an interface");
        let iface_name = g.make_leaf(LeafType::String, 2, "Interface name");
        let shutdown = g.make_command("shutdown", "Disable the interface");
        g.register(g.hooks().config, host).unwrap();
        g.register(host, host_val).unwrap();
        g.register(g.hooks().config, iface).unwrap();
        g.register(iface, iface_name).unwrap();
        g.register(iface_name, shutdown).unwrap();
        g.mark_mode(iface_name).unwrap();
        g
    }

    fn feed(cursor: &mut Cursor, g: &mut Grammar, line: &str) {
        for ch in line.chars() {
            if ch == ' ' {
                cursor.key(g, Key::Space);
            } else {
                cursor.key(g, Key::Char(ch));
            }
        }
    }

    #[test]
    fn enter_config_mode() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        assert_eq!(c.key(&mut g, Key::Enter), KeyOutcome::Submitted(true));
        assert!(c.in_mode());
        assert_eq!(c.mode_checkpoint(), 1);
        assert_eq!(c.mode_values()[0].text(), "config");
    }

    #[test]
    fn enter_mode_noop_at_root() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        assert!(!c.enter_mode(&mut g).unwrap());
        assert!(!c.in_mode());
    }

    #[test]
    fn enter_mode_noop_mid_word() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Char('h'));
        assert!(!c.enter_mode(&mut g).unwrap());
    }

    #[test]
    fn mode_root_gains_universal_shortcuts() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        let hooks = g.hooks().config;
        let names: Vec<&str> = g
            .children_of(hooks)
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        // `show` rides along; `config` is suppressed inside its own branch.
        assert!(names.contains(&"show"));
        assert_eq!(names.iter().filter(|n| **n == "config").count(), 0);
    }

    #[test]
    fn commands_in_mode_are_rooted_at_mode() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        feed(&mut c, &mut g, "host-name ");
        // "host-name" resolved against the config subtree.
        assert_eq!(c.typed_values().last().unwrap().text(), "host-name");
    }

    #[test]
    fn nested_mode_splices_outer_frames() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        feed(&mut c, &mut g, "interface eth0 ");
        c.key(&mut g, Key::Enter);
        assert!(c.in_mode());
        // The config frame is gone: [root, interface, eth0].
        assert_eq!(c.path_len(), 3);
        assert_eq!(c.mode_checkpoint(), 2);
        let words: Vec<&str> = c.typed_values().iter().map(|t| t.text()).collect();
        assert_eq!(words, vec!["interface", "eth0"]);
    }

    #[test]
    fn backspace_honors_mode_checkpoint() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        assert_eq!(c.key(&mut g, Key::Backspace), KeyOutcome::Blocked);
        assert!(c.in_mode());
        assert_eq!(c.path_len(), 2);
    }

    #[test]
    fn word_erase_crosses_checkpoint_and_decrements_once() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        let cp = c.mode_checkpoint();
        let width = c.exit_one_level(&mut g, false, true);
        assert_eq!(width, "config".len() + 1);
        assert_eq!(c.mode_checkpoint(), cp - 1);
        assert!(!c.in_mode());
    }

    #[test]
    fn checkpoints_never_exceed_top() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        feed(&mut c, &mut g, "interface eth0 ");
        c.key(&mut g, Key::Enter);
        loop {
            assert!(c.mode_checkpoint() <= c.path_len() - 1);
            if c.exit_one_level(&mut g, false, true) == 0 {
                break;
            }
        }
        assert_eq!(c.mode_checkpoint(), 0);
    }

    #[test]
    fn exit_mode_returns_to_grammar_root() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        assert!(c.exit_mode(&mut g));
        assert!(!c.in_mode());
        assert_eq!(c.path_len(), 1);
        // The shortcuts left with the mode root.
        let names: Vec<&str> = g
            .children_of(g.hooks().config)
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        assert!(!names.contains(&"show"));
    }

    #[test]
    fn exit_mode_outside_mode_is_noop() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        assert!(!c.exit_mode(&mut g));
    }

    #[test]
    fn reset_round_trip_restores_observable_state() {
        let mut g = config_grammar();
        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        let baseline = observable(&c);
        for _ in 0..3 {
            feed(&mut c, &mut g, "host-name core-1 ");
            c.key(&mut g, Key::Enter);
            assert_eq!(observable(&c), baseline);
        }
    }

    #[test]
    fn mode_entry_submits_mode_root_handler() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);

        let mut g = config_grammar();
        // Attach a handler to the interface-name leaf: applying on entry.
        let iface_name = {
            let iface = g
                .children_of(g.hooks().config)
                .iter()
                .find(|e| g.node(e.target).word() == "interface")
                .unwrap()
                .target;
            g.children_of(iface)[0].target
        };
        g.set_handler(
            iface_name,
            Rc::new(
                move |code: u32, args: &[TokenValue], mode: crate::CommandMode| {
                    seen.borrow_mut().push((
                        code,
                        args.iter().map(|t| t.text().to_string()).collect::<Vec<_>>(),
                        mode,
                    ));
                    Ok(())
                },
            ),
            5,
        )
        .unwrap();

        let mut c = Cursor::new(&g);
        feed(&mut c, &mut g, "config ");
        c.key(&mut g, Key::Enter);
        feed(&mut c, &mut g, "interface eth0 ");
        assert_eq!(c.key(&mut g, Key::Enter), KeyOutcome::Submitted(true));

        let recorded = calls.borrow();
        assert_eq!(recorded.len(), 1);
        let (code, words, mode) = &recorded[0];
        assert_eq!(*code, 5);
        assert_eq!(words, &vec!["interface".to_string(), "eth0".to_string()]);
        assert_eq!(*mode, crate::CommandMode::ConfigEnable);
    }
}
