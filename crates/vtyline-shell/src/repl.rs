//! Line-driven REPL.
//!
//! Reads one line at a time and feeds it to the cursor as individual key
//! events, so the engine runs exactly the per-keystroke path an attached
//! terminal would drive. `?` anywhere in a line prints the help listing
//! for the word in progress. A few session words (`exit`, `end`, `quit`,
//! `history`) are intercepted before they reach the grammar.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use vtyline_engine::{AmbiguityResolver, Cursor, Grammar, run_line};
use vtyline_types::{Key, KeyOutcome, TokenValue};

use crate::config::ShellConfig;
use crate::grammar::DeviceState;

/// Numbered-choice prompt on stdin for ambiguous scripted tokens.
pub struct StdinResolver;

impl AmbiguityResolver for StdinResolver {
    fn choose(&mut self, token: &str, options: &[String], _so_far: &[TokenValue]) -> Option<usize> {
        println!("'{token}' is ambiguous:");
        for (i, opt) in options.iter().enumerate() {
            println!("  {}: {opt}", i + 1);
        }
        print!("choice: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return None;
        }
        match line.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Some(n - 1),
            _ => None,
        }
    }
}

/// Interactive session state: cursor, history, device handle.
pub struct Repl {
    config: ShellConfig,
    state: Rc<DeviceState>,
    history: Vec<String>,
}

impl Repl {
    pub fn new(config: ShellConfig, state: Rc<DeviceState>) -> Self {
        Self {
            config,
            state,
            history: Vec::new(),
        }
    }

    /// Drive the session until EOF or `quit`.
    pub fn run(&mut self, grammar: &mut Grammar) -> io::Result<()> {
        let mut cursor = Cursor::new(grammar);
        let stdin = io::stdin();
        loop {
            print!("{}", self.prompt(&cursor));
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                println!();
                return Ok(());
            }
            let line = line.trim().to_string();

            match self.expand_history(&line) {
                Ok(expanded) => {
                    if !expanded.is_empty() {
                        self.push_history(&expanded);
                    }
                    if !self.dispatch(&expanded, grammar, &mut cursor) {
                        return Ok(());
                    }
                },
                Err(msg) => println!("% {msg}"),
            }
        }
    }

    fn prompt(&self, cursor: &Cursor) -> String {
        let hostname = self.state.hostname.borrow();
        if cursor.in_mode() {
            let words: Vec<&str> = cursor.mode_values().iter().map(TokenValue::text).collect();
            format!("{}({}){}", hostname, words.join("-"), self.config.prompt)
        } else {
            format!("{}{}", hostname, self.config.prompt)
        }
    }

    /// Handle one input line; returns `false` when the session should end.
    fn dispatch(&mut self, line: &str, grammar: &mut Grammar, cursor: &mut Cursor) -> bool {
        match line {
            "" => true,
            "quit" => false,
            "exit" | "end" => {
                if !cursor.exit_mode(grammar) {
                    println!("% not in a mode");
                }
                true
            },
            "history" => {
                for (i, entry) in self.history.iter().enumerate() {
                    println!("  {:4}  {entry}", i + 1);
                }
                true
            },
            _ => {
                self.feed_line(line, grammar, cursor);
                self.drain_script(grammar);
                true
            },
        }
    }

    /// Feed a line through the cursor one key at a time and report the
    /// submission outcome.
    fn feed_line(&self, line: &str, grammar: &mut Grammar, cursor: &mut Cursor) {
        for ch in line.chars() {
            if ch == '?' {
                self.print_help(grammar, cursor);
                continue;
            }
            let key = if ch == ' ' { Key::Space } else { Key::Char(ch) };
            match cursor.key(grammar, key) {
                KeyOutcome::AutoCompleted(rest) => {
                    if self.config.echo_completions {
                        println!("  (completed: {rest})");
                    }
                },
                KeyOutcome::Blocked => {
                    if let Some(err) = cursor.last_error() {
                        log::debug!("key '{ch}' blocked: {err}");
                    }
                },
                _ => {},
            }
        }

        match cursor.key(grammar, Key::Enter) {
            KeyOutcome::Submitted(true) => {
                if let Some(report) = cursor.last_report()
                    && let Some(filter) = &report.filter
                {
                    let words: Vec<&str> = filter.iter().map(TokenValue::text).collect();
                    println!("[filter] {}", words.join(" "));
                }
            },
            KeyOutcome::Submitted(false) | KeyOutcome::Blocked => {
                println!("% {}", cursor.last_error().unwrap_or("invalid input"));
            },
            _ => {},
        }
    }

    fn print_help(&self, grammar: &Grammar, cursor: &Cursor) {
        let entries = cursor.help_entries(grammar);
        if entries.is_empty() {
            println!("  <no completions>");
            return;
        }
        for e in &entries {
            println!("  {:<16} {}", e.label, e.help);
        }
    }

    /// Execute a script requested by the `run` command, one line at a
    /// time through the scripted execution path.
    fn drain_script(&self, grammar: &Grammar) {
        let Some(path) = self.state.pending_script.borrow_mut().take() else {
            return;
        };
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                println!("% script {path}: {e}");
                return;
            },
        };
        for raw in source.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = run_line(grammar, line, &mut StdinResolver) {
                println!("% {line}: {e}");
            }
        }
    }

    // -- History --

    fn push_history(&mut self, line: &str) {
        // Don't duplicate the last entry.
        if self.history.last().is_none_or(|last| last != line) {
            self.history.push(line.to_string());
            if self.history.len() > self.config.history_size {
                self.history.remove(0);
            }
        }
    }

    /// Expand `!!` and `!n` against the history.
    fn expand_history(&self, input: &str) -> Result<String, String> {
        if input == "!!" {
            return self
                .history
                .last()
                .cloned()
                .ok_or_else(|| "!!: no previous command".to_string());
        }
        if let Some(n_str) = input.strip_prefix('!')
            && let Ok(n) = n_str.parse::<usize>()
        {
            if n == 0 || n > self.history.len() {
                return Err(format!("!{n}: event not found"));
            }
            return Ok(self.history[n - 1].clone());
        }
        Ok(input.to_string())
    }
}
