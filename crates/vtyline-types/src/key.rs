//! Decoded logical key events and per-key outcomes.
//!
//! Terminal front-ends decode their raw byte streams into these events.
//! The engine never sees raw I/O: it consumes one `Key` per call and
//! answers with a `KeyOutcome` telling the renderer what to echo.

/// A decoded logical key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character typed into the current word.
    Char(char),
    /// Word boundary: commit the word in progress.
    Space,
    /// Word boundary via completion request.
    Tab,
    /// Submit the current command line.
    Enter,
    /// Erase one character, or pop one completed word at a word start.
    Backspace,
    /// Pop one completed word and reseat the session root.
    WordErase,
    /// List legal continuations for the current word (`?`).
    Help,
}

/// The engine's answer to a single key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key consumed; echo it as typed.
    Accepted,
    /// Key had no effect; cursor state is unchanged.
    Blocked,
    /// Completion appended characters beyond those typed.
    AutoCompleted(String),
    /// Characters were erased; count of display cells to remove.
    Erased(usize),
    /// The line was submitted; `true` when dispatch succeeded.
    Submitted(bool),
}
