//! Command-tree grammar and interactive parsing cursor.
//!
//! Applications register a hierarchical grammar of keywords and typed value
//! slots, then drive a `Cursor` one decoded key at a time. The cursor
//! matches children incrementally, auto-completes, tracks configuration
//! modes and filter clauses, and on submission extracts the accepted token
//! slice and dispatches the registered handler.

mod cursor;
mod filter;
mod handler;
mod matching;
mod mode;
mod submit;
mod tree;


/// Per-session parsing state walking the grammar one keystroke at a time.
pub use cursor::Cursor;
/// One listed continuation for in-line help.
pub use cursor::HelpEntry;
/// Matching-state machine phases of the word in progress.
pub use cursor::MatchState;
/// Mode a submitted command executes under.
pub use handler::CommandMode;
/// Application callback invoked when a command is submitted.
pub use handler::CommandHandler;
/// Application-supplied semantic check over a leaf token.
pub use handler::LeafValidator;
/// Enumerates legal leaf values for in-line help.
pub use handler::ValueDisplay;
/// Synchronous numbered-choice prompt for ambiguous full tokens.
pub use matching::AmbiguityResolver;
/// Result of matching a token against a child set.
pub use matching::MatchResult;
/// Resolver that never answers; ambiguous tokens simply fail to match.
pub use matching::NoPrompt;
pub use matching::find_matches;
/// Leaf slot ids used inside filter clauses.
pub use filter::{FILTER_LEAF_FILE, FILTER_LEAF_INTERVAL, FILTER_LEAF_PATTERN};
/// Scripted one-shot execution of a full command line.
pub use submit::run_line;
/// Outcome of a submission: mode, success, filter clause slice.
pub use submit::SubmitReport;
/// The static command grammar: arena of nodes plus top-level hooks.
pub use tree::Grammar;
/// Edge kinds distinguish ordinary tree edges from deliberate cycles.
pub use tree::EdgeKind;
pub use tree::{Edge, Node, NodeFlags, NodeId, NodeKind, TopHooks};

/// Maximum number of stack frames a single command may occupy.
pub const MAX_DEPTH: usize = 32;
/// Maximum number of characters in a single word.
pub const MAX_WORD: usize = 128;
/// Fixed capacity of a node's own child set.
pub const MAX_CHILDREN: usize = 16;
