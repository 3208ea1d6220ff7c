//! Shared types for the vtyline command-line engine.
//!
//! Everything the engine and its embedders exchange lives here: the error
//! enum, the decoded logical key events consumed one at a time, and the
//! immutable token records extracted as a command is parsed.

pub mod error;
pub mod key;
pub mod value;

/// Errors produced by the vtyline engine.
pub use error::VtyError;
/// Convenience alias.
pub use error::Result;
/// A decoded logical key event.
pub use key::Key;
/// The engine's answer to a single key event.
pub use key::KeyOutcome;
/// Typed value slot kinds accepted by leaf nodes.
pub use value::LeafType;
/// Classification of an extracted token.
pub use value::TokenKind;
/// An immutable extracted token record.
pub use value::TokenValue;
