//! Error types for vtyline.

use std::io;

/// Errors produced by the vtyline engine.
#[derive(Debug, thiserror::Error)]
pub enum VtyError {
    /// Grammar construction error. Fatal at startup: the registered
    /// grammar itself is wrong and cannot be repaired at runtime.
    #[error("grammar error: {0}")]
    Grammar(String),

    /// Recoverable parse-time rejection (no match, validation failure,
    /// out-of-range ambiguity choice). Cursor state is left untouched.
    #[error("parse error: {0}")]
    Parse(String),

    /// Submission failure: incomplete command or a callback reporting
    /// failure. The session is marked unsuccessful but still resets.
    #[error("submit error: {0}")]
    Submit(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VtyError>;
