//! Application callback interfaces.
//!
//! The engine never interprets what a command *does*: submission hands the
//! registered handler an opaque code and the ordered token slice. The three
//! callback roles are closed traits so every dispatch site is exhaustive.

use serde::{Deserialize, Serialize};
use vtyline_types::{Result, TokenValue};

/// Mode a submitted command executes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandMode {
    /// Plain operational command (show/debug/clear/run).
    Operational,
    /// Applying configuration (positive form under the config branch).
    ConfigEnable,
    /// Removing configuration (negated form under the config branch).
    ConfigDisable,
}

/// Application callback invoked when a command is submitted.
///
/// `code` is the opaque value registered with the node. A returned error
/// marks the session unsuccessful; already-applied batch steps are not
/// rolled back.
pub trait CommandHandler {
    fn execute(&self, code: u32, args: &[TokenValue], mode: CommandMode) -> Result<()>;
}

impl<F> CommandHandler for F
where
    F: Fn(u32, &[TokenValue], CommandMode) -> Result<()>,
{
    fn execute(&self, code: u32, args: &[TokenValue], mode: CommandMode) -> Result<()> {
        self(code, args, mode)
    }
}

/// Application-supplied semantic check over a leaf token, run after the
/// built-in type validation passes.
pub trait LeafValidator {
    fn validate(&self, so_far: &[TokenValue], text: &str) -> bool;
}

impl<F> LeafValidator for F
where
    F: Fn(&[TokenValue], &str) -> bool,
{
    fn validate(&self, so_far: &[TokenValue], text: &str) -> bool {
        self(so_far, text)
    }
}

/// Enumerates legal leaf values when the user requests in-line help.
pub trait ValueDisplay {
    fn choices(&self, so_far: &[TokenValue]) -> Vec<String>;
}

impl<F> ValueDisplay for F
where
    F: Fn(&[TokenValue]) -> Vec<String>,
{
    fn choices(&self, so_far: &[TokenValue]) -> Vec<String> {
        self(so_far)
    }
}
