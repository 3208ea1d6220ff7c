//! vtyline demo shell entry point.
//!
//! A line-driven front end for the vtyline engine: builds the demo router
//! grammar, freezes it, and feeds stdin lines through a cursor one key at
//! a time. Config comes from a CLI arg, the VTYLINE_CONFIG env var, or
//! defaults.

mod config;
mod grammar;
mod repl;

use std::path::PathBuf;

use anyhow::Result;

use config::ShellConfig;
use grammar::{DeviceState, register_demo_grammar};
use repl::Repl;
use vtyline_engine::Grammar;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config from CLI arg, VTYLINE_CONFIG env var, or defaults.
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VTYLINE_CONFIG").ok())
        .map(PathBuf::from);
    let config = match &config_path {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    log::info!("starting vtyline shell as '{}'", config.hostname);

    let state = DeviceState::new(&config.hostname);
    let mut grammar = Grammar::new();
    register_demo_grammar(&mut grammar, &state)?;
    grammar.freeze()?;
    log::info!("grammar frozen ({} nodes)", grammar.node_count());

    println!("vtyline {} -- type '?' for completions, 'quit' to leave", env!("CARGO_PKG_VERSION"));

    let mut repl = Repl::new(config, state);
    repl.run(&mut grammar)?;

    log::info!("vtyline shell shut down cleanly");
    Ok(())
}
