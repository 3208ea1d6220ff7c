//! Shell configuration.

use std::path::Path;

use serde::Deserialize;
use vtyline_types::Result;

/// Configuration for the demo shell (from vtyline.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Initial device host name, shown in the prompt.
    pub hostname: String,
    /// Prompt suffix for operational commands.
    pub prompt: String,
    /// Maximum number of history entries to retain.
    pub history_size: usize,
    /// Echo auto-completed characters back to the user.
    pub echo_completions: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            hostname: "vty".to_string(),
            prompt: "# ".to_string(),
            history_size: 100,
            echo_completions: true,
        }
    }
}

impl ShellConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let c = ShellConfig::default();
        assert_eq!(c.hostname, "vty");
        assert_eq!(c.prompt, "# ");
        assert_eq!(c.history_size, 100);
        assert!(c.echo_completions);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: ShellConfig = toml::from_str("hostname = \"core-1\"").unwrap();
        assert_eq!(c.hostname, "core-1");
        assert_eq!(c.history_size, 100);
    }

    #[test]
    fn full_toml_parses() {
        let text = r#"
hostname = "edge-9"
prompt = "> "
history_size = 25
echo_completions = false
"#;
        let c: ShellConfig = toml::from_str(text).unwrap();
        assert_eq!(c.hostname, "edge-9");
        assert_eq!(c.prompt, "> ");
        assert_eq!(c.history_size, 25);
        assert!(!c.echo_completions);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let r: std::result::Result<ShellConfig, _> = toml::from_str("history_size = [[[");
        assert!(r.is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ShellConfig::load(Path::new("/nonexistent/vtyline.toml")).is_err());
    }
}
