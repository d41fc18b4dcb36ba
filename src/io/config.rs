//! Mission configuration loaded from a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::transcript::ContextPolicy;

/// Mission configuration (TOML).
///
/// The file is intended to be edited by humans. Missing fields default to
/// sensible values (correction limit 5, script limit 12, max_tokens 8192,
/// temperature 0.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MissionConfig {
    /// Base URL of the OpenAI-compatible chat-completions API.
    pub api_base: String,

    /// Environment variable holding the API key. The key itself never lives
    /// in the config file.
    pub api_key_env: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Maximum output tokens per completion.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Bounded correction retries per failing step.
    pub max_correction_attempts: u32,

    /// Total script files allowed across the run.
    pub max_scripts: u32,

    /// Request timeout for each blocking LLM call.
    pub llm_timeout_secs: u64,

    /// Wall-clock budget for each script execution; a timed-out script is
    /// killed and treated as a recoverable execution error.
    pub script_timeout_secs: u64,

    /// Truncate captured script output and prompt sections beyond this many bytes.
    pub output_limit_bytes: usize,

    pub interpreter: InterpreterConfig,

    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Command prefix executing a script file (e.g. `["python3"]`); the
    /// script path is appended as the final argument.
    pub command: Vec<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Resubmit the full transcript on every call.
    Full,
    /// Retain the first turn plus the trailing `window_turns` turns.
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    pub mode: HistoryMode,
    pub window_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mode: HistoryMode::Full,
            window_turns: 24,
        }
    }
}

impl HistoryConfig {
    pub fn policy(&self) -> ContextPolicy {
        match self.mode {
            HistoryMode::Full => ContextPolicy::Full,
            HistoryMode::Window => ContextPolicy::Window {
                last_turns: self.window_turns,
            },
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "SCRIPTPILOT_API_KEY".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 8192,
            temperature: 0.7,
            max_correction_attempts: 5,
            max_scripts: 12,
            llm_timeout_secs: 120,
            script_timeout_secs: 600,
            output_limit_bytes: 100_000,
            interpreter: InterpreterConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl MissionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(anyhow!("api_base must be non-empty"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.max_correction_attempts == 0 {
            return Err(anyhow!("max_correction_attempts must be > 0"));
        }
        if self.max_scripts == 0 {
            return Err(anyhow!("max_scripts must be > 0"));
        }
        if self.llm_timeout_secs == 0 {
            return Err(anyhow!("llm_timeout_secs must be > 0"));
        }
        if self.script_timeout_secs == 0 {
            return Err(anyhow!("script_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.interpreter.command.is_empty() || self.interpreter.command[0].trim().is_empty() {
            return Err(anyhow!("interpreter.command must be a non-empty array"));
        }
        if self.history.mode == HistoryMode::Window && self.history.window_turns == 0 {
            return Err(anyhow!("history.window_turns must be > 0 in window mode"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MissionConfig::default()`.
pub fn load_config(path: &Path) -> Result<MissionConfig> {
    if !path.exists() {
        let cfg = MissionConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MissionConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MissionConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, MissionConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = MissionConfig {
            max_scripts: 4,
            ..MissionConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "model = \"gpt-4o-mini\"\nmax_scripts = 3\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_scripts, 3);
        assert_eq!(cfg.max_correction_attempts, 5);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let cfg = MissionConfig {
            max_scripts: 0,
            ..MissionConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = MissionConfig {
            interpreter: InterpreterConfig {
                command: Vec::new(),
            },
            ..MissionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn history_modes_map_to_policies() {
        let cfg = HistoryConfig {
            mode: HistoryMode::Window,
            window_turns: 8,
        };
        assert_eq!(cfg.policy(), ContextPolicy::Window { last_turns: 8 });
        assert_eq!(HistoryConfig::default().policy(), ContextPolicy::Full);
    }
}
