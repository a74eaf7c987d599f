//! Explorer configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::rules::{RuleSet, RuleSpec};

/// Top-level configuration.
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to values tuned against the forest
/// oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExplorerConfig {
    pub oracle: OracleConfig,
    pub explore: ExploreConfig,
    /// Extra classification rules, appended after the built-in defaults.
    pub rules: Vec<RuleSpec>,
}

/// How to spawn and talk to the oracle process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Oracle argv (program plus arguments).
    pub command: Vec<String>,

    /// Prompt token; the sentinel is a newline followed by this.
    pub prompt: String,

    /// Canonical "describe current location" command.
    pub look_command: String,

    /// Canonical "list possessions" command.
    pub inventory_command: String,

    /// Literal no-items line in the inventory listing.
    pub inventory_empty: String,

    /// Sleep between non-blocking output polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Empty polls required after the last data arrival before a sentinel
    /// match is accepted. A tunable, not a correctness invariant.
    pub settle_polls: u32,

    /// Additional empty polls before end-of-stream is accepted as a
    /// terminator (terminal endings exit without printing another prompt).
    pub eof_grace_polls: u32,

    /// Deadline per exchange; prolonged silence becomes a recoverable
    /// unresponsive error for that one path.
    pub exchange_timeout_secs: u64,
}

/// Search bounds and the command vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExploreConfig {
    /// Fixed command vocabulary, tried in declared order.
    pub commands: Vec<String>,

    /// Maximum commands per setup path; discovery may add one more.
    pub max_depth: usize,

    /// Maximum paths dequeued before the run stops with a budget outcome.
    pub max_steps: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: vec!["./forest".to_string()],
            prompt: "command> ".to_string(),
            look_command: "look".to_string(),
            inventory_command: "inv".to_string(),
            inventory_empty: "nothing.".to_string(),
            poll_interval_ms: 10,
            settle_polls: 1,
            eof_grace_polls: 3,
            exchange_timeout_secs: 10,
        }
    }
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            commands: [
                "n",
                "e",
                "s",
                "w",
                "take coin",
                "take statuette",
                "take hammer",
                "take sword",
                "take ladder",
                "take key",
                "take hamburger",
                "take secpter",
                "use red coin",
                "use blue coin",
                "use green coin",
                "use statuette",
                "use hammer",
                "use sword",
                "use ladder",
                "use key",
                "use hamburger",
                "use secpter",
                "find",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            max_depth: 9999,
            max_steps: 100_000,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            explore: ExploreConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl ExplorerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.oracle.command.is_empty() || self.oracle.command[0].trim().is_empty() {
            return Err(anyhow!("oracle.command must be a non-empty array"));
        }
        if self.oracle.prompt.is_empty() {
            return Err(anyhow!("oracle.prompt must be non-empty"));
        }
        if self.oracle.poll_interval_ms == 0 {
            return Err(anyhow!("oracle.poll_interval_ms must be > 0"));
        }
        if self.oracle.exchange_timeout_secs == 0 {
            return Err(anyhow!("oracle.exchange_timeout_secs must be > 0"));
        }
        for command in [&self.oracle.look_command, &self.oracle.inventory_command] {
            if command.trim().is_empty() || command.contains('\n') {
                return Err(anyhow!("invalid oracle introspection command {command:?}"));
            }
        }
        if self.explore.commands.is_empty() {
            return Err(anyhow!("explore.commands must be a non-empty array"));
        }
        for command in &self.explore.commands {
            if command.is_empty() || command.contains('\n') {
                return Err(anyhow!("invalid vocabulary command {command:?}"));
            }
        }
        // Surface bad rule patterns at load time, not mid-run.
        self.rule_set()?;
        Ok(())
    }

    /// Built-in rules followed by this config's extra rules.
    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::defaults_with(&self.rules)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ExplorerConfig::default()`.
pub fn load_config(path: &Path) -> Result<ExplorerConfig> {
    if !path.exists() {
        let cfg = ExplorerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ExplorerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ExplorerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
