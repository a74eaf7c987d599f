//! Test-only oracle fakes: in-memory world models for unit tests and a
//! scripted shell oracle for bridge and CLI tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::path::CommandPath;
use crate::core::state::StateFingerprint;
use crate::io::config::OracleConfig;
use crate::io::oracle::{Exchange, Oracle, UnresponsiveError};

/// Minimal forest-shaped oracle speaking the prompt protocol, as a POSIX
/// shell script.
///
/// Two rooms, one item, one terminal ending, and a `sleepy` command that
/// goes silent (no prompt) to exercise the exchange deadline.
pub const FAKE_ORACLE_SCRIPT: &str = r#"loc=edge
coin=0
respond() { printf '\n%s' "$1"; }
prompt() { printf '\ncommand> '; }
printf 'Welcome to the test forest.'
prompt
while IFS= read -r line; do
  case "$line" in
    n) if [ "$loc" = edge ]; then loc=clearing; respond 'You walk north.'; else respond 'You cannot walk north.'; fi ;;
    s) if [ "$loc" = clearing ]; then loc=edge; respond 'You walk south.'; else respond 'You cannot walk south.'; fi ;;
    e) respond 'You cannot walk east.' ;;
    w) respond 'You cannot walk west.' ;;
    'take coin') if [ "$loc" = clearing ] && [ "$coin" = 0 ]; then coin=1; respond 'You took the coin.'; else respond 'There is no coin here.'; fi ;;
    'use sword') printf '\nYOU GOT THE GOOD ENDING\nCONGRATULATIONS!'; exit 0 ;;
    sleepy) continue ;;
    look) if [ "$loc" = edge ]; then respond 'Forest Edge'; else respond 'Clearing'; fi ;;
    inv) if [ "$coin" = 1 ]; then printf '\nInventory:\n\tcoin'; else printf '\nInventory:\n\tnothing.'; fi ;;
    xyzzy) respond 'Nothing happens.' ;;
    *) respond "You can't do that." ;;
  esac
  prompt
done
"#;

/// Write the scripted oracle into `dir` and return its path.
pub fn write_fake_oracle(dir: &Path) -> Result<PathBuf> {
    let script = dir.join("oracle.sh");
    fs::write(&script, FAKE_ORACLE_SCRIPT)
        .with_context(|| format!("write {}", script.display()))?;
    Ok(script)
}

/// Bridge config for the scripted oracle, tuned for fast test polling.
pub fn fake_oracle_config(dir: &Path) -> Result<OracleConfig> {
    let script = write_fake_oracle(dir)?;
    Ok(OracleConfig {
        command: vec![
            "/bin/sh".to_string(),
            script.to_string_lossy().into_owned(),
        ],
        poll_interval_ms: 2,
        exchange_timeout_secs: 5,
        ..OracleConfig::default()
    })
}

/// Deterministic in-memory stand-in for an oracle process.
///
/// Models a tiny room graph with persistent item pickups. Commands with no
/// transition from the current location answer with a fixed stop-classified
/// refusal, so schedulers under test see the same shape of conversation the
/// process bridge produces.
pub struct WorldOracle {
    start: String,
    moves: BTreeMap<(String, String), (String, String)>,
    takes: BTreeMap<(String, String), (String, String)>,
    unresponsive: BTreeSet<(String, String)>,
    stop_response: String,
}

impl WorldOracle {
    pub fn new(start: &str) -> Self {
        Self {
            start: start.to_string(),
            moves: BTreeMap::new(),
            takes: BTreeMap::new(),
            unresponsive: BTreeSet::new(),
            stop_response: "\nYou can't do that.".to_string(),
        }
    }

    /// Add a movement transition: `command` at `from` leads to `to`.
    pub fn with_move(mut self, from: &str, command: &str, to: &str, response: &str) -> Self {
        self.moves.insert(
            (from.to_string(), command.to_string()),
            (to.to_string(), response.to_string()),
        );
        self
    }

    /// Add an item pickup: `command` at `location` grants `item` once.
    pub fn with_take(mut self, location: &str, command: &str, item: &str, response: &str) -> Self {
        self.takes.insert(
            (location.to_string(), command.to_string()),
            (item.to_string(), response.to_string()),
        );
        self
    }

    /// Make one (setup, command) pair time out like a silent oracle.
    pub fn with_unresponsive(mut self, setup: &CommandPath, command: &str) -> Self {
        self.unresponsive
            .insert((setup.render_wire(), command.to_string()));
        self
    }

    fn apply(&self, location: &mut String, items: &mut BTreeSet<String>, command: &str) -> String {
        let key = (location.clone(), command.to_string());
        if let Some((next, response)) = self.moves.get(&key) {
            *location = next.clone();
            return response.clone();
        }
        if let Some((item, response)) = self.takes.get(&key) {
            if items.insert(item.clone()) {
                return response.clone();
            }
            return self.stop_response.clone();
        }
        self.stop_response.clone()
    }
}

impl Oracle for WorldOracle {
    fn probe(&self) -> Result<StateFingerprint> {
        Ok(StateFingerprint {
            location: self.start.clone(),
            items: BTreeSet::new(),
        })
    }

    fn run(&self, setup: &CommandPath, command: &str) -> Result<Exchange> {
        if self
            .unresponsive
            .contains(&(setup.render_wire(), command.to_string()))
        {
            return Err(UnresponsiveError {
                waited: Duration::from_secs(0),
                buffered_bytes: 0,
            }
            .into());
        }

        let mut location = self.start.clone();
        let mut items = BTreeSet::new();
        for cmd in setup.commands() {
            self.apply(&mut location, &mut items, cmd);
        }
        let response = self.apply(&mut location, &mut items, command);
        Ok(Exchange {
            response,
            state: StateFingerprint { location, items },
        })
    }
}
