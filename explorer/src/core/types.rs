//! Shared deterministic types for explorer core logic.
//!
//! These types define stable contracts between the scheduler and the
//! reporter. They carry no I/O handles and iterate in deterministic order
//! (BTree-backed maps keyed by path or fingerprint).

use std::collections::BTreeMap;

use crate::core::path::CommandPath;
use crate::core::rules::RuleKind;
use crate::core::state::StateFingerprint;

/// Outcome class for one attempted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A continue rule matched: worth expanding further.
    Continue,
    /// A stop rule matched: dead end.
    Stop,
    /// No rule matched; recorded for operator inspection, never expanded.
    Unknown,
}

impl From<RuleKind> for Classification {
    fn from(kind: RuleKind) -> Self {
        match kind {
            RuleKind::Continue => Classification::Continue,
            RuleKind::Stop => Classification::Stop,
        }
    }
}

/// Recorded result for one attempted path (setup + command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    /// The command under test (last element of the path).
    pub command: String,
    /// Name of the matching rule, if any.
    pub rule: Option<String>,
    pub kind: Classification,
}

/// Per-vocabulary-command outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandTally {
    pub continued: u64,
    pub stopped: u64,
    pub unknown: u64,
}

impl CommandTally {
    pub fn record(&mut self, kind: Classification) {
        match kind {
            Classification::Continue => self.continued += 1,
            Classification::Stop => self.stopped += 1,
            Classification::Unknown => self.unknown += 1,
        }
    }
}

/// Why the exploration loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreStop {
    /// The pending queue drained.
    Exhausted,
    /// The step budget ran out before the queue drained.
    StepBudget { steps: usize, max_steps: usize },
}

/// Everything a finished exploration run discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreOutcome {
    /// Fingerprint -> first (BFS-shortest) path that reached it.
    pub visited: BTreeMap<StateFingerprint, CommandPath>,
    /// Attempted path -> classification record (kept for every attempt,
    /// whether or not its fingerprint was new).
    pub outcomes: BTreeMap<CommandPath, PathOutcome>,
    /// Attempted path -> raw response, for responses no rule matched.
    pub unknowns: BTreeMap<CommandPath, String>,
    /// Rule name -> number of responses it classified.
    pub rule_hits: BTreeMap<String, u64>,
    /// Vocabulary command -> outcome counts.
    pub command_tallies: BTreeMap<String, CommandTally>,
    /// Paths skipped because the oracle went silent past the deadline.
    pub unresponsive: Vec<CommandPath>,
    /// Paths left in the pending queue when the run stopped (empty when the
    /// queue drained).
    pub pending: Vec<CommandPath>,
    /// Number of paths dequeued and expanded.
    pub steps: usize,
    pub stop: ExploreStop,
}
