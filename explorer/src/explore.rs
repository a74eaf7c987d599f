//! Breadth-first exploration over the oracle's reachable states.
//!
//! One logical conversation at a time: each (setup, command) pair gets its
//! own fresh oracle process via the bridge, so paths at the same depth share
//! no oracle state. The queue is strict FIFO (all depth-`k` paths are fully
//! expanded before any depth-`k+1` path), and within one dequeued path the
//! vocabulary is tried in declared order, which is the tie-break for which
//! path wins a visited entry.

use std::collections::{BTreeMap, VecDeque};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::path::CommandPath;
use crate::core::types::{
    Classification, CommandTally, ExploreOutcome, ExploreStop, PathOutcome,
};
use crate::io::config::ExplorerConfig;
use crate::io::oracle::{Oracle, UnresponsiveError};

/// Progress report for one dequeued path, fed to the CLI's verbose trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTrace<'a> {
    pub setup: &'a CommandPath,
    pub queue_len: usize,
    pub steps: usize,
}

/// Discover every reachable state breadth-first, up to the configured depth
/// and step budget.
///
/// Per dequeued setup, every vocabulary command is sent through a fresh
/// bridge call; the response is classified and recorded keyed by path
/// (whether or not the fingerprint is new); a new fingerprint is stored with
/// its discovering path and enqueued only when the classification says
/// continue and depth allows. An unresponsive oracle skips that one path.
pub fn explore<O: Oracle, F: FnMut(&StepTrace<'_>)>(
    oracle: &O,
    config: &ExplorerConfig,
    mut on_step: F,
) -> Result<ExploreOutcome> {
    let rules = config.rule_set()?;

    let start = oracle.probe().context("probe start state")?;
    let mut visited = BTreeMap::new();
    let mut queue = VecDeque::new();
    visited.insert(start, CommandPath::empty());
    queue.push_back(CommandPath::empty());

    let mut outcomes = BTreeMap::new();
    let mut unknowns = BTreeMap::new();
    let mut rule_hits: BTreeMap<String, u64> = BTreeMap::new();
    let mut command_tallies: BTreeMap<String, CommandTally> = BTreeMap::new();
    let mut unresponsive = Vec::new();
    let mut steps = 0usize;
    let mut stop = ExploreStop::Exhausted;

    while let Some(setup) = queue.pop_front() {
        if steps >= config.explore.max_steps {
            // Put the path back so the outcome reports the full frontier.
            queue.push_front(setup);
            stop = ExploreStop::StepBudget {
                steps,
                max_steps: config.explore.max_steps,
            };
            break;
        }
        steps += 1;
        on_step(&StepTrace {
            setup: &setup,
            queue_len: queue.len(),
            steps,
        });

        for command in &config.explore.commands {
            let path = setup.child(command);
            let exchange = match oracle.run(&setup, command) {
                Ok(exchange) => exchange,
                Err(err) if err.downcast_ref::<UnresponsiveError>().is_some() => {
                    warn!(path = %path, "oracle unresponsive, skipping path");
                    unresponsive.push(path);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let matched = rules.classify(&exchange.response);
            let kind = match matched {
                Some(rule) => Classification::from(rule.kind),
                None => Classification::Unknown,
            };
            if let Some(rule) = matched {
                *rule_hits.entry(rule.name.clone()).or_default() += 1;
            }
            command_tallies
                .entry(command.clone())
                .or_default()
                .record(kind);
            if kind == Classification::Unknown {
                unknowns.insert(path.clone(), exchange.response.clone());
            }
            outcomes.insert(
                path.clone(),
                PathOutcome {
                    command: command.clone(),
                    rule: matched.map(|rule| rule.name.clone()),
                    kind,
                },
            );

            // Duplicate-state detection is independent of outcome recording:
            // only the first path to reach a fingerprint is kept and eligible
            // for expansion.
            if !visited.contains_key(&exchange.state) {
                debug!(path = %path, location = %exchange.state.location, "new state");
                visited.insert(exchange.state, path.clone());
                if kind == Classification::Continue && setup.depth() < config.explore.max_depth {
                    queue.push_back(path);
                }
            }
        }
    }

    Ok(ExploreOutcome {
        visited,
        outcomes,
        unknowns,
        rule_hits,
        command_tallies,
        unresponsive,
        pending: queue.into_iter().collect(),
        steps,
        stop,
    })
}
