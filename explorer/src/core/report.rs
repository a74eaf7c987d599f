//! Pure aggregation of exploration results into printable summaries.
//!
//! Reads the scheduler's accumulated maps and nothing else; rendering is
//! plain text, one entry per line, in the stable order the BTree-backed maps
//! provide. Field order within a run is stable; no machine-readable schema is
//! promised.

use std::collections::BTreeSet;

use crate::core::types::{ExploreOutcome, ExploreStop};

/// Headline counts over a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub states: usize,
    pub paths: usize,
    pub locations: usize,
    pub items: usize,
    pub unknowns: usize,
    pub unresponsive: usize,
    pub steps: usize,
}

/// Aggregate headline counts from an outcome.
pub fn summarize(outcome: &ExploreOutcome) -> Summary {
    Summary {
        states: outcome.visited.len(),
        paths: unique_paths(outcome).len(),
        locations: unique_locations(outcome).len(),
        items: unique_items(outcome).len(),
        unknowns: outcome.unknowns.len(),
        unresponsive: outcome.unresponsive.len(),
        steps: outcome.steps,
    }
}

fn unique_locations(outcome: &ExploreOutcome) -> BTreeSet<&str> {
    outcome
        .visited
        .keys()
        .map(|fp| fp.location.as_str())
        .collect()
}

fn unique_items(outcome: &ExploreOutcome) -> BTreeSet<&str> {
    outcome
        .visited
        .keys()
        .flat_map(|fp| fp.items.iter().map(String::as_str))
        .collect()
}

fn unique_paths(outcome: &ExploreOutcome) -> BTreeSet<String> {
    outcome
        .visited
        .values()
        .map(ToString::to_string)
        .collect()
}

/// One unique location per line.
pub fn render_locations(outcome: &ExploreOutcome) -> String {
    render_lines(unique_locations(outcome).into_iter())
}

/// One discovered item per line.
pub fn render_items(outcome: &ExploreOutcome) -> String {
    render_lines(unique_items(outcome).into_iter())
}

/// One discovering path per line (semicolon-joined commands).
pub fn render_paths(outcome: &ExploreOutcome) -> String {
    render_lines(unique_paths(outcome).iter().map(String::as_str))
}

/// Paths whose responses no rule matched, with the raw response text.
pub fn render_unknowns(outcome: &ExploreOutcome) -> String {
    let mut buf = String::new();
    for (path, response) in &outcome.unknowns {
        buf.push_str(&format!("{path}: {}\n", response.trim()));
    }
    buf
}

/// Statistics: headline counts, then per-rule and per-command tallies.
pub fn render_stats(outcome: &ExploreOutcome) -> String {
    let summary = summarize(outcome);
    let mut buf = String::new();
    buf.push_str(&format!("game states: {}\n", summary.states));
    buf.push_str(&format!("paths: {}\n", summary.paths));
    buf.push_str(&format!("locations: {}\n", summary.locations));
    buf.push_str(&format!("items: {}\n", summary.items));
    buf.push_str(&format!("unknown responses: {}\n", summary.unknowns));
    buf.push_str(&format!("unresponsive paths: {}\n", summary.unresponsive));
    buf.push_str(&format!("steps: {}\n", summary.steps));
    match &outcome.stop {
        ExploreStop::Exhausted => buf.push_str("stop: queue exhausted\n"),
        ExploreStop::StepBudget { steps, max_steps } => {
            buf.push_str(&format!("stop: step budget ({steps}/{max_steps})\n"));
        }
    }
    for (rule, hits) in &outcome.rule_hits {
        buf.push_str(&format!("rule {rule}: {hits}\n"));
    }
    for (command, tally) in &outcome.command_tallies {
        buf.push_str(&format!(
            "command {command}: continue={} stop={} unknown={}\n",
            tally.continued, tally.stopped, tally.unknown
        ));
    }
    buf
}

fn render_lines<'a, I: Iterator<Item = &'a str>>(lines: I) -> String {
    let mut buf = String::new();
    for line in lines {
        buf.push_str(line);
        buf.push('\n');
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::core::path::CommandPath;
    use crate::core::state::StateFingerprint;
    use crate::core::types::{Classification, CommandTally, PathOutcome};

    fn outcome() -> ExploreOutcome {
        let start = StateFingerprint::from_probe("Forest Edge", "", "nothing.");
        let clearing = StateFingerprint::from_probe("Clearing", "", "nothing.");
        let clearing_coin = StateFingerprint::from_probe("Clearing", "\tcoin\n", "nothing.");

        let n = CommandPath::empty().child("n");
        let n_take = n.child("take coin");

        let mut visited = BTreeMap::new();
        visited.insert(start, CommandPath::empty());
        visited.insert(clearing, n.clone());
        visited.insert(clearing_coin, n_take.clone());

        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            n.clone(),
            PathOutcome {
                command: "n".to_string(),
                rule: Some("walk".to_string()),
                kind: Classification::Continue,
            },
        );

        let mut unknowns = BTreeMap::new();
        unknowns.insert(n.child("xyzzy"), "\nNothing happens.\n".to_string());

        let mut rule_hits = BTreeMap::new();
        rule_hits.insert("walk".to_string(), 2u64);

        let mut command_tallies = BTreeMap::new();
        command_tallies.insert(
            "n".to_string(),
            CommandTally {
                continued: 1,
                stopped: 1,
                unknown: 0,
            },
        );

        ExploreOutcome {
            visited,
            outcomes,
            unknowns,
            rule_hits,
            command_tallies,
            unresponsive: Vec::new(),
            pending: Vec::new(),
            steps: 3,
            stop: ExploreStop::Exhausted,
        }
    }

    #[test]
    fn summarize_counts_unique_values() {
        let summary = summarize(&outcome());
        assert_eq!(summary.states, 3);
        assert_eq!(summary.paths, 3);
        assert_eq!(summary.locations, 2);
        assert_eq!(summary.items, 1);
        assert_eq!(summary.unknowns, 1);
        assert_eq!(summary.steps, 3);
    }

    #[test]
    fn locations_render_sorted_and_unique() {
        assert_eq!(render_locations(&outcome()), "Clearing\nForest Edge\n");
    }

    #[test]
    fn paths_render_one_per_line() {
        let rendered = render_paths(&outcome());
        assert!(rendered.contains("(start)\n"));
        assert!(rendered.contains("n;take coin\n"));
    }

    #[test]
    fn unknowns_render_path_and_response() {
        assert_eq!(render_unknowns(&outcome()), "n;xyzzy: Nothing happens.\n");
    }

    #[test]
    fn stats_render_stable_lines() {
        let rendered = render_stats(&outcome());
        assert!(rendered.contains("game states: 3\n"));
        assert!(rendered.contains("stop: queue exhausted\n"));
        assert!(rendered.contains("rule walk: 2\n"));
        assert!(rendered.contains("command n: continue=1 stop=1 unknown=0\n"));
    }
}
