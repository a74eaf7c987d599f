//! Ordered response-matching rules for outcome classification.
//!
//! A response is classified by the first rule (in declaration order) whose
//! pattern matches anywhere in the text. Declaration order is the only
//! tie-break: no rule is "more specific" automatically. The rule list is
//! static configuration for a run and must not be reordered while exploring;
//! usage counting happens in the scheduler's tallies, never here.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a matching rule says about the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Successful, state-changing action worth exploring further.
    Continue,
    /// Dead end: illegal move, missing item, failed interaction, or a
    /// terminal game ending.
    Stop,
}

/// Source form of a rule, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub kind: RuleKind,
}

/// A compiled classification rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: Regex,
    pub kind: RuleKind,
}

/// The ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Known oracle phrasings, continue rules ahead of stop rules.
///
/// Hand-curated against the forest oracle; extend from configuration rather
/// than editing the scheduler when new phrasings show up as unknowns.
const DEFAULT_RULES: &[(&str, &str, RuleKind)] = &[
    // Walking and moving.
    ("walk", r"^\nYou walk (north|south|east|west)\.", RuleKind::Continue),
    ("walk-thicket", r"^\nYou walk east into the thicket", RuleKind::Continue),
    ("walk-path", r"^\nYou walk down the path", RuleKind::Continue),
    ("walk-stairs", r"^\nYou walk (down|up) the stairs", RuleKind::Continue),
    ("walk-deeper", r"^\nYou (slowly )?walk deeper ", RuleKind::Continue),
    ("crawl", r"^\nYou crawl through ", RuleKind::Continue),
    ("enter-leave", r"^\nYou (enter|leave|exit) the ", RuleKind::Continue),
    // Finding and taking items.
    ("found-item", r" You found the .+!", RuleKind::Continue),
    ("took-item", r"^\nYou took the .+\.", RuleKind::Continue),
    // Refusals.
    (
        "cannot-walk",
        r"^\nYou cannot walk (north|south|east|west)\.",
        RuleKind::Stop,
    ),
    ("nothing-here", r"^\nThere is no .+ here\.", RuleKind::Stop),
    ("found-nothing", r" You didn't find anything\.", RuleKind::Stop),
    ("cannot-do", r"^\nYou can't do that\.", RuleKind::Stop),
    // Terminal endings: the oracle exits after printing these.
    ("ending", r"YOU GOT THE (GOOD|BAD) ENDING", RuleKind::Stop),
    ("game-over", r"GAME OVER:", RuleKind::Stop),
];

impl RuleSet {
    /// Compile the built-in rule list.
    pub fn defaults() -> Result<Self> {
        let specs: Vec<RuleSpec> = DEFAULT_RULES
            .iter()
            .map(|(name, pattern, kind)| RuleSpec {
                name: (*name).to_string(),
                pattern: (*pattern).to_string(),
                kind: *kind,
            })
            .collect();
        Self::from_specs(&specs)
    }

    /// Compile an explicit ordered rule list.
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            let pattern = Regex::new(&spec.pattern)
                .with_context(|| format!("compile rule '{}' pattern {:?}", spec.name, spec.pattern))?;
            rules.push(Rule {
                name: spec.name.clone(),
                pattern,
                kind: spec.kind,
            });
        }
        Ok(Self { rules })
    }

    /// Built-in rules followed by `extra` (appended after, so defaults win
    /// ties against config additions).
    pub fn defaults_with(extra: &[RuleSpec]) -> Result<Self> {
        let mut set = Self::defaults()?;
        let appended = Self::from_specs(extra)?;
        set.rules.extend(appended.rules);
        Ok(set)
    }

    /// Return the first rule whose pattern matches anywhere in `response`,
    /// or `None` (the scheduler treats that as unknown).
    pub fn classify(&self, response: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.pattern.is_match(response))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, pattern: &str, kind: RuleKind) -> RuleSpec {
        RuleSpec {
            name: name.to_string(),
            pattern: pattern.to_string(),
            kind,
        }
    }

    #[test]
    fn defaults_classify_movement_as_continue() {
        let rules = RuleSet::defaults().expect("defaults");
        let rule = rules.classify("\nYou walk north.\n\nClearing\n").expect("match");
        assert_eq!(rule.name, "walk");
        assert_eq!(rule.kind, RuleKind::Continue);
    }

    #[test]
    fn defaults_classify_refusals_as_stop() {
        let rules = RuleSet::defaults().expect("defaults");
        let rule = rules.classify("\nYou cannot walk east.").expect("match");
        assert_eq!(rule.name, "cannot-walk");
        assert_eq!(rule.kind, RuleKind::Stop);

        let rule = rules.classify("\nThere is no coin here.").expect("match");
        assert_eq!(rule.name, "nothing-here");
    }

    #[test]
    fn defaults_classify_endings_as_stop() {
        let rules = RuleSet::defaults().expect("defaults");
        let rule = rules
            .classify("\n----\nYOU GOT THE GOOD ENDING\n----\nCONGRATULATIONS!\n")
            .expect("match");
        assert_eq!(rule.kind, RuleKind::Stop);
    }

    #[test]
    fn unmatched_response_returns_none() {
        let rules = RuleSet::defaults().expect("defaults");
        assert!(rules.classify("\nNothing happens.").is_none());
    }

    /// Declaration order is the tie-break: reordering two rules that both
    /// match the same text must change which one wins.
    #[test]
    fn first_declared_rule_wins_ambiguous_text() {
        let a = spec("broad", "walk", RuleKind::Continue);
        let b = spec("narrow", "walk north", RuleKind::Stop);

        let forward = RuleSet::from_specs(&[a.clone(), b.clone()]).expect("rules");
        assert_eq!(forward.classify("You walk north.").expect("match").name, "broad");

        let reversed = RuleSet::from_specs(&[b, a]).expect("rules");
        assert_eq!(
            reversed.classify("You walk north.").expect("match").name,
            "narrow"
        );
    }

    #[test]
    fn extra_rules_append_after_defaults() {
        let extra = spec("shimmer", "The air shimmers", RuleKind::Continue);
        let rules = RuleSet::defaults_with(std::slice::from_ref(&extra)).expect("rules");
        assert_eq!(rules.len(), DEFAULT_RULES.len() + 1);
        // A default still wins when both match.
        let rule = rules
            .classify("\nYou walk north. The air shimmers.")
            .expect("match");
        assert_eq!(rule.name, "walk");
        // The appended rule catches what defaults miss.
        let rule = rules.classify("The air shimmers.").expect("match");
        assert_eq!(rule.name, "shimmer");
    }

    #[test]
    fn from_specs_rejects_invalid_pattern() {
        let bad = spec("broken", "(", RuleKind::Stop);
        let err = RuleSet::from_specs(&[bad]).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
