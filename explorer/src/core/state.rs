//! Comparable snapshots of the oracle's observable state.
//!
//! A fingerprint is everything the explorer can see of the oracle after a
//! command: where it says it is, and what it says it carries. Two paths that
//! produce equal fingerprints are treated as reaching the same state.

use std::collections::BTreeSet;

/// Location plus item set, captured fresh after every command.
///
/// Ordering is derived: location first, then the sorted item sequence. This
/// gives the visited map a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateFingerprint {
    pub location: String,
    pub items: BTreeSet<String>,
}

impl StateFingerprint {
    /// Build a fingerprint from the canonical look/inventory exchanges.
    ///
    /// `location_text` is stored whitespace-trimmed. `inventory_text` is the
    /// oracle's tab-indented possession listing; `empty_marker` is the
    /// literal no-items line (excluded from the item set).
    pub fn from_probe(location_text: &str, inventory_text: &str, empty_marker: &str) -> Self {
        Self {
            location: location_text.trim().to_string(),
            items: parse_inventory(inventory_text, empty_marker),
        }
    }
}

/// Parse a tab-indented inventory listing into an item set.
///
/// One item per `\t`-prefixed line; surrounding whitespace is trimmed; the
/// header line and the `empty_marker` placeholder are skipped.
fn parse_inventory(text: &str, empty_marker: &str) -> BTreeSet<String> {
    let mut items = BTreeSet::new();
    for line in text.lines() {
        let Some(rest) = line.strip_prefix('\t') else {
            continue;
        };
        let item = rest.trim();
        if item.is_empty() || item == empty_marker {
            continue;
        }
        items.insert(item.to_string());
    }
    items
}
