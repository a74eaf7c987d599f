//! Regression replay of recorded paths against expected response patterns.
//!
//! Mutually exclusive with exploration: a run either discovers or verifies,
//! never both. Verification is fail-fast: the first mismatch invalidates
//! confidence in the oracle relative to the recorded baseline, so the run
//! halts with full context instead of collecting further mismatches.

use std::fmt;
use std::io::BufRead;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::debug;

use crate::core::path::CommandPath;
use crate::io::oracle::Oracle;

/// One recorded path with the pattern its final response must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRecord {
    pub path: CommandPath,
    pub expected: String,
}

/// A replayed response did not match its expected pattern.
#[derive(Debug)]
pub struct MismatchError {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for MismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "response mismatch on path {}\n  expected pattern: {}\n  actual response: {}",
            self.path,
            self.expected,
            self.actual.trim()
        )
    }
}

impl std::error::Error for MismatchError {}

/// Summary of a completed verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub checked: usize,
}

/// Parse verification records from the input stream.
///
/// Records are pairs of lines: a pipe-delimited command path, then the
/// expected pattern, repeated until end of input. Blank lines between
/// records are tolerated; a path line without a pattern line is an error.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<VerifyRecord>> {
    let mut records = Vec::new();
    let mut lines = reader.lines();
    while let Some(path_line) = lines.next() {
        let path_line = path_line.context("read path line")?;
        if path_line.trim().is_empty() {
            continue;
        }
        let expected = match lines.next() {
            Some(line) => line.context("read pattern line")?,
            None => bail!("path line without expected pattern: {path_line:?}"),
        };
        let path = CommandPath::parse_wire(&path_line)
            .with_context(|| format!("parse path line {path_line:?}"))?;
        Regex::new(&expected)
            .with_context(|| format!("invalid expected pattern {expected:?}"))?;
        records.push(VerifyRecord { path, expected });
    }
    Ok(records)
}

/// Replay every record against a fresh oracle and check expected patterns.
///
/// Each path splits into setup (all but the last command) and the command
/// under test; the pattern is regex-searched against the captured response.
/// Returns a [`MismatchError`] (via `downcast_ref`) on the first divergence.
pub fn verify<O: Oracle>(oracle: &O, records: &[VerifyRecord]) -> Result<VerifyOutcome> {
    for record in records {
        let (setup, command) = record
            .path
            .split_last()
            .ok_or_else(|| anyhow!("empty path in verification record"))?;
        let exchange = oracle
            .run(&setup, command)
            .with_context(|| format!("replay {}", record.path))?;
        let pattern = Regex::new(&record.expected)
            .with_context(|| format!("invalid expected pattern {:?}", record.expected))?;
        if !pattern.is_match(&exchange.response) {
            return Err(MismatchError {
                path: record.path.to_string(),
                expected: record.expected.clone(),
                actual: exchange.response,
            }
            .into());
        }
        debug!(path = %record.path, "verified");
    }
    Ok(VerifyOutcome {
        checked: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WorldOracle;

    fn world() -> WorldOracle {
        WorldOracle::new("Forest Edge")
            .with_move("Forest Edge", "n", "Clearing", "\nYou walk north.")
            .with_take("Clearing", "take coin", "coin", "\nYou took the coin.")
    }

    fn record(path: &[&str], expected: &str) -> VerifyRecord {
        VerifyRecord {
            path: CommandPath::from_commands(path.iter().copied()).expect("path"),
            expected: expected.to_string(),
        }
    }

    #[test]
    fn verify_passes_when_patterns_match() {
        let records = vec![
            record(&["n"], r"^\nYou walk north\."),
            record(&["n", "take coin"], r"took the coin"),
        ];
        let outcome = verify(&world(), &records).expect("verify");
        assert_eq!(outcome.checked, 2);
    }

    /// The first mismatch halts the run with path, expected pattern, and
    /// actual response.
    #[test]
    fn verify_fails_fast_with_full_context() {
        let records = vec![
            record(&["n"], r"^\nYou walk north\."),
            record(&["e"], r"^\nYou walk east\."),
            record(&["n", "take coin"], r"took the coin"),
        ];
        let err = verify(&world(), &records).expect_err("mismatch");
        let mismatch = err
            .downcast_ref::<MismatchError>()
            .expect("mismatch error");
        assert_eq!(mismatch.path, "e");
        assert_eq!(mismatch.expected, r"^\nYou walk east\.");
        assert_eq!(mismatch.actual, "\nYou can't do that.");
    }

    #[test]
    fn verify_rejects_empty_path_record() {
        let records = vec![VerifyRecord {
            path: CommandPath::empty(),
            expected: "anything".to_string(),
        }];
        assert!(verify(&world(), &records).is_err());
    }

    #[test]
    fn parse_records_reads_line_pairs() {
        let input = "n|take coin\ntook the coin\n\nn\n^\\nYou walk north\\.\n";
        let records = parse_records(input.as_bytes()).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path.commands(), ["n", "take coin"]);
        assert_eq!(records[1].expected, "^\\nYou walk north\\.");
    }

    #[test]
    fn parse_records_rejects_dangling_path_line() {
        let err = parse_records("n|e\n".as_bytes()).expect_err("dangling");
        assert!(err.to_string().contains("without expected pattern"));
    }

    #[test]
    fn parse_records_rejects_invalid_pattern() {
        let err = parse_records("n\n(\n".as_bytes()).expect_err("bad pattern");
        assert!(err.to_string().contains("invalid expected pattern"));
    }
}
