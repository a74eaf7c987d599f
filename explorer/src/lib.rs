//! Breadth-first black-box explorer for interactive text oracles.
//!
//! Drives an external, prompt-driven program ("the oracle") through fresh
//! subprocess conversations, fingerprints each state it reaches (location
//! plus inventory), and classifies responses against an ordered rule list.
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (paths, fingerprints, rules,
//!   report aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (configuration, the oracle
//!   subprocess bridge). Isolated behind the `Oracle` trait to enable
//!   scripted fakes in tests.
//!
//! Orchestration modules ([`explore`], [`verify`]) coordinate core logic
//! with I/O to implement the CLI's two mutually exclusive modes.

pub mod core;
pub mod exit_codes;
pub mod explore;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
