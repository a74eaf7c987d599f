//! Stable exit codes for explorer CLI commands.

/// Command succeeded; in verify mode, every record matched.
pub const OK: i32 = 0;
/// Invalid arguments, configuration, or oracle environment.
pub const INVALID: i32 = 1;
/// `explorer verify` found a response that diverged from its record.
pub const MISMATCH: i32 = 2;
