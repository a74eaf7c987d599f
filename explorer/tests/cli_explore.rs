//! CLI tests for `explorer explore`.
//!
//! Spawns the explorer binary against a small scripted shell oracle and
//! verifies report contents and exit codes.

use std::fs;
use std::process::Command;

use explorer::test_support::write_fake_oracle;

/// Config keeping the run quick: small vocabulary, fast polling.
const CONFIG: &str = r#"
[oracle]
poll_interval_ms = 2

[explore]
commands = ["n", "e", "s", "w", "take coin"]
"#;

#[test]
fn explore_discovers_states_and_reports() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_fake_oracle(temp.path()).expect("script");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, CONFIG).expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_explorer"))
        .arg("explore")
        .arg("--config")
        .arg(&config_path)
        .arg("--locations")
        .arg("--paths")
        .arg("--stats")
        .arg("/bin/sh")
        .arg(&script)
        .output()
        .expect("run explorer");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Locations section: both rooms, sorted.
    assert!(stdout.contains("Clearing\n"));
    assert!(stdout.contains("Forest Edge\n"));
    // Paths section: the coin pickup path was discovered.
    assert!(stdout.contains("n;take coin\n"));
    // Stats: two rooms, with and without the coin.
    assert!(stdout.contains("game states: 4\n"));
    assert!(stdout.contains("locations: 2\n"));
    assert!(stdout.contains("items: 1\n"));
    assert!(stdout.contains("stop: queue exhausted\n"));
}

#[test]
fn explore_depth_bound_limits_discovery() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_fake_oracle(temp.path()).expect("script");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, CONFIG).expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_explorer"))
        .arg("explore")
        .arg("--config")
        .arg(&config_path)
        .arg("-n")
        .arg("0")
        .arg("--stats")
        .arg("/bin/sh")
        .arg(&script)
        .output()
        .expect("run explorer");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Depth 0: only the start state and its one-command discoveries.
    assert!(stdout.contains("game states: 2\n"));
    assert!(stdout.contains("steps: 1\n"));
}

#[test]
fn explore_rejects_broken_config() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_fake_oracle(temp.path()).expect("script");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "[oracle]\npoll_interval_ms = 0\n").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_explorer"))
        .arg("explore")
        .arg("--config")
        .arg(&config_path)
        .arg("/bin/sh")
        .arg(&script)
        .output()
        .expect("run explorer");

    assert_eq!(output.status.code(), Some(explorer::exit_codes::INVALID));
}
