//! Oracle subprocess bridge implementing the prompt-synchronized exchange
//! protocol.
//!
//! The [`Oracle`] trait decouples exploration and verification from the
//! process backend. Tests use scripted fakes; the real backend,
//! [`PipeOracle`], spawns one fresh oracle process per call, drives it over
//! piped stdin/stdout, and terminates it unconditionally before returning.
//! No knowledge of game semantics lives here.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::path::CommandPath;
use crate::core::state::StateFingerprint;
use crate::io::config::OracleConfig;

/// Bound on reaping a killed oracle before falling back to a blocking wait.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Response and resulting state captured for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Oracle output for the command, sentinel stripped.
    pub response: String,
    /// Fingerprint captured via the canonical look/inventory exchanges.
    pub state: StateFingerprint,
}

/// Abstraction over the oracle conversation backend.
pub trait Oracle {
    /// Fingerprint of the start state (no commands issued).
    fn probe(&self) -> Result<StateFingerprint>;

    /// Replay `setup` (responses discarded), send `command`, and capture its
    /// response and the state it reaches.
    fn run(&self, setup: &CommandPath, command: &str) -> Result<Exchange>;
}

/// The oracle produced neither a complete response nor end-of-stream before
/// the exchange deadline.
///
/// Recoverable per path: the scheduler skips the path and keeps exploring.
#[derive(Debug)]
pub struct UnresponsiveError {
    pub waited: Duration,
    pub buffered_bytes: usize,
}

impl fmt::Display for UnresponsiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "oracle produced no complete response within {:?} ({} bytes buffered)",
            self.waited, self.buffered_bytes
        )
    }
}

impl std::error::Error for UnresponsiveError {}

/// Process-backed oracle bridge.
pub struct PipeOracle {
    config: OracleConfig,
}

impl PipeOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    fn fingerprint(&self, session: &mut OracleSession) -> Result<StateFingerprint> {
        let location = session.exchange(Some(&self.config.look_command))?;
        let inventory = session.exchange(Some(&self.config.inventory_command))?;
        Ok(StateFingerprint::from_probe(
            &location,
            &inventory,
            &self.config.inventory_empty,
        ))
    }
}

impl Oracle for PipeOracle {
    #[instrument(skip_all)]
    fn probe(&self) -> Result<StateFingerprint> {
        let mut session = OracleSession::spawn(&self.config)?;
        session.exchange(None).context("read oracle banner")?;
        let state = self.fingerprint(&mut session)?;
        session.shutdown()?;
        Ok(state)
    }

    #[instrument(skip_all, fields(setup_depth = setup.depth(), command))]
    fn run(&self, setup: &CommandPath, command: &str) -> Result<Exchange> {
        let mut session = OracleSession::spawn(&self.config)?;
        session.exchange(None).context("read oracle banner")?;
        for cmd in setup.commands() {
            // The scheduler already knows the state setup reaches; discard.
            session
                .exchange(Some(cmd))
                .with_context(|| format!("replay setup command {cmd:?}"))?;
        }
        let response = session
            .exchange(Some(command))
            .with_context(|| format!("send command {command:?}"))?;
        let state = self.fingerprint(&mut session)?;
        session.shutdown()?;
        debug!(response_len = response.len(), location = %state.location, "exchange complete");
        Ok(Exchange { response, state })
    }
}

/// One spawned oracle conversation.
///
/// Owns the child process, its input channel, and the reader thread feeding
/// output chunks over an mpsc channel. Killed and reaped on every exit path:
/// explicitly via [`OracleSession::shutdown`], or by `Drop` when unwinding.
struct OracleSession {
    child: Child,
    stdin: ChildStdin,
    output: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
    sentinel: Vec<u8>,
    poll_interval: Duration,
    settle_polls: u32,
    eof_grace_polls: u32,
    exchange_timeout: Duration,
    eof: bool,
    reaped: bool,
}

impl OracleSession {
    fn spawn(config: &OracleConfig) -> Result<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| anyhow!("oracle command is empty"))?;
        debug!(program = %program, "spawning oracle");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn oracle {program:?}"))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("oracle stdin was not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("oracle stdout was not piped"))?;

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || forward_output(stdout, &tx));

        Ok(Self {
            child,
            stdin,
            output: rx,
            reader: Some(reader),
            sentinel: format!("\n{}", config.prompt).into_bytes(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle_polls: config.settle_polls,
            eof_grace_polls: config.eof_grace_polls,
            exchange_timeout: Duration::from_secs(config.exchange_timeout_secs),
            eof: false,
            reaped: false,
        })
    }

    /// Send one command (or nothing, for the banner) and accumulate output
    /// until it ends with the sentinel, which is stripped from the returned
    /// response.
    ///
    /// Output arrives over a non-blocking channel, so "no bytes right now"
    /// must be told apart from "nothing more coming": a sentinel match is
    /// accepted only after `settle_polls` consecutive empty polls, and hard
    /// end-of-stream only after `eof_grace_polls` more. An oracle that
    /// exited (terminal ending) yields the accumulated text as the final
    /// response; later exchanges on the same session return empty.
    fn exchange(&mut self, line: Option<&str>) -> Result<String> {
        if self.eof {
            return Ok(String::new());
        }
        if let Some(command) = line {
            match self.send_line(command) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    // The oracle already exited; nothing more to say.
                    self.eof = true;
                    return Ok(String::new());
                }
                Err(err) => return Err(err).context("write to oracle"),
            }
        }

        let deadline = Instant::now() + self.exchange_timeout;
        let mut buf: Vec<u8> = Vec::new();
        let mut idle_polls: u32 = 0;
        loop {
            match self.output.try_recv() {
                Ok(chunk) => {
                    buf.extend_from_slice(&chunk);
                    idle_polls = 0;
                }
                Err(TryRecvError::Empty) => idle_polls += 1,
                Err(TryRecvError::Disconnected) => {
                    self.eof = true;
                    idle_polls += 1;
                }
            }
            if idle_polls >= self.settle_polls && buf.ends_with(&self.sentinel) {
                buf.truncate(buf.len() - self.sentinel.len());
                return Ok(String::from_utf8_lossy(&buf).into_owned());
            }
            if self.eof && idle_polls >= self.settle_polls + self.eof_grace_polls {
                return Ok(String::from_utf8_lossy(&buf).into_owned());
            }
            if Instant::now() >= deadline {
                warn!(buffered = buf.len(), "oracle exchange deadline passed");
                return Err(UnresponsiveError {
                    waited: self.exchange_timeout,
                    buffered_bytes: buf.len(),
                }
                .into());
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn send_line(&mut self, command: &str) -> io::Result<()> {
        self.stdin.write_all(command.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()
    }

    /// Terminate the oracle unconditionally and reap it.
    ///
    /// The oracle never exits on its own initiative (endings excepted), so
    /// every session ends with a kill.
    fn shutdown(&mut self) -> Result<()> {
        self.child.kill().context("kill oracle")?;
        match self
            .child
            .wait_timeout(REAP_TIMEOUT)
            .context("reap oracle")?
        {
            Some(_) => {}
            None => {
                self.child.wait().context("wait for oracle")?;
            }
        }
        self.reaped = true;
        if let Some(reader) = self.reader.take()
            && reader.join().is_err()
        {
            return Err(anyhow!("oracle reader thread panicked"));
        }
        Ok(())
    }
}

impl Drop for OracleSession {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn forward_output<R: Read>(mut reader: R, tx: &Sender<Vec<u8>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(chunk[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::test_support::fake_oracle_config;

    fn oracle_config(dir: &Path) -> OracleConfig {
        fake_oracle_config(dir).expect("write fake oracle")
    }

    #[test]
    fn run_frames_response_and_fingerprint() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = PipeOracle::new(oracle_config(temp.path()));

        let exchange = oracle.run(&CommandPath::empty(), "n").expect("run");
        assert_eq!(exchange.response, "\nYou walk north.");
        assert_eq!(exchange.state.location, "Clearing");
        assert!(exchange.state.items.is_empty());
    }

    #[test]
    fn setup_responses_are_discarded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = PipeOracle::new(oracle_config(temp.path()));

        let setup = CommandPath::empty().child("n");
        let exchange = oracle.run(&setup, "take coin").expect("run");
        assert_eq!(exchange.response, "\nYou took the coin.");
        assert_eq!(exchange.state.location, "Clearing");
        assert!(exchange.state.items.contains("coin"));
    }

    #[test]
    fn probe_reports_start_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = PipeOracle::new(oracle_config(temp.path()));

        let state = oracle.probe().expect("probe");
        assert_eq!(state.location, "Forest Edge");
        assert!(state.items.is_empty());
    }

    /// Repeated bridge calls with the same (setup, command) pair yield
    /// identical results, and every call releases its process.
    #[test]
    fn sequential_runs_are_deterministic() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = PipeOracle::new(oracle_config(temp.path()));

        let first = oracle.run(&CommandPath::empty(), "n").expect("run");
        for _ in 0..4 {
            let next = oracle.run(&CommandPath::empty(), "n").expect("run");
            assert_eq!(next, first);
        }
    }

    /// A terminal ending exits without printing another prompt; the response
    /// arrives via end-of-stream and later exchanges return empty.
    #[test]
    fn ending_terminates_via_end_of_stream() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = PipeOracle::new(oracle_config(temp.path()));

        let exchange = oracle.run(&CommandPath::empty(), "use sword").expect("run");
        assert!(exchange.response.contains("YOU GOT THE GOOD ENDING"));
        assert_eq!(exchange.state.location, "");
        assert!(exchange.state.items.is_empty());
    }

    #[test]
    fn silent_oracle_times_out_with_unresponsive_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = oracle_config(temp.path());
        config.exchange_timeout_secs = 1;
        let oracle = PipeOracle::new(config);

        let err = oracle
            .run(&CommandPath::empty(), "sleepy")
            .expect_err("should time out");
        assert!(err.downcast_ref::<UnresponsiveError>().is_some());
    }
}
