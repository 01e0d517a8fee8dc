//! Centralized execution of collaborator processes.
//!
//! Every external tool (toolchain, disassembler, import dumper) goes through
//! [`Cmd`]. A non-zero exit is not an error at this layer: callers inspect
//! the status and map it to the matching [`BuildError`] kind.

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{BuildError, Result};

/// How often a child with a deadline is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Stdout followed by stderr, the way a merged stream would read.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Outcome of an interactive (streamed) command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Kill the child if it runs longer than `timeout`.
    ///
    /// Only honoured by [`Cmd::run_interactive`].
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> BuildError {
        BuildError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Run the command and capture its output.
    pub fn run(self) -> Result<CommandResult> {
        debug!(program = %self.program, args = ?self.args, "running");
        let output = self
            .command()
            .output()
            .map_err(|e| self.spawn_error(e))?;

        Ok(CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the command with inherited stdio so its progress streams to the
    /// terminal. Blocks until the child exits or the timeout elapses.
    pub fn run_interactive(self) -> Result<Outcome> {
        debug!(program = %self.program, args = ?self.args, "running interactive");
        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        if self.timeout.is_some() {
            // Own process group, so expiry takes the child's descendants down too.
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let Some(timeout) = self.timeout else {
            let status = child.wait().map_err(|e| self.spawn_error(e))?;
            return Ok(Outcome::Exited(status));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| self.spawn_error(e))? {
                return Ok(Outcome::Exited(status));
            }
            if Instant::now() >= deadline {
                kill_process_group(&mut child);
                return Ok(Outcome::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// SIGKILL the group led by `child`, then reap the child.
///
/// Falls back to killing the child alone when the group cannot be signalled.
fn kill_process_group(child: &mut Child) {
    let signalled = i32::try_from(child.id())
        .ok()
        .map(|pid| killpg(Pid::from_raw(pid), Signal::SIGKILL));
    match signalled {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            warn!("Failed to kill process group {}: {}", child.id(), e);
            // The child may have exited between the poll and the kill.
            let _ = child.kill();
        }
        None => {
            let _ = child.kill();
        }
    }
    let _ = child.wait();
}

/// Locate a program in PATH.
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let result = Cmd::new("false").run().unwrap();
        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_run_captures_stderr() {
        let result = Cmd::new("ls").arg("/nonexistent_path_12345").run().unwrap();
        assert!(!result.success());
        assert!(!result.stderr.trim().is_empty());
        assert!(result.combined().contains(result.stderr.trim()));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = Cmd::new("nonexistent_program_12345").run().unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }

    #[test]
    fn test_cmd_args_iterator() {
        let result = Cmd::new("echo").args(["one", "two", "three"]).run().unwrap();
        assert_eq!(result.stdout.trim(), "one two three");
    }

    #[test]
    fn test_run_in_directory() {
        let result = Cmd::new("pwd").dir(Path::new("/tmp")).run().unwrap();
        assert!(result.stdout.trim().contains("tmp"));
    }

    #[test]
    fn test_interactive_exit_status() {
        let outcome = Cmd::new("sh").args(["-c", "exit 3"]).run_interactive().unwrap();
        match outcome {
            Outcome::Exited(status) => assert_eq!(status.code(), Some(3)),
            Outcome::TimedOut => panic!("should not time out"),
        }
    }

    #[test]
    fn test_interactive_timeout_kills_child() {
        let start = Instant::now();
        let outcome = Cmd::new("sleep")
            .arg("5")
            .timeout(Some(Duration::from_millis(200)))
            .run_interactive()
            .unwrap();
        assert_eq!(outcome, Outcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_interactive_timeout_kills_descendants() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("written_after_timeout");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());

        let outcome = Cmd::new("sh")
            .args(["-c", &script])
            .timeout(Some(Duration::from_millis(200)))
            .run_interactive()
            .unwrap();
        assert_eq!(outcome, Outcome::TimedOut);

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "background job outlived the timeout");
    }

    #[test]
    fn test_which() {
        assert!(which("sh").is_some());
        assert!(which("nonexistent_program_12345").is_none());
    }
}
