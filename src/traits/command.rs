use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

/// Trait for executing system commands, allowing for mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a command in `working_dir`, handing every stdout/stderr line to `on_line` as it
    /// arrives. Returns the exit code (-1 when killed by a signal).
    fn stream(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<i32>;

    /// Check whether a binary is on the executable search path
    fn is_on_path(&self, binary: &str) -> bool;
}

/// Real command executor using std::process::Command
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn stream(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<i32> {
        let mut child = Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start '{}'", command))?;

        let (tx, rx) = mpsc::channel::<String>();
        let mut readers = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        // Ends once both pipes are closed
        for line in rx {
            on_line(&line);
        }

        for reader in readers {
            if reader.join().is_err() {
                log::warn!("Output reader for '{}' panicked", command);
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for '{}'", command))?;
        Ok(status.code().unwrap_or(-1))
    }

    fn is_on_path(&self, binary: &str) -> bool {
        which::which(binary).is_ok()
    }
}

/// Forward every line of `pipe`; bytes that are not UTF-8 are replaced rather than dropped
fn forward_lines<R: Read + Send + 'static>(
    pipe: R,
    tx: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    // Keep draining after the receiver is gone so the child never sees EPIPE
                    let _ = tx.send(line);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Failed to read command output: {}", e);
                    break;
                }
            }
        }
    })
}

/// Mock command executor for testing
#[cfg(test)]
pub struct MockCommandExecutor {
    /// Pre-configured outputs for commands
    outputs: std::sync::Mutex<Vec<MockCommandResult>>,
    calls: std::sync::Mutex<Vec<MockCommandCall>>,
    available: Vec<String>,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct MockCommandResult {
    pub command: String,
    pub exit_code: i32,
    pub lines: Vec<String>,
}

#[cfg(test)]
#[derive(Clone, Debug, PartialEq)]
pub struct MockCommandCall {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: std::path::PathBuf,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::with_outputs(Vec::new())
    }

    pub fn with_outputs(outputs: Vec<MockCommandResult>) -> Self {
        Self {
            outputs: std::sync::Mutex::new(outputs),
            calls: std::sync::Mutex::new(Vec::new()),
            available: vec![crate::config::DEFAULT_COMPOSE_COMMAND.to_string()],
        }
    }

    /// Replace the set of binaries reported as installed
    pub fn with_available(mut self, binaries: &[&str]) -> Self {
        self.available = binaries.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<MockCommandCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn stream(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<i32> {
        self.calls.lock().unwrap().push(MockCommandCall {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
        });

        let mut outputs = self.outputs.lock().unwrap();
        if let Some(index) = outputs.iter().position(|r| r.command == command) {
            let result = outputs.remove(index);
            for line in &result.lines {
                on_line(line);
            }
            return Ok(result.exit_code);
        }

        // Default: success
        Ok(0)
    }

    fn is_on_path(&self, binary: &str) -> bool {
        self.available.iter().any(|b| b == binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mock_executor_replays_lines() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult {
            command: "docker-compose".to_string(),
            exit_code: 0,
            lines: vec!["Creating nginx_1".to_string(), "done".to_string()],
        }]);

        let mut seen = Vec::new();
        let code = executor
            .stream("docker-compose", &["up", "-d"], &PathBuf::from("/srv"), &mut |l: &str| {
                seen.push(l.to_string())
            })
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(seen, vec!["Creating nginx_1", "done"]);
        assert_eq!(executor.calls()[0].args, vec!["up", "-d"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_executor_streams_both_pipes() {
        let temp = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();
        let code = RealCommandExecutor::new()
            .stream(
                "sh",
                &["-c", "echo out; echo err 1>&2; exit 3"],
                temp.path(),
                &mut |l: &str| seen.push(l.to_string()),
            )
            .unwrap();

        assert_eq!(code, 3);
        seen.sort();
        assert_eq!(seen, vec!["err", "out"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_executor_keeps_lines_after_invalid_utf8() {
        let temp = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();
        let code = RealCommandExecutor::new()
            .stream(
                "sh",
                &["-c", "printf 'a\\377b\\n'; echo after; echo done"],
                temp.path(),
                &mut |l: &str| seen.push(l.to_string()),
            )
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(seen, vec!["a\u{FFFD}b", "after", "done"]);
    }

    #[test]
    fn test_real_executor_missing_binary() {
        let temp = tempfile::tempdir().unwrap();
        let result = RealCommandExecutor::new().stream(
            "definitely-not-a-real-binary-xyz",
            &[],
            temp.path(),
            &mut |_: &str| {},
        );
        assert!(result.is_err());
        assert!(!RealCommandExecutor::new().is_on_path("definitely-not-a-real-binary-xyz"));
    }
}
