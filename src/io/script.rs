//! Persisting numbered script files and executing them as child processes.
//!
//! The [`ScriptRunner`] trait decouples mission orchestration from the actual
//! interpreter. Tests use scripted runners that return predetermined outputs
//! without spawning processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::io::process::run_command_with_timeout;

/// Captured result of one script execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecOutput {
    /// A step fails when the child produced non-empty error output. Timeouts
    /// are folded into stderr by the runner so they take the same path.
    pub fn failed(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// Writes script sources into the working directory under monotonic indices.
///
/// A file is always written before any execution decision, so skip-execution
/// steps still leave a numbered artifact on disk. Indices are never reused,
/// so no file is ever overwritten.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    workdir: PathBuf,
}

impl ScriptStore {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn script_path(&self, index: u32) -> PathBuf {
        self.workdir.join(format!("py{index}.py"))
    }

    pub fn write(&self, index: u32, source: &str) -> Result<PathBuf> {
        let path = self.script_path(index);
        fs::write(&path, source).with_context(|| format!("write script {}", path.display()))?;
        debug!(index, path = %path.display(), "script persisted");
        Ok(path)
    }
}

/// Abstraction over script execution backends.
pub trait ScriptRunner {
    /// Execute a persisted script file, blocking until it terminates.
    fn run(&self, path: &Path) -> Result<ExecOutput>;
}

/// Runner that spawns the configured interpreter on the script file.
pub struct InterpreterRunner {
    command: Vec<String>,
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl InterpreterRunner {
    pub fn new(
        command: Vec<String>,
        workdir: impl Into<PathBuf>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            command,
            workdir: workdir.into(),
            timeout,
            output_limit_bytes,
        }
    }
}

impl ScriptRunner for InterpreterRunner {
    #[instrument(skip_all, fields(script = %path.display()))]
    fn run(&self, path: &Path) -> Result<ExecOutput> {
        info!(interpreter = %self.command[0], "executing script");
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..])
            .arg(path)
            .current_dir(&self.workdir);

        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run script {}", path.display()))?;

        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.timed_out {
            // Surface the timeout as ordinary error output so it feeds the
            // same correction cycle as an interpreter traceback.
            warn!(timeout_secs = self.timeout.as_secs(), "script timed out");
            stderr.push_str(&format!(
                "\nscript timed out after {} seconds and was killed\n",
                self.timeout.as_secs()
            ));
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
            exit_code: output.status.code(),
            timed_out: output.timed_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_names_files_by_index() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ScriptStore::new(temp.path());

        let path = store.write(3, "print(3)\n").expect("write");
        assert_eq!(path.file_name().unwrap(), "py3.py");
        assert_eq!(fs::read_to_string(&path).expect("read"), "print(3)\n");
    }

    #[test]
    fn distinct_indices_never_collide() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ScriptStore::new(temp.path());

        store.write(1, "a\n").expect("write");
        store.write(2, "b\n").expect("write");
        assert_eq!(fs::read_to_string(store.script_path(1)).expect("read"), "a\n");
        assert_eq!(fs::read_to_string(store.script_path(2)).expect("read"), "b\n");
    }

    #[test]
    fn runner_captures_interpreter_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ScriptStore::new(temp.path());
        let path = store.write(1, "echo hello\n").expect("write");

        let runner = InterpreterRunner::new(
            vec!["sh".to_string()],
            temp.path(),
            Duration::from_secs(5),
            10_000,
        );
        let output = runner.run(&path).expect("run");

        assert_eq!(output.stdout, "hello\n");
        assert!(!output.failed());
        assert_eq!(output.exit_code, Some(0));
    }

    #[test]
    fn runner_reports_error_output_as_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ScriptStore::new(temp.path());
        let path = store.write(1, "echo broken >&2; exit 1\n").expect("write");

        let runner = InterpreterRunner::new(
            vec!["sh".to_string()],
            temp.path(),
            Duration::from_secs(5),
            10_000,
        );
        let output = runner.run(&path).expect("run");

        assert!(output.failed());
        assert_eq!(output.stderr, "broken\n");
    }

    #[test]
    fn timeout_is_a_recoverable_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ScriptStore::new(temp.path());
        let path = store.write(1, "sleep 30\n").expect("write");

        let runner = InterpreterRunner::new(
            vec!["sh".to_string()],
            temp.path(),
            Duration::from_millis(100),
            10_000,
        );
        let output = runner.run(&path).expect("run");

        assert!(output.timed_out);
        assert!(output.failed());
        assert!(output.stderr.contains("timed out"));
    }
}
