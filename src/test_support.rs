//! Test-only scripted doubles for the chat and script-execution seams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::core::transcript::Turn;
use crate::io::llm::ChatClient;
use crate::io::script::{ExecOutput, ScriptRunner};

/// Chat client returning predetermined replies in order.
///
/// Records the submitted turn windows so tests can assert call counts and
/// transcript growth.
pub struct ScriptedChat {
    replies: RefCell<VecDeque<String>>,
    pub calls: RefCell<Vec<Vec<Turn>>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().map(String::from).collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ChatClient for ScriptedChat {
    fn complete(&self, turns: &[Turn]) -> Result<String> {
        self.calls.borrow_mut().push(turns.to_vec());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted chat ran out of replies"))
    }
}

/// Script runner returning predetermined outputs without spawning processes.
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<ExecOutput>>,
    pub runs: RefCell<Vec<PathBuf>>,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<ExecOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into_iter().collect()),
            runs: RefCell::new(Vec::new()),
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.borrow().len()
    }
}

impl ScriptRunner for ScriptedRunner {
    fn run(&self, path: &Path) -> Result<ExecOutput> {
        self.runs.borrow_mut().push(path.to_path_buf());
        self.outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted runner ran out of outputs"))
    }
}

/// Execution that printed `stdout` and no error output.
pub fn ok_output(stdout: &str) -> ExecOutput {
    ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    }
}

/// Execution that produced error output (recoverable failure).
pub fn err_output(stderr: &str) -> ExecOutput {
    ExecOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(1),
        timed_out: false,
    }
}

/// A reply carrying one fenced script.
pub fn reply_with_code(source: &str) -> String {
    format!("Here you go:\n```python\n{source}\n```")
}

/// A reply carrying a fenced script plus the skip-execution sentinel.
pub fn reply_with_skip(source: &str) -> String {
    format!("NO-RUN-PY\n```python\n{source}\n```")
}
