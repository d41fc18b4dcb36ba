//! Iterative LLM-driven script generation and execution loop.
//!
//! Given a natural-language task, the mission loop repeatedly asks a
//! chat-completion model for a runnable script, persists it under a
//! monotonic index, executes it as a child process, and feeds captured
//! errors back for a bounded number of corrections. The previous step's
//! stdout and the working-directory file listing chain state between steps.
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (reply parsing, run state,
//!   transcript). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, HTTP, filesystem,
//!   process execution). Traits at the chat and runner seams enable
//!   scripted doubles in tests.
//!
//! [`mission`] coordinates core logic with I/O to implement the loop;
//! [`prompt`] renders the step and correction prompts.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mission;
pub mod prompt;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
