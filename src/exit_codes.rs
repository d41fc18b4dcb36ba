//! Stable exit codes for the scriptpilot CLI.

/// Mission completed (the model signaled no further code to run).
pub const OK: i32 = 0;
/// Invalid config/task input, or a transport/filesystem error.
pub const INVALID: i32 = 1;
/// Mission failed: a correction or script-count limit was exceeded.
pub const FAILED: i32 = 2;
