//! Side-effecting operations: configuration, HTTP, filesystem, processes.

pub mod config;
pub mod journal;
pub mod llm;
pub mod process;
pub mod script;
pub mod workdir;
