//! CLI entry point for the mission loop.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use scriptpilot::core::state::MissionOutcome;
use scriptpilot::exit_codes;
use scriptpilot::io::config::load_config;
use scriptpilot::io::llm::HttpChatClient;
use scriptpilot::io::script::InterpreterRunner;
use scriptpilot::logging;
use scriptpilot::mission::{MissionEvent, run_mission};

#[derive(Parser)]
#[command(
    name = "scriptpilot",
    version,
    about = "Iterative LLM-driven script generation and execution loop"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate, execute, and correct scripts until the task completes.
    Run {
        /// Task description, or a path to a `.txt` file containing it.
        #[arg(short = 's', long = "task")]
        task: String,
        /// Path to the TOML config; defaults apply when the file is missing.
        #[arg(long, default_value = "scriptpilot.toml")]
        config: PathBuf,
        /// Directory where scripts and their artifacts accumulate.
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            task,
            config,
            workdir,
        } => cmd_run(&task, &config, &workdir),
    }
}

fn cmd_run(task: &str, config_path: &PathBuf, workdir: &PathBuf) -> Result<i32> {
    let task = resolve_task(task)?;
    let config = load_config(config_path)?;
    let client = HttpChatClient::from_config(&config)?;
    let runner = InterpreterRunner::new(
        config.interpreter.command.clone(),
        workdir.clone(),
        Duration::from_secs(config.script_timeout_secs),
        config.output_limit_bytes,
    );

    println!("Mission start");
    let report = run_mission(workdir, &client, &runner, &config, &task, print_event)?;

    match report.outcome {
        MissionOutcome::Completed => {
            println!("Mission complete.");
            Ok(exit_codes::OK)
        }
        MissionOutcome::Aborted(reason) => {
            println!("Mission failed: {reason}.");
            Ok(exit_codes::FAILED)
        }
    }
}

fn print_event(event: &MissionEvent<'_>) {
    match event {
        MissionEvent::Answer { reply, .. } => println!("##### answer:\n{reply}"),
        MissionEvent::Correction { reply, .. } => println!("##### correction:\n{reply}"),
        MissionEvent::Executing { script_index } => {
            println!("Begin to execute script {script_index}");
        }
        MissionEvent::ExecutionFailed { stderr } => println!("Error: {stderr}"),
        MissionEvent::StepFinished { step } => println!("Step {} is finished", step + 1),
    }
}

/// A value ending in `.txt` with no spaces names a file holding the task;
/// anything else is the literal task description.
fn resolve_task(raw: &str) -> Result<String> {
    if raw.ends_with(".txt") && !raw.contains(' ') {
        return fs::read_to_string(raw).with_context(|| format!("read task file {raw}"));
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_task_string() {
        let cli = Cli::parse_from(["scriptpilot", "run", "-s", "print hello"]);
        let Command::Run { task, workdir, .. } = cli.command;
        assert_eq!(task, "print hello");
        assert_eq!(workdir, PathBuf::from("."));
    }

    #[test]
    fn resolve_task_reads_txt_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("task.txt");
        fs::write(&path, "do the thing").expect("write");

        let task = resolve_task(path.to_str().expect("utf8 path")).expect("resolve");
        assert_eq!(task, "do the thing");
    }

    #[test]
    fn resolve_task_keeps_literals() {
        let task = resolve_task("sample every 10.txt pixels").expect("resolve");
        assert_eq!(task, "sample every 10.txt pixels");
    }
}
