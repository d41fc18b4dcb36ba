//! Orchestration of the outer step loop and the bounded correction cycle.
//!
//! One mission turns a natural-language task into a chain of generated
//! scripts. Each step asks the model for a program, persists it under a fresh
//! monotonic index, optionally executes it, and feeds the captured stdout and
//! the working-directory listing into the next step's prompt. Failing
//! executions enter a bounded correction cycle that resubmits the captured
//! error text to the model.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::reply::{ReplyAction, parse_reply};
use crate::core::state::{AbortReason, MissionOutcome, RunLimits, RunState};
use crate::core::transcript::Transcript;
use crate::io::config::MissionConfig;
use crate::io::journal::{Journal, JournalEntry};
use crate::io::llm::ChatClient;
use crate::io::script::{ExecOutput, ScriptRunner, ScriptStore};
use crate::io::workdir::{list_files, new_files, render_listing};
use crate::prompt::PromptBuilder;

/// Progress notifications for the console; product output, not tracing.
#[derive(Debug)]
pub enum MissionEvent<'a> {
    /// Model reply to a step prompt.
    Answer { step: u32, reply: &'a str },
    /// Model reply inside a correction cycle.
    Correction {
        step: u32,
        attempt: u32,
        reply: &'a str,
    },
    /// A script file is about to be executed.
    Executing { script_index: u32 },
    /// The latest execution produced error output.
    ExecutionFailed { stderr: &'a str },
    /// A step finished normally.
    StepFinished { step: u32 },
}

/// Final accounting for a mission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionReport {
    pub outcome: MissionOutcome,
    pub state: RunState,
    pub llm_calls: u32,
    pub transcript_len: usize,
}

/// Carry-over from one step into the next step's prompt.
#[derive(Debug, Default)]
struct StepChain {
    previous_output: String,
    listing: Vec<String>,
    created: Vec<String>,
}

/// How a correction cycle ended.
enum CycleEnd {
    /// A script finally ran without error output.
    Recovered(ExecOutput),
    /// A correction reply carried no code; treated as overall completion.
    CompletedEarly,
    Aborted(AbortReason),
}

/// Run a full mission for `task` inside `workdir`.
///
/// The returned report carries the terminal outcome as a value; deciding
/// process exit behavior is the caller's job.
#[instrument(skip_all, fields(workdir = %workdir.display()))]
pub fn run_mission<C, R, F>(
    workdir: &Path,
    client: &C,
    runner: &R,
    config: &MissionConfig,
    task: &str,
    on_event: F,
) -> Result<MissionReport>
where
    C: ChatClient,
    R: ScriptRunner,
    F: FnMut(&MissionEvent<'_>),
{
    config.validate()?;
    let mut mission = Mission {
        client,
        runner,
        store: ScriptStore::new(workdir),
        journal: Journal::new(workdir),
        prompts: PromptBuilder::new(config.output_limit_bytes),
        limits: RunLimits {
            max_correction_attempts: config.max_correction_attempts,
            max_scripts: config.max_scripts,
        },
        workdir,
        transcript: Transcript::new(config.history.policy()),
        llm_calls: 0,
        on_event,
    };
    mission.run(task)
}

struct Mission<'a, C, R, F> {
    client: &'a C,
    runner: &'a R,
    store: ScriptStore,
    journal: Journal,
    prompts: PromptBuilder,
    limits: RunLimits,
    workdir: &'a Path,
    transcript: Transcript,
    llm_calls: u32,
    on_event: F,
}

impl<C, R, F> Mission<'_, C, R, F>
where
    C: ChatClient,
    R: ScriptRunner,
    F: FnMut(&MissionEvent<'_>),
{
    fn run(&mut self, task: &str) -> Result<MissionReport> {
        info!("mission start");
        let mut state = RunState::new();
        let mut chain = StepChain::default();

        loop {
            let step = state.steps_completed;
            let prompt = if step == 0 {
                self.prompts.first_step(task)?
            } else {
                self.prompts.next_step(
                    task,
                    &chain.previous_output,
                    &render_listing(&chain.listing),
                    &chain.created,
                )?
            };

            let reply = self.exchange(prompt)?;
            (self.on_event)(&MissionEvent::Answer { step, reply: &reply });

            match parse_reply(&reply) {
                ReplyAction::Done => {
                    info!(steps = step, "model signaled completion");
                    return Ok(self.report(MissionOutcome::Completed, state));
                }
                ReplyAction::WriteOnly(source) => {
                    let index = state.next_script_index();
                    self.store.write(index, &source)?;
                    state = state.record_script();
                    debug!(index, "script persisted without execution");
                    self.journal.append(&JournalEntry {
                        step,
                        attempt: 0,
                        script_index: index,
                        executed: false,
                        exit_code: None,
                        timed_out: false,
                        stderr_bytes: 0,
                        duration_ms: 0,
                    })?;
                    chain.previous_output.clear();
                    chain.created.clear();
                }
                ReplyAction::Run(source) => {
                    let before = list_files(self.workdir)?;
                    let index = state.next_script_index();
                    let path = self.store.write(index, &source)?;
                    state = state.record_script();
                    (self.on_event)(&MissionEvent::Executing {
                        script_index: index,
                    });
                    let started = Instant::now();
                    let output = self.runner.run(&path)?;
                    self.journal
                        .append(&journal_entry(step, 0, index, &output, started.elapsed()))?;

                    let (next_state, end) = self.run_corrections(step, state, output)?;
                    state = next_state;
                    let output = match end {
                        CycleEnd::Recovered(output) => output,
                        CycleEnd::CompletedEarly => {
                            return Ok(self.report(MissionOutcome::Completed, state));
                        }
                        CycleEnd::Aborted(reason) => {
                            return Ok(self.report(MissionOutcome::Aborted(reason), state));
                        }
                    };
                    chain.previous_output = output.stdout;
                    chain.created = new_files(&before, &list_files(self.workdir)?);
                }
            }

            if state.script_budget_exhausted(&self.limits) {
                warn!(
                    scripts_written = state.scripts_written,
                    "script budget exhausted"
                );
                return Ok(self.report(
                    MissionOutcome::Aborted(AbortReason::ScriptLimitExceeded {
                        limit: self.limits.max_scripts,
                    }),
                    state,
                ));
            }

            chain.listing = list_files(self.workdir)?;
            state = state.record_step();
            (self.on_event)(&MissionEvent::StepFinished { step });
        }
    }

    /// Bounded retry loop feeding captured error text back to the model.
    ///
    /// Every correction allocates a fresh script index; the failed attempt's
    /// file is never overwritten.
    fn run_corrections(
        &mut self,
        step: u32,
        mut state: RunState,
        initial: ExecOutput,
    ) -> Result<(RunState, CycleEnd)> {
        let mut output = initial;
        let mut attempts = 0u32;

        loop {
            if !output.failed() {
                return Ok((state, CycleEnd::Recovered(output)));
            }
            // Checked before writing so a correction can never allocate an
            // index past the script budget.
            if state.script_budget_exhausted(&self.limits) {
                warn!(
                    scripts_written = state.scripts_written,
                    "script budget exhausted during corrections"
                );
                return Ok((
                    state,
                    CycleEnd::Aborted(AbortReason::ScriptLimitExceeded {
                        limit: self.limits.max_scripts,
                    }),
                ));
            }
            if attempts >= self.limits.max_correction_attempts {
                warn!(attempts, "correction limit exceeded");
                return Ok((
                    state,
                    CycleEnd::Aborted(AbortReason::CorrectionLimitExceeded {
                        limit: self.limits.max_correction_attempts,
                    }),
                ));
            }

            (self.on_event)(&MissionEvent::ExecutionFailed {
                stderr: &output.stderr,
            });
            let prompt = self.prompts.correction(&output.stderr)?;
            let reply = self.exchange(prompt)?;
            attempts += 1;
            (self.on_event)(&MissionEvent::Correction {
                step,
                attempt: attempts,
                reply: &reply,
            });

            // The skip sentinel is not consulted during corrections; any
            // emitted code is executed.
            let source = match parse_reply(&reply) {
                ReplyAction::Run(source) | ReplyAction::WriteOnly(source) => source,
                ReplyAction::Done => {
                    // A correction reply with no code is treated as overall
                    // completion, not as a failed attempt.
                    info!(step, attempts, "correction reply carried no code");
                    return Ok((state, CycleEnd::CompletedEarly));
                }
            };

            let index = state.next_script_index();
            let path = self.store.write(index, &source)?;
            state = state.record_script();
            (self.on_event)(&MissionEvent::Executing {
                script_index: index,
            });
            let started = Instant::now();
            output = self.runner.run(&path)?;
            self.journal.append(&journal_entry(
                step,
                attempts,
                index,
                &output,
                started.elapsed(),
            ))?;
        }
    }

    /// Append a user turn, call the model, append the assistant turn.
    fn exchange(&mut self, prompt: String) -> Result<String> {
        self.transcript.push_user(prompt);
        let reply = self.client.complete(&self.transcript.window())?;
        self.transcript.push_assistant(reply.clone());
        self.llm_calls += 1;
        debug!(
            llm_calls = self.llm_calls,
            transcript_len = self.transcript.len(),
            "exchange complete"
        );
        Ok(reply)
    }

    fn report(&self, outcome: MissionOutcome, state: RunState) -> MissionReport {
        MissionReport {
            outcome,
            state,
            llm_calls: self.llm_calls,
            transcript_len: self.transcript.len(),
        }
    }
}

fn journal_entry(
    step: u32,
    attempt: u32,
    script_index: u32,
    output: &ExecOutput,
    duration: Duration,
) -> JournalEntry {
    JournalEntry {
        step,
        attempt,
        script_index,
        executed: true,
        exit_code: output.exit_code,
        timed_out: output.timed_out,
        stderr_bytes: output.stderr.len(),
        duration_ms: duration.as_millis() as u64,
    }
}
