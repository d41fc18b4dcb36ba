//! Prompt rendering for mission steps and corrections.

use anyhow::Result;
use minijinja::{Environment, context};

const FIRST_STEP_TEMPLATE: &str = include_str!("prompts/first_step.md");
const NEXT_STEP_TEMPLATE: &str = include_str!("prompts/next_step.md");
const CORRECTION_TEMPLATE: &str = include_str!("prompts/correction.md");

/// Renders step and correction prompts within a byte budget.
///
/// Previous-step output and captured error text are the only unbounded
/// inputs; both are truncated to the budget before rendering so a chatty
/// script cannot blow up the prompt.
pub struct PromptBuilder {
    env: Environment<'static>,
    budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(budget_bytes: usize) -> Self {
        let mut env = Environment::new();
        env.add_template("first_step", FIRST_STEP_TEMPLATE)
            .expect("first step template should be valid");
        env.add_template("next_step", NEXT_STEP_TEMPLATE)
            .expect("next step template should be valid");
        env.add_template("correction", CORRECTION_TEMPLATE)
            .expect("correction template should be valid");
        Self { env, budget_bytes }
    }

    /// Prompt for step 0: produce the first complete, executable program.
    pub fn first_step(&self, task: &str) -> Result<String> {
        let template = self.env.get_template("first_step")?;
        let rendered = template.render(context! {
            task => task.trim(),
        })?;
        Ok(rendered)
    }

    /// Prompt for steps N>0: chains the previous stdout, the directory
    /// listing, and the new-file manifest into the next request.
    pub fn next_step(
        &self,
        task: &str,
        previous_output: &str,
        files: &str,
        new_files: &[String],
    ) -> Result<String> {
        let template = self.env.get_template("next_step")?;
        let rendered = template.render(context! {
            task => task.trim(),
            previous_output => truncate_to_budget(previous_output, self.budget_bytes),
            files => files,
            new_files => (!new_files.is_empty()).then(|| new_files.join(" ")),
        })?;
        Ok(rendered)
    }

    /// Prompt asking for a corrected replacement script, carrying the
    /// literal captured error text.
    pub fn correction(&self, error: &str) -> Result<String> {
        let template = self.env.get_template("correction")?;
        let rendered = template.render(context! {
            error => truncate_to_budget(error, self.budget_bytes),
        })?;
        Ok(rendered)
    }
}

fn truncate_to_budget(text: &str, budget: usize) -> String {
    if text.len() <= budget {
        return text.to_string();
    }
    let mut end = budget;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[truncated {} bytes]", &text[..end], text.len() - end)
}
