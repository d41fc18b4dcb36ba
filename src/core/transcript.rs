//! Append-only conversation transcript submitted to the model on every call.

use serde::{Deserialize, Serialize};

/// Speaker of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One (role, content) exchange in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Policy selecting which turns are resubmitted on each model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    /// Resubmit the entire transcript on every call (unbounded growth).
    Full,
    /// Retain the first turn (task framing) plus the trailing `last_turns`.
    Window { last_turns: usize },
}

/// Ordered conversation history for one mission run.
///
/// Turns are only ever appended; the transcript is never pruned. The context
/// policy bounds what is *submitted*, not what is stored, so a later widening
/// of the window sees the full history.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
    policy: ContextPolicy,
}

impl Transcript {
    pub fn new(policy: ContextPolicy) -> Self {
        Self {
            turns: Vec::new(),
            policy,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns to submit on the next model call, per the context policy.
    pub fn window(&self) -> Vec<Turn> {
        match self.policy {
            ContextPolicy::Full => self.turns.clone(),
            ContextPolicy::Window { last_turns } => {
                if self.turns.len() <= last_turns + 1 {
                    return self.turns.clone();
                }
                let tail_start = self.turns.len() - last_turns;
                let mut window = Vec::with_capacity(last_turns + 1);
                window.push(self.turns[0].clone());
                window.extend_from_slice(&self.turns[tail_start..]);
                window
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_policy_resubmits_everything() {
        let mut transcript = Transcript::new(ContextPolicy::Full);
        for i in 0..5 {
            transcript.push_user(format!("u{i}"));
            transcript.push_assistant(format!("a{i}"));
        }

        assert_eq!(transcript.len(), 10);
        assert_eq!(transcript.window().len(), 10);
    }

    #[test]
    fn window_policy_keeps_first_turn_and_tail() {
        let mut transcript = Transcript::new(ContextPolicy::Window { last_turns: 2 });
        transcript.push_user("task");
        transcript.push_assistant("a1");
        transcript.push_user("u2");
        transcript.push_assistant("a2");

        let window = transcript.window();
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["task", "u2", "a2"]);
    }

    #[test]
    fn window_policy_is_a_no_op_for_short_transcripts() {
        let mut transcript = Transcript::new(ContextPolicy::Window { last_turns: 10 });
        transcript.push_user("task");
        transcript.push_assistant("reply");

        assert_eq!(transcript.window().len(), 2);
    }

    #[test]
    fn length_is_non_decreasing_across_appends() {
        let mut transcript = Transcript::new(ContextPolicy::Full);
        let mut previous = 0;
        for i in 0..4 {
            transcript.push_user(format!("u{i}"));
            assert!(transcript.len() > previous);
            previous = transcript.len();
        }
    }
}
