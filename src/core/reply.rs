//! Typed parsing of model replies.
//!
//! A reply either carries a fenced script to run, a script to persist without
//! running (skip-execution sentinel present), or no script at all, which is
//! the termination signal for the mission loop.

use std::sync::LazyLock;

use regex::Regex;

/// Marker the model includes when the emitted script must not be executed.
pub const SKIP_SENTINEL: &str = "NO-RUN-PY";

/// Language tag expected on the opening fence.
const FENCE_TAG: &str = "python";

/// What the mission loop should do with a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Persist the extracted source and execute it.
    Run(String),
    /// Persist the extracted source but do not execute it.
    WriteOnly(String),
    /// No fenced script present: the model judges the task complete.
    Done,
}

static SKIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NO-RUN-PY").expect("skip sentinel pattern should be valid"));

/// Scan the raw reply for the skip-execution sentinel, independent of
/// whether a fenced block is present.
pub fn contains_skip_sentinel(reply: &str) -> bool {
    SKIP_RE.is_match(reply)
}

/// Classify a raw model reply into a [`ReplyAction`].
///
/// Only the first properly closed fenced block tagged `python` is considered;
/// the behavior with multiple blocks is a deliberate first-wins policy. An
/// unterminated fence counts as no block.
pub fn parse_reply(reply: &str) -> ReplyAction {
    let Some(source) = extract_fenced_block(reply) else {
        return ReplyAction::Done;
    };
    if contains_skip_sentinel(reply) {
        ReplyAction::WriteOnly(source)
    } else {
        ReplyAction::Run(source)
    }
}

/// Extract the text strictly between the first opening fence tagged for the
/// target language and its closing fence.
fn extract_fenced_block(reply: &str) -> Option<String> {
    let mut source: Option<Vec<&str>> = None;
    for line in reply.lines() {
        match source.as_mut() {
            None => {
                if is_opening_fence(line) {
                    source = Some(Vec::new());
                }
            }
            Some(lines) => {
                if line.trim() == "```" {
                    let mut block = lines.join("\n");
                    block.push('\n');
                    return Some(block);
                }
                lines.push(line);
            }
        }
    }
    // Opening fence without a closing fence: treated as no block.
    None
}

fn is_opening_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("```")
        .is_some_and(|tag| tag.trim().eq_ignore_ascii_case(FENCE_TAG))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_without_code_is_done() {
        assert_eq!(parse_reply("All tasks are finished."), ReplyAction::Done);
    }

    #[test]
    fn fenced_block_is_extracted_for_execution() {
        let reply = "Here is the program:\n```python\nprint('hi')\n```\nDone.";
        assert_eq!(
            parse_reply(reply),
            ReplyAction::Run("print('hi')\n".to_string())
        );
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let reply = "```Python\nprint(1)\n```";
        assert_eq!(parse_reply(reply), ReplyAction::Run("print(1)\n".to_string()));
    }

    #[test]
    fn skip_sentinel_turns_run_into_write_only() {
        let reply = "NO-RUN-PY\n```python\nX = 1\n```";
        assert_eq!(
            parse_reply(reply),
            ReplyAction::WriteOnly("X = 1\n".to_string())
        );
    }

    #[test]
    fn skip_sentinel_is_case_insensitive_and_position_independent() {
        assert!(contains_skip_sentinel("trailing note: no-run-py"));
        assert!(!contains_skip_sentinel("nothing to see"));
    }

    #[test]
    fn first_of_multiple_blocks_wins() {
        let reply = "```python\nfirst = True\n```\n```python\nsecond = True\n```";
        assert_eq!(
            parse_reply(reply),
            ReplyAction::Run("first = True\n".to_string())
        );
    }

    #[test]
    fn unterminated_fence_counts_as_no_block() {
        let reply = "```python\nprint('never closed')";
        assert_eq!(parse_reply(reply), ReplyAction::Done);
    }

    #[test]
    fn untagged_fence_is_ignored() {
        let reply = "```\nnot a script\n```";
        assert_eq!(parse_reply(reply), ReplyAction::Done);
    }

    #[test]
    fn multi_line_block_preserves_interior_lines() {
        let reply = "```python\nimport sys\n\nprint(sys.argv)\n```";
        assert_eq!(
            parse_reply(reply),
            ReplyAction::Run("import sys\n\nprint(sys.argv)\n".to_string())
        );
    }
}
