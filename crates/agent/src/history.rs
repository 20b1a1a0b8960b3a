//! Durable session history and the display projection.
//!
//! A session keeps only what survives a request: each accepted user prompt
//! and the terminal turn that answered it. Intermediate tool traffic lives in
//! the per-request working log and is dropped once the request completes.

use docent_core::message::{ConversationEntry, SessionId};
use serde::{Deserialize, Serialize};

/// Conversation state carried from one request to the next.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: SessionId,
    entries: Vec<ConversationEntry>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries replayed at the start of every request.
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a completed request: the prompt and its terminal turn.
    pub(crate) fn commit(&mut self, prompt: ConversationEntry, answer: ConversationEntry) {
        self.entries.push(prompt);
        self.entries.push(answer);
    }

    /// Forget everything. The session keeps its id.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The user-facing view of this session.
    pub fn display(&self) -> Vec<DisplayEntry> {
        display_log(&self.entries)
    }
}

/// One line of the user-facing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DisplayEntry {
    User {
        text: String,
    },
    Assistant {
        text: String,
        tools_used: Vec<String>,
    },
}

impl DisplayEntry {
    /// The "Referenced: …" caption of an assistant entry, if it used tools.
    pub fn caption(&self) -> Option<String> {
        match self {
            Self::Assistant { tools_used, .. } => referenced_summary(tools_used),
            Self::User { .. } => None,
        }
    }
}

/// Project a log onto what the user sees: prompts and final answers.
///
/// Assistant turns that requested tools and tool result batches are hidden.
/// The projection is a pure function of the log.
pub fn display_log(entries: &[ConversationEntry]) -> Vec<DisplayEntry> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ConversationEntry::UserText { text } => Some(DisplayEntry::User { text: text.clone() }),
            ConversationEntry::AssistantTurn {
                message,
                tools_used,
            } if entry.is_terminal_turn() => Some(DisplayEntry::Assistant {
                text: message.display_text(),
                tools_used: tools_used.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Human-readable name of a tool id: `read_slurm_faq_doc` → `Slurm Faq`.
pub fn display_name(tool_id: &str) -> String {
    title_case(&tool_id.replace("read_", "").replace("_doc", "").replace('_', " "))
}

/// Uppercase the first letter of every word, lowercase the rest. A word
/// starts at any letter not preceded by another letter.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Summarise the tools behind an answer, grouped by display name in order of
/// first use: `Referenced: Sbatch (×2), Slurm Faq`.
pub fn referenced_summary(tools_used: &[String]) -> Option<String> {
    if tools_used.is_empty() {
        return None;
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for id in tools_used {
        let name = display_name(id);
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    let parts: Vec<String> = counts
        .into_iter()
        .map(|(name, count)| {
            if count > 1 {
                format!("{name} (×{count})")
            } else {
                name
            }
        })
        .collect();
    Some(format!("Referenced: {}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::message::{AssistantMessage, ContentBlock, ToolResult};

    fn tool_turn(id: &str, name: &str) -> ConversationEntry {
        ConversationEntry::assistant(AssistantMessage {
            content: vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input: serde_json::json!({}),
            }],
        })
    }

    fn full_log() -> Vec<ConversationEntry> {
        vec![
            ConversationEntry::user("How do I request an interactive session?"),
            tool_turn("toolu_1", "read_sinteractive_doc"),
            ConversationEntry::ToolResultBatch {
                results: vec![ToolResult::new("toolu_1", "=== DOCUMENT: slurm/sinteractive.md ===")],
            },
            ConversationEntry::AssistantTurn {
                message: AssistantMessage::text("Run sinteractive."),
                tools_used: vec!["read_sinteractive_doc".into()],
            },
        ]
    }

    #[test]
    fn display_keeps_prompts_and_terminal_turns() {
        let display = display_log(&full_log());
        assert_eq!(
            display,
            vec![
                DisplayEntry::User {
                    text: "How do I request an interactive session?".into()
                },
                DisplayEntry::Assistant {
                    text: "Run sinteractive.".into(),
                    tools_used: vec!["read_sinteractive_doc".into()],
                },
            ]
        );
        assert_eq!(
            display[1].caption().as_deref(),
            Some("Referenced: Sinteractive")
        );
    }

    #[test]
    fn display_projection_is_idempotent() {
        let log = full_log();
        assert_eq!(display_log(&log), display_log(&log));
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("read_sinteractive_doc"), "Sinteractive");
        assert_eq!(display_name("read_slurm_faq_doc"), "Slurm Faq");
        assert_eq!(display_name("read_web_about_rcc"), "Web About Rcc");
        assert_eq!(display_name("read_midwayr3_overview_doc"), "Midwayr3 Overview");
        assert_eq!(display_name("read_web_director_welcome"), "Web Director Welcome");
    }

    #[test]
    fn title_case_restarts_after_non_letters() {
        assert_eq!(title_case("tf-and-torch"), "Tf-And-Torch");
        assert_eq!(title_case("3d viz"), "3D Viz");
        assert_eq!(title_case("GROMACS"), "Gromacs");
    }

    #[test]
    fn summary_counts_repeats_in_first_use_order() {
        let used: Vec<String> = [
            "read_sbatch_doc",
            "read_slurm_faq_doc",
            "read_sbatch_doc",
            "read_sbatch_doc",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(
            referenced_summary(&used).as_deref(),
            Some("Referenced: Sbatch (×3), Slurm Faq")
        );
    }

    #[test]
    fn summary_empty_without_tools() {
        assert!(referenced_summary(&[]).is_none());
        assert!(DisplayEntry::User { text: "q".into() }.caption().is_none());
    }

    #[test]
    fn clear_keeps_session_id() {
        let mut state = ConversationState::new();
        let id = state.id.clone();
        state.commit(
            ConversationEntry::user("q"),
            ConversationEntry::assistant(AssistantMessage::text("a")),
        );
        assert_eq!(state.len(), 2);
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.id, id);
    }
}
