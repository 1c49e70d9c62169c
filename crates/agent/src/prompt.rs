//! Planner-input assembly.
//!
//! The model sees three labeled sections in a fixed order:
//! `<session_history>`, `<rag_context>`, `<user_prompt>`. Sections are
//! always present, empty or not, so the model's framing never shifts.

use pagi_core::memory::{RagMatch, SessionMessage};

/// Build the structured planner input for one turn.
pub fn build_planner_input(
    history: &[SessionMessage],
    matches: &[RagMatch],
    working_prompt: &str,
) -> String {
    let mut out = String::new();

    out.push_str("<session_history>\n");
    for message in history {
        if message.role.is_empty() && message.content.is_empty() {
            continue;
        }
        out.push_str(&message.role);
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out.push_str("</session_history>\n\n");

    out.push_str("<rag_context>\n");
    for m in matches {
        out.push_str("**");
        out.push_str(&m.knowledge_base);
        out.push_str("**\n");
        out.push_str("ID: ");
        out.push_str(&m.id);
        out.push('\n');
        out.push_str("Text: ");
        out.push_str(&m.text);
        out.push_str("\n---\n");
    }
    out.push_str("</rag_context>\n\n");

    out.push_str("<user_prompt>\n");
    out.push_str(working_prompt);
    out.push_str("\n</user_prompt>\n");

    out
}

/// Fold one turn's plan and tool output back into the working prompt.
pub fn build_followup_prompt(working_prompt: &str, plan: &str, tool_result_json: &str) -> String {
    format!(
        "{working_prompt}\n\n<plan>\n{plan}\n</plan>\n\n<tool_result>\n{tool_result_json}\n</tool_result>\n"
    )
}
