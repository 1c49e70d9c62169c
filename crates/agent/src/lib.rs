//! The planner loop — the heart of the PAGI agent planner.
//!
//! Each request runs a **Context → Plan → Interpret → (Tool → Feedback)?**
//! cycle:
//!
//! 1. **Context** — fetch episodic history and RAG matches (best-effort)
//! 2. **Plan** — assemble the planner input, call the model gateway
//! 3. **Interpret** — classify the reply as tool call or final answer
//! 4. **If tool call**: dispatch to the sandbox, fold the output back into
//!    the working prompt, loop
//! 5. **If final answer**: persist the playbook (when earned), store the
//!    session delta, notify subscribers, return
//!
//! The loop continues until the model answers with prose or the turn budget
//! runs out. Every meaningful step is written to the audit log first.

pub mod planner;
pub mod prompt;

pub use planner::{Planner, MAX_TURNS_SENTINEL};
pub use prompt::{build_followup_prompt, build_planner_input};
