//! The episodic store over the memory service's HTTP API.
//!
//! Endpoints:
//! - `GET  /memory/latest?session_id=…` — latest session history
//! - `POST /memory/store`               — one (user, assistant) delta
//! - `POST /memory/playbook`            — learned playbook persistence
//!
//! All calls carry the trace id header and a 10 s client timeout. The driver
//! treats every failure here as best-effort.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use pagi_core::error::MemoryError;
use pagi_core::memory::{EpisodicStore, SessionMessage};
use pagi_core::message::PlaybookStep;
use pagi_core::trace::{TraceId, TRACE_HEADER};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed [`EpisodicStore`].
pub struct HttpEpisodicStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    messages: Vec<SessionMessage>,
}

impl HttpEpisodicStore {
    pub fn new(base_url: &str) -> Result<Self, MemoryError> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| MemoryError::Fetch(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json(
        &self,
        trace: &TraceId,
        path: &str,
        body: &Value,
    ) -> Result<(), reqwest::Error> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header(TRACE_HEADER, trace.as_str())
            .json(body)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

fn delta_body(session_id: &str, user_prompt: &str, assistant_text: &str) -> Value {
    json!({
        "session_id": session_id,
        "history": [
            {"role": "user", "content": user_prompt},
            {"role": "assistant", "content": assistant_text},
        ],
        "prompt": user_prompt,
        "llm_response": {"text": assistant_text},
    })
}

fn playbook_body(session_id: &str, prompt: &str, sequence: &[PlaybookStep]) -> Value {
    json!({
        "session_id": session_id,
        "prompt": prompt,
        "history_sequence": sequence,
    })
}

#[async_trait]
impl EpisodicStore for HttpEpisodicStore {
    async fn latest(
        &self,
        trace: &TraceId,
        session_id: &str,
    ) -> Result<Vec<SessionMessage>, MemoryError> {
        let response = self
            .client
            .get(self.endpoint("/memory/latest"))
            .query(&[("session_id", session_id)])
            .header(TRACE_HEADER, trace.as_str())
            .send()
            .await
            .map_err(|e| MemoryError::Fetch(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| MemoryError::Fetch(e.to_string()))?;

        let payload: LatestResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::Fetch(format!("decode memory/latest: {e}")))?;

        debug!(
            trace_id = %trace,
            session_id,
            messages = payload.messages.len(),
            "Fetched session history"
        );
        Ok(payload.messages)
    }

    async fn store_delta(
        &self,
        trace: &TraceId,
        session_id: &str,
        user_prompt: &str,
        assistant_text: &str,
    ) -> Result<(), MemoryError> {
        let body = delta_body(session_id, user_prompt, assistant_text);
        self.post_json(trace, "/memory/store", &body)
            .await
            .map_err(|e| MemoryError::Store(e.to_string()))
    }

    async fn store_playbook(
        &self,
        trace: &TraceId,
        session_id: &str,
        prompt: &str,
        sequence: &[PlaybookStep],
    ) -> Result<(), MemoryError> {
        let body = playbook_body(session_id, prompt, sequence);
        self.post_json(trace, "/memory/playbook", &body)
            .await
            .map_err(|e| MemoryError::Playbook(e.to_string()))?;

        debug!(
            trace_id = %trace,
            session_id,
            steps = sequence.len(),
            "Playbook persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let store = HttpEpisodicStore::new("http://memory:8003/").unwrap();
        assert_eq!(
            store.endpoint("/memory/latest"),
            "http://memory:8003/memory/latest"
        );
    }

    #[test]
    fn delta_body_matches_contract() {
        let body = delta_body("s1", "what is rust", "a language");
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["prompt"], "what is rust");
        assert_eq!(body["llm_response"]["text"], "a language");
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "what is rust");
        assert_eq!(history[1]["role"], "assistant");
        assert_eq!(history[1]["content"], "a language");
    }

    #[test]
    fn playbook_body_serializes_roles() {
        let sequence = vec![
            PlaybookStep::user("do the thing"),
            PlaybookStep::assistant("{\"tool\":{\"name\":\"t\"}}"),
            PlaybookStep::tool_result("{\"status\":\"ok\"}"),
        ];
        let body = playbook_body("s2", "do the thing", &sequence);
        let steps = body["history_sequence"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0]["role"], "user");
        assert_eq!(steps[1]["role"], "assistant");
        assert_eq!(steps[2]["role"], "tool_result");
    }

    #[test]
    fn empty_latest_response_decodes() {
        let payload: LatestResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.messages.is_empty());
    }
}
