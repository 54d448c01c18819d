//! Generative collaborator.
//!
//! Called only when no stored candidate clears the confidence gate. The
//! collaborator is an opaque external function with a latency and failure
//! contract: it may be slow, it may fail, and either outcome degrades the
//! request to the placeholder reply rather than erroring.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Produces a free-text answer for a query the stored knowledge could not
/// answer confidently.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate(&self, query: &str) -> Result<String, EngineError>;

    /// Model name, for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    // Null for some models mid-reasoning.
    #[serde(default)]
    content: Option<String>,
}

const SYSTEM_PROMPT: &str =
    "You answer short factual questions in one or two sentences. \
     If you are not sure, say so plainly.";

/// OpenAI-compatible chat completions client.
pub struct OpenAiResponder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiResponder {
    pub fn new(endpoint: String, api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Responder for OpenAiResponder {
    async fn generate(&self, query: &str) -> Result<String, EngineError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: query.to_string(),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Collaborator(format!("generate request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Collaborator(format!(
                "chat API error {status}: {body}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Collaborator(format!("chat response parse: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| EngineError::Collaborator("empty chat response".to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
