use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;
use url::Url;

use crate::core::config::FormDConfig;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const GREETING: &str = "Ask me anything about the Form D filings";
pub const MISSING_CREDENTIAL: &str = "Please add your OpenAI API key to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        ChatHistory {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// History plus a pending user message, as sent to the model.
    pub fn with_prompt(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage::user(prompt));
        messages
    }

    pub fn record_exchange(&mut self, prompt: &str, reply: &str) {
        self.messages.push(ChatMessage::user(prompt));
        self.messages.push(ChatMessage::assistant(reply));
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

pub fn require_credential(credential: Option<&str>) -> Result<&str> {
    match credential.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(anyhow!(MISSING_CREDENTIAL)),
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct ChatClient {
    client: Client,
    api_url: Url,
    model: String,
}

impl ChatClient {
    pub fn new(config: &FormDConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = config.chat_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            api_url: config.openai_api_url.clone(),
            model: config.chat_model.clone(),
        })
    }

    pub async fn complete(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String> {
        log::debug!(
            "Sending {} chat messages to {} ({})",
            messages.len(),
            self.api_url,
            self.model
        );

        let response = self
            .client
            .post(self.api_url.as_str())
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat request failed with status {}: {}", status, body));
        }

        let completion: CompletionResponse = response.json().await?;
        parse_reply(completion)
    }
}

fn parse_reply(completion: CompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("Chat response contained no message"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_starts_with_greeting() {
        let history = ChatHistory::new();
        assert_eq!(history.messages(), &[ChatMessage::assistant(GREETING)]);
    }

    #[test]
    fn test_prompt_does_not_touch_history() {
        let mut history = ChatHistory::new();
        let outgoing = history.with_prompt("Which filings raised the most?");
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[1].role, MessageRole::User);
        assert_eq!(history.messages().len(), 1);

        history.record_exchange("Which filings raised the most?", "Acme Ventures.");
        assert_eq!(history.messages().len(), 3);
        history.clear();
        assert_eq!(history, ChatHistory::new());
    }

    #[test]
    fn test_require_credential() {
        assert_eq!(require_credential(Some("sk-abc")).unwrap(), "sk-abc");
        assert_eq!(
            require_credential(None).unwrap_err().to_string(),
            MISSING_CREDENTIAL
        );
        assert!(require_credential(Some("   ")).is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let messages = ChatHistory::new().with_prompt("hi");
        let body = serde_json::to_value(CompletionRequest {
            model: DEFAULT_CHAT_MODEL,
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "assistant", "content": GREETING},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_parse_reply() {
        let completion: CompletionResponse = serde_json::from_str(
            r#"{"id": "c1", "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(parse_reply(completion).unwrap(), "Hello");

        let empty: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parse_reply(empty).is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }
}
