use serde::{Deserialize, Serialize};
use reqwest::blocking::Client;
use anyhow::{Context, Result};
use std::time::Duration;

use crate::error::LlmError;

/// The one capability the generator needs from a model:
/// prompt in, text out.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str) -> Result<String, LlmError>,
{
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self(prompt)
    }
}

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConnection {
    /// Base URL of an OpenAI-compatible API, e.g. `http://localhost:1234/v1`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Blocking chat-completions client.
pub struct ChatClient {
    client: Client,
    conn: LlmConnection,
}

impl ChatClient {
    pub fn new(conn: LlmConnection) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(conn.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, conn })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.conn.endpoint.trim_end_matches('/'), path)
    }

    pub fn test_connection(&self) -> Result<String> {
        let mut req = self.client.get(self.url("models"));
        if let Some(key) = &self.conn.api_key {
            req = req.bearer_auth(key);
        }

        let resp: serde_json::Value = req
            .send()
            .context("could not reach the model server")?
            .error_for_status()?
            .json()
            .context("model list was not JSON")?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl TextGenerator for ChatClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: self.conn.model.clone(),
            temperature: self.conn.temperature,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        };

        let mut req = self.client.post(self.url("chat/completions")).json(&body);
        if let Some(key) = &self.conn.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().map_err(|e| LlmError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        log::debug!("model replied with {} bytes", content.len());
        Ok(content)
    }
}
