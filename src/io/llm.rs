//! Blocking chat-completion client for OpenAI-compatible APIs.
//!
//! The [`ChatClient`] trait decouples the mission loop from the transport.
//! Tests use scripted clients that return predetermined replies without any
//! network access.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::transcript::Turn;
use crate::io::config::MissionConfig;

/// Abstraction over chat-completion backends.
pub trait ChatClient {
    /// Submit the ordered turns and return the assistant's textual reply.
    fn complete(&self, turns: &[Turn]) -> Result<String>;
}

/// Client for `{api_base}/chat/completions` using blocking HTTP.
pub struct HttpChatClient {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl HttpChatClient {
    /// Build a client from config, resolving the API key from the configured
    /// environment variable.
    pub fn from_config(config: &MissionConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env)
            .with_context(|| format!("read API key from ${}", config.api_key_env))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl ChatClient for HttpChatClient {
    #[instrument(skip_all, fields(model = %self.model, turns = turns.len()))]
    fn complete(&self, turns: &[Turn]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: turns
                .iter()
                .map(|t| WireMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if status.as_u16() == 401 {
                return Err(anyhow!("chat completion rejected: authentication failed"));
            }
            if status.as_u16() == 429 {
                return Err(anyhow!("chat completion rejected: rate limited"));
            }
            return Err(anyhow!("chat completion failed with {status}: {body}"));
        }

        let parsed: ChatResponse = response
            .json()
            .context("parse chat completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no choices in chat completion response"))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| anyhow!("chat completion choice has no content"))?;

        debug!(reply_bytes = content.len(), "chat completion received");
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}
