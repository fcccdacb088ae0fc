//! OpenAI-compatible generator.
//! Most LLM APIs follow the same `/v1/chat/completions` format, so a single
//! implementation covers OpenAI itself and compatible gateways.

use crate::providers::traits::{GenerateRequest, Generator};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A generator that speaks the OpenAI-compatible chat completions API.
pub struct OpenAiGenerator {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>, model: &str, temperature: f64) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.map(ToString::to_string),
            model: model.to_string(),
            temperature,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build the chat completions URL, detecting whether the base URL
    /// already names the endpoint (custom gateways sometimes do).
    fn chat_completions_url(&self) -> String {
        if self
            .base_url
            .trim_end_matches('/')
            .ends_with("/chat/completions")
        {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn build_messages(request: &GenerateRequest<'_>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(Message {
        role: "system".to_string(),
        content: request.system_prompt.to_string(),
    });
    for turn in request.history {
        messages.push(Message {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        });
    }
    messages.push(Message {
        role: "user".to_string(),
        content: request.question.to_string(),
    });
    messages
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: build_messages(request),
            temperature: self.temperature,
        };

        let mut http_request = self.client.post(self.chat_completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await?;
        if !response.status().is_success() {
            return Err(super::api_error("openai", response).await);
        }

        let parsed: ApiChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            anyhow::bail!("openai returned an empty completion");
        }
        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
