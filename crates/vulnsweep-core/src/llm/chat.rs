use super::{user_prompt, Classifier, ClassifierSettings, SYSTEM_PROMPT};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for OpenAI-compatible `/chat/completions` endpoints (Groq, OpenAI).
///
/// Each call is a single request with temperature zero; failures, including
/// requests exceeding the configured timeout, are returned to the caller without retrying.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    url: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(settings: &ClassifierSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!("{} provider requires a non-empty api_key", settings.provider);
        }
        let base = settings
            .base_url()
            .ok_or_else(|| anyhow!("{} provider has no endpoint", settings.provider))?;
        let url = format!("{base}/chat/completions");
        let http = Client::builder()
            .user_agent(concat!("vulnsweep/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build chat completions HTTP client")?;
        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl Classifier for ChatCompletionsClient {
    async fn classify(&self, code: &str, model: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(code),
                },
            ],
            temperature: 0.0,
        };

        debug!(url = %self.url, model, chars = code.len(), "sending classification request");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("chat completions API error ({}): {}", status, body);
        }

        let chat: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to parse chat completions response")?;
        let content = chat
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completions response missing message content"))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
