use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use liverag_core::traits::Generator;
use liverag_core::types::GenerationConfig;

pub struct OpenAiCompatibleGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Standard chat fields plus the sampling extras that vLLM/TGI style servers accept.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn request<'a>(&'a self, prompt: &'a str, config: &GenerationConfig) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: config.repetition_penalty,
            top_k: config.top_k,
            do_sample: config.do_sample,
        }
    }

    /// First choice's message content. Blank content is an error.
    pub fn parse_response(body: serde_json::Value) -> Result<String> {
        let parsed: ChatResponse = serde_json::from_value(body).context("unexpected chat completion shape")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| anyhow!("no content in chat completion"))?;
        if content.trim().is_empty() {
            return Err(anyhow!("model returned an empty completion"));
        }
        Ok(content)
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, prompt_chars = prompt.len(), max_tokens = config.max_tokens, "chat completion request");
        let mut request = self.client.post(&url).json(&self.request(prompt, config));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("generation endpoint returned {status}: {text}"));
        }
        let body: serde_json::Value = response.json().await.context("generation response is not JSON")?;
        Self::parse_response(body)
    }
}
