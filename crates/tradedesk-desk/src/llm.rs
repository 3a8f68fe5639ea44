//! Language model capability.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use tradedesk_config::LlmConfig;

use crate::error::LlmError;

/// One prompt for the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
  /// Optional persona given as a system message.
  pub system: Option<String>,
  pub prompt: String,
}

impl CompletionRequest {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      system: None,
      prompt: prompt.into(),
    }
  }

  pub fn with_system(mut self, system: impl Into<String>) -> Self {
    self.system = Some(system.into());
    self
  }
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
  client: Client,
  endpoint: String,
  model: String,
  temperature: f32,
  api_key: String,
}

impl ChatClient {
  pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
      model: config.model.clone(),
      temperature: config.temperature,
      api_key: api_key.into(),
    }
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
      messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    json!({
      "model": self.model,
      "temperature": self.temperature,
      "messages": messages,
    })
  }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

fn first_content(response: ChatResponse) -> Result<String, LlmError> {
  response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .filter(|content| !content.trim().is_empty())
    .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl LanguageModel for ChatClient {
  async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
    debug!(model = %self.model, prompt_len = request.prompt.len(), "llm_request");

    let response = self
      .client
      .post(&self.endpoint)
      .bearer_auth(&self.api_key)
      .json(&self.request_body(&request))
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(LlmError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let body: ChatResponse = response.json().await?;
    first_content(body)
  }
}
