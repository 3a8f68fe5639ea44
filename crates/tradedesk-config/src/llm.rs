use serde::{Deserialize, Serialize};

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  /// Base URL; `/chat/completions` is appended.
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  /// Environment variable holding the API key.
  pub api_key_env: String,
}

impl LlmConfig {
  pub const DEFAULT_BASE_URL: &'static str = "https://api.deepseek.com";
  pub const DEFAULT_MODEL: &'static str = "deepseek-chat";
  pub const DEFAULT_API_KEY_ENV: &'static str = "TRADEDESK_API_KEY";

  /// Read the API key from the configured environment variable.
  pub fn api_key_from_env(&self) -> Option<String> {
    std::env::var(&self.api_key_env)
      .ok()
      .filter(|key| !key.trim().is_empty())
  }
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url: Self::DEFAULT_BASE_URL.to_string(),
      model: Self::DEFAULT_MODEL.to_string(),
      temperature: 0.3,
      api_key_env: Self::DEFAULT_API_KEY_ENV.to_string(),
    }
  }
}
