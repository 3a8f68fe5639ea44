use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::LlmConfig;

/// Settings for one committee run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
  pub llm: LlmConfig,
  /// Bull/bear exchanges before the decision is taken.
  pub max_debate_rounds: u64,
  pub task_timeout_ms: u64,
  pub run_timeout_ms: u64,
  /// Root of the pre-fetched market data. The CLI falls back to
  /// `~/.tradedesk/data`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_dir: Option<PathBuf>,
}

impl Default for DeskConfig {
  fn default() -> Self {
    Self {
      llm: LlmConfig::default(),
      max_debate_rounds: 2,
      task_timeout_ms: 120_000,
      run_timeout_ms: 900_000,
      data_dir: None,
    }
  }
}

impl DeskConfig {
  /// Load and validate a JSON config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: DeskConfig =
      serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      })?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.llm.base_url.trim().is_empty() {
      return Err(ConfigError::Invalid {
        message: "llm.base_url must not be empty".to_string(),
      });
    }
    if self.llm.model.trim().is_empty() {
      return Err(ConfigError::Invalid {
        message: "llm.model must not be empty".to_string(),
      });
    }
    if !(0.0..=2.0).contains(&self.llm.temperature) {
      return Err(ConfigError::Invalid {
        message: format!("llm.temperature {} is outside 0.0..=2.0", self.llm.temperature),
      });
    }
    if self.task_timeout_ms == 0 || self.run_timeout_ms == 0 {
      return Err(ConfigError::Invalid {
        message: "timeouts must be greater than zero".to_string(),
      });
    }
    Ok(())
  }

  pub fn task_timeout(&self) -> Duration {
    Duration::from_millis(self.task_timeout_ms)
  }

  pub fn run_timeout(&self) -> Duration {
    Duration::from_millis(self.run_timeout_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_empty_object_is_a_full_config() {
    let config: DeskConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, DeskConfig::default());
    assert_eq!(config.max_debate_rounds, 2);
    assert_eq!(config.llm.model, "deepseek-chat");
    assert_eq!(config.llm.base_url, "https://api.deepseek.com");
    assert_eq!(config.task_timeout(), Duration::from_secs(120));
    assert_eq!(config.run_timeout(), Duration::from_secs(900));
  }

  #[test]
  fn test_partial_override() {
    let config: DeskConfig = serde_json::from_str(
      r#"{"max_debate_rounds": 4, "llm": {"model": "other-model", "temperature": 0.1}}"#,
    )
    .unwrap();
    assert_eq!(config.max_debate_rounds, 4);
    assert_eq!(config.llm.model, "other-model");
    assert_eq!(config.llm.temperature, 0.1);
    // Unset siblings keep their defaults.
    assert_eq!(config.llm.api_key_env, "TRADEDESK_API_KEY");
    assert_eq!(config.run_timeout_ms, 900_000);
  }

  #[test]
  fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"data_dir": "/srv/market", "task_timeout_ms": 500}}"#).unwrap();

    let config = DeskConfig::load(file.path()).unwrap();
    assert_eq!(config.data_dir, Some(PathBuf::from("/srv/market")));
    assert_eq!(config.task_timeout(), Duration::from_millis(500));
  }

  #[test]
  fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
      DeskConfig::load(&missing),
      Err(ConfigError::Read { .. })
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
      DeskConfig::load(&broken),
      Err(ConfigError::Parse { .. })
    ));

    let invalid = dir.path().join("invalid.json");
    std::fs::write(&invalid, r#"{"run_timeout_ms": 0}"#).unwrap();
    assert!(matches!(
      DeskConfig::load(&invalid),
      Err(ConfigError::Invalid { .. })
    ));
  }
}
