use std::path::PathBuf;

use thiserror::Error;
use tradedesk_graph::TaskError;

/// Errors from the language model endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("model endpoint returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("model returned no content")]
  EmptyResponse,
}

/// Errors from a market data source.
#[derive(Debug, Error)]
pub enum MarketDataError {
  #[error("invalid ticker '{ticker}'")]
  InvalidTicker { ticker: String },

  #[error("no {kind} data for {ticker}")]
  NotFound { ticker: String, kind: String },

  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed data in {path}: {message}")]
  Malformed { path: PathBuf, message: String },
}

impl From<LlmError> for TaskError {
  fn from(e: LlmError) -> Self {
    match e {
      LlmError::Status { .. } => TaskError::rejected(e.to_string()),
      LlmError::Http(_) | LlmError::EmptyResponse => TaskError::upstream(e.to_string()),
    }
  }
}

impl From<MarketDataError> for TaskError {
  fn from(e: MarketDataError) -> Self {
    TaskError::upstream(e.to_string())
  }
}
