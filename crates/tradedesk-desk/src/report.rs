//! Mapping a finished run into the response handed to callers.

use serde::{Deserialize, Serialize};
use tradedesk_executor::{Diagnostic, ExecutionResult};
use tradedesk_state::{State, Value};

use crate::market::NewsLink;
use crate::schema::*;

/// The four desk reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reports {
  pub technical: String,
  pub fundamental: String,
  pub sentiment: String,
  pub risk: String,
}

/// What a committee run reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskReport {
  pub ticker: String,
  pub decision: String,
  pub reports: Reports,
  pub news_links: Vec<NewsLink>,
  pub debate: Vec<String>,
  /// Tasks that failed along the way. Empty for a clean run.
  #[serde(default)]
  pub diagnostics: Vec<Diagnostic>,
}

impl DeskReport {
  /// Build the report from a final state.
  ///
  /// Missing, null, or sentinel values become explicit failure text.
  pub fn from_state(state: &State, diagnostics: &[Diagnostic]) -> Self {
    Self {
      ticker: state.text(TICKER).unwrap_or_default().to_string(),
      decision: text_or(state, FINAL_DECISION, "no final decision was produced"),
      reports: Reports {
        technical: text_or(state, TECH_SIGNAL, "technical analysis failed"),
        fundamental: text_or(state, FUND_SIGNAL, "fundamental analysis failed"),
        sentiment: text_or(state, SENTIMENT_SIGNAL, "sentiment analysis failed"),
        risk: text_or(state, RISK_SIGNAL, "risk analysis failed"),
      },
      news_links: news_links(state),
      debate: state
        .list(DEBATE_LOG)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect(),
      diagnostics: diagnostics.to_vec(),
    }
  }

  pub fn from_result(result: &ExecutionResult) -> Self {
    Self::from_state(&result.state, &result.diagnostics)
  }
}

fn text_or(state: &State, field: &str, fallback: &str) -> String {
  match state.text(field) {
    Some(text) if !text.trim().is_empty() && text != UNAVAILABLE => text.to_string(),
    _ => fallback.to_string(),
  }
}

/// Entries that do not look like a news item are skipped.
fn news_links(state: &State) -> Vec<NewsLink> {
  state
    .list(NEWS_LINKS)
    .unwrap_or_default()
    .iter()
    .filter_map(|v| serde_json::from_value(v.clone()).ok())
    .collect()
}
