//! The committee's tasks.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};
use tradedesk_graph::{Task, TaskDef, TaskError};
use tradedesk_state::{PartialState, State, Value};

use crate::llm::{CompletionRequest, LanguageModel};
use crate::market::{MarketData, ReportKind};
use crate::prompt;
use crate::schema::*;

/// One of the four analyst desks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalystDesk {
  Technical,
  Fundamental,
  Sentiment,
  Risk,
}

impl AnalystDesk {
  pub const ALL: [AnalystDesk; 4] = [
    AnalystDesk::Technical,
    AnalystDesk::Fundamental,
    AnalystDesk::Sentiment,
    AnalystDesk::Risk,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      AnalystDesk::Technical => "technical",
      AnalystDesk::Fundamental => "fundamental",
      AnalystDesk::Sentiment => "sentiment",
      AnalystDesk::Risk => "risk",
    }
  }

  pub fn report_kind(&self) -> ReportKind {
    match self {
      AnalystDesk::Technical => ReportKind::Technical,
      AnalystDesk::Fundamental => ReportKind::Fundamental,
      AnalystDesk::Sentiment => ReportKind::News,
      AnalystDesk::Risk => ReportKind::Risk,
    }
  }

  pub fn data_field(&self) -> &'static str {
    match self {
      AnalystDesk::Technical => TECHNICAL_DATA,
      AnalystDesk::Fundamental => FUNDAMENTAL_DATA,
      AnalystDesk::Sentiment => NEWS_DATA,
      AnalystDesk::Risk => RISK_DATA,
    }
  }

  pub fn signal_field(&self) -> &'static str {
    match self {
      AnalystDesk::Technical => TECH_SIGNAL,
      AnalystDesk::Fundamental => FUND_SIGNAL,
      AnalystDesk::Sentiment => SENTIMENT_SIGNAL,
      AnalystDesk::Risk => RISK_SIGNAL,
    }
  }

  /// Fields the desk writes.
  pub fn outputs(&self) -> Vec<&'static str> {
    let mut outputs = vec![self.data_field(), self.signal_field()];
    if *self == AnalystDesk::Sentiment {
      outputs.push(NEWS_LINKS);
    }
    outputs
  }

  fn template(&self) -> &'static str {
    match self {
      AnalystDesk::Technical => prompt::TECHNICAL,
      AnalystDesk::Fundamental => prompt::FUNDAMENTAL,
      AnalystDesk::Sentiment => prompt::SENTIMENT,
      AnalystDesk::Risk => prompt::RISK,
    }
  }
}

fn ticker(state: &State) -> Result<&str, TaskError> {
  state
    .text(TICKER)
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| TaskError::upstream("ticker is missing from the state"))
}

/// Fetches one raw report and asks the model to analyse it.
pub struct AnalystTask {
  desk: AnalystDesk,
  llm: Arc<dyn LanguageModel>,
  market: Arc<dyn MarketData>,
}

impl AnalystTask {
  pub fn new(desk: AnalystDesk, llm: Arc<dyn LanguageModel>, market: Arc<dyn MarketData>) -> Self {
    Self { desk, llm, market }
  }

  pub fn into_def(self) -> TaskDef {
    TaskDef::new(self.desk.name(), self.desk.outputs(), self)
  }
}

#[async_trait]
impl Task for AnalystTask {
  async fn run(&self, state: Arc<State>) -> Result<PartialState, TaskError> {
    let ticker = ticker(&state)?;
    info!(desk = self.desk.name(), ticker = %ticker, "analyst_started");

    let data = self.market.report(ticker, self.desk.report_kind()).await?;
    if data.trim().is_empty() {
      return Err(TaskError::upstream(format!(
        "{} report for {} is empty",
        self.desk.report_kind(),
        ticker
      )));
    }

    let prompt = prompt::render(self.desk.template(), &json!({ "ticker": ticker, "data": data }))?;
    let signal = self.llm.complete(CompletionRequest::new(prompt)).await?;

    let mut partial = PartialState::new()
      .set(self.desk.data_field(), data)
      .set(self.desk.signal_field(), signal);

    if self.desk == AnalystDesk::Sentiment {
      // Links only decorate the report; losing them does not fail the desk.
      let links = match self.market.news_links(ticker).await {
        Ok(links) => links,
        Err(e) => {
          warn!(ticker = %ticker, error = %e, "news_links_unavailable");
          Vec::new()
        }
      };
      let links = serde_json::to_value(links)
        .map_err(|e| TaskError::failed(format!("failed to encode news links: {}", e)))?;
      partial.insert(NEWS_LINKS, links);
    }

    Ok(partial)
  }
}

/// One bull/bear exchange, appended to the debate log.
pub struct DebateTask {
  llm: Arc<dyn LanguageModel>,
}

impl DebateTask {
  pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
    Self { llm }
  }

  pub fn into_def(self) -> TaskDef {
    TaskDef::new("debate", [DEBATE_LOG], self)
  }
}

#[async_trait]
impl Task for DebateTask {
  async fn run(&self, state: Arc<State>) -> Result<PartialState, TaskError> {
    ticker(&state)?;
    // The node bumps the counter after this task, so this is the round in progress.
    let round = state
      .get(ROUND)
      .and_then(Value::as_u64)
      .unwrap_or(0)
      .saturating_add(1);

    let mut context = state.to_json();
    context["round"] = json!(round);

    let bull = self
      .llm
      .complete(
        CompletionRequest::new(prompt::render(prompt::BULL, &context)?)
          .with_system("You are the bull on an investment committee."),
      )
      .await?;

    context["bull"] = Value::String(bull.clone());
    let bear = self
      .llm
      .complete(
        CompletionRequest::new(prompt::render(prompt::BEAR, &context)?)
          .with_system("You are the bear on an investment committee."),
      )
      .await?;

    info!(round, "debate_round_completed");
    Ok(PartialState::new().set(
      DEBATE_LOG,
      format!("Round {}\nBULL: {}\nBEAR: {}", round, bull.trim(), bear.trim()),
    ))
  }
}

/// The CIO's final call.
pub struct DecisionTask {
  llm: Arc<dyn LanguageModel>,
}

impl DecisionTask {
  pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
    Self { llm }
  }

  pub fn into_def(self) -> TaskDef {
    TaskDef::new("decision", [FINAL_DECISION], self)
  }
}

#[async_trait]
impl Task for DecisionTask {
  async fn run(&self, state: Arc<State>) -> Result<PartialState, TaskError> {
    ticker(&state)?;
    let prompt = prompt::render(prompt::DECISION, &state.to_json())?;
    let decision = self.llm.complete(CompletionRequest::new(prompt)).await?;
    Ok(PartialState::new().set(FINAL_DECISION, decision))
  }
}
