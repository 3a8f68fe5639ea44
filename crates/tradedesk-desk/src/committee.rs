use std::sync::Arc;

use tradedesk_graph::{END, Graph, GraphBuilder, GraphError, NodeDef};
use tradedesk_state::State;

use crate::llm::LanguageModel;
use crate::market::MarketData;
use crate::schema::{ROUND, TICKER, desk_schema};
use crate::tasks::{AnalystDesk, AnalystTask, DebateTask, DecisionTask};

pub const ANALYSTS: &str = "analysts";
pub const DEBATE: &str = "debate";
pub const DECISION: &str = "decision";

/// Build the committee graph around the given capabilities.
///
/// The debate node owns the `round` counter; the committee moves on to the
/// decision once `max_rounds` exchanges have been held. At least one exchange
/// always happens because the loop node runs before its router.
pub fn build_committee_graph(
  llm: Arc<dyn LanguageModel>,
  market: Arc<dyn MarketData>,
  max_rounds: u64,
) -> Result<Graph, GraphError> {
  let analysts = AnalystDesk::ALL
    .into_iter()
    .map(|desk| AnalystTask::new(desk, Arc::clone(&llm), Arc::clone(&market)).into_def());

  GraphBuilder::new(desk_schema())
    .add_node(NodeDef::parallel(ANALYSTS, analysts))
    .add_node(NodeDef::sequential(DEBATE, DebateTask::new(Arc::clone(&llm)).into_def()).counting(ROUND))
    .add_node(NodeDef::sequential(DECISION, DecisionTask::new(llm).into_def()))
    .set_start(ANALYSTS)
    .add_edge(ANALYSTS, DEBATE)
    .add_bounded_loop(DEBATE, ROUND, max_rounds, DEBATE, DECISION)
    .add_edge(DECISION, END)
    .build()
}

/// The state a committee run starts from.
pub fn initial_state(ticker: &str) -> State {
  State::new().with(TICKER, ticker.trim())
}
