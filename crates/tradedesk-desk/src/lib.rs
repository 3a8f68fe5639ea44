//! The investment committee.
//!
//! Four analyst desks study a ticker in parallel, a bull and a bear argue
//! over their reports for a bounded number of rounds, and a CIO takes the
//! final decision:
//!
//! ```text
//! analysts(technical, fundamental, sentiment, risk)
//!   -> debate -> [round < max_rounds: debate, else: decision]
//!   -> decision -> end
//! ```
//!
//! External services are reached only through the [`LanguageModel`] and
//! [`MarketData`] capabilities handed to [`build_committee_graph`].

mod committee;
mod error;
mod llm;
mod market;
mod prompt;
mod report;
pub mod schema;
mod tasks;

pub use committee::{ANALYSTS, DEBATE, DECISION, build_committee_graph, initial_state};
pub use error::{LlmError, MarketDataError};
pub use llm::{ChatClient, CompletionRequest, LanguageModel};
pub use market::{FsMarketData, MarketData, NewsLink, ReportKind};
pub use report::{DeskReport, Reports};
pub use tasks::{AnalystDesk, AnalystTask, DebateTask, DecisionTask};
