//! Fields of the committee state.

use serde_json::json;
use tradedesk_state::{FieldSpec, Schema};

pub const TICKER: &str = "ticker";

pub const TECHNICAL_DATA: &str = "technical_data";
pub const FUNDAMENTAL_DATA: &str = "fundamental_data";
pub const NEWS_DATA: &str = "news_data";
pub const RISK_DATA: &str = "risk_data";
pub const NEWS_LINKS: &str = "news_links";

pub const TECH_SIGNAL: &str = "tech_signal";
pub const FUND_SIGNAL: &str = "fund_signal";
pub const SENTIMENT_SIGNAL: &str = "sentiment_signal";
pub const RISK_SIGNAL: &str = "risk_signal";

pub const ROUND: &str = "round";
pub const DEBATE_LOG: &str = "debate_log";
pub const FINAL_DECISION: &str = "final_decision";

/// Written in place of a report whose desk failed.
pub const UNAVAILABLE: &str = "[unavailable]";

/// The schema every committee graph is built against.
pub fn desk_schema() -> Schema {
  let signal = || FieldSpec::text().with_sentinel(UNAVAILABLE);

  Schema::new()
    .field(TICKER, FieldSpec::text())
    .field(TECHNICAL_DATA, FieldSpec::text())
    .field(FUNDAMENTAL_DATA, FieldSpec::text())
    .field(NEWS_DATA, FieldSpec::text())
    .field(RISK_DATA, FieldSpec::text())
    .field(NEWS_LINKS, FieldSpec::list().with_sentinel(json!([])))
    .field(TECH_SIGNAL, signal())
    .field(FUND_SIGNAL, signal())
    .field(SENTIMENT_SIGNAL, signal())
    .field(RISK_SIGNAL, signal())
    .field(ROUND, FieldSpec::integer())
    .field(DEBATE_LOG, FieldSpec::log().with_sentinel("[debate round unavailable]"))
    .field(FINAL_DECISION, FieldSpec::text())
}
