//! Prompt templates.
//!
//! Templates are rendered by minijinja against the committee state, plus a few
//! task-local values. A report that is missing or null renders as "none".

use minijinja::{Environment, Value};
use serde::Serialize;
use tradedesk_graph::TaskError;

pub(crate) const TECHNICAL: &str = r#"You are a senior technical analyst. Below are the most recent daily bars for {{ ticker }}, including the MA5 and MA20 moving averages:
{{ data }}

Analyse price action, volume and the moving average system (golden or death crosses, bullish or bearish alignment).

Answer in this format:
[View] bullish / bearish / range-bound
[Patterns and indicators] moving average state, support and resistance, volume confirmation
[Action] short-term trading bias"#;

pub(crate) const FUNDAMENTAL: &str = r#"You are a senior equity research analyst covering {{ ticker }}. Based on the following financial data (focus on ROE, net margin and growth):
{{ data }}

Assess profitability, balance sheet quality and valuation.

Answer in this format:
[View] undervalued / fairly valued / overvalued
[Key figures] the numbers that drive your view
[Long-term outlook] what would change your mind"#;

pub(crate) const SENTIMENT: &str = r#"You are a market sentiment and behavioural finance analyst. Below is recent news about {{ ticker }} together with the latest market-wide flashes:
{{ data }}

Judge the prevailing mood, how crowded the trade is, and whether the news flow supports an entry now.

Answer in this format:
[Sentiment] greedy / neutral / fearful
[Drivers] the headlines that matter and why
[Timing] whether sentiment confirms or contradicts an entry"#;

pub(crate) const RISK: &str = r#"You are an extremely strict Chief Risk Officer. Your only goal is to protect capital against tail risk and large drawdowns.

Below are the broad market environment, the volatility of {{ ticker }} and the current account state:
{{ data }}

Answer in this format:
[Risk light] green / yellow / red
[Maximum position] a percentage between 0% and 100%
[Stop loss] the level and the reason"#;

pub(crate) const BULL: &str = r#"You argue the BULL case for {{ ticker }} in round {{ round }} of an investment committee debate.

Technical report: {{ tech_signal or "none" }}
Fundamental report: {{ fund_signal or "none" }}
Sentiment report: {{ sentiment_signal or "none" }}
Risk report: {{ risk_signal or "none" }}
{% if debate_log %}
Debate so far:
{% for entry in debate_log %}{{ entry or "none" }}
{% endfor %}{% endif %}
Make the strongest case for buying in at most three short paragraphs, and answer the bear's latest points if there are any."#;

pub(crate) const BEAR: &str = r#"You argue the BEAR case for {{ ticker }} in round {{ round }} of an investment committee debate.

Technical report: {{ tech_signal or "none" }}
Fundamental report: {{ fund_signal or "none" }}
Sentiment report: {{ sentiment_signal or "none" }}
Risk report: {{ risk_signal or "none" }}
{% if debate_log %}
Debate so far:
{% for entry in debate_log %}{{ entry or "none" }}
{% endfor %}{% endif %}
The bull just argued:
{{ bull }}

Rebut it and make the strongest case against buying in at most three short paragraphs."#;

pub(crate) const DECISION: &str = r#"You are the Chief Investment Officer and portfolio manager of a hedge fund. Four independent reports on {{ ticker }} are on your desk.

[1. Fundamental research]
{{ fund_signal or "none" }}

[2. Technical analysis]
{{ tech_signal or "none" }}

[3. Market sentiment]
{{ sentiment_signal or "none" }}

[4. Chief Risk Officer] (highest priority)
{{ risk_signal or "none" }}
{% if debate_log %}
[Bull / bear debate]
{% for entry in debate_log %}{{ entry or "none" }}
{% endfor %}{% endif %}
Chair the debate and issue the final trading decision.

Rules:
- If the risk officer shows a red light, veto the trade (flat or sell) no matter how bullish the others are.
- If technicals and fundamentals conflict, weigh short-term odds against long-term win rate.
- Use sentiment to confirm timing.
- A report marked "[unavailable]" or "none" could not be produced; say how its absence affects your confidence.

Answer in this format:
# Decision: buy / sell / hold
# Position: 0% - 100%
# Debate summary: how you reconciled the desks, whose views you accepted and whose you rejected
# Execution: concrete orders and stop loss"#;

/// Render `template` with `context`.
///
/// A render failure is a bug in the template or the state, so it fails the task.
pub(crate) fn render<S: Serialize>(template: &str, context: &S) -> Result<String, TaskError> {
  let env = Environment::new();
  env
    .render_str(template, Value::from_serialize(context))
    .map_err(|e| TaskError::failed(format!("failed to render prompt: {}", e)))
}
