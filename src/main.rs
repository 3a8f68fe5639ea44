use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradedesk_config::DeskConfig;
use tradedesk_desk::{
  ChatClient, CompletionRequest, DeskReport, FsMarketData, LanguageModel, LlmError,
  build_committee_graph, initial_state,
};
use tradedesk_executor::{Executor, ExecutorConfig};

/// Tradedesk - a multi-desk investment committee run as a task graph
#[derive(Parser)]
#[command(name = "tradedesk")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the committee on a ticker and print its report
  Analyze {
    /// The ticker to analyse (e.g. sh.600519)
    ticker: String,

    /// Path to a JSON desk config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding pre-fetched market data (default: ~/.tradedesk/data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// API key for the model endpoint (default: read from the environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Number of bull/bear debate rounds
    #[arg(long)]
    rounds: Option<u64>,
  },

  /// Print the committee graph as JSON
  Describe {
    /// Number of bull/bear debate rounds
    #[arg(long, default_value_t = 2)]
    rounds: u64,
  },
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Analyze {
      ticker,
      config,
      data_dir,
      api_key,
      rounds,
    } => analyze(ticker, config, data_dir, api_key, rounds),
    Commands::Describe { rounds } => describe(rounds),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      let error = json!({
        "status": "error",
        "message": format!("{:#}", e),
      });
      println!("{}", serde_json::to_string_pretty(&error).unwrap_or_else(|_| error.to_string()));
      ExitCode::FAILURE
    }
  }
}

fn analyze(
  ticker: String,
  config_file: Option<PathBuf>,
  data_dir: Option<PathBuf>,
  api_key: Option<String>,
  rounds: Option<u64>,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { analyze_async(ticker, config_file, data_dir, api_key, rounds).await })
}

async fn analyze_async(
  ticker: String,
  config_file: Option<PathBuf>,
  data_dir: Option<PathBuf>,
  api_key: Option<String>,
  rounds: Option<u64>,
) -> Result<()> {
  let ticker = ticker.trim().to_string();
  if ticker.is_empty() {
    bail!("missing ticker");
  }

  let mut config = match &config_file {
    Some(path) => DeskConfig::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()))?,
    None => DeskConfig::default(),
  };
  if let Some(rounds) = rounds {
    config.max_debate_rounds = rounds;
  }

  let api_key = api_key
    .filter(|key| !key.trim().is_empty())
    .or_else(|| config.llm.api_key_from_env())
    .with_context(|| format!("missing API key: pass --api-key or set {}", config.llm.api_key_env))?;

  let data_dir = match data_dir.or_else(|| config.data_dir.clone()) {
    Some(dir) => dir,
    None => default_data_dir()?,
  };

  let llm = Arc::new(ChatClient::new(&config.llm, api_key));
  let market = Arc::new(FsMarketData::new(&data_dir));
  let graph = build_committee_graph(llm, market, config.max_debate_rounds)
    .context("failed to build committee graph")?;

  let executor = Executor::new(ExecutorConfig {
    task_timeout: Some(config.task_timeout()),
    run_timeout: Some(config.run_timeout()),
    ..ExecutorConfig::default()
  });

  info!(ticker = %ticker, data_dir = %data_dir.display(), rounds = config.max_debate_rounds, "analysis_started");

  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      ctrl_c.cancel();
    }
  });

  let result = executor
    .execute(&graph, initial_state(&ticker), cancel)
    .await
    .with_context(|| format!("analysis of {} failed", ticker))?;

  let output = json!({
    "status": "success",
    "ticker": ticker,
    "data": DeskReport::from_result(&result),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn describe(rounds: u64) -> Result<()> {
  let graph = build_committee_graph(Arc::new(Offline), Arc::new(FsMarketData::new(".")), rounds)
    .context("failed to build committee graph")?;
  println!("{}", serde_json::to_string_pretty(&graph.describe())?);
  Ok(())
}

fn default_data_dir() -> Result<PathBuf> {
  let home = dirs::home_dir().context("could not determine home directory")?;
  Ok(home.join(".tradedesk").join("data"))
}

/// Stand-in model for commands that never run the graph.
struct Offline;

#[async_trait::async_trait]
impl LanguageModel for Offline {
  async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
    Err(LlmError::EmptyResponse)
  }
}
