//! Market data capability.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MarketDataError;

/// The four raw reports an analyst desk can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
  /// Recent daily bars with moving averages.
  Technical,
  /// Profitability and balance sheet figures.
  Fundamental,
  /// Ticker-specific news and market flashes.
  News,
  /// Index trend, volatility, and account exposure.
  Risk,
}

impl ReportKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReportKind::Technical => "technical",
      ReportKind::Fundamental => "fundamental",
      ReportKind::News => "news",
      ReportKind::Risk => "risk",
    }
  }
}

impl fmt::Display for ReportKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A news item the sentiment desk cited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsLink {
  pub title: String,
  pub url: String,
  pub content: String,
  pub time: String,
}

#[async_trait]
pub trait MarketData: Send + Sync {
  /// Fetch one raw report as text.
  async fn report(&self, ticker: &str, kind: ReportKind) -> Result<String, MarketDataError>;

  /// News items behind the news report. An absent list is empty.
  async fn news_links(&self, ticker: &str) -> Result<Vec<NewsLink>, MarketDataError>;
}

/// Pre-fetched market data on disk.
///
/// Layout:
/// ```text
/// {root}/{ticker}/technical.txt
/// {root}/{ticker}/fundamental.txt
/// {root}/{ticker}/news.txt
/// {root}/{ticker}/risk.txt
/// {root}/{ticker}/news_links.json
/// ```
#[derive(Debug, Clone)]
pub struct FsMarketData {
  root: PathBuf,
}

impl FsMarketData {
  pub fn new(root: impl AsRef<Path>) -> Self {
    Self {
      root: root.as_ref().to_path_buf(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn ticker_dir(&self, ticker: &str) -> Result<PathBuf, MarketDataError> {
    let valid = !ticker.is_empty()
      && ticker != "."
      && ticker != ".."
      && ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if !valid {
      return Err(MarketDataError::InvalidTicker {
        ticker: ticker.to_string(),
      });
    }
    Ok(self.root.join(ticker))
  }
}

#[async_trait]
impl MarketData for FsMarketData {
  async fn report(&self, ticker: &str, kind: ReportKind) -> Result<String, MarketDataError> {
    let path = self.ticker_dir(ticker)?.join(format!("{}.txt", kind));

    match tokio::fs::read_to_string(&path).await {
      Ok(text) => Ok(text),
      Err(e) if e.kind() == ErrorKind::NotFound => Err(MarketDataError::NotFound {
        ticker: ticker.to_string(),
        kind: kind.to_string(),
      }),
      Err(source) => Err(MarketDataError::Io { path, source }),
    }
  }

  async fn news_links(&self, ticker: &str) -> Result<Vec<NewsLink>, MarketDataError> {
    let path = self.ticker_dir(ticker)?.join("news_links.json");

    let content = match tokio::fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(MarketDataError::Io { path, source }),
    };

    serde_json::from_str(&content).map_err(|e| MarketDataError::Malformed {
      path,
      message: e.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn fixture() -> (TempDir, FsMarketData) {
    let dir = TempDir::new().unwrap();
    let ticker = dir.path().join("sh.600519");
    std::fs::create_dir_all(&ticker).unwrap();
    std::fs::write(ticker.join("technical.txt"), "close 1700 MA5 1690").unwrap();
    std::fs::write(
      ticker.join("news_links.json"),
      r#"[{"title": "Earnings beat", "url": "https://example.com/a", "time": "2024-05-01"}]"#,
    )
    .unwrap();
    let data = FsMarketData::new(dir.path());
    (dir, data)
  }

  #[tokio::test]
  async fn test_reads_reports() {
    let (_dir, data) = fixture();

    let text = data.report("sh.600519", ReportKind::Technical).await.unwrap();
    assert_eq!(text, "close 1700 MA5 1690");

    let err = data.report("sh.600519", ReportKind::Risk).await.unwrap_err();
    assert!(matches!(err, MarketDataError::NotFound { ref kind, .. } if kind == "risk"));
  }

  #[tokio::test]
  async fn test_reads_news_links() {
    let (_dir, data) = fixture();

    let links = data.news_links("sh.600519").await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title, "Earnings beat");
    assert_eq!(links[0].content, "");

    // No file means no links.
    std::fs::create_dir_all(data.root().join("AAPL")).unwrap();
    assert!(data.news_links("AAPL").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_malformed_news_links() {
    let (_dir, data) = fixture();
    std::fs::write(data.root().join("sh.600519/news_links.json"), "{}").unwrap();

    let err = data.news_links("sh.600519").await.unwrap_err();
    assert!(matches!(err, MarketDataError::Malformed { .. }));
  }

  #[tokio::test]
  async fn test_rejects_path_like_tickers() {
    let (_dir, data) = fixture();

    for ticker in ["", "..", "../etc", "a/b"] {
      let err = data.report(ticker, ReportKind::News).await.unwrap_err();
      assert!(matches!(err, MarketDataError::InvalidTicker { .. }), "{ticker}");
    }
  }
}
