//! Tradedesk Config
//!
//! Serializable settings for a committee run: which language model endpoint
//! to call, how many debate rounds to hold, and how long tasks and runs may
//! take.
//!
//! Configuration is loaded from a JSON file (via CLI with `--config=desk.json`).
//! Every field has a default, so `{}` is a complete configuration.
//!
//! Credentials never live in the file. The file only names the environment
//! variable the key is read from.

mod desk;
mod error;
mod llm;

pub use desk::DeskConfig;
pub use error::ConfigError;
pub use llm::LlmConfig;
