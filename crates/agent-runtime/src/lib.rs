//! # agent-runtime
//!
//! Runtime providers for the agent system.
//!
//! ## Providers
//!
//! - **OpenAI-compatible** (default): Azure OpenAI deployments, or any server
//!   speaking the OpenAI chat-completions protocol when `OPENAI_BASE_URL` is set
//! - **Scripted**: canned replies for tests and offline runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = Agent::builder()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod openai;
pub mod scripted;

pub use openai::{ApiFlavor, OpenAiConfig, OpenAiProvider};
pub use scripted::{RecordedRequest, ScriptedProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
