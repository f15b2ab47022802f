//! # agent-core
//!
//! Core agent logic: provider-agnostic LLM abstraction, tool system,
//! structured-output decoding and a small workflow graph runner.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Workflow                              │
//! │   executor ──[condition]──▶ executor ──▶ executor ...         │
//! │      │                                                        │
//! │  ┌───▼─────────────────────────────────────────────────────┐  │
//! │  │                        Agent                             │  │
//! │  │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │  │
//! │  │  │  Reasoning  │  │    Tools    │  │   LlmProvider   │  │  │
//! │  │  │    Loop     │──│   Registry  │──│   (Strategy)    │  │  │
//! │  │  └─────────────┘  └─────────────┘  └─────────────────┘  │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod provider;
pub mod tool;
pub mod reasoning;
pub mod message;
pub mod error;
pub mod structured;
pub mod workflow;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{GenerationOptions, LlmProvider, ResponseFormat};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentRunResponse};
pub use structured::{decode_structured, StructuredOutput};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolMode, ToolRegistry, ToolResult, ToolSchema};
pub use workflow::{
    AgentExecutor, AgentRequest, AgentResponse, EdgeCondition, Executor, FnExecutor, Workflow,
    WorkflowBuilder, WorkflowContext, WorkflowEvent, WorkflowInfo, WorkflowRun,
};
