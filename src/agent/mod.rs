//! Answering agent.
//!
//! A [`LanguageModel`](crate::llm::LanguageModel) is driven through a
//! [`ReasoningStrategy`] until it produces a final answer. Retrieval happens
//! before the agent runs; by default no tools are bound.

mod runner;
mod strategy;
mod tools;

pub use runner::AnsweringAgent;
pub use strategy::{AgentStep, ConversationalReact, PromptInputs, ReasoningStrategy};
pub use tools::{find_tool, tool_descriptions, tool_names, Tool};
