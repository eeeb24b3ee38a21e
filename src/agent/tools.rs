//! Tools the agent can call while reasoning.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// An action the agent can take by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown in the prompt.
    fn description(&self) -> &str;

    async fn call(&self, input: &str) -> Result<String>;
}

/// Render `name: description` lines for the prompt prefix.
pub fn tool_descriptions(tools: &[Arc<dyn Tool>]) -> String {
    tools
        .iter()
        .map(|tool| format!("> {}: {}", tool.name(), tool.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-separated tool names for the format instructions.
pub fn tool_names(tools: &[Arc<dyn Tool>]) -> String {
    tools
        .iter()
        .map(|tool| tool.name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find a tool by exact name.
pub fn find_tool<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> Option<&'a Arc<dyn Tool>> {
    tools.iter().find(|tool| tool.name() == name)
}
