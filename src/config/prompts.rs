//! Prompt templates for vidrag.
//!
//! The agent prompt can be customized by placing an `agent.toml` file in the
//! configured prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub agent: AgentPrompts,
}

/// Prompts for the conversational reasoning agent.
///
/// Templates use `{{name}}` placeholders. The prefix receives
/// `tool_descriptions`, the format instructions receive `tool_names`, and the
/// suffix receives `history`, `input` and `agent_scratchpad`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub prefix: String,
    pub format_instructions: String,
    pub suffix: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            prefix: r#"Assistant is a large language model answering questions about a video.

Assistant can hold a conversation, explain topics in depth and summarize what was said. The previous conversation history below contains excerpts of the video's transcript that were selected because they relate to the new input. Ground every answer in those excerpts. If they do not contain the answer, say so instead of guessing.

TOOLS:
------

Assistant has access to the following tools:

{{tool_descriptions}}"#
                .to_string(),

            format_instructions: r#"To use a tool, please use the following format:

Thought: Do I need to use a tool? Yes
Action: the action to take, should be one of [{{tool_names}}]
Action Input: the input to the action
Observation: the result of the action

When you have a response to say to the Human, or if you do not need to use a tool, you MUST use the format:

Thought: Do I need to use a tool? No
AI: [your response here]"#
                .to_string(),

            suffix: r#"Begin!

Previous conversation history:
{{history}}

New input: {{input}}

Thought:{{agent_scratchpad}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the agent prompt from `<custom_dir>/agent.toml` if present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, left to right. Each `{{name}}` with a
    /// matching variable is replaced; unknown placeholders are kept as
    /// written. Substituted values are copied verbatim and never re-scanned.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            match after_open.find("}}") {
                Some(close) => {
                    let name = &after_open[..close];
                    match vars.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after_open[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }
}
