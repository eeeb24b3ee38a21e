//! Reasoning strategies: how a prompt is built and how model output is read.

use super::tools::{tool_descriptions, tool_names, Tool};
use crate::config::{AgentPrompts, Prompts};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// What the model decided to do on one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// The final answer for the user.
    Finish(String),
    /// Call `tool` with `input`; `log` is the raw model output.
    Action {
        tool: String,
        input: String,
        log: String,
    },
}

/// Everything a strategy needs to render one iteration's prompt.
pub struct PromptInputs<'a> {
    pub input: &'a str,
    pub history: &'a str,
    pub tools: &'a [Arc<dyn Tool>],
    pub scratchpad: &'a str,
}

pub trait ReasoningStrategy: Send + Sync {
    fn render_prompt(&self, inputs: &PromptInputs<'_>) -> String;

    fn parse(&self, output: &str) -> AgentStep;

    /// Sequences that end a generation before the model invents an observation.
    fn stop_sequences(&self) -> Vec<String>;
}

/// Conversational ReAct: the model either names an action or answers after `AI:`.
pub struct ConversationalReact {
    prompts: AgentPrompts,
}

impl ConversationalReact {
    pub fn new(prompts: AgentPrompts) -> Self {
        Self { prompts }
    }
}

impl Default for ConversationalReact {
    fn default() -> Self {
        Self::new(AgentPrompts::default())
    }
}

const FINAL_ANSWER_MARKER: &str = "AI:";
const OBSERVATION_STOP: &str = "\nObservation:";

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action:\s*(.*?)\s*\n+\s*Action Input:\s*(.*)").expect("valid regex")
    })
}

impl ReasoningStrategy for ConversationalReact {
    fn render_prompt(&self, inputs: &PromptInputs<'_>) -> String {
        let mut vars = HashMap::new();
        vars.insert("tool_descriptions".to_string(), tool_descriptions(inputs.tools));
        vars.insert("tool_names".to_string(), tool_names(inputs.tools));
        vars.insert("history".to_string(), inputs.history.to_string());
        vars.insert("input".to_string(), inputs.input.to_string());
        vars.insert("agent_scratchpad".to_string(), inputs.scratchpad.to_string());

        [
            &self.prompts.prefix,
            &self.prompts.format_instructions,
            &self.prompts.suffix,
        ]
        .iter()
        .map(|template| Prompts::render(template, &vars))
        .collect::<Vec<_>>()
        .join("\n\n")
    }

    fn parse(&self, output: &str) -> AgentStep {
        if let Some(pos) = output.rfind(FINAL_ANSWER_MARKER) {
            let answer = output[pos + FINAL_ANSWER_MARKER.len()..].trim();
            return AgentStep::Finish(answer.to_string());
        }

        if let Some(caps) = action_regex().captures(output) {
            return AgentStep::Action {
                tool: caps[1].trim().to_string(),
                input: caps[2].trim().trim_matches('"').to_string(),
                log: output.trim_end().to_string(),
            };
        }

        warn!("Model output did not follow the response format; using it as the answer");
        AgentStep::Finish(output.trim().to_string())
    }

    fn stop_sequences(&self) -> Vec<String> {
        vec![OBSERVATION_STOP.to_string()]
    }
}
