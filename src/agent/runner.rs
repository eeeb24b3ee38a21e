//! Agent runner with a bounded reasoning loop.

use super::strategy::{AgentStep, PromptInputs, ReasoningStrategy};
use super::tools::{find_tool, Tool};
use crate::error::{Result, VidragError};
use crate::llm::{GenerationOptions, LanguageModel};
use crate::rag::ConversationMemory;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Answers a query from conversation memory by driving a language model
/// through a reasoning strategy.
pub struct AnsweringAgent {
    llm: Arc<dyn LanguageModel>,
    strategy: Arc<dyn ReasoningStrategy>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
}

impl AnsweringAgent {
    /// Create an agent with no tools bound.
    pub fn new(llm: Arc<dyn LanguageModel>, strategy: Arc<dyn ReasoningStrategy>) -> Self {
        Self {
            llm,
            strategy,
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Produce the final answer for `query`, grounded on the whole memory.
    #[instrument(skip(self, memory, options), fields(turns = memory.len()))]
    pub async fn answer(
        &self,
        query: &str,
        memory: &ConversationMemory,
        options: &GenerationOptions,
    ) -> Result<String> {
        let history = memory.buffer_string();
        let mut options = options.clone();
        for stop in self.strategy.stop_sequences() {
            if !options.stop.contains(&stop) {
                options.stop.push(stop);
            }
        }

        let mut scratchpad = String::new();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}", iteration);

            let prompt = self.strategy.render_prompt(&PromptInputs {
                input: query,
                history: &history,
                tools: &self.tools,
                scratchpad: &scratchpad,
            });

            let output = self.llm.generate(&prompt, &options).await.map_err(|e| match e {
                VidragError::Agent(_) | VidragError::Configuration(_) => e,
                other => VidragError::Agent(other.to_string()),
            })?;

            match self.strategy.parse(&output) {
                AgentStep::Finish(answer) => {
                    if answer.is_empty() {
                        return Err(VidragError::Agent("Model returned an empty answer".to_string()));
                    }
                    info!("Agent finished after {} iteration(s)", iteration);
                    return Ok(answer);
                }
                AgentStep::Action { tool, input, log } => {
                    let observation = self.run_tool(&tool, &input).await;
                    scratchpad.push_str(&format!("{}\nObservation: {}\nThought:", log, observation));
                }
            }
        }

        Err(VidragError::Agent(format!(
            "Agent exceeded maximum iterations ({})",
            self.max_iterations
        )))
    }

    async fn run_tool(&self, name: &str, input: &str) -> String {
        match find_tool(&self.tools, name) {
            Some(tool) => {
                info!("Agent calling tool: {} with input: {}", name, input);
                match tool.call(input).await {
                    Ok(output) => output,
                    Err(e) => format!("Tool error: {}", e),
                }
            }
            None => {
                warn!("Model asked for unknown tool: {}", name);
                format!("{} is not a valid tool, try another one.", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ConversationalReact;
    use crate::rag::Role;
    use crate::test_support::ScriptedLanguageModel;

    fn agent(llm: Arc<ScriptedLanguageModel>) -> AnsweringAgent {
        AnsweringAgent::new(llm, Arc::new(ConversationalReact::default()))
    }

    #[tokio::test]
    async fn test_answer_is_grounded_on_memory() {
        let llm = Arc::new(ScriptedLanguageModel::new(vec![
            "Thought: Do I need to use a tool? No\nAI: It explains retrieval augmented generation.",
        ]));
        let mut memory = ConversationMemory::new();
        memory.append(Role::Assistant, "rag stands for retrieval augmented generation");
        memory.append(Role::Assistant, "the video compares vector stores");

        let answer = agent(llm.clone())
            .answer("what is the video about?", &memory, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "It explains retrieval augmented generation.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("AI: rag stands for retrieval augmented generation\nAI: the video compares vector stores"));
        assert!(prompts[0].contains("what is the video about?"));
    }

    #[tokio::test]
    async fn test_generation_options_carry_temperature_and_stop() {
        let llm = Arc::new(ScriptedLanguageModel::new(vec!["AI: ok"]));
        agent(llm.clone())
            .answer("q", &ConversationMemory::new(), &GenerationOptions::with_temperature(0.8))
            .await
            .unwrap();

        let options = llm.options();
        assert!((options[0].temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(options[0].stop, vec!["\nObservation:".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let llm = Arc::new(ScriptedLanguageModel::new(vec![
            "Thought: Do I need to use a tool? Yes\nAction: search\nAction Input: rag",
            "Thought: Do I need to use a tool? No\nAI: done",
        ]));

        let answer = agent(llm.clone())
            .answer("q", &ConversationMemory::new(), &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "done");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Observation: search is not a valid tool, try another one."));
    }

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "repeats its input"
        }

        async fn call(&self, input: &str) -> Result<String> {
            Ok(input.to_string())
        }
    }

    struct BrokenTool;

    #[async_trait::async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn call(&self, _input: &str) -> Result<String> {
            Err(VidragError::Agent("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_bound_tools_feed_observations() {
        let llm = Arc::new(ScriptedLanguageModel::new(vec![
            "Thought: Do I need to use a tool? Yes\nAction: echo\nAction Input: hello",
            "Thought: Do I need to use a tool? Yes\nAction: broken\nAction Input: x",
            "Thought: Do I need to use a tool? No\nAI: done",
        ]));
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(EchoTool), Arc::new(BrokenTool)];

        let answer = agent(llm.clone())
            .with_tools(tools)
            .answer("q", &ConversationMemory::new(), &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "done");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("> echo: repeats its input"));
        assert!(prompts[0].contains("> broken: always fails"));
        assert!(prompts[1].contains("Observation: hello\nThought:"));
        assert!(prompts[2].contains("Observation: Tool error: Agent error: backend down"));
    }

    #[tokio::test]
    async fn test_iteration_limit_is_agent_error() {
        let llm = Arc::new(ScriptedLanguageModel::repeating(
            "Action: search\nAction Input: again",
        ));

        let err = agent(llm.clone())
            .with_max_iterations(3)
            .answer("q", &ConversationMemory::new(), &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VidragError::Agent(_)));
        assert_eq!(llm.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_memory_still_answers() {
        let llm = Arc::new(ScriptedLanguageModel::new(vec!["AI: I could not find that in the video."]));
        let answer = agent(llm)
            .answer("q", &ConversationMemory::new(), &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "I could not find that in the video.");
    }

    #[tokio::test]
    async fn test_model_failure_is_agent_error() {
        let llm = Arc::new(ScriptedLanguageModel::new(Vec::<&str>::new()));
        let err = agent(llm)
            .answer("q", &ConversationMemory::new(), &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VidragError::Agent(_)));
    }
}
