//! Text generation backends.

use crate::error::{Result, VidragError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, Stop,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Sampling options for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Generation halts before any of these sequences.
    pub stop: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            stop: Vec::new(),
        }
    }
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

/// A model that completes a prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// Chat-completions model on any OpenAI-compatible endpoint.
pub struct OpenAiChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(base_url, api_key)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidragError::Agent(e.to_string()))?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(options.temperature);
        if !options.stop.is_empty() {
            args.stop(Stop::StringArray(options.stop.clone()));
        }
        let request = args.build().map_err(|e| VidragError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidragError::Agent(format!("Language model error: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| VidragError::Agent("Empty response from language model".to_string()))?;

        debug!("Generated {} characters", content.len());
        Ok(content)
    }
}
