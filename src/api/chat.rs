//! Generation backend client
//!
//! Builds the grounded prompt and invokes an OpenAI-compatible chat
//! completion endpoint (a local Ollama server by default). A backend that
//! is unreachable or errors surfaces as
//! [`LexragError::GenerationUnavailable`]; the engine never substitutes a
//! fabricated answer. Callers that want to degrade can build an explicit
//! context-only reply with [`context_only_response`].

use crate::config::GenerationConfig;
use crate::error::{LexragError, Result};
use crate::ml::ScoredChunk;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use std::time::Duration;

/// System prompt for grounded legal answering
const SYSTEM_PROMPT: &str = "You are a legal research assistant answering questions about \
Kenyan law using excerpts from official legal publications.\n\n\
When answering:\n\
1. Ground your answer in the provided context excerpts whenever they are relevant\n\
2. Be clear when the context does not contain enough information to answer\n\
3. Do not invent statutes, case names, or citations\n\
4. Keep answers accurate and concise";

/// Client for the external generation service
#[derive(Clone)]
pub struct GenerationClient {
    config: GenerationConfig,
}

impl GenerationClient {
    /// Create a generation client from the configuration
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    /// Default model used when the caller does not name one
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Run one grounded chat completion and return the backend's answer
    /// verbatim
    pub async fn complete(&self, model: &str, query: &str, context: &str) -> Result<String> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&self.config.api_key)
            .with_api_base(&self.config.api_base);
        let client = Client::with_config(openai_config);

        let user_message = build_user_message(query, context);
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    SYSTEM_PROMPT.to_string(),
                ),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user_message),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| LexragError::Config(format!("invalid generation request: {}", e)))?;

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            client.chat().create(request),
        )
        .await
        .map_err(|_| {
            LexragError::GenerationUnavailable(format!(
                "generation timed out after {}s",
                self.config.timeout_secs
            ))
        })?
        .map_err(|e| LexragError::GenerationUnavailable(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| {
                LexragError::GenerationUnavailable("backend returned no content".to_string())
            })?;

        Ok(content.clone())
    }
}

/// Embed the assembled context and the question into one user message
fn build_user_message(query: &str, context: &str) -> String {
    if context.trim().is_empty() {
        query.to_string()
    } else {
        format!(
            "Context from legal publications:\n{}\n\nQuestion: {}",
            context, query
        )
    }
}

/// Build an explicit context-only reply from retrieval results, for callers
/// that choose to degrade when the generation backend is unavailable
pub fn context_only_response(results: &[ScoredChunk]) -> String {
    if results.is_empty() {
        return "No relevant passages were found in the indexed legal publications.".to_string();
    }

    let mut response =
        "The generation backend is unavailable; here are the most relevant passages:\n\n"
            .to_string();

    for (i, chunk) in results.iter().take(3).enumerate() {
        let preview: String = chunk.text.chars().take(200).collect();
        let ellipsis = if chunk.text.chars().count() > 200 { "..." } else { "" };
        response.push_str(&format!(
            "{}. {}{}\n   ({})\n\n",
            i + 1,
            preview,
            ellipsis,
            chunk.source.url
        ));
    }

    response.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ChunkSource;

    fn scored(text: &str) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            source: ChunkSource::new("https://kenyalaw.org/x", "X", "kenyalaw.org"),
            score: 0.5,
        }
    }

    #[test]
    fn test_user_message_includes_context() {
        let message = build_user_message("What is the Land Act?", "The Land Act of 2012...");
        assert!(message.contains("The Land Act of 2012..."));
        assert!(message.contains("Question: What is the Land Act?"));
    }

    #[test]
    fn test_user_message_without_context_is_bare_query() {
        let message = build_user_message("What is the Land Act?", "   ");
        assert_eq!(message, "What is the Land Act?");
    }

    #[test]
    fn test_context_only_response_previews_top_chunks() {
        let results = vec![scored(&"long passage ".repeat(30)), scored("short")];
        let response = context_only_response(&results);
        assert!(response.contains("1. "));
        assert!(response.contains("..."));
        assert!(response.contains("2. short"));
        assert!(response.contains("https://kenyalaw.org/x"));
    }

    #[test]
    fn test_context_only_response_empty_results() {
        let response = context_only_response(&[]);
        assert!(response.contains("No relevant passages"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_generation_unavailable() {
        let client = GenerationClient::new(GenerationConfig {
            api_base: "http://127.0.0.1:1/v1".to_string(),
            timeout_secs: 5,
            ..GenerationConfig::default()
        });

        let result = client.complete("llama3", "query", "context").await;
        assert!(matches!(
            result,
            Err(LexragError::GenerationUnavailable(_))
        ));
    }
}
