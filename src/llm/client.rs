//! Completion Client - chat-completions call to the text-generation service

use crate::config::CompletionConfig;
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for the external completion service.
///
/// Sampling parameters are fixed at construction (temperature 0, bounded
/// output length); the service is called once per request with no retries.
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> PipelineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Request a completion for the prompt and return the raw message text.
    ///
    /// Any transport failure or non-success status surfaces as
    /// [`PipelineError::GenerationFailed`]; the response body is otherwise
    /// fully untrusted free text.
    pub async fn complete(&self, prompt: &str) -> PipelineResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::GenerationFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::GenerationFailed(format!(
                "completion service returned {}",
                status
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::GenerationFailed(format!("invalid response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PipelineError::GenerationFailed("empty choices".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "prompt body",
            }],
            temperature: 0.0,
            max_tokens: 220,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 220);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "prompt body");
    }

    #[test]
    fn test_response_message_extraction() {
        let body = r#"{"choices":[{"message":{"content":"SELECT 1"}}],"usage":{"total_tokens":5}}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "SELECT 1");
    }
}
