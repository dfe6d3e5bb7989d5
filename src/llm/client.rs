use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// OpenAI-compatible chat completions format
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// One chat completion over the full message history. A well-formed
    /// response with absent or empty content yields an empty `text`; the
    /// caller decides what that means.
    pub async fn complete(&self, model: &str, messages: Vec<ChatMessage>) -> Result<LlmResponse> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            max_tokens: 4096,
            messages,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error ({}): {}", status, body);
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse LLM API response")?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("")
            .to_string();

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(LlmResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::Router;

    use super::*;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn first_choice_content_is_returned() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                r#"{"choices":[{"message":{"content":"答えです。"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#
            }),
        );
        let base = spawn_stub(router).await;

        let client = LlmClient::new("test-key", &format!("{}/chat/completions", base));
        let response = client
            .complete("gpt-4", vec![ChatMessage::new("user", "aspirin")])
            .await
            .unwrap();
        assert_eq!(response.text, "答えです。");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 3);
    }

    #[tokio::test]
    async fn missing_content_yields_empty_text() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { r#"{"choices":[{"message":{}}]}"# }),
        );
        let base = spawn_stub(router).await;

        let client = LlmClient::new("test-key", &format!("{}/chat/completions", base));
        let response = client
            .complete("gpt-4", vec![ChatMessage::new("user", "aspirin")])
            .await
            .unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.input_tokens, 0);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (axum::http::StatusCode::UNAUTHORIZED, "bad key")
            }),
        );
        let base = spawn_stub(router).await;

        let client = LlmClient::new("test-key", &format!("{}/chat/completions", base));
        let err = client
            .complete("gpt-4", vec![ChatMessage::new("user", "aspirin")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
