//! Client for the external AI annotation service.
//!
//! CodexBase treats the language model as an opaque text-in/text-out
//! collaborator behind a chat-completion HTTP endpoint: send a prompt,
//! receive a reply, persist or forward it. Nothing in the core depends on
//! what the model actually says.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the AI collaborator.
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport-level failure talking to the inference endpoint.
    #[error("ai request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("ai endpoint returned status {0}")]
    BadStatus(u16),

    /// The endpoint answered but the reply carried no text.
    #[error("ai endpoint returned an empty reply")]
    EmptyReply,
}

/// Result type for AI operations.
pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// HTTP client for a chat-completion inference endpoint.
pub struct AiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl AiClient {
    /// Creates a client for the given inference endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    /// Sends a prompt and returns the reply text.
    ///
    /// Retries once on transport errors; HTTP error statuses are not
    /// retried.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        match self.complete_once(prompt).await {
            Err(AiError::Http(err)) => {
                tracing::warn!(error = %err, "ai request failed, retrying once");
                self.complete_once(prompt).await
            }
            other => other,
        }
    }

    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::BadStatus(response.status().as_u16()));
        }

        let body: CompletionResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::EmptyReply);
        }
        Ok(text)
    }

    /// Builds a code-review prompt for a pull request diff.
    pub fn review_prompt(diff: &str) -> String {
        format!(
            "You are a code reviewer. Review the following change and point \
             out problems or improvements:\n\n{diff}"
        )
    }

    /// Builds a summary prompt for a pull request diff.
    pub fn summary_prompt(diff: &str) -> String {
        format!("Summarize the following change in a few sentences:\n\n{diff}")
    }

    /// Builds an explanation prompt for one file's content.
    pub fn explain_prompt(name: &str, content: &str) -> String {
        format!("Explain what the file `{name}` does:\n\n{content}")
    }

    /// Builds a commit-message prompt from a change description.
    pub fn commit_message_prompt(changes: &str) -> String {
        format!(
            "Write a concise one-line commit message for the following \
             changes:\n\n{changes}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    }

    #[tokio::test]
    async fn test_complete_returns_reply_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("looks good")))
            .mount(&server)
            .await;

        let client = AiClient::new(&server.uri(), "test-model").unwrap();
        let reply = client.complete("review this").await.unwrap();
        assert_eq!(reply, "looks good");
    }

    #[tokio::test]
    async fn test_complete_surfaces_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AiClient::new(&server.uri(), "test-model").unwrap();
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, AiError::BadStatus(500)));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("")))
            .mount(&server)
            .await;

        let client = AiClient::new(&server.uri(), "test-model").unwrap();
        assert!(matches!(
            client.complete("prompt").await,
            Err(AiError::EmptyReply)
        ));
    }

    #[test]
    fn test_prompts_embed_input() {
        assert!(AiClient::review_prompt("THE DIFF").contains("THE DIFF"));
        assert!(AiClient::summary_prompt("THE DIFF").contains("THE DIFF"));
        assert!(AiClient::explain_prompt("main.rs", "fn main() {}").contains("main.rs"));
        assert!(AiClient::commit_message_prompt("added file").contains("added file"));
    }
}
