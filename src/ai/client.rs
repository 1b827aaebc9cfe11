//! OpenAI chat completions client.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client for the AI provider")?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Run one chat completion and return the first choice.
    pub async fn complete(&self, system: &str, user: &str) -> anyhow::Result<Completion> {
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct CompletionResponse {
            model: String,
            choices: Vec<Choice>,
            #[serde(default)]
            usage: Usage,
        }

        debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "max_tokens": 1000,
                "temperature": 0.7,
                "top_p": 0.9,
            }))
            .send()
            .await
            .context("AI completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("AI provider returned {status}: {body}"));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to decode AI completion")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("AI provider returned no choices"))?;

        Ok(Completion {
            content,
            model: completion.model,
            usage: completion.usage,
        })
    }
}
