use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::TextGenerator;

const CLAUDE_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20240620",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    message: Option<String>,
}

pub struct ClaudeAgent {
    client: Client,
    api_key: String,
}

impl ClaudeAgent {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self { client, api_key }
    }
}

#[async_trait]
impl TextGenerator for ClaudeAgent {
    async fn generate(&self, system: &str, user: &str) -> Result<String, String> {
        let max_retries = 3;
        let mut retry_count = 0;
        let mut backoff = 2u64;
        let mut model_index = 0;

        loop {
            let model = CLAUDE_MODELS[model_index].to_string();
            info!("Calling model {} (input length: {} chars)", model, user.len());

            let body = ClaudeRequest {
                model: model.clone(),
                max_tokens: 1024,
                system: system.to_string(),
                messages: vec![Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                }],
            };

            let response = self
                .client
                .post("https://api.anthropic.com/v1/messages")
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| format!("Request failed: {}", e))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| format!("Response read failed: {}", e))?;

            if status.is_success() {
                let parsed: ClaudeResponse = serde_json::from_str(&text)
                    .map_err(|e| format!("Parse error: {}", e))?;

                if let Some(block) = parsed.content.first() {
                    if block.block_type == "text" {
                        if let Some(ref t) = block.text {
                            return Ok(t.clone());
                        }
                    }
                }
                return Err("No text in response".to_string());
            }

            // 429/404: try the next model in the fallback list before backing off.
            if status.as_u16() == 429 || status.as_u16() == 404 {
                warn!("Model {} unavailable ({})", model, status);
                if model_index < CLAUDE_MODELS.len() - 1 {
                    model_index += 1;
                    retry_count = 0;
                    continue;
                }
            }

            if retry_count >= max_retries {
                let error_json: Result<ClaudeError, _> = serde_json::from_str(&text);
                return Err(format!(
                    "AI service error after {} attempts: {}",
                    max_retries,
                    error_json
                        .ok()
                        .and_then(|e| e.message)
                        .unwrap_or(text)
                ));
            }

            retry_count += 1;
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}
