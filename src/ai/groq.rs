//! Groq provider (fallback)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::Provider;
use crate::util::{CONNECT_TIMEOUT, INFER_TIMEOUT};

const GROQ_API_BASE: &str = "https://api.groq.com";
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

pub struct GroqProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GroqProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GROQ_API_BASE)
    }

    /// Point the provider at a different endpoint (tests)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(INFER_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent("strix/0.3")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": GROQ_MODEL,
                "messages": [
                    { "role": "user", "content": prompt }
                ]
            }))
            .send()
            .await
            .context("Failed to send request to Groq API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Groq API error {status}: {body}");
        }

        let json: serde_json::Value = response.json().await?;
        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Invalid response format from Groq API")?;

        Ok(text.to_string())
    }
}
