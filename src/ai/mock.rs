//! Mock provider for tests and demo pipelines

use async_trait::async_trait;

use super::Provider;

/// Returns a canned answer, or echoes the prompt back
pub struct MockProvider {
    response: Option<String>,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    /// Echo the prompt back as the completion
    pub fn echo() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| prompt.to_string()))
    }
}
