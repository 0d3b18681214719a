//! AI Adapter - prompt operations over a provider fallback chain
//!
//! A single surface with five operations (code analysis, security
//! recommendations, fix generation, documentation, workflow synthesis),
//! each built from a prompt template. The adapter tries providers in
//! order (Gemini primary, Groq fallback) and moves on after any
//! transport error or non-2xx response. Callers that can tolerate a
//! missing report must treat every error here as non-fatal.

mod gemini;
mod groq;
mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Result, StrixError};

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use mock::MockProvider;

/// One LLM backend in the fallback chain
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Single-prompt completion
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Provider chain with prompt-template operations
#[derive(Clone)]
pub struct AiAdapter {
    chain: Vec<Arc<dyn Provider>>,
}

impl AiAdapter {
    pub fn new(chain: Vec<Arc<dyn Provider>>) -> Self {
        Self { chain }
    }

    /// Build the chain from the environment: Gemini primary, Groq
    /// fallback. Providers without credentials are left out.
    pub fn from_env() -> Self {
        let mut chain: Vec<Arc<dyn Provider>> = Vec::new();
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                chain.push(Arc::new(GeminiProvider::new(key)));
            }
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                chain.push(Arc::new(GroqProvider::new(key)));
            }
        }
        Self::new(chain)
    }

    pub fn is_configured(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Walk the chain until a provider answers
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.chain.is_empty() {
            return Err(StrixError::NoProviderConfigured);
        }

        let mut last_error = String::new();
        for provider in &self.chain {
            match provider.complete(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    last_error = format!("{}: {e}", provider.name());
                }
            }
        }
        Err(StrixError::ProviderApi { message: last_error })
    }

    /// Analyze code for vulnerabilities
    pub async fn analyze_code(&self, code: &str, language: &str) -> Result<String> {
        let prompt = format!(
            "Analyze the following {language} code for security vulnerabilities.\n\
Provide a detailed security analysis including:\n\
1. Identified vulnerabilities\n\
2. Severity level (Critical, High, Medium, Low)\n\
3. Detailed explanation\n\
4. Recommended fixes\n\
\n\
Code:\n{code}"
        );
        self.complete(&prompt).await
    }

    /// Executive report over aggregated scan results
    pub async fn generate_security_recommendations(&self, scan_results: &str) -> Result<String> {
        let prompt = format!(
            "Based on the following security scan results and auto-fix actions, provide a detailed report:\n\
\n\
Scan Results & Actions:\n{scan_results}\n\
\n\
Please provide:\n\
1. Executive Summary of Findings\n\
2. Review of Auto-Fix Actions taken (if any)\n\
3. Priority recommendations for remaining issues\n\
4. Best practices to follow"
        );
        self.complete(&prompt).await
    }

    /// Produce the fixed file body for a described vulnerability
    pub async fn generate_fix(&self, code: &str, vulnerability: &str) -> Result<String> {
        let prompt = format!(
            "You are a security expert. Fix the following code to resolve the specified vulnerability.\n\
Return ONLY the fixed code without any markdown formatting or explanation.\n\
\n\
Vulnerability: {vulnerability}\n\
\n\
Code:\n{code}"
        );
        self.complete(&prompt).await
    }

    /// Generate project documentation from execution context
    pub async fn generate_documentation(&self, context: &str) -> Result<String> {
        let prompt = format!(
            "You are a Technical Writer. Generate comprehensive documentation for the following \
infrastructure and security context.\n\
Return the response in Markdown format.\n\
\n\
Context:\n{context}\n\
\n\
Please generate:\n\
1. A README.md content with:\n\
   - Project Overview\n\
   - Architecture Description\n\
   - Security Posture (based on scan results)\n\
   - Setup Instructions\n\
2. An ARCHITECTURE.md content with:\n\
   - Diagram description\n\
   - Decision Records (ADRs) based on findings"
        );
        self.complete(&prompt).await
    }

    /// Synthesize a workflow definition (nodes + edges JSON) from a
    /// natural-language request
    pub async fn generate_workflow_json(&self, request: &str) -> Result<String> {
        let prompt = format!(
            "You are an expert Workflow Builder Assistant.\n\
Create a JSON configuration for a security workflow based on this request: \"{request}\"\n\
\n\
The JSON must return an object with \"nodes\" and \"edges\" arrays.\n\
Node Types available: \"trigger\", \"gobuster\", \"nikto\", \"nmap\", \"sqlmap\", \"wpscan\", \
\"owasp-vulnerabilities\", \"auto-fix\", \"email\", \"github-issue\", \"slack\", \"flow-chart\".\n\
\n\
Rules:\n\
1. Always start with a \"trigger\" node.\n\
2. \"edges\" must connect nodes logically (source -> target).\n\
3. Return ONLY valid JSON. No markdown formatting.\n\
\n\
Example Structure:\n\
{{\n\
  \"nodes\": [\n\
    {{ \"id\": \"1\", \"type\": \"trigger\", \"data\": {{ \"sourceUrl\": \"https://example.com\" }} }},\n\
    {{ \"id\": \"2\", \"type\": \"nmap\", \"data\": {{}} }}\n\
  ],\n\
  \"edges\": [\n\
    {{ \"source\": \"1\", \"target\": \"2\" }}\n\
  ]\n\
}}"
        );
        let raw = self.complete(&prompt).await?;
        Ok(strip_json_fence(&raw).to_string())
    }
}

/// Remove a surrounding ```json fence if the model added one
fn strip_json_fence(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        return rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    trimmed
}
