use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::VulnscanError;
use super::openai::chat_messages;
use super::provider::LLMProvider;
use super::types::LLMResponse;

/// Any OpenAI-compatible server, Ollama by default.
pub struct LocalProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LocalProvider {
    pub fn new(base_url: Option<&str>, model: Option<&str>, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .unwrap_or("http://localhost:11434/v1")
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or("llama3.1").to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for LocalProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LLMResponse, VulnscanError> {
        let body = json!({
            "model": self.model,
            "messages": chat_messages(prompt, system),
            "max_tokens": 4096,
        });

        let mut req = self.client.post(format!("{}/chat/completions", self.base_url)).json(&body);
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }
        let resp = req
            .send()
            .await
            .map_err(|e| VulnscanError::Network(format!("Local LLM request failed: {}", e.without_url())))?;

        let data: Value = resp.json().await
            .map_err(|e| VulnscanError::LLMApi(format!("Parse error: {}", e.without_url())))?;

        let content = data["choices"][0]["message"]["content"].as_str().unwrap_or("").to_string();

        Ok(LLMResponse::text(content, &self.model))
    }

    fn provider_name(&self) -> &str { "local" }
    fn model_name(&self) -> &str { &self.model }
}
