use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::VulnscanError;
use super::provider::LLMProvider;
use super::types::LLMResponse;

/// Messages for the chat completions API, shared with the local provider.
pub(crate) fn chat_messages(prompt: &str, system: Option<&str>) -> Vec<Value> {
    let mut messages = Vec::new();
    if let Some(sys) = system {
        messages.push(json!({"role": "system", "content": sys}));
    }
    messages.push(json!({"role": "user", "content": prompt}));
    messages
}

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LLMResponse, VulnscanError> {
        let body = json!({
            "model": self.model,
            "messages": chat_messages(prompt, system),
            "max_tokens": 4096,
        });

        let resp = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| VulnscanError::Network(format!("OpenAI request failed: {}", e.without_url())))?;

        match resp.status().as_u16() {
            429 => return Err(VulnscanError::LLMApi("OpenAI rate limit".into())),
            401 => return Err(VulnscanError::LLMApi("Invalid OpenAI API key".into())),
            _ => {}
        }

        let data: Value = resp.json().await
            .map_err(|e| VulnscanError::LLMApi(format!("Failed to parse OpenAI response: {}", e.without_url())))?;

        if let Some(error) = data.get("error") {
            return Err(VulnscanError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| VulnscanError::LLMApi("No content in OpenAI response".into()))?
            .to_string();

        Ok(LLMResponse {
            content,
            input_tokens: data["usage"]["prompt_tokens"].as_u64(),
            output_tokens: data["usage"]["completion_tokens"].as_u64(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "openai" }
    fn model_name(&self) -> &str { &self.model }
}
