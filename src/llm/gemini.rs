use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::VulnscanError;
use super::provider::LLMProvider;
use super::types::LLMResponse;

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gemini-1.5-flash").to_string(),
            base_url: base_url
                .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LLMResponse, VulnscanError> {
        let text = match system {
            Some(sys) => format!("System: {}\n\n{}", sys, prompt),
            None => prompt.to_string(),
        };
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": text}]}],
            "generationConfig": {
                "maxOutputTokens": 4096,
            }
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self.client.post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VulnscanError::Network(format!("Gemini request failed: {}", e.without_url())))?;

        match resp.status().as_u16() {
            429 => return Err(VulnscanError::LLMApi("Gemini rate limit exceeded".into())),
            401 | 403 => return Err(VulnscanError::LLMApi("Gemini rejected the API key".into())),
            _ => {}
        }

        let data: Value = resp.json().await
            .map_err(|e| VulnscanError::LLMApi(format!("Failed to parse Gemini response: {}", e.without_url())))?;

        if let Some(error) = data.get("error") {
            return Err(VulnscanError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| VulnscanError::LLMApi("No content in Gemini response".into()))?
            .to_string();

        Ok(LLMResponse {
            content,
            input_tokens: data["usageMetadata"]["promptTokenCount"].as_u64(),
            output_tokens: data["usageMetadata"]["candidatesTokenCount"].as_u64(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "gemini" }
    fn model_name(&self) -> &str { &self.model }
}
