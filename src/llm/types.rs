use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub model: String,
}

impl LLMResponse {
    pub fn text(content: impl Into<String>, model: &str) -> Self {
        Self {
            content: content.into(),
            input_tokens: None,
            output_tokens: None,
            model: model.to_string(),
        }
    }
}
