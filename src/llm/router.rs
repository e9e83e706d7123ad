use crate::errors::VulnscanError;
use super::provider::LLMProvider;
use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;
use super::gemini::GeminiProvider;
use super::local::LocalProvider;

pub const DEFAULT_PROVIDER: &str = "gemini";

pub fn create_provider(
    provider_name: &str,
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn LLMProvider>, VulnscanError> {
    let needs_key = !matches!(provider_name, "local");
    if needs_key && api_key.trim().is_empty() {
        return Err(VulnscanError::Config(format!(
            "LLM provider '{}' requires an api_key",
            provider_name
        )));
    }

    match provider_name {
        "gemini" => Ok(Box::new(GeminiProvider::new(api_key, model, base_url))),
        "anthropic" => Ok(Box::new(AnthropicProvider::new(api_key, model, base_url))),
        "openai" => Ok(Box::new(OpenAIProvider::new(api_key, model, base_url))),
        "local" => Ok(Box::new(LocalProvider::new(base_url, model, api_key))),
        _ => Err(VulnscanError::Config(format!("Unknown LLM provider: {}", provider_name))),
    }
}
