use std::path::Path;
use crate::errors::VulnscanError;
use super::credentials::resolve_with;
use super::types::VulnscanConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;
const MIN_JWT_SECRET_BYTES: usize = 16;
/// One year.
const MAX_TOKEN_TTL_MINUTES: u64 = 525_600;
const KNOWN_LLM_PROVIDERS: &[&str] = &["gemini", "anthropic", "openai", "local"];

pub const ENV_JWT_SECRET: &str = "VULNSCAN_JWT_SECRET";
pub const ENV_DATABASE: &str = "VULNSCAN_DATABASE";
pub const ENV_SCANNER_SOCKET: &str = "VULNSCAN_SCANNER_SOCKET";

pub async fn parse_config(path: &Path) -> Result<VulnscanConfig, VulnscanError> {
    if !path.exists() {
        return Err(VulnscanError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(VulnscanError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content, |name| std::env::var(name).ok())
}

/// Parses YAML text, resolving `$VAR` credentials and environment overrides through `env`.
pub fn parse_config_str(
    content: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<VulnscanConfig, VulnscanError> {
    let yaml: serde_yaml::Value = if content.trim().is_empty() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(content)?
    };

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let mut config: VulnscanConfig = serde_yaml::from_value(yaml)?;

    resolve_credentials(&mut config, &env);
    apply_env_overrides(&mut config, &env);
    validate_semantics(&config)?;

    Ok(config)
}

fn resolve_credentials(config: &mut VulnscanConfig, env: &impl Fn(&str) -> Option<String>) {
    config.auth.jwt_secret = resolve_with(&config.auth.jwt_secret, env);
    config.scanner.username = resolve_with(&config.scanner.username, env);
    config.scanner.password = resolve_with(&config.scanner.password, env);
    if let Some(key) = config.llm.as_mut().and_then(|l| l.api_key.as_mut()) {
        *key = resolve_with(key, env);
    }
}

fn apply_env_overrides(config: &mut VulnscanConfig, env: &impl Fn(&str) -> Option<String>) {
    if let Some(secret) = env(ENV_JWT_SECRET).filter(|s| !s.is_empty()) {
        config.auth.jwt_secret = secret;
    }
    if let Some(path) = env(ENV_DATABASE).filter(|s| !s.is_empty()) {
        config.database.path = path;
    }
    if let Some(socket) = env(ENV_SCANNER_SOCKET).filter(|s| !s.is_empty()) {
        config.scanner.socket_path = socket;
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), VulnscanError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| VulnscanError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| VulnscanError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only: typed deserialization below is the hard gate.
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

fn validate_semantics(config: &VulnscanConfig) -> Result<(), VulnscanError> {
    if config.auth.jwt_secret.is_empty() {
        return Err(VulnscanError::Config(format!(
            "auth.jwt_secret is required (or set {})",
            ENV_JWT_SECRET
        )));
    }
    if config.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
        return Err(VulnscanError::Config(format!(
            "auth.jwt_secret must be at least {} bytes",
            MIN_JWT_SECRET_BYTES
        )));
    }
    if config.auth.token_ttl_minutes == 0 || config.auth.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
        return Err(VulnscanError::Config(format!(
            "auth.token_ttl_minutes must be between 1 and {}",
            MAX_TOKEN_TTL_MINUTES
        )));
    }
    if config.database.path.trim().is_empty() {
        return Err(VulnscanError::Config("database.path must not be empty".into()));
    }
    if let Some(provider) = config.llm.as_ref().and_then(|l| l.provider.as_deref()) {
        if !KNOWN_LLM_PROVIDERS.contains(&provider) {
            return Err(VulnscanError::Config(format!("Unknown LLM provider: {}", provider)));
        }
    }
    if config.scanner.password.is_empty() {
        warn!("scanner.password is empty; scanner authentication will likely fail");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn minimal() -> String {
        format!("auth:\n  jwt_secret: {}\n", SECRET)
    }

    #[test]
    fn test_minimal_config() {
        let config = parse_config_str(&minimal(), no_env).unwrap();
        assert_eq!(config.auth.jwt_secret, SECRET);
        assert_eq!(config.database.path, "vulnscan.db");
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = parse_config_str("server:\n  port: 8080\n", no_env).unwrap_err();
        assert!(matches!(err, VulnscanError::Config(_)));
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = parse_config_str("auth:\n  jwt_secret: short\n", no_env).unwrap_err();
        assert!(err.to_string().contains("at least 16 bytes"));
    }

    #[test]
    fn test_token_ttl_bounds() {
        let zero = format!("{}  token_ttl_minutes: 0\n", minimal());
        assert!(matches!(parse_config_str(&zero, no_env), Err(VulnscanError::Config(_))));
        let huge = format!("{}  token_ttl_minutes: 9999999999\n", minimal());
        assert!(matches!(parse_config_str(&huge, no_env), Err(VulnscanError::Config(_))));
    }

    #[test]
    fn test_env_overrides_win() {
        let env = |name: &str| match name {
            ENV_JWT_SECRET => Some("from-environment-secret".to_string()),
            ENV_DATABASE => Some("/var/lib/vulnscan/app.db".to_string()),
            ENV_SCANNER_SOCKET => Some("/tmp/gvmd.sock".to_string()),
            _ => None,
        };
        let config = parse_config_str("auth:\n  jwt_secret: tiny\n", env).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-environment-secret");
        assert_eq!(config.database.path, "/var/lib/vulnscan/app.db");
        assert_eq!(config.scanner.socket_path, "/tmp/gvmd.sock");
    }

    #[test]
    fn test_dollar_credentials_resolved() {
        let yaml = format!(
            "{}scanner:\n  password: $GVM_PASSWORD\nllm:\n  provider: gemini\n  api_key: $GEMINI_KEY\n",
            minimal()
        );
        let env = |name: &str| match name {
            "GVM_PASSWORD" => Some("gvm-pass".to_string()),
            "GEMINI_KEY" => Some("gem-key".to_string()),
            _ => None,
        };
        let config = parse_config_str(&yaml, env).unwrap();
        assert_eq!(config.scanner.password, "gvm-pass");
        assert_eq!(config.llm.unwrap().api_key.as_deref(), Some("gem-key"));
    }

    #[test]
    fn test_unknown_llm_provider_rejected() {
        let yaml = format!("{}llm:\n  provider: bard\n", minimal());
        assert!(parse_config_str(&yaml, no_env).is_err());
    }

    #[test]
    fn test_dangerous_pattern_rejected() {
        let yaml = format!("{}llm:\n  provider: local\n  base_url: file:///etc/shadow\n", minimal());
        assert!(matches!(parse_config_str(&yaml, no_env), Err(VulnscanError::Config(_))));
    }

    #[test]
    fn test_free_form_values_accepted() {
        let yaml = format!(
            "{}database:\n  path: ../data/vulnscan.db\nscanner:\n  password: 'Data:Center!2024'\n",
            minimal()
        );
        let config = parse_config_str(&yaml, no_env).unwrap();
        assert_eq!(config.database.path, "../data/vulnscan.db");
        assert_eq!(config.scanner.password, "Data:Center!2024");
    }

    #[test]
    fn test_wrong_type_is_yaml_error() {
        let yaml = format!("{}server:\n  port: not-a-number\n", minimal());
        assert!(matches!(parse_config_str(&yaml, no_env), Err(VulnscanError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = parse_config(Path::new("/nonexistent/vulnscan.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vulnscan.yaml");
        std::fs::write(&path, minimal()).unwrap();
        let config = parse_config(&path).await.unwrap();
        assert_eq!(config.server.port, 5000);
    }
}
