use crate::errors::VulnscanError;

/// Schemes and markup that never belong in an origin or endpoint URL.
const DANGEROUS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
];

/// Config fields holding URLs handed to browsers or HTTP clients.
/// Paths and credentials are free-form and not scanned.
const URL_FIELDS: &[&[&str]] = &[&["server", "cors_origins"], &["llm", "base_url"]];

pub fn validate_security_patterns(value: &serde_yaml::Value) -> Result<(), VulnscanError> {
    for field in URL_FIELDS {
        let Some(found) = lookup(value, field) else {
            continue;
        };
        let path = field.join(".");
        match found {
            serde_yaml::Value::String(s) => check_url(s, &path)?,
            serde_yaml::Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(s) = item.as_str() {
                        check_url(s, &format!("{}[{}]", path, i))?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn lookup<'a>(value: &'a serde_yaml::Value, field: &[&str]) -> Option<&'a serde_yaml::Value> {
    field.iter().try_fold(value, |node, key| node.get(*key))
}

fn check_url(value: &str, path: &str) -> Result<(), VulnscanError> {
    let lower = value.to_lowercase();
    match DANGEROUS_PATTERNS.iter().find(|p| lower.contains(*p)) {
        Some(pattern) => Err(VulnscanError::Config(format!(
            "Dangerous pattern '{}' found at config path: {}",
            pattern, path
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_safe_config_passes() {
        let config = yaml(
            "server:\n  host: 0.0.0.0\n  cors_origins: ['https://ui.example.com']\n\
             llm:\n  base_url: http://localhost:11434/v1",
        );
        assert!(validate_security_patterns(&config).is_ok());
    }

    #[test]
    fn test_credentials_and_paths_not_scanned() {
        let config = yaml(
            "scanner:\n  password: 'Data:Center!2024'\n  socket_path: ../run/gvmd.sock\n\
             auth:\n  jwt_secret: 'file:../<script>-0123456789'\n\
             database:\n  path: ../data/vulnscan.db\n\
             llm:\n  api_key: 'javascript:xyz'",
        );
        assert!(validate_security_patterns(&config).is_ok());
    }

    #[test]
    fn test_javascript_origin_blocked() {
        let config = yaml("server:\n  cors_origins: ['https://ok.example', 'JavaScript:void(0)']");
        let err = validate_security_patterns(&config).unwrap_err();
        assert!(err.to_string().contains("server.cors_origins[1]"));
    }

    #[test]
    fn test_data_base_url_blocked() {
        let config = yaml("llm:\n  base_url: 'data:text/html,<h1>hi</h1>'");
        assert!(validate_security_patterns(&config).is_err());
    }

    #[test]
    fn test_file_base_url_blocked() {
        let config = yaml("llm:\n  base_url: 'file:///etc/passwd'");
        let err = validate_security_patterns(&config).unwrap_err();
        assert!(err.to_string().contains("llm.base_url"));
    }

    #[test]
    fn test_script_in_origin_blocked() {
        let config = yaml("server:\n  cors_origins:\n    - '<script>alert(1)'");
        assert!(validate_security_patterns(&config).is_err());
    }
}
