use tracing::debug;

/// Resolve a credential value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_credential(value: &str) -> String {
    resolve_with(value, |name| std::env::var(name).ok())
}

pub(crate) fn resolve_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(var_name) = value.strip_prefix('$') else {
        return value.to_string();
    };
    match lookup(var_name) {
        Some(resolved) => {
            debug!(var = %var_name, "Resolved credential from environment");
            resolved
        }
        None => {
            debug!(var = %var_name, "Environment variable not set, using literal");
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("mypassword"), "mypassword");
    }

    #[test]
    fn test_resolve_credential_env_var() {
        std::env::set_var("TEST_VULNSCAN_CRED", "secret123");
        assert_eq!(resolve_credential("$TEST_VULNSCAN_CRED"), "secret123");
        std::env::remove_var("TEST_VULNSCAN_CRED");
    }

    #[test]
    fn test_resolve_credential_missing_env_var() {
        let result = resolve_credential("$NONEXISTENT_VULNSCAN_VAR");
        assert_eq!(result, "$NONEXISTENT_VULNSCAN_VAR");
    }

    #[test]
    fn test_resolve_with_lookup() {
        let lookup = |name: &str| (name == "GVM_PASS").then(|| "hunter22".to_string());
        assert_eq!(resolve_with("$GVM_PASS", lookup), "hunter22");
        assert_eq!(resolve_with("plain", lookup), "plain");
    }
}
