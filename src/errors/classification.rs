use super::types::VulnscanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// HTTP status the error is surfaced with.
    pub status: u16,
}

impl VulnscanError {
    /// Classify this error into a stable type name and the HTTP status it maps to.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Caller errors
            VulnscanError::Validation(_) => ErrorClassification {
                error_type: "ValidationError",
                status: 400,
            },
            VulnscanError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                status: 401,
            },
            VulnscanError::Permission(_) => ErrorClassification {
                error_type: "PermissionError",
                status: 403,
            },
            VulnscanError::NotFound(_) => ErrorClassification {
                error_type: "NotFoundError",
                status: 404,
            },
            VulnscanError::Conflict(_) => ErrorClassification {
                error_type: "ConflictError",
                status: 409,
            },
            VulnscanError::Unavailable(_) => ErrorClassification {
                error_type: "UnavailableError",
                status: 503,
            },

            // Remote faults are relayed; only "not found" keeps its meaning
            VulnscanError::Scanner { status: 404, .. } => ErrorClassification {
                error_type: "ScannerError",
                status: 404,
            },
            VulnscanError::Scanner { .. } => ErrorClassification {
                error_type: "ScannerError",
                status: 500,
            },
            VulnscanError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                status: 500,
            },
            VulnscanError::LLMApi(_) => ErrorClassification {
                error_type: "LLMApiError",
                status: 500,
            },

            // Server-side failures
            VulnscanError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                status: 500,
            },
            VulnscanError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                status: 500,
            },
            VulnscanError::Xml(_) => ErrorClassification {
                error_type: "XmlError",
                status: 500,
            },
            VulnscanError::Export(_) => ErrorClassification {
                error_type: "ExportError",
                status: 500,
            },
            VulnscanError::Io(_) => ErrorClassification {
                error_type: "IoError",
                status: 500,
            },
            VulnscanError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                status: 500,
            },
            VulnscanError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                status: 500,
            },
            VulnscanError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                status: 500,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_bad_request() {
        let class = VulnscanError::Validation("name is required".into()).classify();
        assert_eq!(class.status, 400);
        assert_eq!(class.error_type, "ValidationError");
    }

    #[test]
    fn test_conflict_is_409() {
        let err = VulnscanError::Conflict("Email already exists".into());
        assert_eq!(err.classify().status, 409);
    }

    #[test]
    fn test_scanner_not_found_keeps_404() {
        let err = VulnscanError::Scanner { status: 404, text: "Failed to find report".into() };
        assert_eq!(err.classify().status, 404);
    }

    #[test]
    fn test_scanner_fault_is_500() {
        let err = VulnscanError::Scanner { status: 400, text: "Bogus".into() };
        assert_eq!(err.classify().status, 500);
        assert_eq!(err.to_string(), "Error 400: Bogus");
    }

    #[test]
    fn test_unavailable_is_503() {
        let err = VulnscanError::Unavailable("AI provider not configured".into());
        assert_eq!(err.classify().status, 503);
    }

    #[test]
    fn test_database_error_is_500() {
        let err = VulnscanError::Database("disk full".into());
        assert_eq!(err.classify().error_type, "DatabaseError");
        assert_eq!(err.classify().status, 500);
    }
}
