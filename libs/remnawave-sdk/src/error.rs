use thiserror::Error;

/// SDK-specific errors.
#[derive(Debug, Error)]
pub enum RemnawaveError {
    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Panel answered with a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Panel answered 2xx but the body did not match the expected shape
    #[error("Failed to decode panel response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemnawaveError {
    /// Returns true if the panel reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemnawaveError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected_only_for_404() {
        let missing = RemnawaveError::Api {
            status: 404,
            message: "User not found".into(),
        };
        let conflict = RemnawaveError::Api {
            status: 409,
            message: "Username already exists".into(),
        };

        assert!(missing.is_not_found());
        assert!(!conflict.is_not_found());
        assert!(!RemnawaveError::Config("x".into()).is_not_found());
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = RemnawaveError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }
}
