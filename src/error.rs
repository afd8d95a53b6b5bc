use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailcowError {
    /// Malformed invocation; raised before any API call is made.
    #[error("{0}")]
    Usage(String),

    #[error("Connection error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl MailcowError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// True when the request never produced an interpretable API reply.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_transport_failures() {
        let err = MailcowError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "HTTP error 502: bad gateway");
    }

    #[test]
    fn usage_errors_are_not_transport_failures() {
        let err = MailcowError::usage("No updates specified");
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "No updates specified");
    }
}
