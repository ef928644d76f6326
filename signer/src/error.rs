use thiserror::Error;

/// Every way a signing run can fail. All of them abort the run.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("signing key error: {0}")]
    Key(String),

    #[error("state file error: {0}")]
    Io(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// The authority's block does not carry a valid signature from the
    /// authority's verifying key. This is a trust breach, not a transport hiccup.
    #[error("verification failure: {0}")]
    VerificationFailure(String),

    #[error("publish error: {0}")]
    Publish(String),
}

impl SignerError {
    pub fn key(context: &str, err: impl std::fmt::Display) -> Self {
        SignerError::Key(format!("{context}: {err}"))
    }

    pub fn io(context: &str, err: impl std::fmt::Display) -> Self {
        SignerError::Io(format!("{context}: {err}"))
    }

    pub fn protocol(context: &str, err: impl std::fmt::Display) -> Self {
        SignerError::Protocol(format!("{context}: {err}"))
    }
}

impl From<reqwest::Error> for SignerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SignerError::Protocol(format!("failed to decode response: {err}"))
        } else {
            SignerError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_keep_context() {
        let err = SignerError::key("Failed to parse signing key", "odd length");
        assert_eq!(
            err.to_string(),
            "signing key error: Failed to parse signing key: odd length"
        );

        let err = SignerError::VerificationFailure("bad seal".to_string());
        assert_eq!(err.to_string(), "verification failure: bad seal");
    }
}
