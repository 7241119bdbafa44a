//! Error types for orgsift.
//!
//! Library crates use [`OrgsiftError`] via `thiserror`. Within a row's
//! pipeline, adapter failures degrade to empty results and never surface
//! here; the variants below cover the failures that do propagate.

/// Top-level error type for all orgsift operations.
#[derive(Debug, thiserror::Error)]
pub enum OrgsiftError {
    /// Configuration loading or validation error. Fatal before any row is
    /// processed (e.g., the dossier stage without a Perplexity key).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error calling a provider or data source.
    #[error("network error: {0}")]
    Network(String),

    /// An AI provider failed at the transport or API level.
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider returned non-JSON or schema-violating content under strict
    /// parsing.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Dossier retries exhausted; carries the last underlying failure.
    #[error("dossier failed after retries for {company}: {message}")]
    Dossier { company: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrgsiftError>;

impl OrgsiftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = OrgsiftError::config("PERPLEXITY_API_KEY is required for the dossier stage");
        assert_eq!(
            err.to_string(),
            "config error: PERPLEXITY_API_KEY is required for the dossier stage"
        );

        let err = OrgsiftError::Dossier {
            company: "Acme".into(),
            message: "HTTP 503".into(),
        };
        assert!(err.to_string().contains("Acme"));
        assert!(err.to_string().contains("HTTP 503"));
    }
}
