//! Error types for the Inquiry service.
//!
//! One unified error enum covers every failure category in the workspace.
//! The variants mirror the stages of the query pipeline so that the lifecycle
//! boundary can tell a configuration problem from a retrieval or generation
//! fault when it turns an error into a degraded response.

use thiserror::Error;

/// Unified error type for the Inquiry workspace.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic in library code; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing credentials, missing corpus, or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunking, index build, or provider construction failed
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Query embedding or vector search failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generative model call failed during answer synthesis
    #[error("Generation error: {0}")]
    Generation(String),

    /// Raw fault reported by an embedding or generative provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Stable, lowercase name of the error category, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration",
            AppError::Initialization(_) => "initialization",
            AppError::Retrieval(_) => "retrieval",
            AppError::Generation(_) => "generation",
            AppError::Provider(_) => "provider",
            AppError::Prompt(_) => "prompt",
            AppError::Io(_) => "io",
            AppError::Serialization(_) => "serialization",
            AppError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = AppError::Retrieval("query is empty".to_string());
        assert_eq!(err.to_string(), "Retrieval error: query is empty");
        assert_eq!(err.kind(), "retrieval");
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: a list").unwrap_err();
        let err: AppError = yaml_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
