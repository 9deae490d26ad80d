use thiserror::Error;

/// A single upstream model call that did not produce usable output.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model {model} returned {status}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    #[error("request to model {model} failed: {message}")]
    Transport { model: String, message: String },

    #[error("model {model} returned an unusable response: {message}")]
    Decode { model: String, message: String },
}

impl ProviderError {
    pub fn model(&self) -> &str {
        match self {
            ProviderError::Status { model, .. }
            | ProviderError::Transport { model, .. }
            | ProviderError::Decode { model, .. } => model,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroLimit,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("text too long (>{limit})")]
    TooLong { limit: usize },

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("no speech detected")]
    NoSpeechDetected,

    #[error("all {attempts} candidate models failed; last error: {last}")]
    AllModelsExhausted {
        attempts: usize,
        #[source]
        last: ProviderError,
    },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ChunkError> for PipelineError {
    fn from(err: ChunkError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// Why a PDF produced no text. `Unreadable` is the upload's fault,
/// `Unavailable` is the host's.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Unreadable(String),

    #[error("pdf extraction unavailable: {0}")]
    Unavailable(String),
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Unreadable(message) => PipelineError::ExtractionFailed(message),
            unavailable @ ExtractError::Unavailable(_) => {
                PipelineError::Config(unavailable.to_string())
            }
        }
    }
}

/// Failure to append to the translation log. Never surfaced to callers.
#[derive(Debug, Error)]
#[error("failed to persist translation record: {0}")]
pub struct PersistenceError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_message_names_last_failure() {
        let err = PipelineError::AllModelsExhausted {
            attempts: 3,
            last: ProviderError::Status {
                model: "C".to_string(),
                status: 503,
                body: "loading".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "all 3 candidate models failed; last error: model C returned 503: loading"
        );
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("model C"));
    }

    #[test]
    fn zero_chunk_limit_maps_to_config_error() {
        let err: PipelineError = ChunkError::ZeroLimit.into();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn extraction_errors_split_by_fault() {
        let unreadable: PipelineError = ExtractError::Unreadable("not a pdf".to_string()).into();
        assert!(matches!(unreadable, PipelineError::ExtractionFailed(ref m) if m == "not a pdf"));

        let unavailable: PipelineError =
            ExtractError::Unavailable("pdftotext missing".to_string()).into();
        assert!(matches!(unavailable, PipelineError::Config(_)));
        assert!(unavailable.to_string().contains("pdftotext missing"));
    }
}
