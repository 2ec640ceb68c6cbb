use thiserror::Error;

use crate::models::AnalysisResult;
use crate::services::encoder::EncodedImage;

/// Why a single analysis request failed. All variants are terminal for the
/// current request; nothing here is retried automatically. The Display
/// message is what the user sees next to the retry button.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("Could not prepare the image for upload: {0}")]
    Encoding(String),

    /// The upstream service declined to process the input. The stated
    /// reason is carried verbatim.
    #[error("The analysis request was blocked: {reason}")]
    Blocked { reason: String },

    /// The upstream response did not match the expected shape. Never
    /// papered over with defaults; the request fails whole.
    #[error("The analysis service returned an unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Could not reach the analysis service: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Transport(err.to_string())
    }
}

/// Seam for the structured-generation backend. One external call per
/// `analyze` invocation; no caching, no retry, no local reasoning over
/// the image.
#[async_trait::async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, AnalysisError>;
}
