pub mod analysis;
pub mod encoder;
pub mod gemini; // Gemini structured-generation client
pub mod preview;

pub use analysis::{AnalysisError, AnalysisService};
pub use encoder::{encode_image, EncodedImage};
pub use gemini::GeminiClient;
pub use preview::PreviewStore;
