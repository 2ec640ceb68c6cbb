use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::AnalysisResult;
use crate::services::analysis::{AnalysisError, AnalysisService};
use crate::services::encoder::EncodedImage;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Finish reasons that mean the model refused the input rather than
/// completing it.
const BLOCKING_FINISH_REASONS: [&str; 3] = ["SAFETY", "PROHIBITED_CONTENT", "RECITATION"];

/// The fixed instruction sent with every image. All judgment lives
/// upstream; this client only encodes the request and classifies the
/// response.
const ANALYSIS_PROMPT: &str = "\
You are an expert chef and nutritionist. Look at this image.\n\
\n\
If it does not show food or drink, set isFood to false, set dishName to \
\"Not a food item\", and leave every other field empty.\n\
\n\
If it shows food or drink:\n\
1. Identify the dish and set dishName to your best guess.\n\
2. Provide a practical recipe: an ordered ingredients list and ordered \
preparation steps.\n\
3. Estimate the nutrition for the portion shown, as short human-readable \
strings (for example \"350 kcal\", \"8g\").\n\
4. Suggest one healthier variation of the dish in healthierVariation.\n\
5. Only if the dish is notably dense in calories, fat or sugar, add a \
short, kind note in friendlyAdvice. Omit the field otherwise.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
    block_reason_message: Option<String>,
}

/// Client for the Gemini structured-generation endpoint. Holds no state
/// beyond credentials and the shared connection pool.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// The JSON shape the service is constrained to return. Field names
    /// and nesting mirror `AnalysisResult`; `friendlyAdvice` is the one
    /// optional field.
    fn response_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "isFood": { "type": "BOOLEAN" },
                "dishName": { "type": "STRING" },
                "recipe": {
                    "type": "OBJECT",
                    "properties": {
                        "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "steps": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["ingredients", "steps"]
                },
                "nutrition": {
                    "type": "OBJECT",
                    "properties": {
                        "calories": { "type": "STRING" },
                        "protein": { "type": "STRING" },
                        "carbs": { "type": "STRING" },
                        "fat": { "type": "STRING" }
                    },
                    "required": ["calories", "protein", "carbs", "fat"]
                },
                "healthierVariation": { "type": "STRING" },
                "friendlyAdvice": { "type": "STRING" }
            },
            "required": ["isFood", "dishName", "recipe", "nutrition", "healthierVariation"]
        })
    }

    fn build_request(&self, image: &EncodedImage) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Self::response_schema(),
            },
        }
    }

    /// Map a raw upstream body to a typed result or a classified failure.
    /// Rejection-with-reason beats any candidate content; a parse failure
    /// is never silently defaulted.
    fn classify_response(body: &str) -> Result<AnalysisResult, AnalysisError> {
        let response: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        if let Some(feedback) = &response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                let reason = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| reason.clone());
                return Err(AnalysisError::Blocked { reason });
            }
        }

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            AnalysisError::MalformedResponse("response contained no candidates".to_string())
        })?;

        if let Some(finish_reason) = &candidate.finish_reason {
            if BLOCKING_FINISH_REASONS.contains(&finish_reason.as_str()) {
                return Err(AnalysisError::Blocked {
                    reason: finish_reason.clone(),
                });
            }
        }

        let text = candidate
            .content
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| {
                AnalysisError::MalformedResponse("candidate carried no text part".to_string())
            })?;

        serde_json::from_str(text.trim())
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AnalysisService for GeminiClient {
    async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, AnalysisError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = self.build_request(image);

        log::info!("🤖 Sending analysis request to model: {}", self.model);
        log::debug!(
            "📤 Request payload: {} image chars as {}",
            image.data.len(),
            image.mime_type
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Analysis service response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            log::error!("❌ Analysis service error ({}): {}", status, body);
            return Err(AnalysisError::Transport(format!(
                "analysis service returned {}",
                status
            )));
        }

        let result = Self::classify_response(&body)?;
        log::info!(
            "💬 Analysis complete: dish '{}' (food: {})",
            result.dish_name,
            result.is_food
        );
        Ok(result)
    }
}
