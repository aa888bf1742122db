// Gateway response bodies
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Text produced by the upstream capability. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextResponse {
    #[schema(example = "4")]
    pub generated_text: String,
}

impl From<GenerationResult> for GenerateTextResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            generated_text: result.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeImageResponse {
    pub analysis: String,
}

impl From<GenerationResult> for AnalyzeImageResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            analysis: result.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    /// RFC 3339 time at which the check ran.
    pub timestamp: String,
    /// Seconds since the gateway started.
    pub uptime: f64,
}
