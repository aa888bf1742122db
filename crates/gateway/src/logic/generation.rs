use std::time::Instant;

use shared::error::GatewayError;
use tracing::{debug, trace};

use super::classify::{GENERATION_FAILED_MESSAGE, classify_upstream_failure};
use super::data_url::{INVALID_IMAGE_FORMAT_MESSAGE, parse_data_url};
use super::history::linearize_history;
use super::request::{GenerationRequest, ImageAnalysisRequest};
use super::response::{GenerationResult, HealthStatus};
use crate::upstream::{GenerationBackend, UpstreamRequest, UpstreamResult};

pub const HEALTHY_STATUS: &str = "ok";

/// Validates the prompt, folds in any history and forwards a single text part.
pub async fn generate_text(
    backend: &dyn GenerationBackend,
    request: GenerationRequest,
) -> Result<GenerationResult, GatewayError> {
    let prompt = request.validated_prompt()?;
    let context = linearize_history(request.history(), prompt);

    debug!(
        history_turns = request.history().len(),
        context_chars = context.len(),
        "Forwarding text generation request"
    );
    let result = backend.generate(UpstreamRequest::text(context)).await;
    into_generation_result(result)
}

/// Validates and decomposes the data URL, then forwards the question and the image.
pub async fn analyze_image(
    backend: &dyn GenerationBackend,
    request: ImageAnalysisRequest,
) -> Result<GenerationResult, GatewayError> {
    let image = request.validated_image()?;
    let parsed = parse_data_url(image).map_err(|e| {
        debug!(error = %e, "Rejecting image");
        GatewayError::validation(INVALID_IMAGE_FORMAT_MESSAGE)
    })?;
    let question = request.question_or_default();

    debug!(
        mime_type = %parsed.mime_type,
        payload_chars = parsed.payload.len(),
        "Forwarding image analysis request"
    );
    let result = backend
        .generate(UpstreamRequest::text_with_inline_data(
            question,
            parsed.mime_type,
            parsed.payload,
        ))
        .await;
    into_generation_result(result)
}

pub fn health_check(started_at: Instant) -> HealthStatus {
    HealthStatus {
        status: HEALTHY_STATUS.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: started_at.elapsed().as_secs_f64(),
    }
}

fn into_generation_result(result: UpstreamResult) -> Result<GenerationResult, GatewayError> {
    match result {
        UpstreamResult::Success(text) if !text.trim().is_empty() => {
            trace!(chars = text.len(), "Upstream returned text");
            Ok(GenerationResult { text })
        }
        UpstreamResult::Success(_) => Err(GatewayError::upstream(
            GENERATION_FAILED_MESSAGE,
            Some("upstream returned empty text".to_string()),
        )),
        UpstreamResult::Failure(failure) => Err(classify_upstream_failure(&failure)),
    }
}
