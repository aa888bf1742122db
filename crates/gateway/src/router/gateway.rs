// Prompt relay routes
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRequest, State};
use shared::{
    adapters::openapi::{GATEWAY_TAG, HEALTH_TAG, JsonResponse},
    error::{ErrorResponse, GatewayError},
};
use tracing::trace;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{Info, OpenApi};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::logic::{
    AnalyzeImageResponse, GenerateTextResponse, GenerationRequest, HealthStatus,
    ImageAnalysisRequest, analyze_image, generate_text, health_check,
};
use crate::upstream::GenerationBackend;

/// JSON body extractor whose rejections are reported as `ValidationError` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(GatewayError))]
pub struct GatewayJson<T>(pub T);

/// Immutable per-process state shared by every request.
pub struct GatewayService {
    backend: Arc<dyn GenerationBackend>,
    started_at: Instant,
    expose_error_details: bool,
}

impl GatewayService {
    pub fn new(backend: Arc<dyn GenerationBackend>, expose_error_details: bool) -> Self {
        Self {
            backend,
            started_at: Instant::now(),
            expose_error_details,
        }
    }

    fn present<T>(&self, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
        if self.expose_error_details {
            result
        } else {
            result.map_err(GatewayError::without_details)
        }
    }
}

pub fn create_router() -> OpenApiRouter<Arc<GatewayService>> {
    OpenApiRouter::new()
        .routes(routes!(route_health))
        .routes(routes!(route_generate))
        .routes(routes!(route_analyze_image))
}

#[utoipa::path(
    get,
    path = "/health",
    tags = [HEALTH_TAG],
    responses(
        (status = 200, description = "Gateway process is alive", body = HealthStatus),
    ),
    summary = "Health check",
    description = "Report liveness, current time and uptime without calling the upstream",
    operation_id = "health-check",
)]
async fn route_health(
    State(ctx): State<Arc<GatewayService>>,
) -> JsonResponse<HealthStatus, GatewayError> {
    JsonResponse::new_ok(health_check(ctx.started_at))
}

#[utoipa::path(
    post,
    path = "/generate",
    tags = [GATEWAY_TAG],
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Generated text", body = GenerateTextResponse),
        (status = 400, description = "Missing prompt or malformed body", body = ErrorResponse),
        (status = 401, description = "Upstream rejected the credential", body = ErrorResponse),
        (status = 429, description = "Upstream quota exhausted", body = ErrorResponse),
        (status = 500, description = "Upstream or server failure", body = ErrorResponse),
    ),
    summary = "Generate text",
    description = "Forward a prompt, with optional conversation history, to the generation model",
    operation_id = "generate-text",
)]
async fn route_generate(
    State(ctx): State<Arc<GatewayService>>,
    GatewayJson(request): GatewayJson<GenerationRequest>,
) -> JsonResponse<GenerateTextResponse, GatewayError> {
    trace!("Generating text");
    let result = generate_text(ctx.backend.as_ref(), request)
        .await
        .map(GenerateTextResponse::from);
    trace!(success = result.is_ok(), "Generating text completed");
    JsonResponse::from(ctx.present(result))
}

#[utoipa::path(
    post,
    path = "/analyze-image",
    tags = [GATEWAY_TAG],
    request_body = ImageAnalysisRequest,
    responses(
        (status = 200, description = "Image analysis", body = AnalyzeImageResponse),
        (status = 400, description = "Missing or malformed image", body = ErrorResponse),
        (status = 401, description = "Upstream rejected the credential", body = ErrorResponse),
        (status = 429, description = "Upstream quota exhausted", body = ErrorResponse),
        (status = 500, description = "Upstream or server failure", body = ErrorResponse),
    ),
    summary = "Analyze image",
    description = "Forward a data URL image and a question to the vision-capable model",
    operation_id = "analyze-image",
)]
async fn route_analyze_image(
    State(ctx): State<Arc<GatewayService>>,
    GatewayJson(request): GatewayJson<ImageAnalysisRequest>,
) -> JsonResponse<AnalyzeImageResponse, GatewayError> {
    trace!("Analyzing image");
    let result = analyze_image(ctx.backend.as_ref(), request)
        .await
        .map(AnalyzeImageResponse::from);
    trace!(success = result.is_ok(), "Analyzing image completed");
    JsonResponse::from(ctx.present(result))
}

pub fn generate_openapi_spec() -> OpenApi {
    let (_, mut spec) = create_router().split_for_parts();

    let mut info = Info::new("prompt-relay", env!("CARGO_PKG_VERSION"));
    info.description =
        Some("Relays text and image prompts to a hosted generative model".to_string());
    spec.info = info;

    spec.tags = Some(vec![
        TagBuilder::new()
            .name(GATEWAY_TAG)
            .description(Some("Text generation and image analysis endpoints"))
            .build(),
        TagBuilder::new()
            .name(HEALTH_TAG)
            .description(Some("Liveness endpoint"))
            .build(),
    ]);

    spec
}
