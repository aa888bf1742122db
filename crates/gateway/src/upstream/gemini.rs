use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{ContentPart, GenerationBackend, UpstreamFailure, UpstreamRequest, UpstreamResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";
const REDACTED: &str = "[REDACTED]";
const MAX_RAW_ERROR_CHARS: usize = 512;

pub struct GeminiClientParams {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// `GenerationBackend` backed by the Gemini `generateContent` REST endpoint.
///
/// The request carries no local timeout and is never retried; a failed call
/// is reported once as an `UpstreamFailure`.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(params: GeminiClientParams) -> Self {
        Self::with_http_client(reqwest::Client::new(), params)
    }

    fn with_http_client(http: reqwest::Client, params: GeminiClientParams) -> Self {
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            params.base_url.trim_end_matches('/'),
            params.model
        );
        Self {
            http,
            api_key: params.api_key,
            model: params.model,
            endpoint,
        }
    }

    fn scrub(&self, message: &str) -> String {
        if self.api_key.is_empty() {
            return message.to_string();
        }
        message.replace(&self.api_key, REDACTED)
    }

    fn rejected(&self, status: Option<u16>, message: &str) -> UpstreamResult {
        UpstreamResult::Failure(UpstreamFailure::rejected(status, self.scrub(message)))
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, request: UpstreamRequest) -> UpstreamResult {
        debug!(
            model = %self.model,
            parts = request.parts.len(),
            inline_data = request.inline_data_count(),
            "Calling generateContent"
        );

        let body = GenerateContentRequest::from(&request);
        let response = match self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return self.rejected(e.status().map(|s| s.as_u16()), &e.to_string()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return self.rejected(Some(status.as_u16()), &e.to_string()),
        };

        if !status.is_success() {
            debug!(status = status.as_u16(), "generateContent returned an error");
            trace!("  {}", self.scrub(&text));
            return self.rejected(Some(status.as_u16()), &describe_error_body(&text));
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "generateContent returned an unparseable body");
                return UpstreamResult::Failure(UpstreamFailure::MalformedResponse);
            }
        };

        match parsed.text() {
            Some(text) => UpstreamResult::Success(text),
            None => {
                if let Some(reason) = parsed.block_reason() {
                    warn!(block_reason = reason, "generateContent blocked the prompt");
                }
                UpstreamResult::Failure(UpstreamFailure::MalformedResponse)
            }
        }
    }
}

/// Turns a non-2xx body into a one-line message, `<STATUS>: <message>` when the
/// body is the usual `{error: {...}}` envelope and truncated raw text otherwise.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => match error.status {
            Some(status) => format!("{status}: {}", error.message),
            None => error.message,
        },
        Err(_) => body.chars().take(MAX_RAW_ERROR_CHARS).collect(),
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent<'a>>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> From<&'a UpstreamRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a UpstreamRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => WirePart::Text { text },
                ContentPart::InlineData { mime_type, data } => WirePart::InlineData {
                    inline_data: WireBlob { mime_type, data },
                },
            })
            .collect();

        Self {
            contents: vec![WireContent { role: "user", parts }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
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
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when there is nothing to return.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    status: Option<String>,
}

#[cfg(test)]
mod unit_test {
    use std::sync::Arc;

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    use super::*;

    const TEST_KEY: &str = "test-key-123";

    #[derive(Default)]
    struct Captured {
        path: Option<String>,
        api_key: Option<String>,
        body: Option<Value>,
    }

    type StubState = Arc<Mutex<Captured>>;

    async fn spawn_stub(status: StatusCode, reply: Value) -> (String, StubState) {
        let captured = StubState::default();
        let router = Router::new()
            .route(
                "/v1beta/models/{model_action}",
                post(
                    move |State(captured): State<StubState>,
                          Path(model_action): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let mut captured = captured.lock().await;
                            captured.path = Some(model_action);
                            captured.api_key = headers
                                .get(API_KEY_HEADER)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            captured.body = Some(body);
                            (status, Json(reply)).into_response()
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{addr}"), captured)
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(GeminiClientParams {
            api_key: TEST_KEY.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: base_url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_generate_text_success() {
        let (base_url, captured) = spawn_stub(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "2 + 2 "}, {"text": "= 4"}]}
                }]
            }),
        )
        .await;

        let result = client(&base_url)
            .generate(UpstreamRequest::text("2+2"))
            .await;

        assert_eq!(result, UpstreamResult::Success("2 + 2 = 4".to_string()));
        let captured = captured.lock().await;
        assert_eq!(
            captured.path.as_deref(),
            Some("gemini-1.5-flash:generateContent")
        );
        assert_eq!(captured.api_key.as_deref(), Some(TEST_KEY));
        let body = captured.body.as_ref().unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "2+2");
    }

    #[tokio::test]
    async fn test_generate_sends_inline_data_after_question() {
        let (base_url, captured) = spawn_stub(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "A cat."}]}}]}),
        )
        .await;

        let result = client(&base_url)
            .generate(UpstreamRequest::text_with_inline_data(
                "Describe this image in detail",
                "image/png",
                "iVBORw0KGgo=",
            ))
            .await;

        assert_eq!(result, UpstreamResult::Success("A cat.".to_string()));
        let captured = captured.lock().await;
        let parts = &captured.body.as_ref().unwrap()["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Describe this image in detail");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_quota_error_is_rejected_with_status() {
        let (base_url, _) = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            json!({
                "error": {
                    "code": 429,
                    "message": "You exceeded your current quota.",
                    "status": "RESOURCE_EXHAUSTED"
                }
            }),
        )
        .await;

        let result = client(&base_url)
            .generate(UpstreamRequest::text("hello"))
            .await;

        assert_eq!(
            result,
            UpstreamResult::Failure(UpstreamFailure::Rejected {
                status: Some(429),
                message: "RESOURCE_EXHAUSTED: You exceeded your current quota.".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_error_message_never_contains_api_key() {
        let (base_url, _) = spawn_stub(
            StatusCode::BAD_REQUEST,
            json!({
                "error": {
                    "code": 400,
                    "message": format!("API key not valid: {TEST_KEY}"),
                    "status": "INVALID_ARGUMENT"
                }
            }),
        )
        .await;

        let result = client(&base_url)
            .generate(UpstreamRequest::text("hello"))
            .await;

        match result {
            UpstreamResult::Failure(UpstreamFailure::Rejected { status, message }) => {
                assert_eq!(status, Some(400));
                assert!(!message.contains(TEST_KEY));
                assert!(message.contains(REDACTED));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_candidates_is_malformed() {
        let (base_url, _) = spawn_stub(
            StatusCode::OK,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        )
        .await;

        let result = client(&base_url)
            .generate(UpstreamRequest::text("hello"))
            .await;

        assert_eq!(
            result,
            UpstreamResult::Failure(UpstreamFailure::MalformedResponse)
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_rejected_without_status() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{addr}"))
            .generate(UpstreamRequest::text("hello"))
            .await;

        assert!(matches!(
            result,
            UpstreamResult::Failure(UpstreamFailure::Rejected { status: None, .. })
        ));
    }

    #[test]
    fn test_describe_error_body_falls_back_to_raw_text() {
        let raw = "x".repeat(MAX_RAW_ERROR_CHARS + 100);
        assert_eq!(describe_error_body(&raw).len(), MAX_RAW_ERROR_CHARS);
        assert_eq!(
            describe_error_body(r#"{"error": {"message": "boom"}}"#),
            "boom"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", client("http://localhost"));
        assert!(!rendered.contains(TEST_KEY));
    }
}
