// Upstream generation capability: the only seam between the gateway and the hosted model.

pub mod gemini;

use std::fmt;

use async_trait::async_trait;

pub use gemini::{GeminiClient, GeminiClientParams};

/// One piece of a multi-part generation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub parts: Vec<ContentPart>,
}

impl UpstreamRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    /// Question first, image second.
    pub fn text_with_inline_data(
        text: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            parts: vec![
                ContentPart::Text(text.into()),
                ContentPart::InlineData {
                    mime_type: mime_type.into(),
                    data: data.into(),
                },
            ],
        }
    }

    pub fn inline_data_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::InlineData { .. }))
            .count()
    }
}

/// Outcome of a single upstream call, decided by the backend implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamResult {
    Success(String),
    Failure(UpstreamFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// The upstream refused or failed the call. `status` is the HTTP status when one was received.
    Rejected {
        status: Option<u16>,
        message: String,
    },
    /// The call succeeded but no text could be extracted from the result.
    MalformedResponse,
}

impl UpstreamFailure {
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        UpstreamFailure::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamFailure::Rejected {
                status: Some(status),
                message,
            } => write!(f, "upstream rejected the call with status {status}: {message}"),
            UpstreamFailure::Rejected {
                status: None,
                message,
            } => write!(f, "upstream call failed: {message}"),
            UpstreamFailure::MalformedResponse => {
                write!(f, "upstream returned no retrievable text")
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: UpstreamRequest) -> UpstreamResult;
}
