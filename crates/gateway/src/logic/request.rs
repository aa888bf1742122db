// Gateway request bodies and their validation
use serde::{Deserialize, Serialize};
use shared::error::GatewayError;
use utoipa::ToSchema;

pub const PROMPT_REQUIRED_MESSAGE: &str = "Prompt is required";
pub const IMAGE_REQUIRED_MESSAGE: &str = "Image data is required";
pub const DEFAULT_IMAGE_QUESTION: &str = "Describe this image in detail";

/// A prior turn of the conversation, supplied by the caller on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversationTurn {
    #[schema(example = "user")]
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    #[schema(required = true, example = "2+2")]
    pub prompt: Option<String>,
    /// Oldest turn first.
    #[serde(default)]
    pub conversation_history: Option<Vec<ConversationTurn>>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            conversation_history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.conversation_history = Some(history);
        self
    }

    /// Absent, empty and whitespace-only prompts are all rejected.
    pub fn validated_prompt(&self) -> Result<&str, GatewayError> {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
            _ => Err(GatewayError::validation(PROMPT_REQUIRED_MESSAGE)),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.conversation_history.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImageAnalysisRequest {
    /// `data:<mime-type>;base64,<payload>`
    #[serde(default)]
    #[schema(required = true)]
    pub image: Option<String>,
    #[serde(default)]
    #[schema(example = "What is in this picture?")]
    pub question: Option<String>,
}

impl ImageAnalysisRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            question: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn validated_image(&self) -> Result<&str, GatewayError> {
        match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => Ok(image),
            _ => Err(GatewayError::validation(IMAGE_REQUIRED_MESSAGE)),
        }
    }

    pub fn question_or_default(&self) -> &str {
        match self.question.as_deref() {
            Some(question) if !question.trim().is_empty() => question,
            _ => DEFAULT_IMAGE_QUESTION,
        }
    }
}

#[cfg(test)]
mod unit_test {
    use super::*;

    #[test]
    fn test_prompt_validation() {
        assert_eq!(
            GenerationRequest::new("2+2").validated_prompt().unwrap(),
            "2+2"
        );

        for request in [
            GenerationRequest::default(),
            GenerationRequest::new(""),
            GenerationRequest::new("  \n\t"),
        ] {
            let err = request.validated_prompt().unwrap_err();
            assert_eq!(err.category(), "ValidationError");
            assert_eq!(err.to_string(), PROMPT_REQUIRED_MESSAGE);
        }
    }

    #[test]
    fn test_generation_request_wire_format() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"prompt": "how are you?", "conversationHistory": [{"role": "user", "content": "hi"}]}"#,
        )
        .unwrap();
        assert_eq!(request.prompt.as_deref(), Some("how are you?"));
        assert_eq!(
            request.history(),
            &[ConversationTurn {
                role: "user".to_string(),
                content: "hi".to_string()
            }]
        );

        let empty: GenerationRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.prompt.is_none());
        assert!(empty.history().is_empty());
    }

    #[test]
    fn test_image_validation_and_default_question() {
        let err = ImageAnalysisRequest::default()
            .validated_image()
            .unwrap_err();
        assert_eq!(err.to_string(), IMAGE_REQUIRED_MESSAGE);

        let request = ImageAnalysisRequest::new("data:image/png;base64,AAAA");
        assert_eq!(request.question_or_default(), DEFAULT_IMAGE_QUESTION);
        assert_eq!(
            request.with_question("What colour is it?").question_or_default(),
            "What colour is it?"
        );
    }
}
