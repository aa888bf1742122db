use std::fmt::Debug;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

pub const GATEWAY_TAG: &str = "gateway";
pub const HEALTH_TAG: &str = "health";

/// Handler return type: serializes `Ok` as a 200 JSON body and defers to the
/// error's own `IntoResponse` otherwise.
pub struct JsonResponse<T: Serialize, E: Serialize>(Result<T, E>);

impl<T: Serialize, E: Serialize + IntoResponse> JsonResponse<T, E> {
    pub fn new_error(error: E) -> Self {
        Self(Err(error))
    }

    pub fn new_ok(value: T) -> Self {
        Self(Ok(value))
    }
}

impl<T: Serialize, E: Serialize + IntoResponse + Debug> IntoResponse for JsonResponse<T, E> {
    fn into_response(self) -> Response {
        match self.0 {
            Ok(value) => (StatusCode::OK, Json(value)).into_response(),
            Err(error) => {
                let description = format!("{error:?}");
                let response = error.into_response();

                if response.status().is_server_error() {
                    error!(status = %response.status(), "Error: {}", description);
                } else {
                    debug!(status = %response.status(), "Rejected request: {}", description);
                }

                response
            }
        }
    }
}

impl<T: Serialize, E: Serialize + IntoResponse> From<Result<T, E>> for JsonResponse<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => JsonResponse::new_ok(value),
            Err(error) => JsonResponse::new_error(error),
        }
    }
}

#[cfg(test)]
mod unit_test {
    use super::*;
    use crate::error::GatewayError;

    #[derive(Serialize)]
    struct Answer {
        text: String,
    }

    #[tokio::test]
    async fn test_ok_is_200_json() {
        let response: JsonResponse<Answer, GatewayError> = Ok(Answer {
            text: "4".to_string(),
        })
        .into();
        let response = response.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["text"], "4");
    }

    #[tokio::test]
    async fn test_error_uses_error_status() {
        let response: JsonResponse<Answer, GatewayError> =
            Err(GatewayError::UpstreamAuth { details: None }).into();

        assert_eq!(response.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
