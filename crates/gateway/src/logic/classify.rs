use shared::error::GatewayError;

use crate::upstream::UpstreamFailure;

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate content";

const AUTH_MARKERS: [&str; 4] = ["api key", "api_key", "unauthenticated", "permission_denied"];
const QUOTA_MARKERS: [&str; 4] = [
    "quota",
    "rate limit",
    "resource_exhausted",
    "too many requests",
];

/// Maps an upstream failure onto the gateway taxonomy.
///
/// An HTTP status of 401/403 or 429 decides on its own. Without one, the
/// failure message is searched case-insensitively for known credential and
/// quota markers. Anything else is a plain `UpstreamError`.
pub fn classify_upstream_failure(failure: &UpstreamFailure) -> GatewayError {
    let (status, message) = match failure {
        UpstreamFailure::MalformedResponse => {
            return GatewayError::upstream(GENERATION_FAILED_MESSAGE, Some(failure.to_string()));
        }
        UpstreamFailure::Rejected { status, message } => (*status, message),
    };
    let details = Some(message.clone());

    match status {
        Some(401 | 403) => return GatewayError::UpstreamAuth { details },
        Some(429) => return GatewayError::UpstreamQuota { details },
        _ => {}
    }

    let lowered = message.to_lowercase();
    if AUTH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        GatewayError::UpstreamAuth { details }
    } else if QUOTA_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        GatewayError::UpstreamQuota { details }
    } else {
        GatewayError::upstream(GENERATION_FAILED_MESSAGE, details)
    }
}
