use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const INVALID_IMAGE_FORMAT_MESSAGE: &str = "Invalid image data format";
/// Used when a data URL carries no usable `type/subtype`.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

static DATA_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:([^;,]*);base64,(.+)$").expect("data URL pattern is a valid regex")
});

static MIME_TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*$")
        .expect("mime type pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDataUrl {
    pub mime_type: String,
    /// The base64 text exactly as supplied.
    pub payload: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("value is not a base64 data URL")]
    NotADataUrl,
    #[error("data URL payload is not valid base64")]
    InvalidPayload,
}

/// Splits `data:<mime-type>;base64,<payload>` into its parts.
///
/// The payload must decode as standard base64 but is returned untouched. A
/// missing or malformed mime type falls back to [`FALLBACK_MIME_TYPE`].
pub fn parse_data_url(input: &str) -> Result<ParsedDataUrl, DataUrlError> {
    let captures = DATA_URL_PATTERN
        .captures(input)
        .ok_or(DataUrlError::NotADataUrl)?;

    let declared = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    let payload = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    if STANDARD.decode(payload).is_err() {
        return Err(DataUrlError::InvalidPayload);
    }

    let mime_type = if MIME_TYPE_PATTERN.is_match(declared) {
        declared.to_ascii_lowercase()
    } else {
        FALLBACK_MIME_TYPE.to_string()
    };

    Ok(ParsedDataUrl {
        mime_type,
        payload: payload.to_string(),
    })
}
