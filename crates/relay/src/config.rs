use std::fmt;

use anyhow::{Context, bail};
use clap::Args;
use gateway::upstream::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use http::HeaderValue;

/// Large enough for base64 encoded phone photos.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Clone, Args)]
pub struct ServeParams {
    /// Credential for the upstream generation API
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Upstream model name
    #[arg(long, env = "RELAY_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub model: String,
    #[arg(long, env = "RELAY_UPSTREAM_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub upstream_base_url: String,
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Comma separated list of trusted front-end origins, `*` allows any origin
    #[arg(
        long,
        env = "RELAY_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, in bytes
    #[arg(long, env = "RELAY_BODY_LIMIT_BYTES", default_value_t = DEFAULT_BODY_LIMIT_BYTES)]
    pub body_limit_bytes: usize,
    /// Leave the `details` field out of error responses
    #[arg(long, env = "RELAY_HIDE_ERROR_DETAILS")]
    pub hide_error_details: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl AllowedOrigins {
    pub fn parse(values: &[String]) -> Result<Self, anyhow::Error> {
        let origins: Vec<&str> = values
            .iter()
            .map(|v| v.trim().trim_end_matches('/'))
            .filter(|v| !v.is_empty())
            .collect();

        if origins.is_empty() {
            bail!("at least one allowed origin is required, use `*` to allow any origin");
        }
        if origins.contains(&"*") {
            return Ok(AllowedOrigins::Any);
        }

        let origins = origins
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid allowed origin: {origin:?}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AllowedOrigins::List(origins))
    }
}

/// Process configuration, built once at startup and passed down explicitly.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub model: String,
    pub upstream_base_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub body_limit_bytes: usize,
    pub expose_error_details: bool,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("expose_error_details", &self.expose_error_details)
            .finish()
    }
}

impl TryFrom<ServeParams> for RelayConfig {
    type Error = anyhow::Error;

    fn try_from(params: ServeParams) -> Result<Self, Self::Error> {
        let api_key = params.api_key.trim().to_string();
        if api_key.is_empty() {
            bail!("an upstream API key is required (set GOOGLE_API_KEY or pass --api-key)");
        }
        if params.model.trim().is_empty() {
            bail!("model name must not be empty");
        }
        if params.body_limit_bytes == 0 {
            bail!("body limit must be greater than zero");
        }

        Ok(Self {
            api_key,
            model: params.model.trim().to_string(),
            upstream_base_url: params.upstream_base_url,
            host: params.host,
            port: params.port,
            allowed_origins: AllowedOrigins::parse(&params.allowed_origins)?,
            body_limit_bytes: params.body_limit_bytes,
            expose_error_details: !params.hide_error_details,
        })
    }
}
