use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct OpenapiParams {
    /// Write the document to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_openapi(params: OpenapiParams) -> Result<(), anyhow::Error> {
    let document = render_openapi_document()?;

    match params.output {
        Some(path) => {
            std::fs::write(&path, document)
                .with_context(|| format!("Failed to write OpenAPI document to {}", path.display()))?;
            info!("Wrote OpenAPI document to {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

fn render_openapi_document() -> Result<String, anyhow::Error> {
    gateway::generate_openapi_spec()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")
}

#[cfg(test)]
mod unit_test {
    use super::*;

    #[test]
    fn test_document_is_json_with_routes() {
        let document: serde_json::Value =
            serde_json::from_str(&render_openapi_document().unwrap()).unwrap();
        assert!(document["paths"]["/generate"]["post"].is_object());
        assert!(document["paths"]["/analyze-image"]["post"].is_object());
        assert!(document["paths"]["/health"]["get"].is_object());
    }
}
