pub mod anthropic;
pub mod prompt_builder;
mod prompts;
pub mod response;

use anyhow::{Result, anyhow};
use serde_json::json;

use crate::config::Settings;
use anthropic::AnthropicClient;

/// Trait for talking to an LLM (real or dummy).
pub trait LlmClient {
    /// Send the directive as a single user message and return the raw
    /// response body, unparsed.
    fn create_message(&self, directive: &str) -> Result<String>;
}

/// No-op / dummy model client for development with --no-model.
pub struct NoopClient;

impl LlmClient for NoopClient {
    fn create_message(&self, directive: &str) -> Result<String> {
        let text = format!(
            "## Summary Dummy description for testing (model calls disabled). \
             ## Changes - Directive was {} characters long. - No request was sent.",
            directive.chars().count()
        );
        let body = json!({
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
        });
        Ok(body.to_string())
    }
}

/// Build the LLM client based on CLI + config.
pub fn build_client(settings: &Settings, no_model: bool) -> Result<Box<dyn LlmClient>> {
    if no_model {
        log::debug!("Using NoopClient (no model calls).");
        return Ok(Box::new(NoopClient));
    }

    let key = settings.api_key.clone().ok_or_else(|| {
        anyhow!(
            "no API key found; run `mrbot setup`, set ANTHROPIC_API_KEY, or pass --api-key ({} is missing)",
            settings.paths.credentials_file.display()
        )
    })?;

    log::debug!("Using AnthropicClient with model: {}", settings.model);

    Ok(Box::new(AnthropicClient::new(
        key,
        settings.model.clone(),
        settings.api_url.clone(),
    )?))
}
