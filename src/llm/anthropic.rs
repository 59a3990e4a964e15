use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Serialize;

use super::LlmClient;

const API_VERSION: &str = "2023-06-01";

/// Length cap for the generated description, in tokens.
pub const MAX_TOKENS: u32 = 1024;

/// Minimal request structs for the Anthropic Messages API.
#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Anthropic-based implementation of LlmClient.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, api_base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to build HTTP client")?;

        Ok(AnthropicClient {
            client,
            api_key,
            model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        if self.api_base_url.ends_with("/v1") {
            format!("{}/messages", self.api_base_url)
        } else {
            format!("{}/v1/messages", self.api_base_url)
        }
    }

    fn request_body<'a>(&'a self, directive: &'a str) -> MessageRequest<'a> {
        MessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: directive,
            }],
        }
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Generating description...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

impl LlmClient for AnthropicClient {
    fn create_message(&self, directive: &str) -> Result<String> {
        let url = self.messages_url();

        log::info!("Calling Anthropic model {:?}", &self.model);

        let spinner = spinner();
        let result = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(directive))
            .send()
            .and_then(|resp| {
                log::debug!("Anthropic responded with HTTP {}", resp.status().as_u16());
                resp.text()
            });
        spinner.finish_and_clear();

        result.context("failed to send request to Anthropic")
    }
}
