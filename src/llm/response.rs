use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// `"type":"message"` with any whitespace around the colon.
static MESSAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""type"\s*:\s*"message""#).expect("valid message marker regex"));

/// Outcome of reading a raw Messages API response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// Text of the first content block.
    Text(String),
    /// Looked like a message but could not be read; carries the reason.
    Malformed(String),
    /// Not a message at all (API error, proxy page, empty body).
    Rejected,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(rename = "type")]
    kind: String,
    content: Option<Vec<ContentBlock>>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

pub fn parse(raw: &str) -> Generation {
    let message = match serde_json::from_str::<MessageResponse>(raw) {
        Ok(message) => message,
        Err(err) if MESSAGE_MARKER.is_match(raw) => {
            return Generation::Malformed(format!("invalid JSON: {err}"));
        }
        Err(_) => return Generation::Rejected,
    };

    if message.kind != "message" {
        return Generation::Rejected;
    }

    let Some(content) = message.content else {
        return Generation::Malformed("response has no `content` field".into());
    };

    match content.into_iter().next() {
        Some(ContentBlock { text: Some(text) }) => Generation::Text(text),
        Some(ContentBlock { text: None }) => {
            Generation::Malformed("first content block has no `text` field".into())
        }
        None => Generation::Malformed("response `content` is empty".into()),
    }
}
