//! API request building.
//!
//! Constructs the chat-completions request body from the transcript and the
//! configured/override parameters, and extracts fields from non-streaming
//! responses.

use crate::config::ProviderConfig;
use crate::transcript::Transcript;
use serde_json::{Value, json};

/// Per-call options recognized by the adapter.
///
/// Anything left unset falls back to the [`ProviderConfig`] value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// Override the configured model id.
    pub model: Option<String>,
    /// JSON-mode response format hint (e.g. "json_object").
    pub response_format: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_response_format(mut self, hint: impl Into<String>) -> Self {
        self.response_format = Some(hint.into());
        self
    }

    /// Model id effective for this call.
    pub fn resolved_model<'a>(&'a self, config: &'a ProviderConfig) -> &'a str {
        self.model.as_deref().unwrap_or(&config.model)
    }
}

/// Build the chat-completions request body.
pub fn build_request_body(
    config: &ProviderConfig,
    options: &SendOptions,
    transcript: &Transcript,
    stream: bool,
) -> Value {
    let messages: Vec<Value> = transcript
        .messages()
        .iter()
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();

    let mut body = json!({
        "model": options.resolved_model(config),
        "messages": messages,
        "stream": stream,
    });

    if let Some(hint) = options
        .response_format
        .as_deref()
        .or(config.response_format.as_deref())
    {
        body["response_format"] = json!({ "type": hint });
    }

    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }

    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    body
}

/// Safely extract content from a response's first choice.
/// Returns None if the response is malformed or empty.
pub fn extract_choice_content(json: &Value) -> Option<&str> {
    json.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Extract the first choice's finish reason, if present.
pub fn extract_finish_reason(json: &Value) -> Option<&str> {
    json.get("choices")?.get(0)?.get("finish_reason")?.as_str()
}
