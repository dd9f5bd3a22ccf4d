//! Chat completion send paths.
//!
//! [`ChatClient`] owns no state beyond its configuration and HTTP client.
//! `send_once` is the single request/response path; `send_stream` opens the
//! chunk sequence and drives the accumulator. Neither retries: every
//! failure is surfaced once.

use crate::api::request::{
    SendOptions, build_request_body, extract_choice_content, extract_finish_reason,
};
use crate::api::sink::ResponseSink;
use crate::api::sse::SseDecoder;
use crate::config::ProviderConfig;
use crate::error::{Error, ProviderError};
use crate::stream::{FinalResponse, FinishReason, StreamChunk, UsageEstimate, accumulate};
use crate::transcript::Transcript;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Decoded chunk sequence from an open streaming request.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>;

/// Provider client adapter.
///
/// Polymorphic over provider identity through [`ProviderConfig::kind`];
/// variants differ only in endpoint/auth shape, never in this contract.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ChatClient {
    /// Build a client for an explicit configuration.
    ///
    /// Fails with a configuration error before any request is attempted
    /// when the configuration is unusable.
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// POST a request body, mapping non-success statuses to provider errors.
    async fn post(&self, body: Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .http
            .post(self.config.endpoint())
            .header(AUTHORIZATION, self.config.auth_header())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::from_http_status(status.as_u16(), &body));
        }
        Ok(response)
    }

    /// Single request/response, no incremental state.
    ///
    /// The transcript is not mutated; the caller appends the assistant
    /// message once the full response is available. Errors propagate
    /// directly; no partial message is ever produced.
    pub async fn send_once(
        &self,
        transcript: &Transcript,
        options: &SendOptions,
    ) -> Result<FinalResponse, Error> {
        let body = build_request_body(&self.config, options, transcript, false);
        log::debug!(
            "send_once: provider={} model={}",
            self.config.kind,
            options.resolved_model(&self.config)
        );

        let response = self.post(body).await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("invalid response JSON: {}", e)))?;

        let content = extract_choice_content(&json).ok_or_else(|| {
            ProviderError::Parse("response missing choices[0].message.content".to_string())
        })?;

        let usage = UsageEstimate::from_chars(transcript.content_chars(), content.chars().count());
        Ok(FinalResponse {
            id: json
                .get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("kaiwa-{}", Uuid::new_v4())),
            model: json
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or(options.resolved_model(&self.config))
                .to_string(),
            content: content.to_string(),
            finish_reason: extract_finish_reason(&json)
                .map(FinishReason::from_provider)
                .unwrap_or(FinishReason::Stop),
            created: json
                .get("created")
                .and_then(Value::as_i64)
                .unwrap_or_else(|| Utc::now().timestamp()),
            usage,
        })
    }

    /// Open a streaming request and return the decoded chunk sequence.
    ///
    /// Failures before the first chunk surface here; failures mid-sequence
    /// surface as stream items.
    pub async fn open_stream(
        &self,
        transcript: &Transcript,
        options: &SendOptions,
    ) -> Result<ChunkStream, Error> {
        let body = build_request_body(&self.config, options, transcript, true);
        log::debug!(
            "open_stream: provider={} model={}",
            self.config.kind,
            options.resolved_model(&self.config)
        );

        let response = self.post(body).await?;
        let mut decoder = SseDecoder::new();
        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(ProviderError::from))
            .flat_map(move |result| {
                let items: Vec<Result<StreamChunk, ProviderError>> = match result {
                    Ok(bytes) => match decoder.feed(&bytes) {
                        Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Err(e) => vec![Err(e)],
                };
                futures_util::stream::iter(items)
            });
        Ok(Box::pin(stream))
    }

    /// Streaming send: appends the in-flight assistant message to the
    /// transcript, drives the accumulator, and publishes each fold step to
    /// `sink`.
    ///
    /// Returns `Ok(None)` when `cancel` fires; the transcript keeps exactly
    /// what was accumulated up to that point.
    pub async fn send_stream<S: ResponseSink>(
        &self,
        transcript: &mut Transcript,
        options: &SendOptions,
        cancel: &CancellationToken,
        sink: &mut S,
    ) -> Result<Option<FinalResponse>, Error> {
        let chunks = self.open_stream(transcript, options).await?;
        let model = options.resolved_model(&self.config).to_string();
        accumulate(chunks, transcript, &model, cancel, sink).await
    }
}
