//! Streaming response accumulation.
//!
//! A [`StreamAccumulator`] folds provider chunks into the single in-flight
//! assistant message of a [`Transcript`], in arrival order, with no
//! trimming and no deduplication. [`accumulate`] drives an accumulator from
//! any chunk stream, publishing each fold step to a [`ResponseSink`] and
//! finalizing into a [`FinalResponse`] when the provider signals completion
//! or the sequence closes.

use crate::api::sink::{ResponseEvent, ResponseSink};
use crate::error::{Error, ProviderError};
use crate::transcript::Transcript;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Characters of text per estimated token.
const CHARS_PER_TOKEN: usize = 4;

/// Why the provider stopped producing content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map a provider-reported `finish_reason` string.
    pub fn from_provider(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(reason) => reason,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incremental unit of a streamed response.
///
/// Transient: folded into the accumulator and not retained. An empty or
/// absent `delta` is valid and a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Response id; the first non-empty id in a stream wins.
    pub id: Option<String>,
    /// Content fragment to append verbatim.
    pub delta: Option<String>,
    /// Termination signal; chunks after it are never folded.
    pub finish: Option<FinishReason>,
}

impl StreamChunk {
    pub fn delta(fragment: impl Into<String>) -> Self {
        Self {
            delta: Some(fragment.into()),
            ..Self::default()
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish: Some(reason),
            ..Self::default()
        }
    }
}

/// Character-count token approximation.
///
/// Computed from character counts divided by four, not from provider
/// accounting. Close enough for display, never billing-accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEstimate {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl UsageEstimate {
    /// Estimate from prompt and completion character counts.
    pub fn from_chars(prompt_chars: usize, completion_chars: usize) -> Self {
        let prompt_tokens = prompt_chars / CHARS_PER_TOKEN;
        let completion_tokens = completion_chars / CHARS_PER_TOKEN;
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A completed response record. Derived once per completed stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: FinishReason,
    /// Unix timestamp (seconds) at finalization.
    pub created: i64,
    pub usage: UsageEstimate,
}

/// Outcome of folding one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldStep {
    /// Keep consuming chunks.
    Continue,
    /// The finish indicator was seen; stop consuming and finalize.
    Finished,
}

/// Folds a chunk sequence into the transcript's in-flight assistant message.
///
/// Construction appends the empty placeholder; exactly one accumulator owns
/// exactly one in-flight message, so no locking is involved. Consuming
/// `finalize` or `abort` ends the mutation window; the message is immutable
/// afterwards.
#[derive(Debug)]
pub struct StreamAccumulator<'a> {
    transcript: &'a mut Transcript,
    slot: usize,
    prompt_chars: usize,
    response_id: Option<String>,
    finish: Option<FinishReason>,
}

impl<'a> StreamAccumulator<'a> {
    /// Append the assistant placeholder and begin accumulating into it.
    pub fn new(transcript: &'a mut Transcript) -> Self {
        let prompt_chars = transcript.content_chars();
        let slot = transcript.begin_assistant();
        Self {
            transcript,
            slot,
            prompt_chars,
            response_id: None,
            finish: None,
        }
    }

    /// Fold one chunk, in arrival order.
    ///
    /// Non-empty deltas are appended verbatim. The first non-empty id is
    /// recorded. A finish indicator marks the accumulator finished; anything
    /// folded after that point is discarded.
    pub fn fold(&mut self, chunk: &StreamChunk) -> FoldStep {
        if self.finish.is_some() {
            log::warn!("discarding chunk received after finish indicator");
            return FoldStep::Finished;
        }

        if self.response_id.is_none()
            && let Some(id) = chunk.id.as_deref()
            && !id.is_empty()
        {
            self.response_id = Some(id.to_string());
        }

        if let Some(delta) = chunk.delta.as_deref()
            && !delta.is_empty()
        {
            self.transcript.append_fragment(self.slot, delta);
        }

        if let Some(reason) = &chunk.finish {
            self.finish = Some(reason.clone());
            return FoldStep::Finished;
        }

        FoldStep::Continue
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.transcript.messages()[self.slot].content
    }

    /// Characters folded so far.
    pub fn chars_received(&self) -> usize {
        self.content().chars().count()
    }

    /// Finalize into a [`FinalResponse`].
    ///
    /// Sequence exhaustion without an explicit finish indicator is the
    /// terminal condition, not an error; the reason defaults to `stop`.
    pub fn finalize(self, model: &str) -> FinalResponse {
        let content = self.transcript.messages()[self.slot].content.clone();
        let usage = UsageEstimate::from_chars(self.prompt_chars, content.chars().count());
        FinalResponse {
            id: self
                .response_id
                .unwrap_or_else(|| format!("kaiwa-{}", Uuid::new_v4())),
            model: model.to_string(),
            content,
            finish_reason: self.finish.unwrap_or(FinishReason::Stop),
            created: Utc::now().timestamp(),
            usage,
        }
    }

    /// Abort accumulation after a stream failure.
    ///
    /// Appends a visible marker to the partial message and returns the
    /// marker text for sink publication. The fragments folded so far stay
    /// in the transcript, never rolled back.
    pub fn abort(self, error: &ProviderError) -> String {
        let marker = format!("\n\n[response interrupted: {}]", error);
        self.transcript.append_fragment(self.slot, &marker);
        marker
    }
}

/// Drive an accumulator from a chunk stream.
///
/// Each appended fragment is published to `sink` after the fold, so the
/// rendering collaborator sees every intermediate state. Returns
/// `Ok(Some(response))` on completion or exhaustion, and `Ok(None)` when
/// `cancel` fires first; the transcript keeps exactly the fragments folded
/// before the cancellation point. A stream error appends the visible marker,
/// notifies the sink, and is then re-raised as
/// [`Error::StreamInterrupted`].
pub async fn accumulate<St, S>(
    chunks: St,
    transcript: &mut Transcript,
    model: &str,
    cancel: &CancellationToken,
    sink: &mut S,
) -> Result<Option<FinalResponse>, Error>
where
    St: Stream<Item = Result<StreamChunk, ProviderError>>,
    S: ResponseSink,
{
    let mut chunks = std::pin::pin!(chunks);
    sink.handle(ResponseEvent::StartResponse)?;
    let mut acc = StreamAccumulator::new(transcript);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            next = chunks.next() => next,
        };

        let chunk = match next {
            None => break,
            Some(Ok(chunk)) => chunk,
            Some(Err(source)) => {
                let received = acc.chars_received();
                let marker = acc.abort(&source);
                // Sink update comes first; a failing sink must not mask the
                // stream error.
                if let Err(sink_err) = sink.handle(ResponseEvent::Interrupted { marker: &marker }) {
                    log::warn!("sink failed while reporting interruption: {}", sink_err);
                }
                return Err(Error::StreamInterrupted { received, source });
            }
        };

        let step = acc.fold(&chunk);
        if let Some(delta) = chunk.delta.as_deref()
            && !delta.is_empty()
        {
            sink.handle(ResponseEvent::TextChunk(delta))?;
        }
        if step == FoldStep::Finished {
            break;
        }
    }

    let response = acc.finalize(model);
    sink.handle(ResponseEvent::Finished)?;
    Ok(Some(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;

    #[test]
    fn fold_appends_in_arrival_order() {
        let mut transcript = Transcript::new();
        transcript.push(Role::User, "hi");
        let mut acc = StreamAccumulator::new(&mut transcript);

        assert_eq!(acc.fold(&StreamChunk::delta("Hel")), FoldStep::Continue);
        assert_eq!(acc.fold(&StreamChunk::delta("lo")), FoldStep::Continue);
        assert_eq!(acc.content(), "Hello");
    }

    #[test]
    fn empty_delta_is_a_noop() {
        let mut transcript = Transcript::new();
        let mut acc = StreamAccumulator::new(&mut transcript);

        acc.fold(&StreamChunk::delta(""));
        acc.fold(&StreamChunk::default());
        assert_eq!(acc.content(), "");
    }

    #[test]
    fn first_nonempty_id_wins() {
        let mut transcript = Transcript::new();
        let mut acc = StreamAccumulator::new(&mut transcript);

        acc.fold(&StreamChunk {
            id: Some(String::new()),
            ..StreamChunk::default()
        });
        acc.fold(&StreamChunk {
            id: Some("resp-1".to_string()),
            ..StreamChunk::default()
        });
        acc.fold(&StreamChunk {
            id: Some("resp-2".to_string()),
            ..StreamChunk::default()
        });

        let response = acc.finalize("test-model");
        assert_eq!(response.id, "resp-1");
    }

    #[test]
    fn fold_after_finish_discards() {
        let mut transcript = Transcript::new();
        let mut acc = StreamAccumulator::new(&mut transcript);

        acc.fold(&StreamChunk::delta("kept"));
        assert_eq!(
            acc.fold(&StreamChunk::finish(FinishReason::Stop)),
            FoldStep::Finished
        );
        assert_eq!(acc.fold(&StreamChunk::delta("dropped")), FoldStep::Finished);
        assert_eq!(acc.content(), "kept");
    }

    #[test]
    fn finalize_without_indicator_defaults_to_stop() {
        let mut transcript = Transcript::new();
        let acc = StreamAccumulator::new(&mut transcript);
        let response = acc.finalize("test-model");

        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.content, "");
        assert!(response.id.starts_with("kaiwa-"), "got: {}", response.id);
    }

    #[test]
    fn abort_preserves_partial_content() {
        let mut transcript = Transcript::new();
        let mut acc = StreamAccumulator::new(&mut transcript);
        acc.fold(&StreamChunk::delta("Par"));

        let marker = acc.abort(&ProviderError::Transport("reset".to_string()));
        let last = transcript.last().unwrap();
        assert!(last.content.starts_with("Par"), "got: {}", last.content);
        assert!(last.content.ends_with(&marker));
        assert!(last.content.contains("interrupted"));
    }

    #[test]
    fn usage_estimate_floors_and_sums() {
        let usage = UsageEstimate::from_chars(10, 7);
        assert_eq!(usage.prompt_tokens, 2);
        assert_eq!(usage.completion_tokens, 1);
        assert_eq!(usage.total_tokens, 3);

        // Deterministic and additive for arbitrary counts.
        for (p, c) in [(0, 0), (3, 3), (4, 4), (1000, 999)] {
            let usage = UsageEstimate::from_chars(p, c);
            assert_eq!(
                usage.total_tokens,
                usage.prompt_tokens + usage.completion_tokens
            );
        }
    }

    #[test]
    fn usage_counts_prompt_chars_at_construction() {
        let mut transcript = Transcript::new();
        transcript.push(Role::System, "12345678"); // 8 chars -> 2 tokens
        let mut acc = StreamAccumulator::new(&mut transcript);
        acc.fold(&StreamChunk::delta("abcd")); // 4 chars -> 1 token

        let response = acc.finalize("test-model");
        assert_eq!(response.usage.prompt_tokens, 2);
        assert_eq!(response.usage.completion_tokens, 1);
        assert_eq!(response.usage.total_tokens, 3);
    }

    #[test]
    fn finish_reason_from_provider_strings() {
        assert_eq!(FinishReason::from_provider("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_provider("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_provider("content_filter"),
            FinishReason::ContentFilter
        );
        assert_eq!(
            FinishReason::from_provider("tool_calls"),
            FinishReason::Other("tool_calls".to_string())
        );
        assert_eq!(FinishReason::from_provider("stop").as_str(), "stop");
    }
}
