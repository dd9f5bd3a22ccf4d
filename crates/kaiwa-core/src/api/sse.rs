//! Incremental SSE decoding for streamed chat completions.
//!
//! Network chunks do not align with event boundaries, so the decoder
//! buffers bytes and emits a [`StreamChunk`] per complete `data:` line.
//! Lines end at `\n` (ASCII), so buffered line bytes are always complete
//! UTF-8 sequences when the payload is valid.

use crate::error::ProviderError;
use crate::stream::{FinishReason, StreamChunk};
use serde_json::Value;

/// Terminal sentinel payload for OpenAI-compatible streams.
const DONE_SENTINEL: &str = "[DONE]";

/// Stateful decoder from network bytes to [`StreamChunk`]s.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk; returns the chunks completed by it, in
    /// arrival order. Anything after the `[DONE]` sentinel is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<StreamChunk>, ProviderError> {
        if self.done {
            return Ok(Vec::new());
        }
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.done {
                continue;
            }
            let line = std::str::from_utf8(&line_bytes)
                .map_err(|e| ProviderError::Parse(format!("invalid UTF-8 in stream: {}", e)))?
                .trim_end_matches(['\n', '\r']);
            if let Some(chunk) = self.decode_line(line)? {
                out.push(chunk);
            }
        }
        Ok(out)
    }

    /// Decode one complete line. Blank lines, comments, and non-`data`
    /// fields are skipped.
    fn decode_line(&mut self, line: &str) -> Result<Option<StreamChunk>, ProviderError> {
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.trim_start();
        if data == DONE_SENTINEL {
            self.done = true;
            return Ok(None);
        }
        let json: Value = serde_json::from_str(data)
            .map_err(|e| ProviderError::Parse(format!("malformed stream payload: {}", e)))?;
        Ok(Some(chunk_from_json(&json)))
    }
}

/// Map one chat-completion chunk object to a [`StreamChunk`].
fn chunk_from_json(json: &Value) -> StreamChunk {
    let id = json
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let choice = json.get("choices").and_then(|c| c.get(0));
    let delta = choice
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let finish = choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(Value::as_str)
        .map(FinishReason::from_provider);

    StreamChunk { id, delta, finish }
}
