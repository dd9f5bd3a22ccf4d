//! Provider client adapter.
//!
//! Wraps the provider HTTP surface behind a uniform send/stream contract,
//! decoupled from presentation through the [`ResponseSink`] trait.

pub mod request;
pub mod send;
pub mod sink;
pub mod sse;

pub use request::{SendOptions, build_request_body, extract_choice_content};
pub use send::{ChatClient, ChunkStream};
pub use sink::{CollectingSink, ResponseEvent, ResponseSink};
pub use sse::SseDecoder;
