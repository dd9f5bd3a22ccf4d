//! kaiwa-core: embeddable chat-client core.
//!
//! Provides the provider client adapter, the streaming response
//! accumulator, the conversation data model, and the typed segment scanner
//! used by rendering front ends.
//!
//! # Quick Start
//!
//! ```no_run
//! use kaiwa_core::{ChatClient, ProviderConfig, ProviderKind, Role, SendOptions, Transcript};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kaiwa_core::Error> {
//!     let config = ProviderConfig::new(ProviderKind::OpenAiCompatible, "sk-...", "gpt-4o-mini");
//!     let client = ChatClient::new(config)?;
//!
//!     let mut transcript = Transcript::new();
//!     transcript.push(Role::User, "Hello!");
//!
//!     let response = client.send_once(&transcript, &SendOptions::new()).await?;
//!     transcript.push(Role::Assistant, response.content.clone());
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```
//!
//! For streaming with progressive rendering, implement
//! [`ResponseSink`](api::sink::ResponseSink) and use
//! [`ChatClient::send_stream`].

pub mod api;
pub mod config;
pub mod error;
pub mod segment;
pub mod stream;
pub mod transcript;

// Re-export commonly used types
pub use api::{ChatClient, ChunkStream, CollectingSink, ResponseEvent, ResponseSink, SendOptions};
pub use config::{ConfigHandle, ProviderConfig, ProviderKind};
pub use error::{Error, ProviderError};
pub use segment::{Segment, Segments, segments};
pub use stream::{
    FinalResponse, FinishReason, StreamAccumulator, StreamChunk, UsageEstimate, accumulate,
};
pub use transcript::{ChatMessage, Role, Transcript};
