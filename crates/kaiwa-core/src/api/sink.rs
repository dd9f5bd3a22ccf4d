//! Response sink abstraction for decoupling the adapter from presentation.
//!
//! The accumulator publishes every fold step through a [`ResponseSink`], so
//! the rendering collaborator can re-render after each accumulation step
//! without the core knowing how output is displayed.

use std::io;

/// Events published while a response is accumulated.
#[derive(Debug, Clone)]
pub enum ResponseEvent<'a> {
    /// A new response is starting; presentation state should reset.
    StartResponse,

    /// A content fragment was appended to the in-flight assistant message.
    TextChunk(&'a str),

    /// The stream failed mid-sequence. `marker` is the visible error text
    /// already appended to the partial message.
    Interrupted { marker: &'a str },

    /// The response finished (explicit finish indicator or sequence
    /// exhaustion).
    Finished,
}

/// Trait for handling response events.
///
/// # Example
///
/// ```
/// use kaiwa_core::api::sink::{ResponseEvent, ResponseSink};
/// use std::io;
///
/// struct MySink {
///     text: String,
/// }
///
/// impl ResponseSink for MySink {
///     fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
///         if let ResponseEvent::TextChunk(chunk) = event {
///             self.text.push_str(chunk);
///         }
///         Ok(())
///     }
/// }
///
/// let mut sink = MySink { text: String::new() };
/// sink.handle(ResponseEvent::TextChunk("Hello")).unwrap();
/// assert_eq!(sink.text, "Hello");
/// ```
pub trait ResponseSink {
    /// Handle one response event.
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()>;
}

/// A sink that collects responses for programmatic use.
///
/// Useful for testing or when the response is needed without any terminal
/// output.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Accumulated text content.
    pub text: String,
    /// Interruption markers observed.
    pub markers: Vec<String>,
    /// Whether the stream finished cleanly.
    pub finished: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseSink for CollectingSink {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        match event {
            ResponseEvent::StartResponse => {
                self.text.clear();
                self.finished = false;
            }
            ResponseEvent::TextChunk(chunk) => self.text.push_str(chunk),
            ResponseEvent::Interrupted { marker } => self.markers.push(marker.to_string()),
            ResponseEvent::Finished => self.finished = true,
        }
        Ok(())
    }
}
