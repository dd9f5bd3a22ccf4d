//! Error taxonomy.
//!
//! Three failure classes, surfaced once and never retried internally:
//! configuration problems (reported before any request), provider failures
//! (transport/auth/status/parse), and mid-stream interruptions (partial
//! transcript preserved).

use thiserror::Error;

/// Longest provider error body carried into an error message.
const MAX_BODY_CHARS: usize = 300;

/// Top-level error type for kaiwa operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable provider configuration was selected. No request was
    /// attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider failed the request before or at the HTTP layer.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The chunk sequence failed mid-iteration. The partial transcript is
    /// preserved with a visible marker; `received` counts the characters
    /// folded before the failure.
    #[error("stream interrupted after {received} characters: {source}")]
    StreamInterrupted {
        received: usize,
        #[source]
        source: ProviderError,
    },

    /// The rendering sink failed while a fold step was being published.
    #[error("sink error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Failures from the provider HTTP surface.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider rejected the credentials.
    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    /// Non-success response other than an auth rejection.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response or a stream payload did not match the expected shape.
    #[error("malformed provider payload: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Auth { status },
            _ => ProviderError::Status {
                status,
                body: truncate_body(body),
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_http_status(status.as_u16(), &err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Truncate an error body on a character boundary.
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_classify_as_auth() {
        assert!(matches!(
            ProviderError::from_http_status(401, "Unauthorized"),
            ProviderError::Auth { status: 401 }
        ));
        assert!(matches!(
            ProviderError::from_http_status(403, "Forbidden"),
            ProviderError::Auth { status: 403 }
        ));
    }

    #[test]
    fn other_statuses_carry_the_body() {
        let err = ProviderError::from_http_status(429, "slow down");
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(MAX_BODY_CHARS + 50);
        let err = ProviderError::from_http_status(500, &body);
        match err {
            ProviderError::Status { body, .. } => {
                assert!(body.ends_with("..."));
                assert_eq!(body.chars().count(), MAX_BODY_CHARS + 3);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn stream_interrupted_reports_source() {
        let err = Error::StreamInterrupted {
            received: 3,
            source: ProviderError::Transport("connection reset".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("after 3 characters"), "got: {}", msg);

        let source = std::error::Error::source(&err).expect("source must be set");
        assert!(source.to_string().contains("connection reset"));
    }

    #[test]
    fn configuration_error_message() {
        let err = Error::Configuration("api_key is empty".to_string());
        assert_eq!(err.to_string(), "configuration error: api_key is empty");
    }
}
