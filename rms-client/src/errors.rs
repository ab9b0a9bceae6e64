//! Error types for the stream client.

use rms_protocol::WireError;
use std::io;
use thiserror::Error;

/// Coarse classification of a terminal stream fault, reported alongside the
/// human-readable message so callers can pick a reconnection policy without
/// string matching. Rate limiting gets its own class: retrying it
/// immediately is exactly what a rate-limited client must not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Could not establish the TCP connection.
    Connection,
    /// TLS setup or handshake failure.
    Tls,
    /// The server answered with a non-2xx status.
    Http,
    /// The server answered 429: too many clients.
    RateLimited,
    /// The body ended without the consumer asking for termination.
    StreamEnded,
    /// I/O failure mid-stream.
    Transport,
    /// The byte stream violated the wire format.
    Wire,
    /// A response that is not HTTP at all.
    Protocol,
    /// Should not happen in normal operation.
    Internal,
}

/// Errors that can occur during stream client operation.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport-level I/O error (TCP, socket operations).
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Connection failed (TCP connection establishment failed).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server refused the stream request with a non-2xx status.
    #[error("Server error: status {status}")]
    Http {
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// The server is already serving its maximum number of clients.
    #[error("Rate limited: too many clients")]
    RateLimited,

    /// The response was not parseable as HTTP.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The stream ended without an explicit terminate request. The stream
    /// is expected to be long-lived, so a clean end still signals a fault
    /// upstream.
    #[error("Stream ended unexpectedly")]
    StreamEnded,

    /// The byte stream violated the frame wire format.
    #[error("Wire format violation: {0}")]
    Wire(#[from] WireError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client has been shut down.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// True if reconnecting later can plausibly succeed.
    ///
    /// Wire violations are deliberately fatal: they indicate a protocol
    /// version mismatch or a corrupt producer, and a fresh connection will
    /// fault the same way immediately.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionFailed(_)
                | Self::Tls(_)
                | Self::Http { .. }
                | Self::RateLimited
                | Self::StreamEnded
        )
    }

    /// True for fatal conditions that should not be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }

    /// Classify this error for the caller's backoff logic.
    #[must_use]
    pub fn classification(&self) -> FaultClass {
        match self {
            Self::Transport(_) => FaultClass::Transport,
            Self::ConnectionFailed(_) => FaultClass::Connection,
            Self::Tls(_) => FaultClass::Tls,
            Self::Http { .. } => FaultClass::Http,
            Self::RateLimited => FaultClass::RateLimited,
            Self::MalformedResponse(_) => FaultClass::Protocol,
            Self::StreamEnded => FaultClass::StreamEnded,
            Self::Wire(_) => FaultClass::Wire,
            Self::Config(_) | Self::ConnectionClosed | Self::Internal(_) => FaultClass::Internal,
        }
    }
}
