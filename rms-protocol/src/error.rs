//! Wire-level error types.
//!
//! These errors are fatal for the stream that produced them: the framer
//! trusts the producer, so a malformed header means the two sides no longer
//! agree on the protocol and nothing downstream can be salvaged. Recoverable
//! per-record faults (size mismatches, truncated delta runs) are a separate
//! taxonomy owned by `rms-codec`.

use thiserror::Error;

/// Unrecoverable violations of the wire format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The frame type tag is not one the protocol defines.
    #[error("unknown frame type tag 0x{0:02X}")]
    UnknownFrameType(u8),

    /// The declared payload length exceeds the practical frame size.
    ///
    /// A full frame can never legitimately exceed the raster size plus
    /// compression overhead; a larger value means the header bytes are not
    /// really a header.
    #[error("payload length {declared} exceeds limit {limit}")]
    OversizedPayload { declared: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = WireError::UnknownFrameType(0x7F);
        assert_eq!(err.to_string(), "unknown frame type tag 0x7F");

        let err = WireError::OversizedPayload {
            declared: 100,
            limit: 10,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("10"));
    }
}
