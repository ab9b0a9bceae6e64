//! Application-facing message types for the stream client.

use crate::errors::FaultClass;
use bytes::Bytes;

/// Events sent from the stream client to the application.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The stream request was accepted; frames will follow.
    Connected {
        /// Raster width in pixels.
        width: u32,
        /// Raster height in pixels.
        height: u32,
    },

    /// A complete raster is ready to render.
    ///
    /// The buffer is an owned copy: hold it as long as needed, the decoder
    /// never touches it again. Each successfully received frame is also the
    /// caller's cue to reset any reconnection backoff it maintains.
    FrameReady {
        /// RGBA8 pixels, `width * height * 4` bytes, row-major.
        raster: Bytes,
    },

    /// The stream failed. This is terminal for the client; reconnection
    /// policy belongs to the application.
    Fault {
        /// Coarse classification for backoff decisions.
        class: FaultClass,
        /// Human-readable description.
        message: String,
        /// Whether a reconnect can plausibly succeed.
        retryable: bool,
    },

    /// The client stopped, either after a fault or on request. Always the
    /// last event.
    Closed,
}

/// Commands sent from the application to the stream client.
#[derive(Debug, Clone)]
pub enum StreamCommand {
    /// Stop streaming and close the connection. Not an error: no fault is
    /// reported and no frame is emitted afterwards.
    Terminate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StreamEvent>();
        assert_send::<StreamCommand>();
    }

    #[test]
    fn test_frame_ready_is_cheap_to_clone() {
        let raster = Bytes::from(vec![0u8; 1024]);
        let event = StreamEvent::FrameReady {
            raster: raster.clone(),
        };
        let cloned = event.clone();
        match (event, cloned) {
            (StreamEvent::FrameReady { raster: a }, StreamEvent::FrameReady { raster: b }) => {
                // Same backing storage, not a copy.
                assert_eq!(a.as_ptr(), b.as_ptr());
            }
            _ => unreachable!(),
        }
    }
}
