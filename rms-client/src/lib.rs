//! High-level async client for the reMarkable screen stream.
//!
//! This crate provides a complete client for the device's `/stream`
//! endpoint, built on top of the `rms-protocol` and `rms-codec` crates. It
//! handles the connection, the HTTP request, incremental record decoding,
//! and delivers finished RGBA rasters over a channel.
//!
//! # Features
//!
//! - **Async I/O**: Built on tokio for event-driven networking
//! - **All wire encodings**: raw, gzip and zstd full frames, delta patches
//! - **Typed faults**: classified errors with a retryable flag, and a
//!   distinct rate-limited class so callers can back off properly
//! - **Self-healing decode**: per-record faults are absorbed, the next
//!   full frame resynchronizes
//! - **Bearer auth and TLS**: matching the device's server options
//!
//! # Quick Start
//!
//! ```no_run
//! use rms_client::{ClientBuilder, Config, StreamEvent};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::builder()
//!         .host("10.11.99.1")
//!         .build()?;
//!
//!     let client = ClientBuilder::new(config).connect().await?;
//!     let handle = client.handle();
//!
//!     while let Ok(event) = handle.events().recv_async().await {
//!         match event {
//!             StreamEvent::Connected { width, height } => {
//!                 println!("Streaming {}x{}", width, height);
//!             }
//!             StreamEvent::FrameReady { raster } => {
//!                 // Hand the raster to the renderer
//!                 let _ = raster;
//!             }
//!             StreamEvent::Fault { message, retryable, .. } => {
//!                 eprintln!("stream fault (retryable={}): {}", retryable, message);
//!                 break;
//!             }
//!             StreamEvent::Closed => break,
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! A single spawned task owns the connection, the record framer, and the
//! reference raster; nothing is shared. Rasters cross to the application as
//! owned [`bytes::Bytes`] snapshots, commands cross the other way over a
//! bounded channel. The task reads one body chunk at a time and drains
//! every complete record from it before reading again.
//!
//! # Error Handling
//!
//! Connection-time errors are returned from [`ClientBuilder::connect`].
//! Mid-stream faults arrive as [`StreamEvent::Fault`] with a
//! classification and a retryable flag, followed by [`StreamEvent::Closed`];
//! the client never reconnects on its own.
//!
//! # Safety
//!
//! This crate is `#![forbid(unsafe_code)]` and uses only safe Rust.

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod errors;
pub mod messages;
pub mod transport;

// Private implementation modules
mod http;
mod session;

// Re-exports
pub use config::Config;
pub use errors::{FaultClass, StreamError};
pub use messages::{StreamCommand, StreamEvent};

use tokio::task::JoinHandle;

/// Builder for creating a stream client.
///
/// # Examples
///
/// ```no_run
/// use rms_client::{ClientBuilder, Config};
/// # use anyhow::Result;
///
/// # async fn example() -> Result<()> {
/// let config = Config::builder().host("10.11.99.1").build()?;
/// let client = ClientBuilder::new(config).connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    /// Creates a new client builder with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Connects and starts streaming.
    ///
    /// This validates the configuration, establishes the connection, sends
    /// the stream request, and spawns the decode loop. On success the
    /// first event on the handle is [`StreamEvent::Connected`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection
    /// cannot be established, or the server refuses the stream request
    /// (including [`StreamError::RateLimited`] for a 429).
    pub async fn connect(self) -> Result<Client, StreamError> {
        self.config.validate()?;

        let (cmd_tx, cmd_rx) = flume::bounded(8);
        let (event_tx, event_rx) = flume::bounded(64);

        let handle = session::spawn(self.config, cmd_rx, event_tx).await?;

        Ok(Client {
            handle: ClientHandle {
                commands: cmd_tx,
                events: event_rx,
            },
            join_handle: handle,
        })
    }
}

/// Handle for interacting with a running stream client.
///
/// The handle can be cloned and shared across threads.
#[derive(Clone, Debug)]
pub struct ClientHandle {
    commands: flume::Sender<StreamCommand>,
    events: flume::Receiver<StreamEvent>,
}

impl ClientHandle {
    /// Returns a reference to the event receiver.
    ///
    /// Events can be received with `recv()`, `recv_async()`, `try_recv()`,
    /// or by iterating over the receiver.
    #[must_use]
    pub fn events(&self) -> &flume::Receiver<StreamEvent> {
        &self.events
    }

    /// Stops the stream and closes the connection.
    ///
    /// Termination is cooperative and silent: no fault is reported and no
    /// frame is emitted after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has already shut down.
    pub fn terminate(&self) -> Result<(), StreamError> {
        self.commands
            .send(StreamCommand::Terminate)
            .map_err(|_| StreamError::ConnectionClosed)
    }
}

/// A connected stream client.
///
/// The decode loop runs in a background task. Use [`handle()`](Self::handle)
/// for events and termination. Dropping the client requests termination.
#[derive(Debug)]
pub struct Client {
    handle: ClientHandle,
    join_handle: JoinHandle<()>,
}

impl Client {
    /// Returns a handle for interacting with the client.
    #[must_use]
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Waits for the client task to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the background task panicked.
    pub async fn join(mut self) -> Result<(), StreamError> {
        // Take ownership of join_handle without triggering Drop
        let join_handle = std::mem::replace(&mut self.join_handle, tokio::spawn(async {}));
        // Prevent Drop from running
        std::mem::forget(self);
        join_handle
            .await
            .map_err(|e| StreamError::Internal(format!("Client task panicked: {e}")))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Best-effort cooperative shutdown.
        let _ = self.handle.commands.try_send(StreamCommand::Terminate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientHandle>();
    }
}
