//! Wire protocol for the reMarkable framebuffer stream.
//!
//! This crate implements the byte-level protocol spoken by the streaming
//! server: length-prefixed frame records carrying either a full raster
//! (raw, gzip-compressed, or zstd-compressed) or a sparse delta patch made
//! of byte runs. It handles framing only; payload decoding lives in
//! `rms-codec`.
//!
//! # Modules
//!
//! - [`record`] - Frame record header: type tag and 24-bit payload length
//! - [`framer`] - Incremental reassembly of records from arbitrary chunks
//! - [`delta`] - Delta-run sub-record parsing (short and long header forms)
//! - [`encode`] - Writer half, used by tests and stream tooling
//!
//! # Wire Format
//!
//! ```text
//! byte 0       : frame type (0x00 raw full, 0x01 delta,
//!                            0x02 gzip full, 0x03 zstd full)
//! bytes 1..3   : payload length, unsigned 24-bit little-endian
//! bytes 4..    : payload
//! ```
//!
//! All multi-byte integers on this wire are **little-endian**.

pub mod delta;
pub mod encode;
pub mod error;
pub mod framer;
mod proptest_framing;
pub mod record;

pub use delta::{DeltaRun, RunError, RunReader};
pub use error::WireError;
pub use framer::RecordFramer;
pub use record::{FrameRecord, FrameType, HEADER_LEN, MAX_PAYLOAD_LEN};
