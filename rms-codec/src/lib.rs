//! Payload decoders for the reMarkable framebuffer stream.
//!
//! This crate turns complete frame records (as produced by
//! `rms_protocol::RecordFramer`) into raster updates. It owns the reference
//! raster for one connection and applies records to it one at a time:
//!
//! - Full frames (raw, gzip, zstd) replace the raster wholesale and are the
//!   resynchronization points of the stream.
//! - Delta frames patch byte runs into the raster at cursor-relative
//!   offsets.
//!
//! # Fault Policy
//!
//! Per-record decode faults are expected in normal operation (frames are
//! droppable; the next full frame heals everything), so they never
//! terminate decoding. Every fault is still surfaced in the
//! [`RecordOutcome`] so callers can log or count them.
//!
//! Full-frame faults drop the frame: nothing is emitted and the raster is
//! untouched. Delta-frame faults trim the record: runs applied before the
//! fault stay applied and a snapshot is emitted anyway, trading correctness
//! for liveness.

pub mod decoder;
pub mod delta;
pub mod full;

pub use decoder::{DecodeFault, RecordOutcome, StreamDecoder};
pub use delta::apply_delta;
pub use full::{decode_full_frame, Compression};
