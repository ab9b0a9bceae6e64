//! Stream decoder state and record dispatch.

use crate::delta::apply_delta;
use crate::full::{decode_full_frame, Compression};
use bytes::Bytes;
use rms_common::Dimensions;
use rms_protocol::{FrameRecord, FrameType};
use rms_raster::Raster;
use thiserror::Error;

/// Recoverable per-record decode faults.
///
/// None of these terminate the stream: frame loss is expected and the next
/// full frame resynchronizes the raster. They are surfaced so callers can
/// log and count them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeFault {
    /// A full frame's (decompressed) payload does not match the raster size.
    #[error("full frame size mismatch: got {got} bytes, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },

    /// A compressed full-frame payload failed to decompress.
    #[error("{codec} decompression failed: {detail}")]
    Decompression {
        codec: &'static str,
        detail: String,
    },

    /// A delta payload ended inside a run header or its pixel data.
    #[error("delta record truncated at payload byte {at}")]
    TruncatedDelta { at: usize },

    /// A delta run would write outside the raster.
    #[error("delta run of {len} bytes at offset {offset} exceeds raster of {raster_len} bytes")]
    BoundsViolation {
        offset: usize,
        len: usize,
        raster_len: usize,
    },
}

/// What applying one record produced.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// A completed output raster to hand to the renderer, if this record
    /// produced one. Full frames emit unless they faulted; delta frames
    /// always emit, faulted or not.
    pub frame: Option<Bytes>,
    /// The fault that trimmed or dropped this record, if any.
    pub fault: Option<DecodeFault>,
}

/// Stateful decoder for one stream connection.
///
/// Owns the reference raster and applies records in arrival order. The
/// struct replaces the worker-global mutable state of the original design:
/// one instance per connection, dropped on teardown.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use rms_codec::StreamDecoder;
/// use rms_common::Dimensions;
/// use rms_protocol::{FrameRecord, FrameType};
///
/// let mut decoder = StreamDecoder::new(Dimensions::new(4, 1));
/// let record = FrameRecord::new(FrameType::RawFull, Bytes::from(vec![0u8; 16]));
/// let outcome = decoder.apply_record(&record);
/// assert!(outcome.fault.is_none());
/// assert_eq!(outcome.frame.unwrap().len(), 16);
/// ```
#[derive(Debug)]
pub struct StreamDecoder {
    raster: Raster,
}

impl StreamDecoder {
    /// Create a decoder with a zero-initialized reference raster.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            raster: Raster::new(dims),
        }
    }

    /// The negotiated raster dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.raster.dimensions()
    }

    /// Read-only access to the reference raster, mainly for tests.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Apply one complete frame record.
    ///
    /// Faults are absorbed per the stream's self-healing policy and
    /// reported in the outcome; this method never fails.
    pub fn apply_record(&mut self, record: &FrameRecord) -> RecordOutcome {
        tracing::debug!(
            target: "rms_codec::framing",
            "record: type={:?} payload_len={}",
            record.frame_type,
            record.payload.len()
        );

        match record.frame_type {
            FrameType::RawFull => self.apply_full(&record.payload, Compression::None),
            FrameType::GzipFull => self.apply_full(&record.payload, Compression::Gzip),
            FrameType::ZstdFull => self.apply_full(&record.payload, Compression::Zstd),
            FrameType::Delta => self.apply_delta_record(&record.payload),
        }
    }

    fn apply_full(&mut self, payload: &[u8], compression: Compression) -> RecordOutcome {
        match decode_full_frame(payload, compression, &mut self.raster) {
            Ok(()) => RecordOutcome {
                frame: Some(self.raster.snapshot()),
                fault: None,
            },
            Err(fault) => {
                tracing::warn!("dropping full frame: {}", fault);
                RecordOutcome {
                    frame: None,
                    fault: Some(fault),
                }
            }
        }
    }

    fn apply_delta_record(&mut self, payload: &[u8]) -> RecordOutcome {
        let (applied, fault) = apply_delta(payload, &mut self.raster);
        if let Some(fault) = &fault {
            tracing::warn!("delta record cut short after {} runs: {}", applied, fault);
        }
        // A delta always yields a renderable image, even partially applied.
        RecordOutcome {
            frame: Some(self.raster.snapshot()),
            fault,
        }
    }
}
