//! Incremental frame record reassembly.
//!
//! The transport delivers the stream in chunks of arbitrary non-zero length
//! with no relationship to record boundaries. [`RecordFramer`] accumulates
//! those chunks and yields complete records in order, holding any trailing
//! partial record until the rest of its bytes arrive.
//!
//! The accumulator is a [`BytesMut`]: consumed records are carved off the
//! front with `split_to`, which advances a cursor into shared storage
//! instead of copying the remainder, so feeding the framer one byte at a
//! time costs the same total work as feeding it one large chunk.

use crate::error::WireError;
use crate::record::{FrameRecord, FrameType, HEADER_LEN, MAX_PAYLOAD_LEN};
use bytes::{Buf, BytesMut};

/// Reassembles length-prefixed frame records from stream chunks.
///
/// # Example
///
/// ```
/// use rms_protocol::{FrameType, RecordFramer};
///
/// let mut framer = RecordFramer::new(16);
/// // Header split across two chunks, payload in a third.
/// framer.push_chunk(&[0x01, 0x03]);
/// assert!(framer.next_record().unwrap().is_none());
/// framer.push_chunk(&[0x00, 0x00]);
/// framer.push_chunk(&[0xAA, 0xBB, 0xCC]);
/// let rec = framer.next_record().unwrap().unwrap();
/// assert_eq!(rec.frame_type, FrameType::Delta);
/// assert_eq!(&rec.payload[..], &[0xAA, 0xBB, 0xCC]);
/// ```
#[derive(Debug)]
pub struct RecordFramer {
    pending: BytesMut,
    max_payload: usize,
}

impl RecordFramer {
    /// Create a framer for a raster of `raster_len` bytes.
    ///
    /// The raster size bounds the plausible payload: a full frame is at most
    /// the raster itself (compression only shrinks it), and a delta frame
    /// larger than the raster would have been sent as a full frame by any
    /// sane producer. A 2x slack plus header room keeps the check from ever
    /// rejecting a legitimate worst case.
    pub fn new(raster_len: usize) -> Self {
        let max_payload = (raster_len * 2 + 1024).min(MAX_PAYLOAD_LEN);
        Self {
            pending: BytesMut::with_capacity(raster_len.min(1 << 20)),
            max_payload,
        }
    }

    /// Append one received chunk to the pending buffer.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Extract the next complete record, if one is fully buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Call in a loop after
    /// each [`push_chunk`](Self::push_chunk) until it returns `None`: a
    /// single chunk may complete several records.
    ///
    /// # Errors
    ///
    /// A header with an unknown type tag or an implausible length is a
    /// [`WireError`]; the stream cannot be resynchronized after one.
    pub fn next_record(&mut self) -> Result<Option<FrameRecord>, WireError> {
        if self.pending.len() < HEADER_LEN {
            return Ok(None);
        }

        // Peek the header without consuming; a partial payload must leave
        // the buffer untouched.
        let tag = self.pending[0];
        let payload_len = u32::from_le_bytes([
            self.pending[1],
            self.pending[2],
            self.pending[3],
            0,
        ]) as usize;

        let frame_type = FrameType::from_wire(tag)?;
        if payload_len > self.max_payload {
            return Err(WireError::OversizedPayload {
                declared: payload_len,
                limit: self.max_payload,
            });
        }

        if self.pending.len() < HEADER_LEN + payload_len {
            return Ok(None);
        }

        self.pending.advance(HEADER_LEN);
        let payload = self.pending.split_to(payload_len).freeze();
        Ok(Some(FrameRecord::new(frame_type, payload)))
    }

    /// Bytes buffered but not yet resolved into a record.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
