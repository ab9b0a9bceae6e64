//! Writer half of the wire protocol.
//!
//! The client never sends frame records, but the encoder is load-bearing
//! anyway: round-trip tests, the mock stream server in the client's
//! integration tests, and any capture-replay tooling all produce wire bytes
//! through here. The short/long run form is chosen exactly as the producer
//! chooses it: short iff the offset fits 16 bits and the length fits 7.

use crate::delta::{LONG_MAX_OFFSET, LONG_MAX_RUN, SHORT_MAX_OFFSET, SHORT_MAX_RUN};
use crate::record::{FrameType, MAX_PAYLOAD_LEN};
use rms_common::BYTES_PER_PIXEL;

/// Serialize one frame record (header + payload).
///
/// # Panics
///
/// Panics if the payload exceeds the 24-bit length field.
pub fn encode_record(frame_type: FrameType, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD_LEN,
        "payload of {} bytes exceeds the 24-bit length field",
        payload.len()
    );
    let mut out = Vec::with_capacity(4 + payload.len());
    out.push(frame_type.as_wire());
    let len = payload.len() as u32;
    out.extend_from_slice(&len.to_le_bytes()[..3]);
    out.extend_from_slice(payload);
    out
}

/// Append one delta run to a payload buffer.
///
/// `data` is the run's RGBA pixel data and must be a whole number of
/// pixels; `relative_offset` is measured in bytes from the previous run's
/// end. The header form is picked automatically.
///
/// # Panics
///
/// Panics if `data` is not pixel-aligned or the run exceeds the long-form
/// field widths.
pub fn push_run(payload: &mut Vec<u8>, relative_offset: usize, data: &[u8]) {
    assert!(
        data.len() % BYTES_PER_PIXEL == 0,
        "run data of {} bytes is not pixel-aligned",
        data.len()
    );
    let length = data.len() / BYTES_PER_PIXEL;
    assert!(
        length <= LONG_MAX_RUN,
        "run of {} pixels exceeds the 15-bit length field",
        length
    );
    assert!(
        relative_offset <= LONG_MAX_OFFSET,
        "relative offset {} exceeds the 24-bit offset field",
        relative_offset
    );

    if length <= SHORT_MAX_RUN && relative_offset <= SHORT_MAX_OFFSET {
        payload.push(length as u8);
        payload.extend_from_slice(&(relative_offset as u16).to_le_bytes());
    } else {
        payload.push(0x80 | (length >> 8) as u8);
        payload.push((length & 0xFF) as u8);
        payload.extend_from_slice(&(relative_offset as u32).to_le_bytes()[..3]);
    }
    payload.extend_from_slice(data);
}

/// Append one delta run forced into the long header form.
///
/// The producer only emits long form when it must, but the decoder accepts
/// either form for any run; tests use this to prove the two encodings are
/// interchangeable.
pub fn push_run_long(payload: &mut Vec<u8>, relative_offset: usize, data: &[u8]) {
    assert!(data.len() % BYTES_PER_PIXEL == 0);
    let length = data.len() / BYTES_PER_PIXEL;
    assert!(length <= LONG_MAX_RUN);
    assert!(relative_offset <= LONG_MAX_OFFSET);

    payload.push(0x80 | (length >> 8) as u8);
    payload.push((length & 0xFF) as u8);
    payload.extend_from_slice(&(relative_offset as u32).to_le_bytes()[..3]);
    payload.extend_from_slice(data);
}
