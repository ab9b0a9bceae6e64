//! Frame record types.
//!
//! A frame record is the unit of the wire protocol: a 4-byte header
//! (1-byte type tag + 24-bit little-endian payload length) followed by the
//! payload. Records are reassembled from stream chunks by
//! [`RecordFramer`](crate::framer::RecordFramer).

use crate::error::WireError;
use bytes::Bytes;

/// Length of the record header in bytes (type tag + 24-bit length).
pub const HEADER_LEN: usize = 4;

/// Largest payload length expressible in the 24-bit header field.
pub const MAX_PAYLOAD_LEN: usize = (1 << 24) - 1;

/// Frame type tag, the first byte of every record header.
///
/// Three full-frame encodings coexist for backward compatibility with older
/// producers; all must be supported indefinitely since producer and consumer
/// versions may not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Uncompressed full raster. Deprecated on the producer side but still
    /// decoded.
    RawFull = 0x00,
    /// Sparse patch of byte runs against the reference raster.
    Delta = 0x01,
    /// Gzip-compressed full raster (legacy producers).
    GzipFull = 0x02,
    /// Zstd-compressed full raster (current producers).
    ZstdFull = 0x03,
}

impl FrameType {
    /// Parse a wire tag. Unknown tags are a fatal wire error so that new
    /// frame types fail loudly instead of being length-skipped in silence.
    pub fn from_wire(tag: u8) -> Result<Self, WireError> {
        match tag {
            0x00 => Ok(Self::RawFull),
            0x01 => Ok(Self::Delta),
            0x02 => Ok(Self::GzipFull),
            0x03 => Ok(Self::ZstdFull),
            other => Err(WireError::UnknownFrameType(other)),
        }
    }

    /// The tag byte written on the wire.
    pub const fn as_wire(self) -> u8 {
        self as u8
    }

    /// True for the three full-raster variants.
    pub const fn is_full(self) -> bool {
        !matches!(self, Self::Delta)
    }
}

/// One complete frame record extracted from the stream.
///
/// The payload is a shared [`Bytes`] slice of the framer's buffer; cloning
/// a record is cheap and never copies pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub frame_type: FrameType,
    pub payload: Bytes,
}

impl FrameRecord {
    /// Create a record from an already-extracted payload.
    pub fn new(frame_type: FrameType, payload: Bytes) -> Self {
        Self {
            frame_type,
            payload,
        }
    }

    /// Total size of this record on the wire, header included.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_round_trip() {
        for tag in [0x00u8, 0x01, 0x02, 0x03] {
            let ft = FrameType::from_wire(tag).unwrap();
            assert_eq!(ft.as_wire(), tag);
        }
    }

    #[test]
    fn test_frame_type_unknown() {
        for tag in [0x04u8, 0x10, 0x80, 0xFF] {
            assert_eq!(
                FrameType::from_wire(tag),
                Err(WireError::UnknownFrameType(tag))
            );
        }
    }

    #[test]
    fn test_is_full() {
        assert!(FrameType::RawFull.is_full());
        assert!(FrameType::GzipFull.is_full());
        assert!(FrameType::ZstdFull.is_full());
        assert!(!FrameType::Delta.is_full());
    }

    #[test]
    fn test_wire_len() {
        let rec = FrameRecord::new(FrameType::Delta, Bytes::from_static(&[1, 2, 3]));
        assert_eq!(rec.wire_len(), HEADER_LEN + 3);
    }
}
