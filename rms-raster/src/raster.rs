//! RGBA raster buffer implementation.
//!
//! # Memory Layout
//!
//! The raster is a contiguous `Vec<u8>` in row-major order, top-left
//! origin, 4 bytes per pixel:
//!
//! ```text
//! Total size = width * height * 4 bytes
//! Pixel at (x, y) starts at offset: (y * width + x) * 4
//! ```
//!
//! Delta runs address the buffer by raw byte offset, so the write API is
//! byte-oriented rather than rectangle-oriented.

use bytes::Bytes;
use rms_common::Dimensions;
use thiserror::Error;

/// Errors from raster mutation.
///
/// Both variants are recoverable at the stream level: the decoder drops or
/// trims the offending frame and waits for the next full frame to
/// resynchronize.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    /// A full-frame payload does not match the raster size exactly.
    #[error("frame size mismatch: got {got} bytes, raster is {expected}")]
    SizeMismatch { got: usize, expected: usize },

    /// A write would extend past the end of the raster.
    #[error("write of {len} bytes at offset {offset} exceeds raster of {raster_len} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        raster_len: usize,
    },
}

/// A fixed-size RGBA8 pixel buffer.
///
/// # Example
///
/// ```
/// use rms_common::Dimensions;
/// use rms_raster::Raster;
///
/// let mut raster = Raster::new(Dimensions::new(4, 1));
/// raster.write_at(0, &[0xFF, 0x00, 0x00, 0xFF]).unwrap();
/// assert_eq!(&raster.as_bytes()[..4], &[0xFF, 0x00, 0x00, 0xFF]);
/// ```
#[derive(Debug, Clone)]
pub struct Raster {
    dims: Dimensions,
    data: Vec<u8>,
}

impl Raster {
    /// Allocate a zero-initialized raster for the given dimensions.
    ///
    /// Zero bytes render as transparent black; the first full frame
    /// replaces them wholesale.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            data: vec![0u8; dims.raster_len()],
        }
    }

    /// The raster's dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True only for degenerate zero-sized dimensions.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only view of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite the entire raster from a full frame.
    ///
    /// The source must match the raster size exactly; on mismatch nothing
    /// is written and the previous contents survive.
    pub fn fill_from(&mut self, frame: &[u8]) -> Result<(), RasterError> {
        if frame.len() != self.data.len() {
            return Err(RasterError::SizeMismatch {
                got: frame.len(),
                expected: self.data.len(),
            });
        }
        self.data.copy_from_slice(frame);
        Ok(())
    }

    /// Write a run of bytes at the given byte offset.
    ///
    /// The write is all-or-nothing: if any byte would land outside the
    /// raster, nothing is written.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), RasterError> {
        let end = offset.checked_add(bytes.len()).ok_or(RasterError::OutOfBounds {
            offset,
            len: bytes.len(),
            raster_len: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(RasterError::OutOfBounds {
                offset,
                len: bytes.len(),
                raster_len: self.data.len(),
            });
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy the current contents into a fresh owned buffer.
    ///
    /// This is the "output raster" handed to the rendering side: an owned
    /// copy, so the consumer can hold it for as long as it likes while the
    /// reference raster keeps being patched underneath.
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Raster {
        Raster::new(Dimensions::new(4, 1))
    }

    #[test]
    fn test_new_is_zeroed() {
        let raster = small();
        assert_eq!(raster.len(), 16);
        assert!(raster.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_from_exact() {
        let mut raster = small();
        let frame: Vec<u8> = (0..16).collect();
        raster.fill_from(&frame).unwrap();
        assert_eq!(raster.as_bytes(), &frame[..]);
    }

    #[test]
    fn test_fill_from_wrong_size_keeps_contents() {
        let mut raster = small();
        raster.fill_from(&[7u8; 16]).unwrap();

        let err = raster.fill_from(&[0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            RasterError::SizeMismatch {
                got: 15,
                expected: 16
            }
        );
        assert!(raster.as_bytes().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_write_at() {
        let mut raster = small();
        raster.write_at(4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(&raster.as_bytes()[4..8], &[1, 2, 3, 4]);
        assert_eq!(&raster.as_bytes()[..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_write_at_end_boundary() {
        let mut raster = small();
        raster.write_at(12, &[9; 4]).unwrap();
        assert_eq!(&raster.as_bytes()[12..], &[9; 4]);
    }

    #[test]
    fn test_write_past_end_is_rejected_whole() {
        let mut raster = small();
        let err = raster.write_at(14, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(
            err,
            RasterError::OutOfBounds {
                offset: 14,
                len: 4,
                raster_len: 16
            }
        );
        // Nothing landed, not even the in-bounds prefix.
        assert!(raster.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_at_offset_overflow() {
        let mut raster = small();
        assert!(raster.write_at(usize::MAX, &[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut raster = small();
        raster.write_at(0, &[5; 4]).unwrap();
        let snap = raster.snapshot();
        raster.write_at(0, &[6; 4]).unwrap();

        assert_eq!(&snap[..4], &[5; 4]);
        assert_eq!(&raster.as_bytes()[..4], &[6; 4]);
    }
}
