//! Full-frame handling: raw, gzip-compressed, and zstd-compressed.
//!
//! A full frame carries the entire raster. Raw payloads (frame type 0x00)
//! are the raster bytes themselves; gzip (0x02) and zstd (0x03) payloads
//! decompress to them. All three paths end in the same exact-size check and
//! wholesale overwrite of the reference raster.
//!
//! Three encodings coexist because producer and consumer versions drift
//! independently in the field; none of them can be retired from the
//! decoder.

use crate::decoder::DecodeFault;
use rms_raster::{Raster, RasterError};
use std::io::Read;

/// Compression applied to a full-frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Payload bytes are the raster (deprecated wire type 0x00).
    None,
    /// Gzip member, one per frame (legacy wire type 0x02).
    Gzip,
    /// Zstd frame (current wire type 0x03).
    Zstd,
}

/// Materialize a full frame into the raster.
///
/// On success the raster is completely overwritten. On any fault the
/// raster keeps its previous contents; the caller drops the frame and the
/// stream continues.
pub fn decode_full_frame(
    payload: &[u8],
    compression: Compression,
    raster: &mut Raster,
) -> Result<(), DecodeFault> {
    match compression {
        Compression::None => fill(payload, raster),
        Compression::Gzip => {
            let expanded = decompress_gzip(payload, raster.len())?;
            fill(&expanded, raster)
        }
        Compression::Zstd => {
            let expanded = decompress_zstd(payload)?;
            fill(&expanded, raster)
        }
    }
}

fn fill(frame: &[u8], raster: &mut Raster) -> Result<(), DecodeFault> {
    raster.fill_from(frame).map_err(|e| match e {
        RasterError::SizeMismatch { got, expected } => {
            DecodeFault::SizeMismatch { got, expected }
        }
        RasterError::OutOfBounds { .. } => unreachable!("fill_from only size-checks"),
    })
}

fn decompress_gzip(payload: &[u8], expected_len: usize) -> Result<Vec<u8>, DecodeFault> {
    let mut out = Vec::with_capacity(expected_len);
    flate2::read::GzDecoder::new(payload)
        .read_to_end(&mut out)
        .map_err(|e| DecodeFault::Decompression {
            codec: "gzip",
            detail: e.to_string(),
        })?;
    Ok(out)
}

fn decompress_zstd(payload: &[u8]) -> Result<Vec<u8>, DecodeFault> {
    zstd::stream::decode_all(payload).map_err(|e| DecodeFault::Decompression {
        codec: "zstd",
        detail: e.to_string(),
    })
}
