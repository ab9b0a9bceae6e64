//! Delta-frame patch application.
//!
//! A delta payload is a sequence of runs applied left to right with a
//! running byte cursor: each run advances the cursor by its relative
//! offset, copies `length * 4` bytes into the raster, then leaves the
//! cursor at the end of the written range for the next run. Offsets are
//! deltas from the cursor, never absolute positions.
//!
//! Application is best-effort. A truncated run or a run that would write
//! past the raster end stops processing at that run; everything applied
//! before it stays applied. The caller emits the raster regardless — a
//! partially patched image beats a stale one, and the next full frame
//! resynchronizes.

use crate::decoder::DecodeFault;
use rms_protocol::{RunError, RunReader};
use rms_raster::{Raster, RasterError};

/// Apply a delta payload to the raster.
///
/// Returns the number of runs applied and the fault that stopped
/// processing, if any.
pub fn apply_delta(payload: &[u8], raster: &mut Raster) -> (usize, Option<DecodeFault>) {
    let mut cursor = 0usize;
    let mut applied = 0usize;

    for run in RunReader::new(payload) {
        let run = match run {
            Ok(run) => run,
            Err(RunError::TruncatedHeader { at })
            | Err(RunError::TruncatedData { at, .. }) => {
                return (applied, Some(DecodeFault::TruncatedDelta { at }));
            }
        };

        // `checked_add` guards the cursor itself: a hostile 24-bit offset
        // cannot overflow usize, but repeated offsets can still run the
        // cursor far past the raster, which the write check catches.
        cursor = match cursor.checked_add(run.relative_offset) {
            Some(c) => c,
            None => {
                return (
                    applied,
                    Some(DecodeFault::BoundsViolation {
                        offset: cursor,
                        len: run.data.len(),
                        raster_len: raster.len(),
                    }),
                );
            }
        };

        match raster.write_at(cursor, run.data) {
            Ok(()) => {
                cursor += run.data.len();
                applied += 1;
            }
            Err(RasterError::OutOfBounds {
                offset,
                len,
                raster_len,
            }) => {
                return (
                    applied,
                    Some(DecodeFault::BoundsViolation {
                        offset,
                        len,
                        raster_len,
                    }),
                );
            }
            Err(RasterError::SizeMismatch { .. }) => {
                unreachable!("write_at only bounds-checks")
            }
        }
    }

    (applied, None)
}
