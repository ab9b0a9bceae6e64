//! The persistent reference raster.
//!
//! This crate owns the single mutable pixel buffer the stream decoder
//! patches: the "last known good" image. The raster lives for exactly one
//! stream connection, is zero-initialized, and is mutated in place by every
//! full or delta frame. Consumers never see the live buffer; they receive
//! owned snapshots.

mod raster;

pub use raster::{Raster, RasterError};
