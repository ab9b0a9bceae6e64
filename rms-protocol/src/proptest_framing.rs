//! Property tests for record framing.
//!
//! These tests verify that record reassembly is invariant under
//! fragmentation at arbitrary byte boundaries, which is the core
//! correctness requirement for decoding a streaming HTTP body: the
//! transport may hand over one byte or one megabyte at a time and the
//! record sequence must come out identical.

#[cfg(test)]
mod tests {
    use crate::encode::encode_record;
    use crate::framer::RecordFramer;
    use crate::record::{FrameRecord, FrameType};
    use proptest::prelude::*;

    const RASTER_LEN: usize = 4096;

    fn arb_frame_type() -> impl Strategy<Value = FrameType> {
        prop_oneof![
            Just(FrameType::RawFull),
            Just(FrameType::Delta),
            Just(FrameType::GzipFull),
            Just(FrameType::ZstdFull),
        ]
    }

    fn arb_record() -> impl Strategy<Value = (FrameType, Vec<u8>)> {
        (arb_frame_type(), prop::collection::vec(any::<u8>(), 0..512))
    }

    /// Serialize records and decode them with the given chunking pattern.
    fn decode_chunked(wire: &[u8], chunk_sizes: &[usize]) -> Vec<FrameRecord> {
        let mut framer = RecordFramer::new(RASTER_LEN);
        let mut out = Vec::new();
        let mut pos = 0;

        let feed = |framer: &mut RecordFramer, chunk: &[u8], out: &mut Vec<FrameRecord>| {
            if chunk.is_empty() {
                return;
            }
            framer.push_chunk(chunk);
            while let Some(rec) = framer.next_record().expect("valid wire bytes") {
                out.push(rec);
            }
        };

        for &size in chunk_sizes {
            let end = (pos + size.max(1)).min(wire.len());
            feed(&mut framer, &wire[pos..end], &mut out);
            pos = end;
            if pos == wire.len() {
                break;
            }
        }
        // Whatever the chunk plan did not cover arrives as one final chunk.
        feed(&mut framer, &wire[pos..], &mut out);
        out
    }

    proptest! {
        #[test]
        fn framing_is_chunking_invariant(
            records in prop::collection::vec(arb_record(), 1..8),
            chunk_sizes in prop::collection::vec(1usize..64, 0..128),
        ) {
            let mut wire = Vec::new();
            for (ft, payload) in &records {
                wire.extend_from_slice(&encode_record(*ft, payload));
            }

            let all_at_once = decode_chunked(&wire, &[wire.len()]);
            let fragmented = decode_chunked(&wire, &chunk_sizes);
            let byte_at_a_time = decode_chunked(&wire, &vec![1; wire.len()]);

            prop_assert_eq!(all_at_once.len(), records.len());
            for (rec, (ft, payload)) in all_at_once.iter().zip(&records) {
                prop_assert_eq!(rec.frame_type, *ft);
                prop_assert_eq!(&rec.payload[..], &payload[..]);
            }
            prop_assert_eq!(&all_at_once, &fragmented);
            prop_assert_eq!(&all_at_once, &byte_at_a_time);
        }

        #[test]
        fn trailing_partial_record_stays_pending(
            (ft, payload) in arb_record(),
            cut in 1usize..4,
        ) {
            let wire = encode_record(ft, &payload);
            let keep = wire.len() - cut.min(wire.len() - 1);

            let mut framer = RecordFramer::new(RASTER_LEN);
            framer.push_chunk(&wire[..keep]);
            prop_assert!(framer.next_record().unwrap().is_none());
            prop_assert_eq!(framer.pending_len(), keep);

            framer.push_chunk(&wire[keep..]);
            let rec = framer.next_record().unwrap().unwrap();
            prop_assert_eq!(rec.frame_type, ft);
            prop_assert_eq!(&rec.payload[..], &payload[..]);
        }
    }
}
