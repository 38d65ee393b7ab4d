//! Frame codec: pack start/continuation frames into the 8-byte CAN payload
//! and decode received frames back into [`FrameKind`].

use crate::protocol::{
    CanFrame, FrameKind, CONT_HEADER_LEN, CONT_PAYLOAD_MAX, MAGIC_CONT, MAGIC_START,
    START_HEADER_LEN, START_PAYLOAD_MAX,
};

/// Encode a start frame: `[0xAA, len_lo, len_hi, 0, payload..]`.
///
/// Panics if `first_chunk` exceeds 4 bytes; callers slice before encoding,
/// so a violation is a programmer error rather than a runtime condition.
pub fn encode_start(bus_id: u16, total_len: u16, first_chunk: &[u8]) -> CanFrame {
    assert!(
        first_chunk.len() <= START_PAYLOAD_MAX,
        "start frame payload limited to {START_PAYLOAD_MAX} bytes"
    );
    let mut frame = CanFrame::new(bus_id);
    frame.data[0] = MAGIC_START;
    frame.data[1] = (total_len & 0xFF) as u8;
    frame.data[2] = (total_len >> 8) as u8;
    frame.data[3] = 0; // sequence placeholder
    frame.data[START_HEADER_LEN..START_HEADER_LEN + first_chunk.len()].copy_from_slice(first_chunk);
    frame.dlc = (START_HEADER_LEN + first_chunk.len()) as u8;
    frame
}

/// Encode a continuation frame: `[0xCC, seq, payload..]`.
///
/// Sequence numbers start at 1 and wrap modulo 256 on long messages; sender
/// and receiver advance in lockstep through the wrap, so 0 is a legal value
/// here even though a fresh conversation never opens with it.
///
/// Panics if `chunk` exceeds 6 bytes.
pub fn encode_continuation(bus_id: u16, seq: u8, chunk: &[u8]) -> CanFrame {
    assert!(
        chunk.len() <= CONT_PAYLOAD_MAX,
        "continuation frame payload limited to {CONT_PAYLOAD_MAX} bytes"
    );
    let mut frame = CanFrame::new(bus_id);
    frame.data[0] = MAGIC_CONT;
    frame.data[1] = seq;
    frame.data[CONT_HEADER_LEN..CONT_HEADER_LEN + chunk.len()].copy_from_slice(chunk);
    frame.dlc = (CONT_HEADER_LEN + chunk.len()) as u8;
    frame
}

/// Decode a frame by its leading magic byte. Total: never fails.
///
/// Unrecognised magics decode as `Unknown`; a recognised magic whose frame is
/// shorter than the header decodes as `Malformed`. An empty frame has no
/// leading byte to inspect and is treated as `Unknown`.
pub fn decode(frame: &CanFrame) -> FrameKind<'_> {
    let bytes = frame.payload();
    let Some(&magic) = bytes.first() else {
        return FrameKind::Unknown { magic: 0 };
    };
    match magic {
        MAGIC_START => {
            if bytes.len() < START_HEADER_LEN {
                return FrameKind::Malformed;
            }
            let total_len = bytes[1] as u16 | ((bytes[2] as u16) << 8);
            FrameKind::Start {
                total_len,
                payload: &bytes[START_HEADER_LEN..],
            }
        }
        MAGIC_CONT => {
            if bytes.len() < CONT_HEADER_LEN {
                return FrameKind::Malformed;
            }
            FrameKind::Continuation {
                seq: bytes[1],
                payload: &bytes[CONT_HEADER_LEN..],
            }
        }
        magic => FrameKind::Unknown { magic },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_layout() {
        let frame = encode_start(0x203, 0x1234, &[b'a', b'b']);
        assert_eq!(frame.id, 0x203);
        assert_eq!(frame.dlc, 6);
        assert_eq!(&frame.data[..6], &[MAGIC_START, 0x34, 0x12, 0, b'a', b'b']);
    }

    #[test]
    fn start_empty_payload() {
        let frame = encode_start(0x201, 0, &[]);
        assert_eq!(frame.dlc, 4);
        assert_eq!(&frame.data[..4], &[MAGIC_START, 0, 0, 0]);
    }

    #[test]
    fn continuation_layout() {
        let frame = encode_continuation(0x201, 7, b"hello!");
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.data[0], MAGIC_CONT);
        assert_eq!(frame.data[1], 7);
        assert_eq!(&frame.data[2..8], b"hello!");
    }

    #[test]
    fn roundtrip_start() {
        let frame = encode_start(0x205, 300, &[1, 2, 3, 4]);
        match decode(&frame) {
            FrameKind::Start { total_len, payload } => {
                assert_eq!(total_len, 300);
                assert_eq!(payload, &[1, 2, 3, 4]);
            }
            other => panic!("expected Start, got {other:?}"),
        }
    }

    #[test]
    fn roundtrip_continuation() {
        let frame = encode_continuation(0x205, 1, &[9]);
        match decode(&frame) {
            FrameKind::Continuation { seq, payload } => {
                assert_eq!(seq, 1);
                assert_eq!(payload, &[9]);
            }
            other => panic!("expected Continuation, got {other:?}"),
        }
    }

    #[test]
    fn unknown_magic() {
        let mut frame = CanFrame::new(0x201);
        frame.data[0] = 0x42;
        frame.dlc = 3;
        assert_eq!(decode(&frame), FrameKind::Unknown { magic: 0x42 });
    }

    #[test]
    fn empty_frame_is_unknown() {
        let frame = CanFrame::new(0x201);
        assert!(matches!(decode(&frame), FrameKind::Unknown { .. }));
    }

    #[test]
    fn short_start_is_malformed() {
        let mut frame = CanFrame::new(0x201);
        frame.data[0] = MAGIC_START;
        frame.dlc = 3;
        assert_eq!(decode(&frame), FrameKind::Malformed);
    }

    #[test]
    fn short_continuation_is_malformed() {
        let mut frame = CanFrame::new(0x201);
        frame.data[0] = MAGIC_CONT;
        frame.dlc = 1;
        assert_eq!(decode(&frame), FrameKind::Malformed);
    }

    #[test]
    #[should_panic]
    fn oversized_start_chunk_panics() {
        encode_start(0x201, 10, &[0; 5]);
    }

    #[test]
    #[should_panic]
    fn oversized_continuation_chunk_panics() {
        encode_continuation(0x201, 1, &[0; 7]);
    }
}
