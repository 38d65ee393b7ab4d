//! Wire protocol: frame model, magics, addressing constants.

use thiserror::Error;

/// Base bus identifier for targeted messages. Target `t` listens on `0x200 + t`.
pub const CAN_BASE_ID: u16 = 0x200;

/// Smallest valid target id (inclusive).
pub const TARGET_ID_MIN: u8 = 1;
/// Largest valid target id (inclusive).
pub const TARGET_ID_MAX: u8 = 5;

/// Leading byte of a start frame.
pub const MAGIC_START: u8 = 0xAA;
/// Leading byte of a continuation frame.
pub const MAGIC_CONT: u8 = 0xCC;

/// Classic CAN 2.0 payload limit in bytes.
pub const FRAME_CAPACITY: usize = 8;

/// Start frame header: magic, length low, length high, sequence placeholder.
pub const START_HEADER_LEN: usize = 4;
/// Continuation frame header: magic, sequence.
pub const CONT_HEADER_LEN: usize = 2;

/// Payload bytes a start frame can carry after its header.
pub const START_PAYLOAD_MAX: usize = FRAME_CAPACITY - START_HEADER_LEN;
/// Payload bytes a continuation frame can carry after its header.
pub const CONT_PAYLOAD_MAX: usize = FRAME_CAPACITY - CONT_HEADER_LEN;

/// Longest message the length field (u16) can declare.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// One CAN 2.0 data frame: 11-bit identifier, data length code, payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    pub id: u16,
    pub dlc: u8,
    pub data: [u8; FRAME_CAPACITY],
}

impl CanFrame {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            dlc: 0,
            data: [0; FRAME_CAPACITY],
        }
    }

    /// The `dlc` leading bytes of `data`. A dlc above 8 is clamped.
    pub fn payload(&self) -> &[u8] {
        let n = (self.dlc as usize).min(FRAME_CAPACITY);
        &self.data[..n]
    }
}

/// Validated receiver endpoint id (1..=5), encoded into the bus id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u8);

/// Target id outside the closed 1..=5 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("target id {0} out of range {TARGET_ID_MIN}..={TARGET_ID_MAX}")]
pub struct InvalidTargetId(pub u8);

impl TargetId {
    pub fn new(raw: u8) -> Result<Self, InvalidTargetId> {
        if (TARGET_ID_MIN..=TARGET_ID_MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(InvalidTargetId(raw))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Bus identifier this target listens on.
    pub fn bus_id(self) -> u16 {
        CAN_BASE_ID + self.0 as u16
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded view of a received frame. Borrows the payload from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind<'a> {
    /// Opens a conversation: declared total message length plus the first chunk.
    Start { total_len: u16, payload: &'a [u8] },
    /// Carries a subsequent chunk with its 1-based sequence number.
    Continuation { seq: u8, payload: &'a [u8] },
    /// Magic recognised but the frame is shorter than its header.
    Malformed,
    /// Leading byte matches neither magic; carries no protocol meaning.
    Unknown { magic: u8 },
}
