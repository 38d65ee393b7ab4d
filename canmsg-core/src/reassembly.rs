//! Reassembler: per-node state machine that accumulates decoded frames back
//! into complete messages. One conversation at a time; a fresh start frame
//! supersedes whatever was in progress (last writer wins).

use crate::protocol::FrameKind;

/// Default receive buffer cap. Large buffers cost RAM on small targets.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Why an assembly (or an incoming start frame) was rejected. Each of these
/// is local to one message; none are fatal to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReassemblyError {
    #[error("declared length {len} exceeds receive capacity {capacity}")]
    ExceedsCapacity { len: u16, capacity: usize },
    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u8, got: u8 },
    #[error("continuation frame with no assembly in progress")]
    UnexpectedContinuation,
    #[error("frame shorter than its header")]
    Malformed,
}

/// Outcome of feeding one decoded frame to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Message fully accumulated; the reassembler is idle again.
    Complete(Vec<u8>),
    /// Frame accepted, more continuations expected.
    Assembling,
    /// Frame rejected; any in-progress assembly was dropped.
    Aborted(ReassemblyError),
    /// Unknown frame; no protocol meaning, assembly untouched.
    Ignored,
}

/// Owns the accumulation buffer and conversation state for one receiving
/// node. Single-threaded by design: exactly one instance per node, fed from
/// the host's polling loop.
pub struct Reassembler {
    capacity: usize,
    expected_len: u16,
    next_seq: u8,
    assembling: bool,
    buf: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            expected_len: 0,
            next_seq: 0,
            assembling: false,
            buf: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_assembling(&self) -> bool {
        self.assembling
    }

    pub fn expected_len(&self) -> u16 {
        self.expected_len
    }

    pub fn received_len(&self) -> u16 {
        self.buf.len() as u16
    }

    /// Drop any in-progress assembly and return to idle.
    pub fn reset(&mut self) {
        self.expected_len = 0;
        self.next_seq = 0;
        self.assembling = false;
        self.buf.clear();
    }

    /// Feed one decoded frame. Implements the full transition table:
    /// start frames (re)initialise the conversation, continuations must
    /// arrive in exact sequence, and any validation failure drops the
    /// whole message with no partial recovery.
    pub fn accept(&mut self, kind: FrameKind<'_>) -> FrameOutcome {
        match kind {
            FrameKind::Start { total_len, payload } => self.on_start(total_len, payload),
            FrameKind::Continuation { seq, payload } => self.on_continuation(seq, payload),
            FrameKind::Malformed => {
                self.reset();
                FrameOutcome::Aborted(ReassemblyError::Malformed)
            }
            FrameKind::Unknown { .. } => FrameOutcome::Ignored,
        }
    }

    fn on_start(&mut self, total_len: u16, payload: &[u8]) -> FrameOutcome {
        // Whatever was assembling is superseded, valid new start or not.
        self.reset();
        if total_len as usize > self.capacity {
            return FrameOutcome::Aborted(ReassemblyError::ExceedsCapacity {
                len: total_len,
                capacity: self.capacity,
            });
        }
        self.expected_len = total_len;
        self.next_seq = 1;
        self.assembling = true;
        let take = payload.len().min(total_len as usize);
        self.buf.extend_from_slice(&payload[..take]);
        self.try_complete()
    }

    fn on_continuation(&mut self, seq: u8, payload: &[u8]) -> FrameOutcome {
        if !self.assembling {
            return FrameOutcome::Aborted(ReassemblyError::UnexpectedContinuation);
        }
        if seq != self.next_seq {
            let expected = self.next_seq;
            self.reset();
            return FrameOutcome::Aborted(ReassemblyError::SequenceMismatch { expected, got: seq });
        }
        // Wraps modulo 256 on long messages, in lockstep with the sender.
        self.next_seq = self.next_seq.wrapping_add(1);
        let remaining = self.expected_len as usize - self.buf.len();
        let take = payload.len().min(remaining);
        self.buf.extend_from_slice(&payload[..take]);
        self.try_complete()
    }

    fn try_complete(&mut self) -> FrameOutcome {
        if self.buf.len() >= self.expected_len as usize {
            let message = std::mem::take(&mut self.buf);
            self.reset();
            FrameOutcome::Complete(message)
        } else {
            FrameOutcome::Assembling
        }
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
