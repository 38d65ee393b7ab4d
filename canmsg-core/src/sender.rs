//! Sending side: split a message into start/continuation frames and drive
//! them through the link with bounded busy-retry and inter-frame pacing.

use std::time::Duration;

use crate::link::{Delay, LinkDriver, LinkError};
use crate::protocol::{
    CanFrame, InvalidTargetId, TargetId, CONT_PAYLOAD_MAX, MAX_MESSAGE_LEN, START_PAYLOAD_MAX,
};
use crate::wire;

/// Retry and pacing knobs. Deployments disagree on sensible values for
/// both, so they are policy rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendPolicy {
    /// Attempts per frame before a busy link counts as a timeout.
    pub max_attempts: u32,
    /// Wait between attempts while the link reports busy.
    pub retry_delay: Duration,
    /// Wait after each transmitted frame, bounding receiver buffer pressure.
    pub frame_gap: Duration,
}

impl Default for SendPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            retry_delay: Duration::from_millis(5),
            frame_gap: Duration::from_millis(10),
        }
    }
}

/// Error sending a message (rejected up front, retry budget exhausted, or
/// a non-recoverable link fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetId),
    #[error("message of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    MessageTooLong { len: usize },
    #[error("transmit buffers busy after {attempts} attempts")]
    BusyTimeout { attempts: u32 },
    #[error("link error: {0}")]
    Link(#[from] LinkError),
}

/// Transmit one frame, retrying while the link reports busy.
///
/// Exhausting `policy.max_attempts` yields `BusyTimeout`; any link error
/// other than `Busy` is non-recoverable for the current message and is
/// surfaced immediately.
pub fn send_frame(
    link: &mut impl LinkDriver,
    delay: &mut impl Delay,
    frame: &CanFrame,
    policy: &SendPolicy,
) -> Result<(), SendError> {
    for attempt in 0..policy.max_attempts {
        match link.transmit(frame) {
            Ok(()) => return Ok(()),
            Err(LinkError::Busy) => {
                if attempt + 1 < policy.max_attempts {
                    delay.delay(policy.retry_delay);
                }
            }
            Err(e) => return Err(SendError::Link(e)),
        }
    }
    Err(SendError::BusyTimeout {
        attempts: policy.max_attempts,
    })
}

/// Fragments messages onto the bus. Owns the link endpoint and delay source;
/// blocks for the duration of a send, including retry and pacing waits.
pub struct MessageSender<L: LinkDriver, D: Delay> {
    link: L,
    delay: D,
    policy: SendPolicy,
}

impl<L: LinkDriver, D: Delay> MessageSender<L, D> {
    pub fn new(link: L, delay: D) -> Self {
        Self::with_policy(link, delay, SendPolicy::default())
    }

    pub fn with_policy(link: L, delay: D, policy: SendPolicy) -> Self {
        Self {
            link,
            delay,
            policy,
        }
    }

    pub fn policy(&self) -> &SendPolicy {
        &self.policy
    }

    /// Send `data` to `target` as one start frame plus as many continuation
    /// frames as the length requires.
    ///
    /// A zero-length message is valid and produces exactly one start frame.
    /// On failure the message is aborted mid-stream: frames already on the
    /// bus stay there, and the receiver will simply never see the assembly
    /// complete. There is no abort signal on the wire.
    pub fn send(&mut self, target: TargetId, data: &[u8]) -> Result<(), SendError> {
        if data.len() > MAX_MESSAGE_LEN {
            return Err(SendError::MessageTooLong { len: data.len() });
        }
        let bus_id = target.bus_id();
        let total_len = data.len() as u16;

        let first = &data[..data.len().min(START_PAYLOAD_MAX)];
        let start = wire::encode_start(bus_id, total_len, first);
        send_frame(&mut self.link, &mut self.delay, &start, &self.policy)?;
        let mut offset = first.len();
        self.delay.delay(self.policy.frame_gap);

        let mut seq: u8 = 0;
        while offset < data.len() {
            seq = seq.wrapping_add(1);
            let chunk = &data[offset..(offset + CONT_PAYLOAD_MAX).min(data.len())];
            let frame = wire::encode_continuation(bus_id, seq, chunk);
            send_frame(&mut self.link, &mut self.delay, &frame, &self.policy)?;
            offset += chunk.len();
            self.delay.delay(self.policy.frame_gap);
        }
        Ok(())
    }

    /// Like [`send`](Self::send) but validates a raw operator-supplied id.
    pub fn send_to_raw(&mut self, raw_id: u8, data: &[u8]) -> Result<(), SendError> {
        let target = TargetId::new(raw_id)?;
        self.send(target, data)
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
