//! Segmented messaging over classic CAN: arbitrary-length byte messages are
//! split across 8-byte frames and reassembled on the receiving side.
//! Host-driven: no I/O and no sleeping in the core; the host supplies the
//! link driver and delay source.

pub mod bus;
pub mod link;
pub mod node;
pub mod protocol;
pub mod reassembly;
pub mod sender;
pub mod wire;

pub use bus::{LoopbackBus, LoopbackEndpoint};
pub use link::{Bitrate, Delay, LinkDriver, LinkError, OperatingMode, OscillatorFreq, ThreadDelay};
pub use node::{ReceiverNode, RxEvent};
pub use protocol::{CanFrame, FrameKind, InvalidTargetId, TargetId, CAN_BASE_ID, MAX_MESSAGE_LEN};
pub use reassembly::{FrameOutcome, Reassembler, ReassemblyError, DEFAULT_CAPACITY};
pub use sender::{send_frame, MessageSender, SendError, SendPolicy};
pub use wire::{decode, encode_continuation, encode_start};
