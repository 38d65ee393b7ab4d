//! Host-driven receiver: the host owns the link and the polling loop, the
//! node owns the conversation state and turns raw frames into events.

use crate::link::LinkDriver;
use crate::protocol::TargetId;
use crate::reassembly::{FrameOutcome, Reassembler, ReassemblyError};
use crate::wire;

/// What one poll step produced, for the host to report or act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxEvent {
    /// A message completed; conversation is over.
    Message(Vec<u8>),
    /// A frame was accepted; assembly continues.
    Progress { received: u16, expected: u16 },
    /// A message was dropped. Local to that message, never fatal.
    Dropped(ReassemblyError),
    /// Frame addressed to a different node; filtered at the id boundary.
    Foreign { id: u16 },
    /// Frame with an unrecognised magic byte; logged and ignored.
    UnknownFrame { magic: u8 },
}

/// One receiving endpoint on the bus. Tracks a single conversation at a
/// time: a second sender's start frame supersedes whatever is in progress.
pub struct ReceiverNode {
    self_id: TargetId,
    reassembler: Reassembler,
}

impl ReceiverNode {
    pub fn new(self_id: TargetId) -> Self {
        Self {
            self_id,
            reassembler: Reassembler::new(),
        }
    }

    pub fn with_reassembler(self_id: TargetId, reassembler: Reassembler) -> Self {
        Self {
            self_id,
            reassembler,
        }
    }

    pub fn self_id(&self) -> TargetId {
        self.self_id
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// One poll step: read at most one frame from the link, filter by our
    /// bus id, decode and feed the reassembler. `None` when the link had
    /// nothing; the host decides how long to idle between polls.
    pub fn poll(&mut self, link: &mut impl LinkDriver) -> Option<RxEvent> {
        let frame = link.receive()?;
        if frame.id != self.self_id.bus_id() {
            return Some(RxEvent::Foreign { id: frame.id });
        }
        let kind = wire::decode(&frame);
        let event = match self.reassembler.accept(kind) {
            FrameOutcome::Complete(message) => RxEvent::Message(message),
            FrameOutcome::Assembling => RxEvent::Progress {
                received: self.reassembler.received_len(),
                expected: self.reassembler.expected_len(),
            },
            FrameOutcome::Aborted(err) => RxEvent::Dropped(err),
            FrameOutcome::Ignored => match kind {
                crate::protocol::FrameKind::Unknown { magic } => RxEvent::UnknownFrame { magic },
                _ => return None,
            },
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LoopbackBus;
    use crate::link::{Delay, LinkDriver};
    use crate::protocol::CanFrame;
    use crate::sender::MessageSender;

    struct NoDelay;

    impl Delay for NoDelay {
        fn delay(&mut self, _d: std::time::Duration) {}
    }

    fn target(raw: u8) -> TargetId {
        TargetId::new(raw).unwrap()
    }

    /// Drive every pending bus frame through the node, returning completed
    /// messages and drop events.
    fn drain(
        node: &mut ReceiverNode,
        link: &mut impl LinkDriver,
    ) -> (Vec<Vec<u8>>, Vec<ReassemblyError>) {
        let mut messages = Vec::new();
        let mut drops = Vec::new();
        while let Some(event) = node.poll(link) {
            match event {
                RxEvent::Message(m) => messages.push(m),
                RxEvent::Dropped(e) => drops.push(e),
                _ => {}
            }
        }
        (messages, drops)
    }

    #[test]
    fn round_trip_various_lengths() {
        for len in [0usize, 1, 4, 10, 2048] {
            let bus = LoopbackBus::new();
            let mut sender = MessageSender::new(bus.endpoint(), NoDelay);
            let mut rx_link = bus.endpoint();
            let mut node = ReceiverNode::new(target(2));

            let data: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            sender.send(target(2), &data).unwrap();

            let (messages, drops) = drain(&mut node, &mut rx_link);
            assert!(drops.is_empty(), "len {len}: unexpected drops {drops:?}");
            assert_eq!(messages.len(), 1, "len {len}");
            assert_eq!(messages[0], data, "len {len}");
        }
    }

    #[test]
    fn filters_frames_for_other_targets() {
        let bus = LoopbackBus::new();
        let mut sender = MessageSender::new(bus.endpoint(), NoDelay);
        let mut rx_link = bus.endpoint();
        let mut node = ReceiverNode::new(target(2));

        sender.send(target(3), b"not for us").unwrap();
        let mut saw_foreign = false;
        while let Some(event) = node.poll(&mut rx_link) {
            match event {
                RxEvent::Foreign { id } => {
                    assert_eq!(id, 0x203);
                    saw_foreign = true;
                }
                other => panic!("expected Foreign, got {other:?}"),
            }
        }
        assert!(saw_foreign);
        assert!(!node.reassembler().is_assembling());
    }

    #[test]
    fn unknown_magic_reported_and_ignored() {
        let bus = LoopbackBus::new();
        let mut tx = bus.endpoint();
        let mut rx_link = bus.endpoint();
        let mut node = ReceiverNode::new(target(1));

        let mut junk = CanFrame::new(0x201);
        junk.data[0] = 0x55;
        junk.dlc = 2;
        tx.transmit(&junk).unwrap();

        assert_eq!(
            node.poll(&mut rx_link),
            Some(RxEvent::UnknownFrame { magic: 0x55 })
        );
        assert!(!node.reassembler().is_assembling());
    }

    #[test]
    fn back_to_back_messages_share_the_reassembler() {
        let bus = LoopbackBus::new();
        let mut sender = MessageSender::new(bus.endpoint(), NoDelay);
        let mut rx_link = bus.endpoint();
        let mut node = ReceiverNode::new(target(4));

        sender.send(target(4), b"first message").unwrap();
        sender.send(target(4), b"second, longer message body").unwrap();

        let (messages, drops) = drain(&mut node, &mut rx_link);
        assert!(drops.is_empty());
        assert_eq!(
            messages,
            vec![
                b"first message".to_vec(),
                b"second, longer message body".to_vec()
            ]
        );
    }

    #[test]
    fn progress_events_during_assembly() {
        let bus = LoopbackBus::new();
        let mut sender = MessageSender::new(bus.endpoint(), NoDelay);
        let mut rx_link = bus.endpoint();
        let mut node = ReceiverNode::new(target(1));

        sender.send(target(1), &[7u8; 10]).unwrap();

        assert_eq!(
            node.poll(&mut rx_link),
            Some(RxEvent::Progress {
                received: 4,
                expected: 10
            })
        );
        assert_eq!(node.poll(&mut rx_link), Some(RxEvent::Message(vec![7u8; 10])));
        assert_eq!(node.poll(&mut rx_link), None);
    }
}
