//! In-memory loopback bus: a [`LinkDriver`] double for tests and for running
//! a sender and receiver on one machine without controller hardware, much
//! like a controller's loopback operating mode.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::link::{Bitrate, LinkDriver, LinkError, OperatingMode, OscillatorFreq};
use crate::protocol::CanFrame;

#[derive(Default)]
struct BusInner {
    /// One inbound FIFO per endpoint, indexed by endpoint id.
    queues: Vec<VecDeque<CanFrame>>,
}

/// Shared medium. Every transmitted frame is delivered to every endpoint
/// except the transmitter, like a wire with no filtering.
#[derive(Clone, Default)]
pub struct LoopbackBus {
    inner: Arc<Mutex<BusInner>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint to the bus.
    pub fn endpoint(&self) -> LoopbackEndpoint {
        let mut inner = self.inner.lock().expect("bus lock poisoned");
        inner.queues.push(VecDeque::new());
        LoopbackEndpoint {
            bus: self.inner.clone(),
            index: inner.queues.len() - 1,
            busy_remaining: 0,
            fail_next: None,
        }
    }
}

/// One attachment point on the loopback bus. Supports fault injection so
/// tests can script busy buffers and wire faults.
pub struct LoopbackEndpoint {
    bus: Arc<Mutex<BusInner>>,
    index: usize,
    busy_remaining: u32,
    fail_next: Option<LinkError>,
}

impl LoopbackEndpoint {
    /// Make the next `n` transmits report `Busy`.
    pub fn inject_busy(&mut self, n: u32) {
        self.busy_remaining = n;
    }

    /// Make the next transmit fail with `err` (once).
    pub fn inject_failure(&mut self, err: LinkError) {
        self.fail_next = Some(err);
    }

    /// Frames waiting in this endpoint's inbound queue.
    pub fn pending(&self) -> usize {
        let inner = self.bus.lock().expect("bus lock poisoned");
        inner.queues[self.index].len()
    }
}

impl LinkDriver for LoopbackEndpoint {
    fn configure(&mut self, _bitrate: Bitrate, _osc: OscillatorFreq) -> Result<(), LinkError> {
        Ok(())
    }

    fn set_operating_mode(&mut self, _mode: OperatingMode) -> Result<(), LinkError> {
        Ok(())
    }

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), LinkError> {
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return Err(LinkError::Busy);
        }
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        let mut inner = self.bus.lock().expect("bus lock poisoned");
        for (i, queue) in inner.queues.iter_mut().enumerate() {
            if i != self.index {
                queue.push_back(*frame);
            }
        }
        Ok(())
    }

    fn receive(&mut self) -> Option<CanFrame> {
        let mut inner = self.bus.lock().expect("bus lock poisoned");
        inner.queues[self.index].pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u16, byte: u8) -> CanFrame {
        let mut f = CanFrame::new(id);
        f.data[0] = byte;
        f.dlc = 1;
        f
    }

    #[test]
    fn delivers_to_all_other_endpoints() {
        let bus = LoopbackBus::new();
        let mut a = bus.endpoint();
        let mut b = bus.endpoint();
        let mut c = bus.endpoint();

        a.transmit(&frame(0x201, 1)).unwrap();

        assert!(a.receive().is_none(), "transmitter must not hear itself");
        assert_eq!(b.receive().unwrap().data[0], 1);
        assert_eq!(c.receive().unwrap().data[0], 1);
        assert!(b.receive().is_none());
    }

    #[test]
    fn preserves_frame_order() {
        let bus = LoopbackBus::new();
        let mut tx = bus.endpoint();
        let mut rx = bus.endpoint();

        for i in 0..5 {
            tx.transmit(&frame(0x201, i)).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.receive().unwrap().data[0], i);
        }
    }

    #[test]
    fn injected_busy_then_recovers() {
        let bus = LoopbackBus::new();
        let mut tx = bus.endpoint();
        let mut rx = bus.endpoint();

        tx.inject_busy(2);
        assert_eq!(tx.transmit(&frame(0x201, 1)), Err(LinkError::Busy));
        assert_eq!(tx.transmit(&frame(0x201, 1)), Err(LinkError::Busy));
        tx.transmit(&frame(0x201, 1)).unwrap();
        assert_eq!(rx.pending(), 1);
    }

    #[test]
    fn injected_failure_fires_once() {
        let bus = LoopbackBus::new();
        let mut tx = bus.endpoint();
        let _rx = bus.endpoint();

        tx.inject_failure(LinkError::TransmitFailure);
        assert_eq!(
            tx.transmit(&frame(0x201, 1)),
            Err(LinkError::TransmitFailure)
        );
        tx.transmit(&frame(0x201, 1)).unwrap();
    }
}
