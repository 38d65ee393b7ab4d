//! Link driver boundary: the bus controller is an external collaborator,
//! consumed through a trait so the core never touches hardware or sleeps.

use std::time::Duration;

use crate::protocol::CanFrame;

/// Errors surfaced by the bus controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// All transmit buffers occupied; transient, worth retrying.
    #[error("all transmit buffers busy")]
    Busy,
    /// Controller initialization/configuration failed.
    #[error("controller initialization failed")]
    InitFailure,
    /// Frame transmission failed on the wire.
    #[error("transmission failed")]
    TransmitFailure,
}

/// Bus bit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitrate {
    Kbps125,
    Kbps250,
    Kbps500,
}

/// Controller oscillator frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorFreq {
    Mhz8,
    Mhz16,
}

/// Controller operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Transmit and receive on the wire.
    Normal,
    /// Frames loop back internally; no bus required.
    Loopback,
}

/// Blocking send / polling receive primitives of the bus controller.
pub trait LinkDriver {
    fn configure(&mut self, bitrate: Bitrate, osc: OscillatorFreq) -> Result<(), LinkError>;

    fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), LinkError>;

    /// Hand one frame to the controller. Blocks until accepted or failed.
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), LinkError>;

    /// Non-blocking poll for one received frame.
    fn receive(&mut self) -> Option<CanFrame>;
}

/// Pacing and retry waits go through this seam; the core itself never sleeps.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// [`Delay`] backed by `std::thread::sleep`, for host binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
