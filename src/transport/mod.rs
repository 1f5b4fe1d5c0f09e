//! Transport layer for nooLite communication.
//!
//! This module provides the abstraction for the two ways commands reach the
//! radio: USB HID transmitter adapters and the Ethernet gateway.

pub mod http;
pub mod usb;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::protocol::FRAME_SIZE;
use crate::types::Command;

/// Trait for command transmitters.
///
/// Transport failures are logged and reported as `false`; they never surface
/// as errors.
pub trait Transmitter: Send + Sync {
    /// Number of channels the adapter addresses.
    fn available_channels(&self) -> u8;

    /// Sends a command, returning true on success.
    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, bool>;
}

/// An open HID handle that exchanges 8-byte reports.
///
/// Calls block for at most the configured transfer timeout.
pub trait HidDevice: Send + 'static {
    /// Writes one frame with a `SET_REPORT` control transfer.
    fn write_frame(&mut self, frame: &[u8; FRAME_SIZE]) -> Result<()>;

    /// Reads the adapter's current frame.
    fn read_frame(&mut self) -> Result<[u8; FRAME_SIZE]>;
}

/// Opens HID handles on demand.
pub trait HidConnector: Send + Sync + 'static {
    /// Handle type produced by this connector.
    type Device: HidDevice;

    /// Opens and claims the device.
    fn open(&self) -> Result<Self::Device>;
}

pub use http::{GatewayConfig, HttpGateway};
pub use usb::{TransmitterConfig, UsbConnector, UsbHidDevice, UsbTransmitter};
