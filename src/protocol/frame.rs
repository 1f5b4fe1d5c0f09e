//! Fixed-size frames exchanged with nooLite USB adapters.
//!
//! Both directions use 8-byte HID feature reports:
//! ```text
//! command (host -> adapter)
//! ┌────────┬─────────┬────────┬──────────┬─────────┬──────────────┐
//! │  mode  │ command │ format │ reserved │ channel │ payload[0..3]│
//! │ byte 0 │ byte 1  │ byte 2 │  byte 3  │ byte 4  │  bytes 5..7  │
//! └────────┴─────────┴────────┴──────────┴─────────┴──────────────┘
//!
//! notification (adapter -> host)
//! ┌────────┬─────────┬─────────┬────────┬──────────────┐
//! │ toggle │ channel │ command │ format │ payload[0..4]│
//! │ byte 0 │ byte 1  │ byte 2  │ byte 3 │  bytes 4..7  │
//! └────────┴─────────┴─────────┴────────┴──────────────┘
//! ```
//! Channels are zero-based on the wire.

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::protocol::ReceiverRequest;
use crate::types::Command;

/// Size of every frame in bytes.
pub const FRAME_SIZE: usize = 8;

/// Mode header of command frames (bits 6-7 hold the radio repeat count).
pub const MODE_HEADER: u8 = 0x30;

/// Maximum radio repeat count encoded in the mode header.
pub const MAX_RADIO_REPEATS: u8 = 3;

/// Mask of the toggle counter in notification byte 0.
pub const TOGGLE_MASK: u8 = 0x3F;

/// HID `SET_REPORT` request code used for all transfers.
pub const HID_REQUEST: u8 = 0x09;

/// Feature report, report id 0.
pub const HID_REPORT_VALUE: u16 = 0x0300;

/// Interface index of the report transfers.
pub const HID_REPORT_INDEX: u16 = 0;

/// An encoded command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_SIZE]);

impl CommandFrame {
    /// Encodes a command for an adapter with `available` channels.
    ///
    /// Level commands put the level in byte 5; other payload-carrying
    /// commands copy the first three payload bytes. Fails with
    /// `ChannelOutOfRange` before anything is built.
    pub fn encode(command: &Command, available: u8, radio_repeats: u8) -> Result<Self> {
        let channel = command.wire_channel(available)?;

        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        buf.put_u8(MODE_HEADER | (radio_repeats.min(MAX_RADIO_REPEATS) << 6));
        buf.put_u8(command.kind.code());
        buf.put_u8(command.format.map_or(0, u8::from));
        buf.put_u8(0);
        buf.put_u8(channel);
        match command.level {
            Some(level) => buf.put_slice(&[level, 0, 0]),
            None => buf.put_slice(&command.data[..3]),
        }

        Ok(Self::from_slice(&buf))
    }

    /// Builds a service request for a receiver adapter.
    #[must_use]
    pub fn receiver_request(request: ReceiverRequest, wire_channel: u8) -> Self {
        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        buf.put_u8(request.into());
        buf.put_u8(wire_channel);
        buf.put_bytes(0, FRAME_SIZE - 2);
        Self::from_slice(&buf)
    }

    fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes.copy_from_slice(data);
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// Command code (byte 1).
    #[must_use]
    pub const fn command_code(&self) -> u8 {
        self.0[1]
    }

    /// Zero-based channel (byte 4).
    #[must_use]
    pub const fn wire_channel(&self) -> u8 {
        self.0[4]
    }
}

/// A raw notification frame read from a receiver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationFrame([u8; FRAME_SIZE]);

impl NotificationFrame {
    /// Assembles a frame from its fields.
    #[must_use]
    pub const fn new(toggle: u8, wire_channel: u8, command: u8, format: u8, payload: [u8; 4]) -> Self {
        Self([
            toggle & TOGGLE_MASK,
            wire_channel,
            command,
            format,
            payload[0],
            payload[1],
            payload[2],
            payload[3],
        ])
    }

    /// Wraps a buffer that must be exactly one frame long.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, FrameError> {
        let bytes: [u8; FRAME_SIZE] = data.try_into().map_err(|_| FrameError::WrongLength {
            expected: FRAME_SIZE,
            got: data.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// Rolling 6-bit counter that changes with every new event.
    #[must_use]
    pub const fn toggle(&self) -> u8 {
        self.0[0] & TOGGLE_MASK
    }

    /// Zero-based channel.
    #[must_use]
    pub const fn wire_channel(&self) -> u8 {
        self.0[1]
    }

    /// One-based channel.
    #[must_use]
    pub const fn channel(&self) -> u8 {
        self.0[1].wrapping_add(1)
    }

    /// Command code.
    #[must_use]
    pub const fn command_code(&self) -> u8 {
        self.0[2]
    }

    /// Format tag.
    #[must_use]
    pub const fn format_code(&self) -> u8 {
        self.0[3]
    }

    /// Payload bytes 4..7.
    #[must_use]
    pub const fn payload(&self) -> [u8; 4] {
        [self.0[4], self.0[5], self.0[6], self.0[7]]
    }
}

impl From<[u8; FRAME_SIZE]> for NotificationFrame {
    fn from(bytes: [u8; FRAME_SIZE]) -> Self {
        Self(bytes)
    }
}
