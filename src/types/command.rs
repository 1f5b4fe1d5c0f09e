//! Logical commands sent to power units.

use crate::error::{Error, Result};
use crate::protocol::{CommandType, DataFormat};

/// Highest brightness level accepted by dimmers.
pub const MAX_LEVEL: u8 = 100;

/// A command addressed to one channel, independent of the transport.
///
/// USB adapters pack it into an 8-byte frame; the HTTP gateway turns it into
/// query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command to execute.
    pub kind: CommandType,
    /// Target channel (1-based).
    pub channel: u8,
    /// Payload format tag, for commands that carry a format-dependent payload.
    pub format: Option<DataFormat>,
    /// Brightness for `SetLevel`, already clamped to `0..=100`.
    pub level: Option<u8>,
    /// Raw payload bytes (RGB levels use the first three).
    pub data: [u8; 4],
}

impl Command {
    /// Creates a command without payload.
    #[must_use]
    pub const fn new(kind: CommandType, channel: u8) -> Self {
        Self {
            kind,
            channel,
            format: None,
            level: None,
            data: [0; 4],
        }
    }

    /// Creates a `SetLevel` command, clamping `level` to `0..=100`.
    #[must_use]
    pub fn set_level(channel: u8, level: i32) -> Self {
        let clamped = level.clamp(0, i32::from(MAX_LEVEL)) as u8;
        if i32::from(clamped) != level {
            tracing::debug!("level {} clamped to {}", level, clamped);
        }
        Self {
            format: Some(DataFormat::OneByte),
            level: Some(clamped),
            ..Self::new(CommandType::SetLevel, channel)
        }
    }

    /// Creates a `SetLevel` command for an RGB controller.
    #[must_use]
    pub const fn set_rgb(channel: u8, red: u8, green: u8, blue: u8) -> Self {
        let mut cmd = Self::new(CommandType::SetLevel, channel);
        cmd.format = Some(DataFormat::FourByte);
        cmd.data = [red, green, blue, 0];
        cmd
    }

    /// Creates an RGB controller command using the LED format.
    #[must_use]
    pub const fn led(kind: CommandType, channel: u8) -> Self {
        let mut cmd = Self::new(kind, channel);
        cmd.format = Some(DataFormat::Led);
        cmd
    }

    /// Checks the channel against the adapter's channel count.
    ///
    /// Returns the zero-based wire channel.
    pub fn wire_channel(&self, available: u8) -> Result<u8> {
        if self.channel == 0 || self.channel > available {
            return Err(Error::ChannelOutOfRange {
                channel: self.channel,
                available,
            });
        }
        Ok(self.channel - 1)
    }
}
