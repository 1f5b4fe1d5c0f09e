//! High-level power unit commands.
//!
//! [`Controller`] offers the nooLite command vocabulary over any
//! [`Transmitter`], so USB adapters and the Ethernet gateway share one API.

use crate::error::Result;
use crate::protocol::CommandType;
use crate::transport::Transmitter;
use crate::types::Command;

/// Command front-end for a transmitter.
///
/// Every method checks the channel first and fails with
/// [`ChannelOutOfRange`](crate::Error::ChannelOutOfRange) without touching
/// the transport. Otherwise it returns whether the transport delivered the
/// command.
pub struct Controller<T> {
    transmitter: T,
}

impl<T: Transmitter> Controller<T> {
    /// Creates a controller over a transmitter.
    #[must_use]
    pub const fn new(transmitter: T) -> Self {
        Self { transmitter }
    }

    /// Returns the underlying transmitter.
    #[must_use]
    pub const fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// Consumes the controller, returning the transmitter.
    pub fn into_inner(self) -> T {
        self.transmitter
    }

    /// Number of addressable channels.
    #[must_use]
    pub fn available_channels(&self) -> u8 {
        self.transmitter.available_channels()
    }

    /// Sends an arbitrary command.
    pub async fn execute(&self, command: &Command) -> Result<bool> {
        command.wire_channel(self.transmitter.available_channels())?;
        tracing::debug!("channel {}: {:?}", command.channel, command.kind);
        Ok(self.transmitter.send(command).await)
    }

    async fn simple(&self, kind: CommandType, channel: u8) -> Result<bool> {
        self.execute(&Command::new(kind, channel)).await
    }

    async fn led(&self, kind: CommandType, channel: u8) -> Result<bool> {
        self.execute(&Command::led(kind, channel)).await
    }

    /// Turns the power unit on.
    pub async fn turn_on(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::TurnOn, channel).await
    }

    /// Turns the power unit off.
    pub async fn turn_off(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::TurnOff, channel).await
    }

    /// Toggles the power unit.
    pub async fn switch(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::Switch, channel).await
    }

    /// Sets the brightness, clamping `level` to `0..=100`.
    pub async fn set_level(&self, channel: u8, level: i32) -> Result<bool> {
        self.execute(&Command::set_level(channel, level)).await
    }

    /// Starts a slow brightness increase.
    pub async fn slow_turn_on(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::SlowTurnOn, channel).await
    }

    /// Starts a slow brightness decrease.
    pub async fn slow_turn_off(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::SlowTurnOff, channel).await
    }

    /// Stops a running dim/bright ramp.
    pub async fn stop_dim_bright(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::StopDimBright, channel).await
    }

    /// Reverses the direction of a running ramp.
    pub async fn revert_slow_turn(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::RevertSlowTurn, channel).await
    }

    /// Recalls the scene stored on the channel.
    pub async fn run_scene(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::RunScene, channel).await
    }

    /// Stores the current state as the channel's scene.
    pub async fn record_scene(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::RecordScene, channel).await
    }

    /// Sends a bind request; the power unit must be in binding mode.
    pub async fn bind(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::Bind, channel).await
    }

    /// Sends an unbind request.
    pub async fn unbind(&self, channel: u8) -> Result<bool> {
        self.simple(CommandType::Unbind, channel).await
    }

    /// Sets the color of an RGB controller.
    pub async fn set_rgb(&self, channel: u8, red: u8, green: u8, blue: u8) -> Result<bool> {
        self.execute(&Command::set_rgb(channel, red, green, blue))
            .await
    }

    /// Starts or stops the slow color cycle of an RGB controller.
    pub async fn slow_rgb_change(&self, channel: u8) -> Result<bool> {
        self.led(CommandType::SlowRgbChange, channel).await
    }

    /// Switches an RGB controller to its next color.
    pub async fn switch_color(&self, channel: u8) -> Result<bool> {
        self.led(CommandType::SwitchColor, channel).await
    }

    /// Switches the RGB controller's mode.
    pub async fn switch_mode(&self, channel: u8) -> Result<bool> {
        self.led(CommandType::SwitchMode, channel).await
    }

    /// Switches the speed of the RGB controller's color animation.
    pub async fn switch_speed_mode(&self, channel: u8) -> Result<bool> {
        self.led(CommandType::SwitchSpeedMode, channel).await
    }
}
