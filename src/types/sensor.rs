//! Sensor readings reported by the HTTP gateway.

/// Sensor status index from the gateway snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SensorState {
    /// Sensor is bound and reporting.
    #[default]
    Normal,
    /// No sensor bound to the channel.
    NotBound,
    /// Sensor is bound but has stopped reporting.
    NoSignal,
    /// Sensor battery is low.
    BatteryLow,
    /// Status index this library does not know.
    Other(u8),
}

impl SensorState {
    /// Maps a status index to a state.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Normal,
            1 => Self::NotBound,
            2 => Self::NoSignal,
            3 => Self::BatteryLow,
            other => Self::Other(other),
        }
    }
}

/// Latest reading of one gateway sensor channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensor {
    /// Sensor channel (1-based).
    pub channel: u8,
    /// Temperature in Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Sensor status.
    pub state: SensorState,
}
