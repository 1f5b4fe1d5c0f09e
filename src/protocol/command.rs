//! Command codes and enumerations of the nooLite radio protocol.
//!
//! The same command table is used in both directions: the host sends these
//! codes to transmitter adapters, and receiver adapters report them back in
//! notification frames.

/// Commands understood by nooLite power units and reported by remotes/sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    /// Turn the load off.
    TurnOff = 0,
    /// Start dimming down.
    SlowTurnOff = 1,
    /// Turn the load on.
    TurnOn = 2,
    /// Start dimming up.
    SlowTurnOn = 3,
    /// Toggle between on and off.
    Switch = 4,
    /// Reverse the direction of a running dim.
    RevertSlowTurn = 5,
    /// Set brightness (or RGB levels).
    SetLevel = 6,
    /// Recall the stored scene.
    RunScene = 7,
    /// Store the current state as a scene.
    RecordScene = 8,
    /// Remove a binding.
    Unbind = 9,
    /// Stop a running dim.
    StopDimBright = 10,
    /// Pairing request.
    Bind = 15,
    /// Start cycling through colours smoothly.
    SlowRgbChange = 16,
    /// Step to the next colour.
    SwitchColor = 17,
    /// Switch the RGB controller mode.
    SwitchMode = 18,
    /// Switch the RGB effect speed.
    SwitchSpeedMode = 19,
    /// Sensor battery is low.
    BatteryLow = 20,
    /// Temperature/humidity telemetry.
    TempHumi = 21,
}

impl CommandType {
    /// Every command in wire-code order.
    pub const ALL: [Self; 18] = [
        Self::TurnOff,
        Self::SlowTurnOff,
        Self::TurnOn,
        Self::SlowTurnOn,
        Self::Switch,
        Self::RevertSlowTurn,
        Self::SetLevel,
        Self::RunScene,
        Self::RecordScene,
        Self::Unbind,
        Self::StopDimBright,
        Self::Bind,
        Self::SlowRgbChange,
        Self::SwitchColor,
        Self::SwitchMode,
        Self::SwitchSpeedMode,
        Self::BatteryLow,
        Self::TempHumi,
    ];

    /// Attempts to parse a command from its wire code.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::TurnOff),
            1 => Some(Self::SlowTurnOff),
            2 => Some(Self::TurnOn),
            3 => Some(Self::SlowTurnOn),
            4 => Some(Self::Switch),
            5 => Some(Self::RevertSlowTurn),
            6 => Some(Self::SetLevel),
            7 => Some(Self::RunScene),
            8 => Some(Self::RecordScene),
            9 => Some(Self::Unbind),
            10 => Some(Self::StopDimBright),
            15 => Some(Self::Bind),
            16 => Some(Self::SlowRgbChange),
            17 => Some(Self::SwitchColor),
            18 => Some(Self::SwitchMode),
            19 => Some(Self::SwitchSpeedMode),
            20 => Some(Self::BatteryLow),
            21 => Some(Self::TempHumi),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for the RGB controller commands that use the LED format.
    #[must_use]
    pub const fn is_led(self) -> bool {
        matches!(
            self,
            Self::SlowRgbChange | Self::SwitchColor | Self::SwitchMode | Self::SwitchSpeedMode
        )
    }
}

impl From<CommandType> for u8 {
    fn from(cmd: CommandType) -> Self {
        cmd as Self
    }
}

/// Payload format tag carried next to the command code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataFormat {
    /// No payload.
    #[default]
    NoData = 0,
    /// One payload byte.
    OneByte = 1,
    /// Two payload bytes.
    TwoByte = 2,
    /// Four payload bytes.
    FourByte = 3,
    /// RGB controller command.
    Led = 4,
}

impl DataFormat {
    /// Attempts to parse a format tag.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::NoData),
            1 => Some(Self::OneByte),
            2 => Some(Self::TwoByte),
            3 => Some(Self::FourByte),
            4 => Some(Self::Led),
            _ => None,
        }
    }
}

impl From<DataFormat> for u8 {
    fn from(fmt: DataFormat) -> Self {
        fmt as Self
    }
}

/// Sensor model as reported in bind and telemetry frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    /// No type reported.
    Unassigned,
    /// PT112 temperature sensor.
    Pt112,
    /// PT111 temperature and humidity sensor.
    Pt111,
    /// PM111 motion sensor.
    Pm111,
    /// PM112 motion sensor.
    Pm112,
    /// PS111 smoke sensor.
    Ps111,
    /// Type code this library does not know.
    Other(u8),
}

impl SensorType {
    /// Maps a type code to a sensor model.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Unassigned,
            1 => Self::Pt112,
            2 => Self::Pt111,
            3 => Self::Pm111,
            4 => Self::Pm112,
            5 => Self::Ps111,
            other => Self::Other(other),
        }
    }

    /// Returns the raw type code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unassigned => 0,
            Self::Pt112 => 1,
            Self::Pt111 => 2,
            Self::Pm111 => 3,
            Self::Pm112 => 4,
            Self::Ps111 => 5,
            Self::Other(code) => code,
        }
    }
}

/// Sensor battery flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BatteryState {
    /// Battery is fine.
    #[default]
    Ok,
    /// Battery needs replacement.
    Low,
}

impl BatteryState {
    /// Parses the single battery bit.
    #[must_use]
    pub const fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 { Self::Ok } else { Self::Low }
    }
}

/// Service requests written to a receiver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReceiverRequest {
    /// Put a channel into binding mode.
    Bind = 1,
    /// Clear one channel's binding.
    Unbind = 3,
    /// Clear every binding.
    UnbindAll = 4,
}

impl From<ReceiverRequest> for u8 {
    fn from(req: ReceiverRequest) -> Self {
        req as Self
    }
}
