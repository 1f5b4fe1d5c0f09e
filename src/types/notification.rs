//! Notifications reported by receiver adapters.

use crate::protocol::{BatteryState, CommandType, DataFormat, SensorType};

/// Analog byte value meaning "no analog sensor attached".
pub const ANALOG_ABSENT: u8 = 0xFF;

/// Temperature/humidity telemetry from a PT111/PT112 sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempHumi {
    /// Temperature in Celsius (0.1 resolution).
    pub temperature: f32,
    /// Sensor battery state.
    pub battery: BatteryState,
    /// Sensor model.
    pub sensor_type: SensorType,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Raw analog input, `0xFF` when absent.
    pub analog: u8,
}

impl TempHumi {
    /// Returns true if the sensor reports an analog input.
    #[must_use]
    pub const fn analog_present(&self) -> bool {
        self.analog != ANALOG_ABSENT
    }
}

/// Payload of a notification, determined by its command type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationData {
    /// Command carries no extra fields.
    None,
    /// Brightness reported with `SetLevel`.
    Level { level: u8 },
    /// Bind request; sensors report their type.
    Bind { sensor_type: Option<SensorType> },
    /// Sensor telemetry.
    TempHumi(TempHumi),
}

/// Value of a single named notification field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Unsigned byte value.
    Byte(u8),
    /// Temperature in Celsius.
    Temperature(f32),
    /// Sensor model.
    SensorType(SensorType),
    /// Battery state.
    Battery(BatteryState),
}

/// A decoded notification frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Notification {
    /// Source channel (1-based).
    pub channel: u8,
    /// Reported command.
    pub command: CommandType,
    /// Payload format tag.
    pub format: DataFormat,
    /// Command-specific payload.
    pub data: NotificationData,
}

impl Notification {
    /// Looks up a payload field by name.
    ///
    /// Known names are `level`, `sensor_type`, `temperature`, `battery`,
    /// `humidity` and `analog`; a name the command does not carry yields `None`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        match (&self.data, name) {
            (NotificationData::Level { level }, "level") => Some(FieldValue::Byte(*level)),
            (
                NotificationData::Bind {
                    sensor_type: Some(sensor_type),
                },
                "sensor_type",
            ) => Some(FieldValue::SensorType(*sensor_type)),
            (NotificationData::TempHumi(th), "temperature") => {
                Some(FieldValue::Temperature(th.temperature))
            }
            (NotificationData::TempHumi(th), "battery") => Some(FieldValue::Battery(th.battery)),
            (NotificationData::TempHumi(th), "sensor_type") => {
                Some(FieldValue::SensorType(th.sensor_type))
            }
            (NotificationData::TempHumi(th), "humidity") => Some(FieldValue::Byte(th.humidity)),
            (NotificationData::TempHumi(th), "analog") => Some(FieldValue::Byte(th.analog)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_humi() -> Notification {
        Notification {
            channel: 3,
            command: CommandType::TempHumi,
            format: DataFormat::FourByte,
            data: NotificationData::TempHumi(TempHumi {
                temperature: 21.5,
                battery: BatteryState::Ok,
                sensor_type: SensorType::Pt111,
                humidity: 40,
                analog: ANALOG_ABSENT,
            }),
        }
    }

    #[test]
    fn test_named_fields() {
        let n = temp_humi();
        assert_eq!(n.value("temperature"), Some(FieldValue::Temperature(21.5)));
        assert_eq!(n.value("humidity"), Some(FieldValue::Byte(40)));
        assert_eq!(n.value("battery"), Some(FieldValue::Battery(BatteryState::Ok)));
        assert_eq!(n.value("level"), None);
    }

    #[test]
    fn test_no_fields_for_plain_commands() {
        let n = Notification {
            channel: 1,
            command: CommandType::TurnOn,
            format: DataFormat::NoData,
            data: NotificationData::None,
        };
        for name in ["level", "sensor_type", "temperature", "humidity", "analog"] {
            assert_eq!(n.value(name), None);
        }
    }

    #[test]
    fn test_analog_sentinel() {
        let NotificationData::TempHumi(th) = temp_humi().data else {
            unreachable!()
        };
        assert!(!th.analog_present());
    }
}
