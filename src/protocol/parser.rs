//! Parsing of notification frames and gateway sensor snapshots.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::protocol::{BatteryState, CommandType, DataFormat, NotificationFrame, SensorType};
use crate::types::{Notification, NotificationData, Sensor, SensorState, TempHumi};

/// Values per channel in a sensor snapshot (temperature, humidity, state).
const VALUES_PER_SENSOR: usize = 3;

/// Placeholder the gateway prints for a missing value.
const PLACEHOLDER: &str = "-";

/// Temperature scaling factor (raw values are tenths of a degree).
const TEMP_SCALE: f32 = 10.0;

/// Decodes a notification frame.
///
/// Unknown format tags fall back to `NoData`; an unknown command code is an
/// error and the frame should be dropped.
pub fn decode_notification(frame: &NotificationFrame) -> Result<Notification> {
    let code = frame.command_code();
    let command = CommandType::from_byte(code).ok_or(Error::UnknownCommand(code))?;

    let format = DataFormat::from_byte(frame.format_code()).unwrap_or_else(|| {
        tracing::debug!("unknown data format {}, assuming no data", frame.format_code());
        DataFormat::NoData
    });

    let payload = frame.payload();
    let data = match command {
        CommandType::SetLevel => NotificationData::Level { level: payload[0] },
        CommandType::Bind => NotificationData::Bind {
            sensor_type: (format == DataFormat::OneByte).then_some(SensorType::from_byte(payload[0])),
        },
        CommandType::TempHumi => NotificationData::TempHumi(parse_temp_humi(payload)),
        _ => NotificationData::None,
    };

    Ok(Notification {
        channel: frame.channel(),
        command,
        format,
        data,
    })
}

/// Parses the packed telemetry payload of a `TempHumi` notification.
///
/// Format (payload bytes 0..3 = frame bytes 4..7):
/// ```text
/// [temp_lo:8] [battery:1 type:3 temp_hi:4] [humidity:8] [analog:8]
/// ```
/// Temperature is a 12-bit two's complement value in tenths of a degree.
#[must_use]
pub fn parse_temp_humi(payload: [u8; 4]) -> TempHumi {
    let mut raw = (i16::from(payload[1] & 0x0F) << 8) | i16::from(payload[0]);
    if raw >= 0x800 {
        raw -= 0x1000;
    }

    TempHumi {
        temperature: f32::from(raw) / TEMP_SCALE,
        battery: BatteryState::from_bit((payload[1] >> 7) & 1),
        sensor_type: SensorType::from_byte((payload[1] >> 4) & 0x07),
        humidity: payload[2],
        analog: payload[3],
    }
}

/// Wire format of the gateway sensor snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SnapshotFormat {
    /// `sens.xml`, one leaf element per value.
    #[default]
    Xml,
    /// Plain text, one value per line.
    PlainText,
}

impl SnapshotFormat {
    /// Path of the snapshot resource on the gateway.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Xml => "sens.xml",
            Self::PlainText => "sens.txt",
        }
    }
}

/// Parses a sensor snapshot into one reading per channel, ordered by channel.
///
/// Values come in runs of three per channel: temperature in tenths of a
/// degree, humidity, state index. `-` or an empty value reads as 0.
pub fn parse_sensor_snapshot(body: &str, format: SnapshotFormat) -> Result<Vec<Sensor>> {
    let values: Vec<String> = match format {
        SnapshotFormat::Xml => xml_leaf_values(body)?,
        SnapshotFormat::PlainText => body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect(),
    };

    let remainder = values.len() % VALUES_PER_SENSOR;
    if remainder != 0 {
        tracing::warn!("ignoring {} trailing snapshot values", remainder);
    }

    let mut sensors = BTreeMap::new();
    for (index, run) in values.chunks_exact(VALUES_PER_SENSOR).enumerate() {
        let channel = u8::try_from(index + 1).map_err(|_| Error::Snapshot {
            message: format!("too many sensors: {}", index + 1),
        })?;

        let temperature = f32::from(parse_value::<i16>(&run[0])?) / TEMP_SCALE;
        let humidity = parse_value::<u8>(&run[1])?;
        let state = SensorState::from_index(parse_value::<u8>(&run[2])?);

        sensors.insert(
            channel,
            Sensor {
                channel,
                temperature,
                humidity,
                state,
            },
        );
    }

    Ok(sensors.into_values().collect())
}

fn parse_value<T: std::str::FromStr + Default>(value: &str) -> Result<T> {
    if value.is_empty() || value == PLACEHOLDER {
        return Ok(T::default());
    }
    value.parse().map_err(|_| Error::Snapshot {
        message: format!("invalid value: {value:?}"),
    })
}

/// Collects the text of every leaf element, in document order.
///
/// Elements with child elements contribute nothing themselves; comments and
/// the XML declaration are skipped.
fn xml_leaf_values(body: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut values = Vec::new();
    // Text of the innermost open element, while it has no child elements.
    let mut leaf: Option<String> = None;

    loop {
        match reader.read_event().map_err(snapshot_error)? {
            Event::Start(_) => leaf = Some(String::new()),
            Event::Text(text) => {
                if let Some(value) = leaf.as_mut() {
                    value.push_str(&text.unescape().map_err(snapshot_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(value) = leaf.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                if let Some(value) = leaf.take() {
                    values.push(value.trim().to_owned());
                }
            }
            Event::Empty(_) => {
                leaf = None;
                values.push(String::new());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(values)
}

fn snapshot_error(err: quick_xml::Error) -> Error {
    Error::Snapshot {
        message: format!("malformed XML: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    fn temp_humi_frame(payload: [u8; 4]) -> NotificationFrame {
        NotificationFrame::new(7, 2, CommandType::TempHumi.code(), 7, payload)
    }

    fn decode_temp_humi(payload: [u8; 4]) -> TempHumi {
        let notification = decode_notification(&temp_humi_frame(payload)).unwrap();
        match notification.data {
            NotificationData::TempHumi(th) => th,
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn test_decode_positive_temperature() {
        let th = decode_temp_humi([0xE8, 0x01, 0x2D, 0xFF]);
        assert_close(th.temperature, 48.8);
        assert_eq!(th.humidity, 45);
        assert_eq!(th.analog, 255);
        assert!(!th.analog_present());
        assert_eq!(th.battery, BatteryState::Ok);
    }

    #[test]
    fn test_decode_negative_temperature() {
        let th = decode_temp_humi([0x18, 0x0F, 0, 0]);
        assert_close(th.temperature, -23.2);
    }

    #[test]
    fn test_decode_battery_and_sensor_type() {
        // bit 7 battery, bits 4-6 = 0b011
        let th = decode_temp_humi([0x00, 0b1011_0000, 0, 0]);
        assert_eq!(th.battery, BatteryState::Low);
        assert_eq!(th.sensor_type, SensorType::Pm111);
        assert_eq!(th.sensor_type.code(), 3);
        assert_close(th.temperature, 0.0);
    }

    #[test]
    fn test_decode_set_level() {
        let frame = NotificationFrame::new(1, 0, CommandType::SetLevel.code(), 1, [77, 0, 0, 0]);
        let n = decode_notification(&frame).unwrap();
        assert_eq!(n.channel, 1);
        assert_eq!(n.format, DataFormat::OneByte);
        assert_eq!(n.data, NotificationData::Level { level: 77 });
    }

    #[test]
    fn test_decode_bind_with_sensor_type() {
        let frame = NotificationFrame::new(1, 9, CommandType::Bind.code(), 1, [2, 0, 0, 0]);
        let n = decode_notification(&frame).unwrap();
        assert_eq!(n.channel, 10);
        assert_eq!(
            n.data,
            NotificationData::Bind {
                sensor_type: Some(SensorType::Pt111)
            }
        );

        let frame = NotificationFrame::new(1, 9, CommandType::Bind.code(), 0, [2, 0, 0, 0]);
        let n = decode_notification(&frame).unwrap();
        assert_eq!(n.data, NotificationData::Bind { sensor_type: None });
    }

    #[test]
    fn test_decode_plain_command_has_no_fields() {
        let frame = NotificationFrame::new(1, 3, CommandType::Switch.code(), 0, [9, 9, 9, 9]);
        let n = decode_notification(&frame).unwrap();
        assert_eq!(n.command, CommandType::Switch);
        assert_eq!(n.data, NotificationData::None);
    }

    #[test]
    fn test_decode_unknown_format_defaults() {
        let frame = NotificationFrame::new(1, 3, CommandType::TurnOn.code(), 0x42, [0; 4]);
        let n = decode_notification(&frame).unwrap();
        assert_eq!(n.format, DataFormat::NoData);
    }

    #[test]
    fn test_decode_unknown_command() {
        let frame = NotificationFrame::new(1, 3, 0xFF, 0, [0; 4]);
        assert!(matches!(
            decode_notification(&frame),
            Err(Error::UnknownCommand(0xFF))
        ));
    }

    #[test]
    fn test_round_trip_channel_and_command() {
        use crate::protocol::CommandFrame;
        use crate::types::Command;

        for channel in 1..=64u8 {
            for kind in CommandType::ALL {
                let encoded = CommandFrame::encode(&Command::new(kind, channel), 64, 0).unwrap();
                let frame = NotificationFrame::new(
                    0,
                    encoded.wire_channel(),
                    encoded.command_code(),
                    0,
                    [0; 4],
                );
                let n = decode_notification(&frame).unwrap();
                assert_eq!(n.channel, channel);
                assert_eq!(n.command, kind);
            }
        }
    }

    #[test]
    fn test_parse_plain_snapshot() {
        let body = "235\n45\n0\n-\n-\n1\n-52\n80\n3\n";
        let sensors = parse_sensor_snapshot(body, SnapshotFormat::PlainText).unwrap();

        assert_eq!(sensors.len(), 3);
        assert_eq!(sensors[0].channel, 1);
        assert_close(sensors[0].temperature, 23.5);
        assert_eq!(sensors[0].humidity, 45);
        assert_eq!(sensors[0].state, SensorState::Normal);

        assert_eq!(sensors[1].channel, 2);
        assert_close(sensors[1].temperature, 0.0);
        assert_eq!(sensors[1].state, SensorState::NotBound);

        assert_close(sensors[2].temperature, -5.2);
        assert_eq!(sensors[2].state, SensorState::BatteryLow);
    }

    #[test]
    fn test_parse_xml_snapshot() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<response>
  <snt0>215</snt0><snh0>38</snh0><snst0>0</snst0>
  <snt1>-</snt1><snh1>-</snh1><snst1>2</snst1>
</response>"#;
        assert_eq!(
            xml_leaf_values(body).unwrap(),
            vec!["215", "38", "0", "-", "-", "2"]
        );
        let sensors = parse_sensor_snapshot(body, SnapshotFormat::Xml).unwrap();

        assert_eq!(sensors.len(), 2);
        assert_close(sensors[0].temperature, 21.5);
        assert_eq!(sensors[0].humidity, 38);
        assert_eq!(sensors[1].channel, 2);
        assert_eq!(sensors[1].humidity, 0);
        assert_eq!(sensors[1].state, SensorState::NoSignal);
    }

    #[test]
    fn test_xml_flat_document_has_no_remainder() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<response><snt0>215</snt0><snh0>38</snh0><snst0>0</snst0></response>"#;
        assert_eq!(xml_leaf_values(body).unwrap(), vec!["215", "38", "0"]);
    }

    #[test]
    fn test_parse_nested_xml_snapshot() {
        let body = "<response>\
            <sensor><t>215</t><h>38</h><s>0</s></sensor>\
            <sensor><t>100</t><h>50</h><s>3</s></sensor>\
            </response>";
        assert_eq!(
            xml_leaf_values(body).unwrap(),
            vec!["215", "38", "0", "100", "50", "3"]
        );

        let sensors = parse_sensor_snapshot(body, SnapshotFormat::Xml).unwrap();
        assert_eq!(sensors.len(), 2);
        assert_close(sensors[0].temperature, 21.5);
        assert_eq!(sensors[0].humidity, 38);
        assert_eq!(sensors[0].state, SensorState::Normal);
        assert_close(sensors[1].temperature, 10.0);
        assert_eq!(sensors[1].humidity, 50);
        assert_eq!(sensors[1].state, SensorState::BatteryLow);
    }

    #[test]
    fn test_parse_xml_snapshot_with_comment() {
        let body = "<response><!-- channel 1 --><snt0>-12</snt0><snh0></snh0>\
            <snst0>2</snst0><!-- end --></response>";
        assert_eq!(xml_leaf_values(body).unwrap(), vec!["-12", "", "2"]);

        let sensors = parse_sensor_snapshot(body, SnapshotFormat::Xml).unwrap();
        assert_eq!(sensors.len(), 1);
        assert_close(sensors[0].temperature, -1.2);
        assert_eq!(sensors[0].humidity, 0);
        assert_eq!(sensors[0].state, SensorState::NoSignal);
    }

    #[test]
    fn test_parse_malformed_xml() {
        let result = parse_sensor_snapshot("<response><snt0>1</snh0>", SnapshotFormat::Xml);
        assert!(matches!(result, Err(Error::Snapshot { .. })));
    }

    #[test]
    fn test_parse_snapshot_ignores_partial_run() {
        let sensors = parse_sensor_snapshot("100\n50\n0\n99\n", SnapshotFormat::PlainText).unwrap();
        assert_eq!(sensors.len(), 1);
    }

    #[test]
    fn test_parse_snapshot_rejects_garbage() {
        let result = parse_sensor_snapshot("abc\n1\n0\n", SnapshotFormat::PlainText);
        assert!(matches!(result, Err(Error::Snapshot { .. })));
    }
}
