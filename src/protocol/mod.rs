//! Protocol definitions for nooLite communication.
//!
//! This module contains the low-level protocol types including:
//! - Command codes and payload enumerations
//! - 8-byte command and notification frames
//! - Notification and sensor snapshot parsing

pub mod command;
pub mod frame;
pub mod parser;

pub use command::{BatteryState, CommandType, DataFormat, ReceiverRequest, SensorType};
pub use frame::{
    CommandFrame, FRAME_SIZE, HID_REPORT_INDEX, HID_REPORT_VALUE, HID_REQUEST, MODE_HEADER,
    NotificationFrame, TOGGLE_MASK,
};
pub use parser::{SnapshotFormat, decode_notification, parse_sensor_snapshot, parse_temp_humi};
