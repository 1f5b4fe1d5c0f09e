//! Data types for nooLite entities.
//!
//! This module contains the core data structures used throughout the library:
//! - Logical commands
//! - Adapter models
//! - Notifications and sensor telemetry
//! - Gateway sensor readings

pub mod command;
pub mod device;
pub mod notification;
pub mod sensor;

pub use command::{Command, MAX_LEVEL};
pub use device::{DeviceModel, RECEIVER_PRODUCT_ID, TRANSMITTER_PRODUCT_ID, VENDOR_ID};
pub use notification::{ANALOG_ABSENT, FieldValue, Notification, NotificationData, TempHumi};
pub use sensor::{Sensor, SensorState};
