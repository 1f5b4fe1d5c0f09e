//! # noolite
//!
//! A Rust client library for nooLite wireless home-automation adapters.
//!
//! This library drives the PC11xx USB transmitters and the PR1132 Ethernet
//! gateway, and listens to the RX2164 USB receiver.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - One command vocabulary over USB and HTTP transmitters
//! - Background receiver loop with ordered observers
//! - Type-safe frame encoding and notification decoding
//!
//! ## Quick Start
//!
//! ```no_run
//! use noolite::{Controller, DeviceModel, TransmitterConfig, UsbTransmitter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), noolite::Error> {
//!     let config = TransmitterConfig::for_model(DeviceModel::Pc1116);
//!     let lights = Controller::new(UsbTransmitter::new(config));
//!
//!     lights.turn_on(1).await?;
//!     lights.set_level(2, 40).await?;
//!     Ok(())
//! }
//! ```
//!
//! Receiving notifications:
//!
//! ```no_run
//! use noolite::{Receiver, ReceiverConfig, event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), noolite::Error> {
//!     let mut receiver = Receiver::open(ReceiverConfig::default())?;
//!     let (observer, mut notifications) = event::channel();
//!     receiver.add_observer(observer)?;
//!     receiver.start()?;
//!
//!     while let Some(n) = notifications.recv().await {
//!         println!("channel {}: {:?}", n.channel, n.command);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Command codes, 8-byte frames, notification and snapshot parsing
//! - [`types`] - Commands, notifications, sensor readings, adapter models
//! - [`transport`] - USB (`nusb`) and HTTP (`reqwest`) transmitters
//! - [`commands`] - [`Controller`] over any transmitter
//! - [`receiver`] - RX2164 poll loop, bind and unbind
//! - [`event`] - Observers for received notifications

pub mod commands;
pub mod error;
pub mod event;
pub mod protocol;
pub mod receiver;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use commands::Controller;
pub use error::{Error, FrameError, Result};
pub use event::{ChannelObserver, NotificationDispatcher, Observer};
pub use protocol::{BatteryState, CommandType, DataFormat, SensorType, SnapshotFormat};
pub use receiver::{Receiver, ReceiverConfig, ReceiverState};
pub use transport::{
    GatewayConfig, HidConnector, HidDevice, HttpGateway, Transmitter, TransmitterConfig,
    UsbConnector, UsbTransmitter,
};
pub use types::{
    Command, DeviceModel, FieldValue, Notification, NotificationData, Sensor, SensorState,
    TempHumi,
};
