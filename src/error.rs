//! Error types for the noolite library.

use thiserror::Error;

/// The main error type for noolite operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Channel outside the range supported by the adapter.
    #[error("channel {channel} out of range: adapter supports channels 1..={available}")]
    ChannelOutOfRange { channel: u8, available: u8 },

    /// No USB device with the expected vendor/product id is attached.
    #[error("device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The device is claimed by another process.
    #[error("device is busy")]
    DeviceBusy,

    /// Selecting the configuration or claiming the interface failed.
    #[error("device configuration failed: {message}")]
    DeviceConfig { message: String },

    /// USB I/O error.
    #[error("USB error: {0}")]
    Usb(#[from] std::io::Error),

    /// USB control transfer error.
    #[error("USB transfer error: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status.
    #[error("gateway returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Notification carried a command code outside the protocol table.
    #[error("unknown command code: {0}")]
    UnknownCommand(u8),

    /// Sensor snapshot could not be parsed.
    #[error("sensor snapshot error: {message}")]
    Snapshot { message: String },

    /// Operation not allowed in the current receiver state.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Frame-specific errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Buffer is not exactly one frame long.
    #[error("wrong frame length: expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// Result type alias for noolite operations.
pub type Result<T> = std::result::Result<T, Error>;
