//! Adapter models and their USB identities.

/// Vendor id shared by all nooLite USB adapters.
pub const VENDOR_ID: u16 = 0x16c0;

/// Product id of the PC11xx transmitter family.
pub const TRANSMITTER_PRODUCT_ID: u16 = 0x05df;

/// Product id of the RX2164 receiver.
pub const RECEIVER_PRODUCT_ID: u16 = 0x05dc;

/// Known nooLite adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// USB transmitter, 8 channels.
    Pc1108,
    /// USB transmitter, 16 channels.
    Pc1116,
    /// USB transmitter, 32 channels.
    Pc1132,
    /// USB receiver, 64 channels.
    Rx2164,
    /// Ethernet gateway, 32 transmit channels.
    Pr1132,
}

impl DeviceModel {
    /// Number of channels the adapter addresses.
    #[must_use]
    pub const fn channels(self) -> u8 {
        match self {
            Self::Pc1108 => 8,
            Self::Pc1116 => 16,
            Self::Pc1132 | Self::Pr1132 => 32,
            Self::Rx2164 => 64,
        }
    }

    /// USB product id, `None` for the network gateway.
    #[must_use]
    pub const fn product_id(self) -> Option<u16> {
        match self {
            Self::Pc1108 | Self::Pc1116 | Self::Pc1132 => Some(TRANSMITTER_PRODUCT_ID),
            Self::Rx2164 => Some(RECEIVER_PRODUCT_ID),
            Self::Pr1132 => None,
        }
    }
}
