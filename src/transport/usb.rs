//! USB HID transport implementation.
//!
//! nooLite USB adapters are driven with class/interface control transfers
//! carrying 8-byte feature reports. This module opens them through `nusb`
//! and provides the PC11xx transmitter.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use nusb::transfer::{Control, ControlType, Recipient};

use crate::error::{Error, Result};
use crate::protocol::{CommandFrame, FRAME_SIZE, HID_REPORT_INDEX, HID_REPORT_VALUE, HID_REQUEST};
use crate::transport::{HidConnector, HidDevice, Transmitter};
use crate::types::{Command, DeviceModel, TRANSMITTER_PRODUCT_ID, VENDOR_ID};

/// Default timeout of a single control transfer.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(100);

/// Default number of extra transfers per command.
pub const DEFAULT_SEND_REPEAT: u8 = 1;

/// Highest accepted send repeat count.
pub const MAX_SEND_REPEAT: u8 = 7;

/// USB configuration selected before claiming.
const USB_CONFIGURATION: u8 = 1;

/// HID interface number.
const HID_INTERFACE: u8 = 0;

const fn report_control() -> Control {
    Control {
        control_type: ControlType::Class,
        recipient: Recipient::Interface,
        request: HID_REQUEST,
        value: HID_REPORT_VALUE,
        index: HID_REPORT_INDEX,
    }
}

/// Opens nooLite adapters by vendor/product id.
#[derive(Debug, Clone)]
pub struct UsbConnector {
    vendor_id: u16,
    product_id: u16,
    timeout: Duration,
}

impl UsbConnector {
    /// Creates a connector for the given USB identity.
    #[must_use]
    pub const fn new(vendor_id: u16, product_id: u16, timeout: Duration) -> Self {
        Self {
            vendor_id,
            product_id,
            timeout,
        }
    }
}

impl HidConnector for UsbConnector {
    type Device = UsbHidDevice;

    fn open(&self) -> Result<UsbHidDevice> {
        let not_found = Error::DeviceNotFound {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        };

        let info = nusb::list_devices()?
            .find(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id)
            .ok_or(not_found)?;

        tracing::debug!(
            "opening USB device {:04x}:{:04x}",
            self.vendor_id,
            self.product_id
        );
        let device = info.open()?;
        prepare_device(&device)?;

        let interface = device
            .claim_interface(HID_INTERFACE)
            .map_err(configuration_error)?;

        Ok(UsbHidDevice {
            device,
            interface: Some(interface),
            timeout: self.timeout,
        })
    }
}

/// Device operations run before the HID interface is claimed.
trait ConfigureDevice {
    fn detach_kernel_driver(&self, interface: u8) -> io::Result<()>;
    fn active_configuration(&self) -> Option<u8>;
    fn set_configuration(&self, configuration: u8) -> io::Result<()>;
}

impl ConfigureDevice for nusb::Device {
    #[cfg(target_os = "linux")]
    fn detach_kernel_driver(&self, interface: u8) -> io::Result<()> {
        nusb::Device::detach_kernel_driver(self, interface)
    }

    #[cfg(not(target_os = "linux"))]
    fn detach_kernel_driver(&self, _interface: u8) -> io::Result<()> {
        Ok(())
    }

    fn active_configuration(&self) -> Option<u8> {
        nusb::Device::active_configuration(self)
            .ok()
            .map(|config| config.configuration_value())
    }

    fn set_configuration(&self, configuration: u8) -> io::Result<()> {
        nusb::Device::set_configuration(self, configuration)
    }
}

/// Takes the HID interface away from the kernel driver, then selects
/// configuration 1.
///
/// The kernel refuses a configuration change while its driver holds an
/// interface, so the driver is detached first.
fn prepare_device(device: &impl ConfigureDevice) -> Result<()> {
    if let Err(e) = device.detach_kernel_driver(HID_INTERFACE) {
        tracing::debug!("no kernel driver detached: {}", e);
    }

    if device.active_configuration() == Some(USB_CONFIGURATION) {
        return Ok(());
    }
    device
        .set_configuration(USB_CONFIGURATION)
        .map_err(configuration_error)
}

fn configuration_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::ResourceBusy {
        Error::DeviceBusy
    } else {
        Error::DeviceConfig {
            message: err.to_string(),
        }
    }
}

/// A claimed nooLite USB adapter.
///
/// Dropping it releases the interface and hands it back to the kernel driver.
pub struct UsbHidDevice {
    device: nusb::Device,
    interface: Option<nusb::Interface>,
    timeout: Duration,
}

impl UsbHidDevice {
    fn interface(&self) -> Result<&nusb::Interface> {
        self.interface.as_ref().ok_or_else(|| Error::DeviceConfig {
            message: "interface released".into(),
        })
    }
}

impl HidDevice for UsbHidDevice {
    fn write_frame(&mut self, frame: &[u8; FRAME_SIZE]) -> Result<()> {
        tracing::trace!("USB write: {}", hex::encode(frame));
        self.interface()?
            .control_out_blocking(report_control(), frame, self.timeout)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<[u8; FRAME_SIZE]> {
        let mut buf = [0u8; FRAME_SIZE];
        let n = self
            .interface()?
            .control_in_blocking(report_control(), &mut buf, self.timeout)?;
        if n != FRAME_SIZE {
            return Err(crate::error::FrameError::WrongLength {
                expected: FRAME_SIZE,
                got: n,
            }
            .into());
        }
        Ok(buf)
    }
}

impl Drop for UsbHidDevice {
    fn drop(&mut self) {
        // Release the claim before giving the interface back to the kernel.
        self.interface = None;

        #[cfg(target_os = "linux")]
        if let Err(e) = self.device.attach_kernel_driver(HID_INTERFACE) {
            tracing::debug!("kernel driver not reattached: {}", e);
        }
    }
}

/// Configuration for USB transmitters.
#[derive(Debug, Clone)]
pub struct TransmitterConfig {
    /// Number of channels the adapter addresses.
    pub channels: u8,
    /// Extra transfers per command, to ride out radio losses (0-7).
    pub send_repeat: u8,
    /// Repeat count encoded in the frame header (0-3).
    pub radio_repeats: u8,
    /// USB vendor id.
    pub vendor_id: u16,
    /// USB product id.
    pub product_id: u16,
    /// Timeout of each control transfer.
    pub transfer_timeout: Duration,
}

impl TransmitterConfig {
    /// Creates a configuration for the given transmitter model.
    #[must_use]
    pub const fn for_model(model: DeviceModel) -> Self {
        Self {
            channels: model.channels(),
            send_repeat: DEFAULT_SEND_REPEAT,
            radio_repeats: 0,
            vendor_id: VENDOR_ID,
            product_id: TRANSMITTER_PRODUCT_ID,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// Sets the number of extra transfers, clamped to 0-7.
    #[must_use]
    pub fn send_repeat(mut self, repeat: u8) -> Self {
        self.send_repeat = repeat.min(MAX_SEND_REPEAT);
        self
    }

    /// Sets the radio repeat count encoded in each frame.
    #[must_use]
    pub const fn radio_repeats(mut self, repeats: u8) -> Self {
        self.radio_repeats = repeats;
        self
    }

    /// Overrides the channel count.
    #[must_use]
    pub const fn channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the transfer timeout.
    #[must_use]
    pub const fn transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self::for_model(DeviceModel::Pc1108)
    }
}

/// PC11xx USB transmitter.
///
/// The adapter is opened for every command and released afterwards.
pub struct UsbTransmitter<C = UsbConnector> {
    config: TransmitterConfig,
    connector: Arc<C>,
}

impl UsbTransmitter<UsbConnector> {
    /// Creates a transmitter for the configured USB adapter.
    #[must_use]
    pub fn new(config: TransmitterConfig) -> Self {
        let connector =
            UsbConnector::new(config.vendor_id, config.product_id, config.transfer_timeout);
        Self::with_connector(config, connector)
    }
}

impl<C: HidConnector> UsbTransmitter<C> {
    /// Creates a transmitter that opens devices through `connector`.
    #[must_use]
    pub fn with_connector(config: TransmitterConfig, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TransmitterConfig {
        &self.config
    }
}

/// Opens the device and writes the frame `1 + repeat` times.
fn write_repeated<C: HidConnector>(connector: &C, frame: &CommandFrame, repeat: u8) -> Result<()> {
    let mut device = connector.open()?;
    tracing::debug!("sending frame {}", hex::encode(frame.as_bytes()));
    for _ in 0..=repeat {
        device.write_frame(frame.as_bytes())?;
    }
    Ok(())
}

impl<C: HidConnector> Transmitter for UsbTransmitter<C> {
    fn available_channels(&self) -> u8 {
        self.config.channels
    }

    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, bool> {
        async move {
            let frame = match CommandFrame::encode(
                command,
                self.config.channels,
                self.config.radio_repeats,
            ) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("command rejected: {}", e);
                    return false;
                }
            };

            let connector = Arc::clone(&self.connector);
            let repeat = self.config.send_repeat.min(MAX_SEND_REPEAT);
            let result =
                tokio::task::spawn_blocking(move || write_repeated(&*connector, &frame, repeat))
                    .await;

            match result {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::error!("USB transmit failed: {}", e);
                    false
                }
                Err(e) => {
                    tracing::error!("USB worker failed: {}", e);
                    false
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::protocol::CommandType;

    /// In-memory device recording every write.
    #[derive(Default, Clone)]
    struct FakeDevice {
        writes: Arc<Mutex<Vec<[u8; FRAME_SIZE]>>>,
    }

    impl HidDevice for FakeDevice {
        fn write_frame(&mut self, frame: &[u8; FRAME_SIZE]) -> Result<()> {
            self.writes.lock().unwrap().push(*frame);
            Ok(())
        }

        fn read_frame(&mut self) -> Result<[u8; FRAME_SIZE]> {
            Err(Error::DeviceBusy)
        }
    }

    struct FakeConnector {
        device: Option<FakeDevice>,
        opens: Arc<Mutex<usize>>,
    }

    impl HidConnector for FakeConnector {
        type Device = FakeDevice;

        fn open(&self) -> Result<FakeDevice> {
            *self.opens.lock().unwrap() += 1;
            self.device.clone().ok_or(Error::DeviceNotFound {
                vendor_id: VENDOR_ID,
                product_id: TRANSMITTER_PRODUCT_ID,
            })
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = TransmitterConfig::default();
        assert_eq!(config.channels, 8);
        assert_eq!(config.send_repeat, 1);
        assert_eq!(config.vendor_id, 5824);
        assert_eq!(config.product_id, 1503);
        assert_eq!(config.transfer_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_config_builder() {
        let config = TransmitterConfig::for_model(DeviceModel::Pc1116)
            .send_repeat(12)
            .radio_repeats(2);
        assert_eq!(config.channels, 16);
        assert_eq!(config.send_repeat, 7);
        assert_eq!(config.radio_repeats, 2);
    }

    #[tokio::test]
    async fn test_send_repeats_transfer() {
        let device = FakeDevice::default();
        let connector = FakeConnector {
            device: Some(device.clone()),
            opens: Arc::default(),
        };
        let config = TransmitterConfig::default().send_repeat(3);
        let tx = UsbTransmitter::with_connector(config, connector);

        assert!(tx.send(&Command::new(CommandType::TurnOn, 2)).await);

        let writes = device.writes.lock().unwrap();
        assert_eq!(writes.len(), 4);
        assert!(writes.iter().all(|w| *w == [0x30, 2, 0, 0, 1, 0, 0, 0]));
    }

    #[tokio::test]
    async fn test_send_opens_per_call() {
        let opens = Arc::new(Mutex::new(0));
        let connector = FakeConnector {
            device: Some(FakeDevice::default()),
            opens: Arc::clone(&opens),
        };
        let tx = UsbTransmitter::with_connector(TransmitterConfig::default(), connector);

        assert!(tx.send(&Command::new(CommandType::TurnOn, 1)).await);
        assert!(tx.send(&Command::new(CommandType::TurnOff, 1)).await);
        assert_eq!(*opens.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_send_missing_device_returns_false() {
        let connector = FakeConnector {
            device: None,
            opens: Arc::default(),
        };
        let tx = UsbTransmitter::with_connector(TransmitterConfig::default(), connector);
        assert!(!tx.send(&Command::new(CommandType::TurnOn, 1)).await);
    }

    #[tokio::test]
    async fn test_send_out_of_range_never_opens() {
        let opens = Arc::new(Mutex::new(0));
        let connector = FakeConnector {
            device: Some(FakeDevice::default()),
            opens: Arc::clone(&opens),
        };
        let tx = UsbTransmitter::with_connector(TransmitterConfig::default(), connector);

        assert!(!tx.send(&Command::new(CommandType::TurnOn, 9)).await);
        assert_eq!(*opens.lock().unwrap(), 0);
    }

    /// Records the open sequence of a USB device.
    struct ScriptedUsb {
        calls: Mutex<Vec<&'static str>>,
        active: Option<u8>,
        detach: fn() -> io::Result<()>,
        configure: fn() -> io::Result<()>,
    }

    impl ScriptedUsb {
        fn new(active: Option<u8>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                active,
                detach: || Ok(()),
                configure: || Ok(()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ConfigureDevice for ScriptedUsb {
        fn detach_kernel_driver(&self, interface: u8) -> io::Result<()> {
            assert_eq!(interface, HID_INTERFACE);
            self.calls.lock().unwrap().push("detach");
            (self.detach)()
        }

        fn active_configuration(&self) -> Option<u8> {
            self.calls.lock().unwrap().push("active");
            self.active
        }

        fn set_configuration(&self, configuration: u8) -> io::Result<()> {
            assert_eq!(configuration, 1);
            self.calls.lock().unwrap().push("configure");
            (self.configure)()
        }
    }

    #[test]
    fn test_prepare_detaches_before_configuring() {
        let usb = ScriptedUsb::new(None);
        prepare_device(&usb).unwrap();
        assert_eq!(usb.calls(), vec!["detach", "active", "configure"]);
    }

    #[test]
    fn test_prepare_skips_active_configuration() {
        let usb = ScriptedUsb::new(Some(1));
        prepare_device(&usb).unwrap();
        assert_eq!(usb.calls(), vec!["detach", "active"]);
    }

    #[test]
    fn test_prepare_without_kernel_driver() {
        let mut usb = ScriptedUsb::new(Some(2));
        usb.detach = || Err(io::Error::from(io::ErrorKind::NotFound));
        prepare_device(&usb).unwrap();
        assert_eq!(usb.calls(), vec!["detach", "active", "configure"]);
    }

    #[test]
    fn test_prepare_busy_configuration() {
        let mut usb = ScriptedUsb::new(None);
        usb.configure = || Err(io::Error::from(io::ErrorKind::ResourceBusy));
        assert!(matches!(prepare_device(&usb), Err(Error::DeviceBusy)));
    }

    #[test]
    fn test_busy_error_mapping() {
        let err = configuration_error(io::Error::from(io::ErrorKind::ResourceBusy));
        assert!(matches!(err, Error::DeviceBusy));

        let err = configuration_error(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::DeviceConfig { .. }));
    }
}
