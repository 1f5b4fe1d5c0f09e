//! RX2164 receiver adapter.
//!
//! The adapter keeps the last radio notification in a feature report whose
//! first byte carries a 6-bit toggle counter. [`Receiver`] polls that report
//! on a background task, drops repeats of the same toggle, decodes new
//! frames, and hands them to its observers.
//!
//! Bind and unbind requests share the device with the poll loop. Every
//! transfer goes through one mutex, and the loop stays paused while a
//! request settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::event::{NotificationDispatcher, Observer};
use crate::protocol::{CommandFrame, NotificationFrame, ReceiverRequest, decode_notification};
use crate::transport::usb::DEFAULT_TRANSFER_TIMEOUT;
use crate::transport::{HidConnector, HidDevice, UsbConnector, UsbHidDevice};
use crate::types::{DeviceModel, Notification, RECEIVER_PRODUCT_ID, VENDOR_ID};

/// Default delay between two reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default time the adapter needs after a bind/unbind request.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Configuration for the receiver adapter.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Number of receiver channels.
    pub channels: u8,
    /// Delay between two reads.
    pub poll_interval: Duration,
    /// Pause after a bind/unbind request.
    pub settle_delay: Duration,
    /// Timeout of each control transfer.
    pub transfer_timeout: Duration,
    /// USB vendor id.
    pub vendor_id: u16,
    /// USB product id.
    pub product_id: u16,
}

impl ReceiverConfig {
    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the settle delay.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the transfer timeout.
    #[must_use]
    pub const fn transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Overrides the channel count.
    #[must_use]
    pub const fn channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            channels: DeviceModel::Rx2164.channels(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            vendor_id: VENDOR_ID,
            product_id: RECEIVER_PRODUCT_ID,
        }
    }
}

/// Lifecycle of a [`Receiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Created, accepting observers.
    Idle,
    /// Poll loop running.
    Running,
    /// Poll loop finished.
    Stopped,
}

/// Remembers the last toggle value seen.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToggleTracker {
    last: Option<u8>,
}

impl ToggleTracker {
    /// Returns true if `toggle` differs from the last recorded one.
    #[must_use]
    pub fn is_new(&self, toggle: u8) -> bool {
        self.last != Some(toggle)
    }

    /// Records `toggle` as the last one seen.
    pub fn record(&mut self, toggle: u8) {
        self.last = Some(toggle);
    }
}

/// Handles one polled frame.
///
/// Returns the notification if the frame was new and decodable.
fn process_frame(
    frame: &NotificationFrame,
    tracker: &mut ToggleTracker,
    dispatcher: &mut NotificationDispatcher,
) -> Option<Notification> {
    let toggle = frame.toggle();
    if !tracker.is_new(toggle) {
        return None;
    }
    tracker.record(toggle);

    match decode_notification(frame) {
        Ok(notification) => {
            tracing::debug!(
                "notification {}: {:?}",
                hex::encode(frame.as_bytes()),
                notification
            );
            dispatcher.dispatch(&notification);
            Some(notification)
        }
        Err(e) => {
            tracing::warn!("dropping frame {}: {}", hex::encode(frame.as_bytes()), e);
            None
        }
    }
}

/// Reads one frame, holding the device lock for the transfer.
async fn read_frame<D: HidDevice>(device: &Arc<Mutex<D>>) -> Result<NotificationFrame> {
    let mut guard = Arc::clone(device).lock_owned().await;
    let bytes = tokio::task::spawn_blocking(move || guard.read_frame())
        .await
        .map_err(|e| Error::Usb(std::io::Error::other(e)))??;
    Ok(NotificationFrame::from(bytes))
}

async fn run_loop<D: HidDevice>(
    device: Arc<Mutex<D>>,
    shutdown: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    mut dispatcher: NotificationDispatcher,
    poll_interval: Duration,
) {
    let mut tracker = ToggleTracker::default();

    while !shutdown.load(Ordering::SeqCst) {
        if !paused.load(Ordering::SeqCst) {
            match read_frame(&device).await {
                Ok(frame) => {
                    process_frame(&frame, &mut tracker, &mut dispatcher);
                }
                Err(e) => tracing::trace!("receiver read failed: {}", e),
            }
        }
        tokio::time::sleep(poll_interval).await;
    }

    tracing::info!("receiver loop stopped");
}

/// RX2164 receiver with a background poll loop.
pub struct Receiver<D = UsbHidDevice> {
    config: ReceiverConfig,
    device: Arc<Mutex<D>>,
    shutdown: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    dispatcher: Option<NotificationDispatcher>,
    task: Option<JoinHandle<()>>,
    state: ReceiverState,
}

impl Receiver<UsbHidDevice> {
    /// Opens the receiver adapter over USB.
    ///
    /// The device stays claimed until the receiver is dropped.
    pub fn open(config: ReceiverConfig) -> Result<Self> {
        let connector =
            UsbConnector::new(config.vendor_id, config.product_id, config.transfer_timeout);
        let device = connector.open()?;
        tracing::info!(
            "opened receiver {:04x}:{:04x}",
            config.vendor_id,
            config.product_id
        );
        Ok(Self::with_device(config, device))
    }
}

impl<D: HidDevice> Receiver<D> {
    /// Creates a receiver over an already opened device.
    #[must_use]
    pub fn with_device(config: ReceiverConfig, device: D) -> Self {
        Self {
            config,
            device: Arc::new(Mutex::new(device)),
            shutdown: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            dispatcher: Some(NotificationDispatcher::new()),
            task: None,
            state: ReceiverState::Idle,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ReceiverState {
        self.state
    }

    /// Returns true while a bind/unbind request is settling.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Registers an observer. Only allowed before [`start`](Self::start).
    pub fn add_observer(&mut self, observer: impl Observer) -> Result<()> {
        match (self.state, self.dispatcher.as_mut()) {
            (ReceiverState::Idle, Some(dispatcher)) => {
                dispatcher.register(observer);
                Ok(())
            }
            _ => Err(Error::InvalidState {
                message: "observers must be added before start".into(),
            }),
        }
    }

    /// Starts the poll loop on a background task.
    pub fn start(&mut self) -> Result<()> {
        let dispatcher = match (self.state, self.dispatcher.take()) {
            (ReceiverState::Idle, Some(dispatcher)) => dispatcher,
            (_, dispatcher) => {
                self.dispatcher = dispatcher;
                return Err(Error::InvalidState {
                    message: format!("cannot start receiver in state {:?}", self.state),
                });
            }
        };

        tracing::info!(
            "starting receiver loop with {} observers",
            dispatcher.len()
        );
        self.task = Some(tokio::spawn(run_loop(
            Arc::clone(&self.device),
            Arc::clone(&self.shutdown),
            Arc::clone(&self.paused),
            dispatcher,
            self.config.poll_interval,
        )));
        self.state = ReceiverState::Running;
        Ok(())
    }

    /// Stops the poll loop and waits for it to finish.
    ///
    /// Frames still pending in the adapter are not drained.
    pub async fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("receiver task failed: {}", e);
            }
        }
        self.state = ReceiverState::Stopped;
    }

    /// Stops the loop and releases the device.
    pub async fn close(mut self) {
        self.stop().await;
        tracing::info!("receiver closed");
    }

    /// Binds a remote to `channel`; the adapter must be in binding mode.
    pub async fn bind_channel(&self, channel: u8) -> Result<bool> {
        let wire = self.wire_channel(channel)?;
        Ok(self.service_request(ReceiverRequest::Bind, wire).await)
    }

    /// Clears the binding of `channel`.
    pub async fn unbind_channel(&self, channel: u8) -> Result<bool> {
        let wire = self.wire_channel(channel)?;
        Ok(self.service_request(ReceiverRequest::Unbind, wire).await)
    }

    /// Clears every binding of the adapter.
    pub async fn unbind_all(&self) -> bool {
        self.service_request(ReceiverRequest::UnbindAll, 0).await
    }

    fn wire_channel(&self, channel: u8) -> Result<u8> {
        if channel == 0 || channel > self.config.channels {
            return Err(Error::ChannelOutOfRange {
                channel,
                available: self.config.channels,
            });
        }
        Ok(channel - 1)
    }

    async fn service_request(&self, request: ReceiverRequest, wire_channel: u8) -> bool {
        self.paused.store(true, Ordering::SeqCst);

        let frame = CommandFrame::receiver_request(request, wire_channel);
        let mut guard = Arc::clone(&self.device).lock_owned().await;
        tracing::debug!("receiver request {}", hex::encode(frame.as_bytes()));
        let result = tokio::task::spawn_blocking(move || guard.write_frame(frame.as_bytes())).await;

        let ok = match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!("receiver request {:?} failed: {}", request, e);
                false
            }
            Err(e) => {
                tracing::error!("USB worker failed: {}", e);
                false
            }
        };

        tokio::time::sleep(self.config.settle_delay).await;
        self.paused.store(false, Ordering::SeqCst);
        ok
    }
}

impl<D> Drop for Receiver<D> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
