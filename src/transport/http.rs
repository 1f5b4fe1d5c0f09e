//! PR1132 Ethernet gateway.
//!
//! Commands become `GET /api.htm` requests; sensor readings are fetched from
//! the gateway's snapshot page.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::protocol::{SnapshotFormat, parse_sensor_snapshot};
use crate::transport::Transmitter;
use crate::types::{Command, DeviceModel, Sensor};

/// Default timeout of a gateway request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway host, optionally with a port (`192.168.0.168`, `gw.lan:8080`).
    pub host: String,
    /// Number of transmitter channels.
    pub channels: u8,
    /// Timeout of each request.
    pub request_timeout: Duration,
    /// Snapshot page served by the gateway firmware.
    pub snapshot_format: SnapshotFormat,
}

impl GatewayConfig {
    /// Creates a configuration for the gateway at `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            channels: DeviceModel::Pr1132.channels(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            snapshot_format: SnapshotFormat::default(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the snapshot format.
    #[must_use]
    pub const fn snapshot_format(mut self, format: SnapshotFormat) -> Self {
        self.snapshot_format = format;
        self
    }

    /// Overrides the channel count.
    #[must_use]
    pub const fn channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }
}

/// HTTP client for the PR1132 gateway.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    sensors: RwLock<BTreeMap<u8, Sensor>>,
}

impl HttpGateway {
    /// Creates a gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            sensors: RwLock::new(BTreeMap::new()),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Builds the request URL for a command.
    ///
    /// `br`, `fmt` and `d0`..`d3` are only appended when they carry a value.
    pub fn command_url(&self, command: &Command) -> Result<String> {
        let channel = command.wire_channel(self.config.channels)?;

        let mut query = vec![format!("ch={channel}"), format!("cmd={}", command.kind.code())];
        match (command.level, command.format) {
            (Some(level), _) if level != 0 => query.push(format!("br={level}")),
            (None, Some(format)) => query.push(format!("fmt={}", u8::from(format))),
            _ => {}
        }
        query.extend(
            command
                .data
                .iter()
                .enumerate()
                .filter(|(_, value)| **value != 0)
                .map(|(i, value)| format!("d{i}={value}")),
        );

        let url = format!("http://{}/api.htm?{}", self.config.host, query.join("&"));
        Ok(url)
    }

    /// Fetches the sensor snapshot and replaces the cached readings.
    pub async fn fetch_sensors(&self) -> Result<Vec<Sensor>> {
        let url = format!(
            "http://{}/{}",
            self.config.host,
            self.config.snapshot_format.path()
        );
        tracing::debug!("fetching sensors from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let sensors = parse_sensor_snapshot(&body, self.config.snapshot_format)?;

        *self.sensors.write().await = sensors.iter().map(|s| (s.channel, *s)).collect();
        Ok(sensors)
    }

    /// Returns the readings from the last successful fetch, ordered by channel.
    pub async fn sensors(&self) -> Vec<Sensor> {
        self.sensors.read().await.values().copied().collect()
    }

    async fn get_ok(&self, url: &str) -> Result<()> {
        let status = self.client.get(url).send().await?.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(Error::HttpStatus {
                status: status.as_u16(),
            })
        }
    }
}

impl Transmitter for HttpGateway {
    fn available_channels(&self) -> u8 {
        self.config.channels
    }

    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, bool> {
        async move {
            let url = match self.command_url(command) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("command rejected: {}", e);
                    return false;
                }
            };

            tracing::debug!("gateway request {}", url);
            match self.get_ok(&url).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("gateway request failed: {}", e);
                    false
                }
            }
        }
        .boxed()
    }
}
