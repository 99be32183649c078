//! Static device configuration
//!
//! Network credentials, the WebSocket endpoint and the device identity can be
//! overridden at build time through `NOBU_*` environment variables (or a `.env`
//! file next to `Cargo.toml`, see `build.rs`). Everything else is fixed for the
//! TTGO T5 V2.3 board with its 2.13" panel.

use std::fmt;
use std::time::Duration;

use crate::face::layout::FaceLayout;

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(value) => value,
        None => default,
    }
}

const WIFI_SSID: &str = env_or(option_env!("NOBU_WIFI_SSID"), "YOUR_WIFI_SSID");
const WIFI_PASSWORD: &str = env_or(option_env!("NOBU_WIFI_PASSWORD"), "YOUR_WIFI_PASSWORD");

const WS_HOST: &str = env_or(option_env!("NOBU_WS_HOST"), "192.168.1.100");
const WS_PORT: u16 = 8765;
const WS_PATH: &str = env_or(option_env!("NOBU_WS_PATH"), "/ws");

const DEVICE_ID: &str = env_or(option_env!("NOBU_DEVICE_ID"), "nobu-kitchen");
const DEVICE_LOCATION: &str = env_or(option_env!("NOBU_DEVICE_LOCATION"), "kitchen");

const WIFI_RECONNECT_MS: u64 = 5000;
const WS_RECONNECT_MS: u64 = 3000;

const DEMO_MODE: bool = true;
const DEMO_CYCLE_MS: u64 = 6000;

/// Wi-Fi station credentials
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"********")
            .finish()
    }
}

/// WebSocket endpoint of the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: &'static str,
    pub port: u16,
    pub path: &'static str,
}

impl Endpoint {
    /// `ws://host:port/path`
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Who this device is, announced in the greeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: &'static str,
    pub location: &'static str,
}

/// Everything the connectivity state machine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub credentials: Credentials,
    pub endpoint: Endpoint,
    /// Minimum time between two Wi-Fi connection attempts
    pub link_backoff: Duration,
    /// Minimum time between two WebSocket connection attempts
    pub session_backoff: Duration,
}

/// Cycling through the expressions while nobody is talking to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    pub enabled: bool,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub face: FaceLayout,
    pub network: NetworkConfig,
    pub identity: DeviceIdentity,
    pub demo: DemoConfig,
}

impl Default for Config {
    fn default() -> Self {
        let port = option_env!("NOBU_WS_PORT")
            .and_then(|port| port.parse().ok())
            .unwrap_or(WS_PORT);

        Self {
            face: FaceLayout::DEFAULT,
            network: NetworkConfig {
                credentials: Credentials {
                    ssid: WIFI_SSID,
                    password: WIFI_PASSWORD,
                },
                endpoint: Endpoint {
                    host: WS_HOST,
                    port,
                    path: WS_PATH,
                },
                link_backoff: Duration::from_millis(WIFI_RECONNECT_MS),
                session_backoff: Duration::from_millis(WS_RECONNECT_MS),
            },
            identity: DeviceIdentity {
                device_id: DEVICE_ID,
                location: DEVICE_LOCATION,
            },
            demo: DemoConfig {
                enabled: DEMO_MODE,
                interval: Duration::from_millis(DEMO_CYCLE_MS),
            },
        }
    }
}
