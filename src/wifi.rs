use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::{EspNvsPartition, NvsDefault};
use esp_idf_svc::wifi::EspWifi;
use log::{debug, info};

use crate::config::Credentials;
use crate::connectivity::{Link, LinkStatus};

/// How long an unassociated station counts as connecting after an attempt.
/// Kept below the link backoff so a failed attempt shows as down before the next one.
const ASSOCIATION_WINDOW: Duration = Duration::from_secs(4);

/// Wi-Fi station driven without blocking. Progress is read back through
/// [`Link::status`] on every tick.
pub struct EspLink {
    wifi: EspWifi<'static>,
    attempt_started: Option<Instant>,
}

impl EspLink {
    pub fn new(modem: Modem) -> Result<Self> {
        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspNvsPartition::<NvsDefault>::take()?;
        let wifi = EspWifi::new(modem, sys_loop, Some(nvs))?;

        Ok(Self {
            wifi,
            attempt_started: None,
        })
    }

    pub fn get_ip_info(&self) -> Result<esp_idf_svc::ipv4::IpInfo> {
        Ok(self.wifi.sta_netif().get_ip_info()?)
    }
}

impl Link for EspLink {
    fn status(&self) -> LinkStatus {
        let associated = self.wifi.is_connected().unwrap_or(false);
        let netif_up = self.wifi.sta_netif().is_up().unwrap_or(false);

        let since_attempt = self.attempt_started.map(|started| started.elapsed());

        LinkStatus::from_station(associated, netif_up, since_attempt, ASSOCIATION_WINDOW)
    }

    fn begin_connect(&mut self, credentials: &Credentials) -> Result<()> {
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid
                .try_into()
                .map_err(|_| anyhow!("SSID too long: {}", credentials.ssid))?,
            password: credentials
                .password
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }

        // Drop a half finished association before starting over
        if let Err(e) = self.wifi.disconnect() {
            debug!("WiFi disconnect before reconnect: {}", e);
        }
        self.wifi.connect()?;
        self.attempt_started = Some(Instant::now());
        info!("WiFi association started");
        Ok(())
    }
}
