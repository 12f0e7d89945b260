//! Wi-Fi soft access point adapter.
//!
//! Implements [`AccessPointPort`]: the car hosts its own network and the
//! joypad is served on the AP's router address.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` in access-point
//!   mode with a custom router netif at 192.168.4.1/24 (DHCP on).
//! - **all other targets**: simulation stub that reports 127.0.0.1.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::{AccessPointPort, ApSettings, NetError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    ipv4::{self, Mask, Subnet},
    netif::{EspNetif, NetifConfiguration, NetifStack},
    wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi, WifiDriver,
    },
};

/// Gateway address handed out by the AP's DHCP server.
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// Prefix length of the AP subnet.
pub const AP_PREFIX_LEN: u8 = 24;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate(settings: &ApSettings) -> Result<(), NetError> {
    let ssid = settings.ssid.as_str();
    if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(NetError::ApStart("invalid SSID"));
    }
    let pw = settings.password.len();
    if pw != 0 && pw < 8 {
        return Err(NetError::ApStart("passphrase shorter than 8 bytes"));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Soft AP adapter
// ───────────────────────────────────────────────────────────────

pub struct SoftApAdapter {
    active: bool,
    activations: u32,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
}

#[cfg(target_os = "espidf")]
impl SoftApAdapter {
    /// Build the Wi-Fi driver with a router-mode AP netif.  The radio stays
    /// off until [`AccessPointPort::activate`].
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> anyhow::Result<Self> {
        let [a, b, c, d] = AP_ADDRESS.octets();
        let gateway = ipv4::Ipv4Addr::new(a, b, c, d);
        let ap_netif = EspNetif::new_with_conf(&NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(ipv4::RouterConfiguration {
                subnet: Subnet {
                    gateway,
                    mask: Mask(AP_PREFIX_LEN),
                },
                dhcp_enabled: true,
                dns: Some(gateway),
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        })?;

        let driver = WifiDriver::new(modem, sysloop.clone(), None)?;
        let sta_netif = EspNetif::new(NetifStack::Sta)?;
        let wifi = BlockingWifi::wrap(EspWifi::wrap_all(driver, sta_netif, ap_netif)?, sysloop)?;

        Ok(Self {
            active: false,
            activations: 0,
            wifi,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl SoftApAdapter {
    pub fn new() -> Self {
        Self {
            active: false,
            activations: 0,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SoftApAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftApAdapter {
    /// Successful activations since boot.
    pub fn activations(&self) -> u32 {
        self.activations
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self, settings: &ApSettings) -> Result<Ipv4Addr, NetError> {
        let auth_method = if settings.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = AccessPointConfiguration {
            ssid: settings
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| NetError::ApStart("SSID too long"))?,
            password: settings
                .password
                .as_str()
                .try_into()
                .map_err(|_| NetError::ApStart("passphrase too long"))?,
            ssid_hidden: false,
            channel: settings.channel,
            auth_method,
            max_connections: settings.max_clients,
            ..Default::default()
        };

        self.wifi
            .set_configuration(&Configuration::AccessPoint(config))
            .map_err(|_| NetError::ApStart("set_configuration"))?;
        self.wifi.start().map_err(|_| NetError::ApStart("wifi start"))?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| NetError::ApStart("netif up"))?;

        let info = self
            .wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .map_err(|_| NetError::ApStart("ip info"))?;
        Ok(Ipv4Addr::from(info.ip.octets()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self, settings: &ApSettings) -> Result<Ipv4Addr, NetError> {
        info!(
            "WiFi(sim): AP '{}' on channel {} (max {} clients)",
            settings.ssid, settings.channel, settings.max_clients
        );
        Ok(Ipv4Addr::LOCALHOST)
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), NetError> {
        self.wifi.stop().map_err(|_| NetError::ApStop("wifi stop"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), NetError> {
        info!("WiFi(sim): AP stopped");
        Ok(())
    }
}

impl AccessPointPort for SoftApAdapter {
    fn activate(&mut self, settings: &ApSettings) -> Result<Ipv4Addr, NetError> {
        if self.active {
            return Err(NetError::AlreadyActive);
        }
        validate(settings)?;
        let address = self.platform_start(settings)?;
        self.active = true;
        self.activations = self.activations.wrapping_add(1);
        info!("WiFi: AP '{}' active at {}", settings.ssid, address);
        Ok(address)
    }

    fn deactivate(&mut self) -> Result<(), NetError> {
        if !self.active {
            return Ok(());
        }
        // Considered down even if the driver call fails; the next activation
        // reconfigures the radio from scratch.
        self.active = false;
        self.platform_stop().inspect_err(|e| warn!("WiFi: {}", e))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
