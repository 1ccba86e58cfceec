use esp_idf_hal::peripheral;
/// WiFi connection manager - station mode only
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::info;

/// Access points listed in the pre-connect scan
const MAX_SCAN_RESULTS: usize = 10;

pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiManager {
    pub fn new(
        modem: impl peripheral::Peripheral<P = esp_idf_hal::modem::Modem> + 'static,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;
        Ok(Self { wifi })
    }

    /// Join an existing network and wait for a DHCP lease
    ///
    /// Nearby access points are logged first, which helps when the SSID is
    /// misspelled or out of range.
    pub fn connect(
        &mut self,
        ssid: &str,
        password: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        info!("Setting WiFi configuration (STA mode)");
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| "SSID longer than 32 bytes")?,
            password: password
                .try_into()
                .map_err(|_| "WiFi password longer than 64 bytes")?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;

        info!("Starting WiFi");
        self.wifi.start()?;

        self.log_scan();

        info!("Connecting to AP '{}'", ssid);
        self.wifi.connect()?;

        info!("Waiting for DHCP lease");
        self.wifi.wait_netif_up()?;

        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        info!(
            "WiFi connected! IP: {}, Netmask: /{}, Gateway: {}",
            ip_info.ip, ip_info.subnet.mask, ip_info.subnet.gateway
        );

        Ok(())
    }

    fn log_scan(&mut self) {
        match self.wifi.scan() {
            Ok(aps) => {
                info!("{} network(s) available", aps.len());
                for ap in aps.iter().take(MAX_SCAN_RESULTS) {
                    info!(
                        "  {} secured: {} RSSI: {} Ch: {}",
                        ap.ssid,
                        ap.auth_method.map_or(false, |m| m != AuthMethod::None),
                        ap.signal_strength,
                        ap.channel
                    );
                }
            }
            Err(e) => info!("WiFi scan failed: {}", e),
        }
    }
}
