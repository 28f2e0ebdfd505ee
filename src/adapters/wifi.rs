//! Wi-Fi station adapter.
//!
//! Radio management itself is out of scope for the coordination core — this
//! adapter's job is to validate operator credentials and to translate the
//! station lifecycle into [`ConnectivityEvent`]s on the shared event channel,
//! where it is one of two producers (the OTA callback is the other).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF station driver calls.
//! - **all other targets**: simulation stub that associates immediately.

use heapless::String;
use log::{info, warn};

use crate::channel::Sender;
use crate::error::CommsError;
use crate::events::ConnectivityEvent;

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CommsError> {
    // Empty = open network; otherwise WPA2 bounds.
    if !password.is_empty() && (password.len() < 8 || password.len() > 64) {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}

/// Station-mode adapter. Produces connectivity events; never consumes them.
pub struct WifiAdapter {
    ssid: String<32>,
    password: String<64>,
    events: Sender<ConnectivityEvent>,
}

impl WifiAdapter {
    pub fn new(events: Sender<ConnectivityEvent>) -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            events,
        }
    }

    /// Validate and store operator credentials (from `POST /wifi_credentials`).
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| CommsError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| CommsError::InvalidPassword)?;
        info!("wifi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Begin a connect attempt. Emits `WifiConnectInit` immediately and
    /// `WifiConnectSuccess`/`WifiConnectFail` when the attempt resolves.
    pub fn connect(&mut self) -> Result<(), CommsError> {
        if self.ssid.is_empty() {
            return Err(CommsError::InvalidSsid);
        }

        self.events.try_send(ConnectivityEvent::WifiConnectInit);

        match self.platform_connect() {
            Ok(()) => {
                info!("wifi: associated with '{}'", self.ssid);
                self.events.try_send(ConnectivityEvent::WifiConnectSuccess);
                Ok(())
            }
            Err(e) => {
                warn!("wifi: connect failed ({e})");
                self.events.try_send(ConnectivityEvent::WifiConnectFail);
                Err(e)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        // The EspWifi handle (modem peripheral + sysloop) is owned by the
        // espidf bootstrap in main; this adapter drives it through the
        // station lifecycle and reports the outcome.
        crate::drivers::hw::wifi_sta_connect(self.ssid.as_str(), self.password.as_str())
            .map_err(|_| CommsError::WifiConnectFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        info!("wifi(sim): associated with '{}'", self.ssid);
        Ok(())
    }
}
