//! HTTP surface: status, latest sensor value, configuration, credentials.
//!
//! Request parsing and response building are pure functions over byte slices
//! and snapshots, unit-tested on the host; the ESP-IDF server wiring at the
//! bottom only moves bytes between those functions and the socket.
//!
//! Contract (paths as served by the existing web UI):
//!
//! - `GET /wifiConnectStatus` → `{"wifi_connect_status":<0-3>,"fw_update_status":<-1|0|1>}`
//! - `GET /sensor_value` → latest temperature as a bare decimal string;
//!   `503` until the first sample exists. The legacy handler blocked forever
//!   on the sample queue here, so a request could hang indefinitely; this
//!   reads the latest-value snapshot instead.
//! - `POST /tempRange.json` → flat band/color fields, validated before the
//!   table is pushed to the classifier's config channel; `400` leaves the
//!   active table in force.
//! - `POST /wifiConnect.json` → `{selectedSSID, pwd}`, forwarded to the
//!   Wi-Fi adapter.

use serde::Deserialize;

use crate::channel::{LatestCell, Sender};
use crate::config::{Band, Rgb, ThresholdConfig};
use crate::error::ConfigError;
use crate::monitor::StatusCell;
use crate::sampler::Sample;

/// Shared handles the HTTP handlers operate on. Everything here is a
/// read-only snapshot or a non-blocking producer: handlers never suspend.
#[derive(Clone)]
pub struct HttpState {
    pub status: StatusCell,
    pub latest: LatestCell<Sample>,
    pub config_tx: Sender<ThresholdConfig>,
}

// ───────────────────────────────────────────────────────────────
// Wire structs
// ───────────────────────────────────────────────────────────────

/// The existing webform posts every value as a string-encoded integer;
/// scripted clients post plain numbers. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntField {
    Num(i32),
    Str(heapless::String<16>),
}

impl IntField {
    fn value(&self) -> Result<i32, ConfigError> {
        match self {
            Self::Num(n) => Ok(*n),
            Self::Str(s) => s.parse().map_err(|_| ConfigError::Malformed),
        }
    }
}

/// Flat wire layout of `POST /tempRange.json` (observed field names).
/// First LED = high band, second = medium, third = low.
#[derive(Deserialize)]
struct ConfigRequest {
    high_temp_lvalue: IntField,
    high_temp_uvalue: IntField,
    medium_temp_lvalue: IntField,
    medium_temp_uvalue: IntField,
    low_temp_lvalue: IntField,
    low_temp_uvalue: IntField,
    r_value_first_led: IntField,
    g_value_first_led: IntField,
    b_value_first_led: IntField,
    r_value_second_led: IntField,
    g_value_second_led: IntField,
    b_value_second_led: IntField,
    r_value_third_led: IntField,
    g_value_third_led: IntField,
    b_value_third_led: IntField,
}

fn channel_u8(field: &IntField) -> Result<u8, ConfigError> {
    u8::try_from(field.value()?).map_err(|_| ConfigError::Malformed)
}

impl ConfigRequest {
    fn into_config(self) -> Result<ThresholdConfig, ConfigError> {
        let high_color = Rgb::new(
            channel_u8(&self.r_value_first_led)?,
            channel_u8(&self.g_value_first_led)?,
            channel_u8(&self.b_value_first_led)?,
        );
        let medium_color = Rgb::new(
            channel_u8(&self.r_value_second_led)?,
            channel_u8(&self.g_value_second_led)?,
            channel_u8(&self.b_value_second_led)?,
        );
        let low_color = Rgb::new(
            channel_u8(&self.r_value_third_led)?,
            channel_u8(&self.g_value_third_led)?,
            channel_u8(&self.b_value_third_led)?,
        );
        Ok(ThresholdConfig {
            low: Band::new(
                self.low_temp_lvalue.value()?,
                self.low_temp_uvalue.value()?,
                low_color,
            ),
            medium: Band::new(
                self.medium_temp_lvalue.value()?,
                self.medium_temp_uvalue.value()?,
                medium_color,
            ),
            high: Band::new(
                self.high_temp_lvalue.value()?,
                self.high_temp_uvalue.value()?,
                high_color,
            ),
        })
    }
}

/// `POST /wifiConnect.json` body (observed field names).
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(rename = "selectedSSID")]
    pub ssid: std::string::String,
    #[serde(rename = "pwd")]
    pub password: std::string::String,
}

// ───────────────────────────────────────────────────────────────
// Handlers (pure)
// ───────────────────────────────────────────────────────────────

/// Minimal response: status code plus body.
pub type Response = (u16, std::string::String);

/// Largest request body any endpoint accepts.
const MAX_BODY: usize = 1024;

/// Fixed-capacity accumulator for a request body that may arrive in
/// arbitrary chunk sizes (one TCP segment per read).
pub struct BodyBuf {
    buf: [u8; MAX_BODY],
    len: usize,
}

impl BodyBuf {
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_BODY],
            len: 0,
        }
    }

    /// Append one chunk. Returns `false` when the body exceeds capacity.
    pub fn extend(&mut self, chunk: &[u8]) -> bool {
        let Some(end) = self.len.checked_add(chunk.len()).filter(|&e| e <= MAX_BODY) else {
            return false;
        };
        self.buf[self.len..end].copy_from_slice(chunk);
        self.len = end;
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Default for BodyBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /wifiConnectStatus`.
pub fn get_status(state: &HttpState) -> Response {
    let snap = state.status.read();
    (
        200,
        format!(
            "{{\"wifi_connect_status\":{},\"fw_update_status\":{}}}",
            snap.wifi.code(),
            snap.ota.code()
        ),
    )
}

/// `GET /sensor_value`. Non-blocking snapshot read; 503 before first sample.
pub fn get_sensor_value(state: &HttpState) -> Response {
    match state.latest.load() {
        Some(sample) => (200, format!("{:.2}", sample.temperature_c)),
        None => (503, "no sample yet".into()),
    }
}

/// Parse and validate a config request body without touching any channel.
pub fn parse_config(body: &[u8]) -> Result<ThresholdConfig, ConfigError> {
    let req: ConfigRequest = serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)?;
    let config = req.into_config()?;
    config.validate()?;
    Ok(config)
}

/// `POST /tempRange.json`. On success the validated table is pushed to the
/// classifier's config channel (non-blocking; a full channel is the usual
/// counted silent drop). On validation failure the previously active table
/// remains in force and the caller gets a client error.
pub fn post_config(state: &HttpState, body: &[u8]) -> Response {
    match parse_config(body) {
        Ok(config) => {
            state.config_tx.try_send(config);
            (200, "{}".into())
        }
        Err(e) => (400, format!("{{\"error\":\"{e}\"}}")),
    }
}

/// Parse a credentials body; forwarding to the Wi-Fi adapter is wired by the
/// caller, which owns the adapter.
pub fn parse_credentials(body: &[u8]) -> Result<CredentialsRequest, ConfigError> {
    serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF server wiring
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub mod server {
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::{Read, Write};
    use log::info;

    use super::{get_sensor_value, get_status, parse_credentials, post_config, BodyBuf, HttpState};
    use crate::adapters::wifi::WifiAdapter;

    /// Drain the request body; a single read can return one TCP segment,
    /// not the whole body. `None` means the body exceeded capacity.
    fn read_body<R: Read>(req: &mut R) -> Result<Option<BodyBuf>, R::Error> {
        let mut body = BodyBuf::new();
        let mut chunk = [0u8; 128];
        loop {
            let n = req.read(&mut chunk)?;
            if n == 0 {
                return Ok(Some(body));
            }
            if !body.extend(&chunk[..n]) {
                return Ok(None);
            }
        }
    }

    /// Start the HTTP server and register all URI handlers.
    pub fn start(
        state: HttpState,
        wifi: Arc<Mutex<WifiAdapter>>,
    ) -> anyhow::Result<EspHttpServer<'static>> {
        let mut server = EspHttpServer::new(&Configuration::default())?;

        let s = state.clone();
        server.fn_handler("/wifiConnectStatus", Method::Get, move |req| {
            let (code, body) = get_status(&s);
            let mut resp = req.into_status_response(code)?;
            resp.write(body.as_bytes())?;
            Ok::<(), anyhow::Error>(())
        })?;

        let s = state.clone();
        server.fn_handler("/sensor_value", Method::Get, move |req| {
            let (code, body) = get_sensor_value(&s);
            let mut resp = req.into_status_response(code)?;
            resp.write(body.as_bytes())?;
            Ok::<(), anyhow::Error>(())
        })?;

        let s = state.clone();
        server.fn_handler("/tempRange.json", Method::Post, move |mut req| {
            let Some(raw) = read_body(&mut req)? else {
                req.into_status_response(413)?;
                return Ok(());
            };
            let (code, body) = post_config(&s, raw.as_slice());
            let mut resp = req.into_status_response(code)?;
            resp.write(body.as_bytes())?;
            Ok::<(), anyhow::Error>(())
        })?;

        server.fn_handler("/wifiConnect.json", Method::Post, move |mut req| {
            let Some(raw) = read_body(&mut req)? else {
                req.into_status_response(413)?;
                return Ok(());
            };
            let code = match parse_credentials(raw.as_slice()) {
                Ok(creds) => {
                    let mut wifi = wifi.lock().unwrap();
                    match wifi
                        .set_credentials(&creds.ssid, &creds.password)
                        .and_then(|()| wifi.connect())
                    {
                        Ok(()) => 200,
                        Err(_) => 400,
                    }
                }
                Err(_) => 400,
            };
            req.into_status_response(code)?;
            Ok::<(), anyhow::Error>(())
        })?;

        info!("http: server started");
        Ok(server)
    }
}
