//! Time, SNTP, and restart adapters.
//!
//! - **`target_os = "espidf"`** — monotonic time from `esp_timer_get_time()`,
//!   wall-clock sync via the ESP-IDF SNTP client, restart via `esp_restart`.
//! - **all other targets** — `std::time::Instant`, logged no-op sync, and a
//!   restart adapter that records the request so tests can observe it.

use crate::ports::{RestartPort, TimeSyncPort};

// ───────────────────────────────────────────────────────────────
// Monotonic clock
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot. Cheap to clone; every task gets one.
#[derive(Clone)]
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ───────────────────────────────────────────────────────────────
// SNTP time sync
// ───────────────────────────────────────────────────────────────

/// One-shot SNTP synchronization against `pool.ntp.org`, invoked by the
/// monitor on the first successful connection. Idempotent: a second call
/// while a client is already running does nothing.
pub struct SntpSync {
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    synced: bool,
}

impl Default for SntpSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SntpSync {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            synced: false,
        }
    }
}

impl TimeSyncPort for SntpSync {
    #[cfg(target_os = "espidf")]
    fn sync_time(&mut self) {
        if self.client.is_some() {
            return;
        }
        match esp_idf_svc::sntp::EspSntp::new_default() {
            Ok(client) => {
                log::info!("sntp: client started (pool.ntp.org)");
                self.client = Some(client);
            }
            Err(e) => log::warn!("sntp: init failed ({e})"),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync_time(&mut self) {
        if !self.synced {
            log::info!("sntp(sim): time sync requested");
            self.synced = true;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// System restart
// ───────────────────────────────────────────────────────────────

/// Deferred restart executor for the post-OTA reboot.
#[derive(Default)]
pub struct SystemRestart {
    #[cfg(not(target_os = "espidf"))]
    requested: bool,
}

impl SystemRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-only observability hook for tests and the simulation loop.
    #[cfg(not(target_os = "espidf"))]
    pub fn was_requested(&self) -> bool {
        self.requested
    }
}

impl RestartPort for SystemRestart {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        log::info!("restart: rebooting now");
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        log::info!("restart(sim): reboot requested");
        self.requested = true;
    }
}
