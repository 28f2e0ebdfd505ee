//! Connectivity status monitor.
//!
//! A two-axis state machine — network association × firmware-update
//! lifecycle — driven by [`ConnectivityEvent`]s from the Wi-Fi adapter and
//! the OTA upload callback. The monitor is the single consumer of the event
//! channel and the sole owner of both axes, so serialization comes from the
//! channel and no internal locking is needed. HTTP handlers read the current
//! state through a pair of atomics written only here.
//!
//! Side effects owned by the monitor:
//!
//! - first successful connection triggers a one-shot SNTP time sync;
//! - a successful firmware update arms a single-shot restart timer
//!   ([`RESTART_DELAY_MS`]) so the web page can receive its acknowledgement
//!   before the device reboots.

use std::sync::atomic::{AtomicI8, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::channel::{Receiver, ShutdownFlag};
use crate::events::ConnectivityEvent;
use crate::ports::{RestartPort, TimeSyncPort};

/// Delay between a successful OTA and the deferred restart (observed: 8 s).
pub const RESTART_DELAY_MS: u64 = 8_000;

/// Network-association axis. Integer values match the wire constants the
/// web UI polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WifiStatus {
    Disconnected = 0,
    Connecting = 1,
    ConnectFailed = 2,
    Connected = 3,
}

impl WifiStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Connecting,
            2 => Self::ConnectFailed,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Firmware-update axis. Codes match the legacy firmware's constants
/// (pending 0, successful 1, failed -1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaStatus {
    Pending,
    Successful,
    Failed,
}

impl OtaStatus {
    pub const fn code(self) -> i8 {
        match self {
            Self::Pending => 0,
            Self::Successful => 1,
            Self::Failed => -1,
        }
    }

    fn from_code(code: i8) -> Self {
        match code {
            1 => Self::Successful,
            -1 => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Read-only view of both axes at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub wifi: WifiStatus,
    pub ota: OtaStatus,
}

/// Lock-free snapshot cell: written exclusively by the monitor, read by any
/// number of HTTP handlers. Each axis is a small tagged value, so a plain
/// atomic per axis is enough — no transaction needed.
#[derive(Clone, Default)]
pub struct StatusCell {
    wifi: Arc<AtomicU8>,
    ota: Arc<AtomicI8>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            wifi: Arc::new(AtomicU8::new(WifiStatus::Disconnected.code())),
            ota: Arc::new(AtomicI8::new(OtaStatus::Pending.code())),
        }
    }

    pub fn read(&self) -> StatusSnapshot {
        StatusSnapshot {
            wifi: WifiStatus::from_code(self.wifi.load(Ordering::Acquire)),
            ota: OtaStatus::from_code(self.ota.load(Ordering::Acquire)),
        }
    }

    fn publish(&self, wifi: WifiStatus, ota: OtaStatus) {
        self.wifi.store(wifi.code(), Ordering::Release);
        self.ota.store(ota.code(), Ordering::Release);
    }
}

/// The state machine. No terminal state — runs for the process lifetime.
pub struct ConnectivityStatusMonitor {
    wifi: WifiStatus,
    ota: OtaStatus,
    /// In-process latch: the SNTP sync fires at most once.
    time_synced: bool,
    /// Armed restart deadline, single-shot.
    restart_at_ms: Option<u64>,
    cell: StatusCell,
}

impl ConnectivityStatusMonitor {
    pub fn new(cell: StatusCell) -> Self {
        cell.publish(WifiStatus::Disconnected, OtaStatus::Pending);
        Self {
            wifi: WifiStatus::Disconnected,
            ota: OtaStatus::Pending,
            time_synced: false,
            restart_at_ms: None,
            cell,
        }
    }

    pub fn wifi_status(&self) -> WifiStatus {
        self.wifi
    }

    pub fn ota_status(&self) -> OtaStatus {
        self.ota
    }

    /// Whether a restart deadline is currently armed.
    pub fn restart_armed(&self) -> bool {
        self.restart_at_ms.is_some()
    }

    /// Apply one event at monotonic time `now_ms`.
    ///
    /// Network axis: `WifiConnectInit` moves any state to `Connecting`;
    /// success and failure are only valid from `Connecting` and leave the
    /// axis unchanged otherwise. OTA axis: success and failure overwrite the
    /// axis from any state; only success arms the restart timer, and an
    /// already-armed timer is never re-armed.
    pub fn apply(&mut self, event: ConnectivityEvent, now_ms: u64, sync: &mut impl TimeSyncPort) {
        debug!("monitor: {event:?} in ({:?}, {:?})", self.wifi, self.ota);
        match event {
            ConnectivityEvent::WifiConnectInit => {
                self.wifi = WifiStatus::Connecting;
            }
            ConnectivityEvent::WifiConnectSuccess => {
                if self.wifi == WifiStatus::Connecting {
                    self.wifi = WifiStatus::Connected;
                    if !self.time_synced {
                        info!("monitor: connected, requesting time sync");
                        sync.sync_time();
                        self.time_synced = true;
                    }
                } else {
                    debug!("monitor: ignoring connect success in {:?}", self.wifi);
                }
            }
            ConnectivityEvent::WifiConnectFail => {
                if self.wifi == WifiStatus::Connecting {
                    self.wifi = WifiStatus::ConnectFailed;
                } else {
                    debug!("monitor: ignoring connect fail in {:?}", self.wifi);
                }
            }
            ConnectivityEvent::OtaSuccess => {
                self.ota = OtaStatus::Successful;
                if self.restart_at_ms.is_none() {
                    let deadline = now_ms + RESTART_DELAY_MS;
                    info!("monitor: firmware updated, restart armed for t+{RESTART_DELAY_MS} ms");
                    self.restart_at_ms = Some(deadline);
                } else {
                    warn!("monitor: restart already armed, not re-arming");
                }
            }
            ConnectivityEvent::OtaFailed => {
                self.ota = OtaStatus::Failed;
            }
        }
        self.cell.publish(self.wifi, self.ota);
    }

    /// Check the restart deadline against `now_ms`, firing at most once.
    /// Returns `true` when the restart action was invoked.
    pub fn poll_restart(&mut self, now_ms: u64, restart: &mut impl RestartPort) -> bool {
        match self.restart_at_ms {
            Some(deadline) if now_ms >= deadline => {
                info!("monitor: restart timer expired, restarting");
                self.restart_at_ms = None;
                restart.restart();
                true
            }
            _ => false,
        }
    }
}

/// Wake-up bound for the monitor loop: short enough that the restart
/// deadline and the shutdown flag are observed promptly.
const POLL_BOUND: Duration = Duration::from_millis(100);

/// Monitor task body. Runs until `shutdown` is triggered.
pub fn run(
    mut monitor: ConnectivityStatusMonitor,
    rx: &Receiver<ConnectivityEvent>,
    sync: &mut impl TimeSyncPort,
    restart: &mut impl RestartPort,
    clock: &MonotonicClock,
    shutdown: &ShutdownFlag,
) {
    while !shutdown.is_set() {
        if let Some(event) = rx.recv_timeout(POLL_BOUND) {
            monitor.apply(event, clock.uptime_ms(), sync);
        }
        monitor.poll_restart(clock.uptime_ms(), restart);
    }

    debug!("monitor: shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockSync {
        calls: u32,
    }
    impl TimeSyncPort for MockSync {
        fn sync_time(&mut self) {
            self.calls += 1;
        }
    }

    #[derive(Default)]
    struct MockRestart {
        calls: u32,
    }
    impl RestartPort for MockRestart {
        fn restart(&mut self) {
            self.calls += 1;
        }
    }

    fn monitor() -> ConnectivityStatusMonitor {
        ConnectivityStatusMonitor::new(StatusCell::new())
    }

    #[test]
    fn initial_state_is_disconnected_pending() {
        let m = monitor();
        assert_eq!(m.wifi_status(), WifiStatus::Disconnected);
        assert_eq!(m.ota_status(), OtaStatus::Pending);
    }

    #[test]
    fn connect_init_from_any_state() {
        let mut sync = MockSync::default();
        let mut m = monitor();
        for setup in [
            ConnectivityEvent::WifiConnectInit,
            ConnectivityEvent::WifiConnectSuccess,
            ConnectivityEvent::WifiConnectFail,
        ] {
            m.apply(setup, 0, &mut sync);
            m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
            assert_eq!(m.wifi_status(), WifiStatus::Connecting);
        }
    }

    #[test]
    fn success_only_valid_from_connecting() {
        let mut sync = MockSync::default();
        let mut m = monitor();
        // Disconnected: success is not a valid transition.
        m.apply(ConnectivityEvent::WifiConnectSuccess, 0, &mut sync);
        assert_eq!(m.wifi_status(), WifiStatus::Disconnected);

        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::WifiConnectSuccess, 0, &mut sync);
        assert_eq!(m.wifi_status(), WifiStatus::Connected);
    }

    #[test]
    fn fail_only_valid_from_connecting() {
        let mut sync = MockSync::default();
        let mut m = monitor();
        m.apply(ConnectivityEvent::WifiConnectFail, 0, &mut sync);
        assert_eq!(m.wifi_status(), WifiStatus::Disconnected);

        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::WifiConnectFail, 0, &mut sync);
        assert_eq!(m.wifi_status(), WifiStatus::ConnectFailed);
    }

    #[test]
    fn ota_events_do_not_touch_network_axis() {
        let mut sync = MockSync::default();
        let mut m = monitor();
        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::OtaSuccess, 0, &mut sync);
        m.apply(ConnectivityEvent::OtaFailed, 0, &mut sync);
        assert_eq!(m.wifi_status(), WifiStatus::Connecting);
    }

    #[test]
    fn time_sync_fires_once_per_process() {
        let mut sync = MockSync::default();
        let mut m = monitor();

        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::WifiConnectSuccess, 0, &mut sync);
        assert_eq!(sync.calls, 1);

        // Reconnect episode: already synchronized in-process, no re-trigger.
        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::WifiConnectSuccess, 0, &mut sync);
        assert_eq!(sync.calls, 1);
    }

    #[test]
    fn ota_success_arms_single_shot_restart() {
        let mut sync = MockSync::default();
        let mut restart = MockRestart::default();
        let mut m = monitor();

        m.apply(ConnectivityEvent::OtaSuccess, 1_000, &mut sync);
        assert!(m.restart_armed());

        // Not yet due.
        assert!(!m.poll_restart(1_000 + RESTART_DELAY_MS - 1, &mut restart));
        assert_eq!(restart.calls, 0);

        // Due: fires exactly once.
        assert!(m.poll_restart(1_000 + RESTART_DELAY_MS, &mut restart));
        assert_eq!(restart.calls, 1);
        assert!(!m.poll_restart(1_000 + RESTART_DELAY_MS * 2, &mut restart));
        assert_eq!(restart.calls, 1);
    }

    #[test]
    fn second_ota_success_does_not_rearm() {
        let mut sync = MockSync::default();
        let mut restart = MockRestart::default();
        let mut m = monitor();

        m.apply(ConnectivityEvent::OtaSuccess, 0, &mut sync);
        // Second success inside the window: the original deadline stands.
        m.apply(ConnectivityEvent::OtaSuccess, 5_000, &mut sync);

        assert!(m.poll_restart(RESTART_DELAY_MS, &mut restart));
        assert_eq!(restart.calls, 1);
        // Nothing left armed from the second event.
        assert!(!m.restart_armed());
        assert!(!m.poll_restart(5_000 + RESTART_DELAY_MS, &mut restart));
        assert_eq!(restart.calls, 1);
    }

    #[test]
    fn ota_failed_arms_nothing() {
        let mut sync = MockSync::default();
        let mut restart = MockRestart::default();
        let mut m = monitor();

        m.apply(ConnectivityEvent::OtaFailed, 0, &mut sync);
        assert_eq!(m.ota_status(), OtaStatus::Failed);
        assert!(!m.restart_armed());
        assert!(!m.poll_restart(u64::MAX, &mut restart));
    }

    #[test]
    fn snapshot_cell_tracks_both_axes() {
        let cell = StatusCell::new();
        let mut sync = MockSync::default();
        let mut m = ConnectivityStatusMonitor::new(cell.clone());

        m.apply(ConnectivityEvent::WifiConnectInit, 0, &mut sync);
        m.apply(ConnectivityEvent::OtaFailed, 0, &mut sync);

        let snap = cell.read();
        assert_eq!(snap.wifi, WifiStatus::Connecting);
        assert_eq!(snap.ota, OtaStatus::Failed);
    }
}
